// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Key decoder.
//
// Turns raw stdin bytes into logical keys. In raw mode with `VMIN = 0` and a
// short `VTIME`, a read returns zero bytes when nothing was typed in time.
// That is not an error: the decoder simply reads again until a byte shows up.
//
// Once a byte arrives, ESC (0x1B) starts a bounded lookahead. Every sequence
// killo understands is a short, fixed-shape CSI sequence, so at most three
// more bytes are ever needed:
//
//   ESC [ A/B/C/D      → arrows (up, down, right, left)
//   ESC [ 5 ~          → Page Up
//   ESC [ 6 ~          → Page Down
//
// A follow-up read that comes back empty means the user pressed Escape on
// its own (or the sequence was cut short); the decoder answers `Escape`.
// Anything it doesn't recognize also collapses to `Escape`.
//
// Control-key combinations are not the decoder's business. Ctrl+letter
// arrives as the letter with bits 0x60 cleared; see [`ctrl_key`].

#[cfg(any(test, feature = "testing"))]
use std::collections::VecDeque;
use std::io;

use crate::error::{Error, Result};

/// The escape byte that introduces every control sequence.
pub const ESC: u8 = 0x1b;

// ─── Key ────────────────────────────────────────────────────────────────────

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Any single byte that didn't start an escape sequence: printable
    /// characters, control characters, DEL.
    Byte(u8),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    /// A lone Escape press, or an escape sequence that was truncated or
    /// not recognized.
    Escape,
}

/// The byte a terminal sends for Ctrl+`letter`.
///
/// ```
/// assert_eq!(killo_term::input::ctrl_key(b'q'), 0x11);
/// ```
#[inline]
#[must_use]
pub const fn ctrl_key(letter: u8) -> u8 {
    letter & 0x1f
}

// ─── ByteSource ─────────────────────────────────────────────────────────────

/// Where key bytes come from.
pub trait ByteSource {
    /// Read a single byte.
    ///
    /// `Ok(None)` means the read timed out without data; the caller decides
    /// whether that ends a sequence or just means "try again".
    ///
    /// # Errors
    ///
    /// Any read failure other than a timeout.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Stdin in raw mode, read one byte per `read(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinBytes;

#[cfg(unix)]
impl ByteSource for StdinBytes {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    // VTIME expiry on some systems, or a signal mid-read.
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for StdinBytes {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

/// A scripted byte source: each entry is either a byte or a timeout.
///
/// Once the script runs out every read times out, the same as an idle
/// terminal. Built for tests with the `testing` feature.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default, Clone)]
pub struct ByteQueue {
    script: VecDeque<Option<u8>>,
}

#[cfg(any(test, feature = "testing"))]
impl ByteQueue {
    /// An empty queue: every read times out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that yields `bytes` back to back with no timeouts between.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            script: bytes.iter().copied().map(Some).collect(),
        }
    }

    /// Append bytes delivered back to back.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.script.extend(bytes.iter().copied().map(Some));
        self
    }

    /// Append one read that times out.
    pub fn push_timeout(&mut self) -> &mut Self {
        self.script.push_back(None);
        self
    }

    /// Scripted reads not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[cfg(any(test, feature = "testing"))]
impl ByteSource for ByteQueue {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.script.pop_front().flatten())
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Block until one key is available and decode it.
///
/// Empty reads before the first byte are retried transparently.
///
/// # Errors
///
/// [`Error::TerminalIo`] if the source fails with anything but a timeout.
/// On a source that only ever times out, this never returns.
pub fn read_key(src: &mut impl ByteSource) -> Result<Key> {
    let first = loop {
        if let Some(b) = src.read_byte().map_err(|e| Error::io("read", e))? {
            break b;
        }
    };

    if first != ESC {
        return Ok(Key::Byte(first));
    }

    Ok(decode_escape(src))
}

/// Decode what follows an ESC byte.
///
/// Follow-up read failures are treated like timeouts: the sequence is
/// abandoned and reported as [`Key::Escape`].
fn decode_escape(src: &mut impl ByteSource) -> Key {
    let mut seq = [0u8; 3];

    for slot in &mut seq[..2] {
        let Some(b) = next(src) else {
            return Key::Escape;
        };
        *slot = b;
    }

    if seq[0] != b'[' {
        tracing::trace!(?seq, "unrecognized escape sequence");
        return Key::Escape;
    }

    let key = match seq[1] {
        b'0'..=b'9' => {
            let Some(c) = next(src) else {
                return Key::Escape;
            };
            seq[2] = c;
            match (seq[1], seq[2]) {
                (b'5', b'~') => Key::PageUp,
                (b'6', b'~') => Key::PageDown,
                _ => Key::Escape,
            }
        }
        b'A' => Key::ArrowUp,
        b'B' => Key::ArrowDown,
        b'C' => Key::ArrowRight,
        b'D' => Key::ArrowLeft,
        _ => Key::Escape,
    };

    if key == Key::Escape {
        tracing::trace!(?seq, "unrecognized escape sequence");
    }
    key
}

/// One lookahead byte, or `None` on timeout or failure.
fn next(src: &mut impl ByteSource) -> Option<u8> {
    src.read_byte().ok().flatten()
}

// ─── Tests ──────────────────────────────────────────────────────────────────
