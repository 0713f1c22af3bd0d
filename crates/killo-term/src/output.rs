// SPDX-License-Identifier: MIT
//
// Output buffering.
//
// OutputBuffer accumulates every byte of a frame in memory so the whole
// screen can be handed to the terminal in a single write() call. Many small
// writes let the terminal paint half a frame before the rest arrives, which
// shows up as flicker and cursor jumps. One write, one paint.
//
// Appends never truncate: if growing the buffer fails, that one append is
// dropped and everything already written stays intact.
//
// `io::stdout()` is line-buffered and would split a frame at its last
// newline, so frames go out through `StdoutFd`, which hands each buffer
// straight to write(2) on fd 1.

use std::io::{self, Write};

/// A byte buffer that accumulates ANSI output for a single `write()` call.
///
/// Owned by one render pass and discarded afterwards. There is no
/// double-buffering or diffing between frames.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

/// Enough for an 80×24 frame of filler rows without reallocating.
const DEFAULT_CAPACITY: usize = 4096;

impl OutputBuffer {
    /// Create an empty buffer with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes.
    ///
    /// Returns `false` if the buffer could not grow; in that case nothing
    /// was appended and the existing contents are unchanged.
    pub fn append(&mut self, bytes: &[u8]) -> bool {
        if self.buf.try_reserve(bytes.len()).is_err() {
            tracing::warn!(len = bytes.len(), "output buffer allocation failed, dropping append");
            return false;
        }
        self.buf.extend_from_slice(bytes);
        true
    }

    /// Append `byte` `count` times.
    pub fn append_repeated(&mut self, byte: u8, count: usize) -> bool {
        if self.buf.try_reserve(count).is_err() {
            tracing::warn!(len = count, "output buffer allocation failed, dropping append");
            return false;
        }
        self.buf.resize(self.buf.len() + count, byte);
        true
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w` in one `write_all`, flush, and clear.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A dropped append still reports success: the frame goes out short
        // rather than aborting the render.
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── StdoutFd ────────────────────────────────────────────────────────────────

/// Unbuffered stdout: every `write` is one `write(2)` on fd 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutFd;

#[cfg(unix)]
#[allow(unsafe_code)]
impl Write for StdoutFd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                buf.as_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        // n is -1 on error, otherwise within 0..=buf.len().
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(not(unix))]
impl Write for StdoutFd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(buf)?;
        stdout.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Writer that records how many `write` calls it received.
    struct CountingWriter {
        data: Vec<u8>,
        writes: usize,
        flushes: usize,
    }

    impl Write for CountingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn new_is_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn append_accumulates_in_order() {
        let mut buf = OutputBuffer::new();
        assert!(buf.append(b"\x1b[H"));
        assert!(buf.append(b"~"));
        assert_eq!(buf.as_bytes(), b"\x1b[H~");
    }

    #[test]
    fn append_repeated_spaces() {
        let mut buf = OutputBuffer::new();
        buf.append(b"~");
        buf.append_repeated(b' ', 3);
        assert_eq!(buf.as_bytes(), b"~   ");
    }

    #[test]
    fn append_repeated_zero_is_noop() {
        let mut buf = OutputBuffer::new();
        buf.append_repeated(b' ', 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn failed_growth_drops_append_and_keeps_contents() {
        let mut buf = OutputBuffer::new();
        assert!(buf.append(b"abc"));

        assert!(!buf.append_repeated(b' ', usize::MAX));
        assert_eq!(buf.as_bytes(), b"abc");

        // The buffer is still usable afterwards.
        assert!(buf.append(b"d"));
        assert_eq!(buf.as_bytes(), b"abcd");
    }

    #[test]
    fn write_trait_formats() {
        let mut buf = OutputBuffer::new();
        write!(buf, "\x1b[{};{}H", 3, 7).unwrap();
        assert_eq!(buf.as_bytes(), b"\x1b[3;7H");
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buf = OutputBuffer::new();
        buf.append(b"some data");
        let cap = buf.buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.buf.capacity(), cap);
    }

    #[test]
    fn flush_to_is_a_single_write() {
        let mut buf = OutputBuffer::new();
        for _ in 0..500 {
            buf.append(b"~\x1b[K\r\n");
        }
        let mut dest = CountingWriter {
            data: Vec::new(),
            writes: 0,
            flushes: 0,
        };
        buf.flush_to(&mut dest).unwrap();

        assert_eq!(dest.writes, 1);
        assert_eq!(dest.flushes, 1);
        assert_eq!(dest.data.len(), 500 * 6);
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_to_empty_is_noop() {
        let mut buf = OutputBuffer::new();
        let mut dest = CountingWriter {
            data: Vec::new(),
            writes: 0,
            flushes: 0,
        };
        buf.flush_to(&mut dest).unwrap();
        assert_eq!(dest.writes, 0);
    }

    #[test]
    fn flush_to_propagates_writer_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut buf = OutputBuffer::new();
        buf.append(b"frame");
        let err = buf.flush_to(&mut Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        // Content survives a failed flush.
        assert_eq!(buf.as_bytes(), b"frame");
    }
}
