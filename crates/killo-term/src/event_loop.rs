// SPDX-License-Identifier: MIT
//
// Event loop — render, read a key, dispatch, repeat.
//
// killo's loop is strictly alternating. Each cycle:
//
//   1. the application paints a complete frame into an `OutputBuffer`,
//   2. the buffer goes to the terminal in one write,
//   3. the decoder blocks until a key arrives,
//   4. the application handles it and says whether to keep going.
//
// A render therefore always reflects every key handled so far, and no key
// is ever handled against a stale frame. There is no tick, no resize
// handling and no background reader thread: the only waiting happens inside
// the decoder's bounded reads.
//
// Both ways out end the same: clear the screen, home the cursor, restore the
// terminal. Quit returns `Ok`; any terminal failure returns the error for
// the caller to report once the terminal is usable again.

use std::io::Write;

use crate::ansi;
use crate::error::{Error, Result};
use crate::input::{self, ByteSource, Key};
use crate::output::OutputBuffer;
use crate::terminal::{self, Size, Terminal, TtyDevice};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
pub trait App {
    /// Handle one decoded key.
    ///
    /// Return [`Action::Quit`] to exit the event loop.
    fn on_key(&mut self, key: Key) -> Action;

    /// Paint the whole screen into `out`.
    ///
    /// The buffer is empty on entry and is written to the terminal in one
    /// piece afterwards. Paint everything you want visible.
    fn paint(&mut self, out: &mut OutputBuffer);
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the raw-mode session, the key source and the output stream. Call
/// [`start`](Self::start) to enter raw mode and learn the viewport size,
/// then [`run`](Self::run) until the application quits.
///
/// # Example
///
/// ```no_run
/// use killo_term::event_loop::{Action, App, EventLoop};
/// use killo_term::input::{Key, StdinBytes};
/// use killo_term::output::{OutputBuffer, StdoutFd};
/// use killo_term::terminal::StdinTty;
///
/// struct MyApp;
///
/// impl App for MyApp {
///     fn on_key(&mut self, key: Key) -> Action {
///         if key == Key::Byte(b'q') {
///             return Action::Quit;
///         }
///         Action::Continue
///     }
///
///     fn paint(&mut self, out: &mut OutputBuffer) {
///         out.append(b"\x1b[Hhello");
///     }
/// }
///
/// let mut event_loop = EventLoop::new(StdinTty, StdinBytes, StdoutFd);
/// event_loop.start()?;
/// event_loop.run(&mut MyApp)?;
/// # Ok::<(), killo_term::Error>(())
/// ```
pub struct EventLoop<D: TtyDevice, S: ByteSource, W: Write> {
    terminal: Terminal<D>,
    source: S,
    out: W,
    frame: OutputBuffer,
}

impl<D: TtyDevice, S: ByteSource, W: Write> EventLoop<D, S, W> {
    /// Create an event loop with the default read timeout.
    pub fn new(device: D, source: S, out: W) -> Self {
        Self::with_terminal(Terminal::new(device), source, out)
    }

    /// Create an event loop around a configured [`Terminal`].
    pub fn with_terminal(terminal: Terminal<D>, source: S, out: W) -> Self {
        Self {
            terminal,
            source,
            out,
            frame: OutputBuffer::new(),
        }
    }

    /// The raw-mode session.
    #[inline]
    #[must_use]
    pub const fn terminal(&self) -> &Terminal<D> {
        &self.terminal
    }

    /// The output stream (for inspecting what was written).
    #[inline]
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Enter raw mode and resolve the viewport size.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalIo`] if raw mode cannot be entered,
    /// [`Error::GeometryUnavailable`] if the size cannot be determined. In
    /// both cases the terminal has already been cleared and restored.
    pub fn start(&mut self) -> Result<Size> {
        let result = self.terminal.enter().and_then(|()| {
            let direct = self.terminal.window_size();
            terminal::resolve_geometry(direct, &mut self.out, &mut self.source)
        });
        result.or_else(|err| self.abort(err))
    }

    /// Run the loop until the application returns [`Action::Quit`].
    ///
    /// Enters raw mode first if [`start`](Self::start) hasn't already.
    /// Returns with the screen cleared and the terminal restored, whether
    /// the loop ended by quitting or by error.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalIo`] if entering raw mode, writing a frame, or
    /// reading a key fails.
    pub fn run(&mut self, app: &mut impl App) -> Result<()> {
        if let Err(err) = self.terminal.enter() {
            return self.abort(err);
        }

        match self.run_inner(app) {
            Ok(()) => self.finish(),
            Err(err) => self.abort(err),
        }
    }

    /// Render one frame with a single write.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalIo`] if the write fails.
    pub fn render(&mut self, app: &mut impl App) -> Result<()> {
        self.frame.clear();
        app.paint(&mut self.frame);
        self.frame
            .flush_to(&mut self.out)
            .map_err(|e| Error::io("write", e))
    }

    /// The inner loop, separated so cleanup runs regardless of outcome.
    fn run_inner(&mut self, app: &mut impl App) -> Result<()> {
        loop {
            self.render(app)?;

            let key = input::read_key(&mut self.source)?;
            tracing::trace!(?key, "key");
            if app.on_key(key) == Action::Quit {
                tracing::debug!("quit requested");
                return Ok(());
            }
        }
    }

    /// Clear the screen, home the cursor, restore the terminal.
    fn finish(&mut self) -> Result<()> {
        let mut reset = OutputBuffer::new();
        ansi::clear_screen(&mut reset).ok();
        ansi::cursor_home(&mut reset).ok();
        let written = reset
            .flush_to(&mut self.out)
            .map_err(|e| Error::io("write", e));

        // Restore even if the reset write failed.
        self.terminal.leave()?;
        written
    }

    /// The fatal path: best-effort [`finish`](Self::finish), then `err`.
    fn abort<T>(&mut self, err: Error) -> Result<T> {
        tracing::error!(%err, "fatal terminal error");
        if let Err(cleanup) = self.finish() {
            tracing::error!(err = %cleanup, "cleanup after fatal error failed");
        }
        Err(err)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
