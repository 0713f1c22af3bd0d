// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, RAII restore, and viewport geometry.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd writes. These are the standard
// POSIX interfaces for terminal control and have no safe wrapper in std.
// Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// A `Terminal` is the one session object that owns the terminal's raw state.
// Entering captures the original attributes and switches the line discipline
// to raw mode; leaving puts the snapshot back. Restoration is guaranteed on
// every way out of the process that we control:
//
//   - `leave()` on the normal quit path and on the fatal-error path,
//   - `Drop` if the session is unwound or simply goes out of scope,
//   - a panic hook that restores from a global backup, because the hook
//     cannot reach the session itself.
//
// The OS side sits behind `TtyDevice`. `StdinTty` is the real thing (fd 0
// via libc); `MemoryTty`, behind the `testing` feature, keeps its
// attributes in memory so the round trip can be checked without a terminal.
//
// Geometry comes from `ioctl(TIOCGWINSZ)` when the driver knows it, and from
// a cursor-position probe when it doesn't: push the cursor into the bottom
// right corner, ask where it ended up, and parse the reply.

#[cfg(any(test, feature = "testing"))]
use std::cell::RefCell;
use std::io::{self, Write};
#[cfg(any(test, feature = "testing"))]
use std::rc::Rc;
#[cfg(unix)]
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::error::{Error, Result};
use crate::input::ByteSource;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)` on stdout.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// driver reports a zero dimension.
#[cfg(unix)]
#[must_use]
pub fn query_window_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn query_window_size() -> Option<Size> {
    None
}

// ─── Geometry Probe ─────────────────────────────────────────────────────────

/// Longest cursor-position reply we are willing to read, `R` excluded.
pub const PROBE_REPLY_LIMIT: usize = 31;

/// Parse a cursor-position report of the form `ESC [ rows ; cols`.
///
/// The terminating `R` is optional (the probe stops reading at it). Bytes
/// after the column number are ignored. Returns `None` for anything that
/// doesn't start with `ESC [`, lacks either number, or reports a zero
/// dimension.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let body = reply.strip_prefix(b"\x1b[")?;
    let (rows, rest) = parse_u16(body)?;
    let rest = rest.strip_prefix(b";")?;
    let (cols, _) = parse_u16(rest)?;

    let size = Size { cols, rows };
    (!size.is_degenerate()).then_some(size)
}

/// Parse leading ASCII digits. `None` if there are none or the value
/// overflows `u16`.
fn parse_u16(buf: &[u8]) -> Option<(u16, &[u8])> {
    let digits = buf.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let mut val: u16 = 0;
    for &b in &buf[..digits] {
        val = val.checked_mul(10)?.checked_add(u16::from(b - b'0'))?;
    }
    Some((val, &buf[digits..]))
}

/// Determine the viewport size by asking the terminal where the cursor is
/// after pushing it into the bottom-right corner.
///
/// Reads the reply one byte at a time until `R`, a read that yields
/// nothing, or [`PROBE_REPLY_LIMIT`] bytes. Any failure yields `None`.
pub fn probe_window_size(out: &mut impl Write, src: &mut impl ByteSource) -> Option<Size> {
    let sent = ansi::cursor_to_far_corner(out)
        .and_then(|()| ansi::request_cursor_position(out))
        .and_then(|()| out.flush());
    if let Err(err) = sent {
        tracing::debug!(%err, "cursor position probe: write failed");
        return None;
    }

    let mut reply = [0u8; PROBE_REPLY_LIMIT];
    let mut len = 0;
    while len < PROBE_REPLY_LIMIT {
        match src.read_byte() {
            Ok(Some(b'R') | None) | Err(_) => break,
            Ok(Some(b)) => {
                reply[len] = b;
                len += 1;
            }
        }
    }

    let size = parse_cursor_report(&reply[..len]);
    if size.is_none() {
        tracing::debug!(reply = ?&reply[..len], "cursor position probe: unparsable reply");
    }
    size
}

/// Resolve the viewport geometry.
///
/// Uses `direct` (the driver's answer, see [`query_window_size`]) when it
/// is present and non-degenerate, otherwise falls back to
/// [`probe_window_size`].
///
/// # Errors
///
/// [`Error::GeometryUnavailable`] if both strategies fail.
pub fn resolve_geometry(
    direct: Option<Size>,
    out: &mut impl Write,
    src: &mut impl ByteSource,
) -> Result<Size> {
    if let Some(size) = direct.filter(|s| !s.is_degenerate()) {
        tracing::debug!(cols = size.cols, rows = size.rows, "geometry from TIOCGWINSZ");
        return Ok(size);
    }

    let size = probe_window_size(out, src).ok_or(Error::GeometryUnavailable)?;
    tracing::debug!(cols = size.cols, rows = size.rows, "geometry from cursor probe");
    Ok(size)
}

// ─── TtyDevice ──────────────────────────────────────────────────────────────

/// The OS side of a terminal: get and set line-discipline attributes.
pub trait TtyDevice {
    /// Opaque snapshot of the terminal's attributes.
    type Attrs: Clone;

    /// Read the current attributes.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the query fails.
    fn get_attrs(&mut self) -> io::Result<Self::Attrs>;

    /// Apply `attrs`, discarding pending input (`TCSAFLUSH`).
    ///
    /// # Errors
    ///
    /// Returns the OS error if the terminal rejects the attributes.
    fn set_attrs(&mut self, attrs: &Self::Attrs) -> io::Result<()>;

    /// Derive the raw-mode attribute set from `original`.
    ///
    /// `read_timeout` is the inter-byte read timeout in tenths of a second.
    fn make_raw(original: &Self::Attrs, read_timeout: u8) -> Self::Attrs;

    /// The window size as the driver reports it, if it knows.
    fn window_size(&self) -> Option<Size>;

    /// Remember `saved` somewhere a panic hook can reach it.
    fn arm_emergency_restore(&self, _saved: &Self::Attrs) {}

    /// Forget the snapshot stored by [`arm_emergency_restore`](Self::arm_emergency_restore).
    fn disarm_emergency_restore(&self) {}
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] owns its own copy, but the panic hook can't access it.
/// This global backup, behind a [`Mutex`], lets the
/// hook restore raw mode without the session.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Restore sequence written on panic: show the cursor, clear the frame,
/// home the cursor so the panic message starts at the top.
#[cfg(unix)]
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?25h\x1b[2J\x1b[H";

#[cfg(unix)]
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Writes [`EMERGENCY_RESTORE`] straight to fd 1 (bypassing Rust's stdout
/// lock, which may be held mid-frame), restores termios, then delegates to
/// the original hook so the message prints to a working terminal.
#[cfg(unix)]
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            unsafe {
                let _ = libc::write(
                    libc::STDOUT_FILENO,
                    EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
                    EMERGENCY_RESTORE.len(),
                );
            }
            restore_termios_from_backup();
            original(info);
        }));
    });
}

// ─── StdinTty ───────────────────────────────────────────────────────────────

/// The controlling terminal, reached through stdin's file descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinTty;

/// Compute the raw-mode attribute set from the original termios.
///
/// Input: no CR→NL translation, no XON/XOFF flow control, no parity
/// checking, no 8th-bit stripping, no SIGINT on break.
/// Output: no post-processing (we send `\r\n` ourselves).
/// Local: no echo, no canonical mode, no signal keys, no `IEXTEN`.
/// Control: 8-bit characters.
///
/// `VMIN = 0` and `VTIME = read_timeout` make `read()` return after at most
/// `read_timeout` tenths of a second, with zero bytes if nothing arrived.
#[cfg(unix)]
#[must_use]
pub fn raw_attributes(original: &libc::termios, read_timeout: u8) -> libc::termios {
    let mut raw = *original;
    raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
    raw.c_oflag &= !libc::OPOST;
    raw.c_cflag |= libc::CS8;
    raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
    raw.c_cc[libc::VMIN] = 0;
    raw.c_cc[libc::VTIME] = read_timeout;
    raw
}

#[cfg(unix)]
impl TtyDevice for StdinTty {
    type Attrs = libc::termios;

    fn get_attrs(&mut self) -> io::Result<libc::termios> {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(termios)
    }

    fn set_attrs(&mut self, attrs: &libc::termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, attrs) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn make_raw(original: &libc::termios, read_timeout: u8) -> libc::termios {
        raw_attributes(original, read_timeout)
    }

    fn window_size(&self) -> Option<Size> {
        query_window_size()
    }

    fn arm_emergency_restore(&self, saved: &libc::termios) {
        install_panic_hook();
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some(*saved);
        }
    }

    fn disarm_emergency_restore(&self) {
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }
    }
}

#[cfg(not(unix))]
impl TtyDevice for StdinTty {
    type Attrs = ();

    fn get_attrs(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode requires a unix terminal",
        ))
    }

    fn set_attrs(&mut self, _attrs: &()) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode requires a unix terminal",
        ))
    }

    fn make_raw(_original: &(), _read_timeout: u8) {}

    fn window_size(&self) -> Option<Size> {
        None
    }
}

// ─── MemoryTty ──────────────────────────────────────────────────────────────

/// Attributes of a [`MemoryTty`]: just enough to tell cooked from raw.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAttrs {
    /// Canonical (line-buffered) input with echo and signal keys.
    pub cooked: bool,
    /// Minimum bytes for a read to return.
    pub vmin: u8,
    /// Read timeout in tenths of a second.
    pub vtime: u8,
}

#[cfg(any(test, feature = "testing"))]
impl Default for MemoryAttrs {
    fn default() -> Self {
        Self {
            cooked: true,
            vmin: 1,
            vtime: 0,
        }
    }
}

#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
struct MemoryState {
    attrs: MemoryAttrs,
    size: Option<Size>,
    fail_get: bool,
    fail_set: bool,
    set_calls: usize,
}

/// An in-memory terminal for tests, built with the `testing` feature.
///
/// Clones share state, so a test can keep one handle and give the other to
/// a [`Terminal`], then inspect the attributes after the session is gone.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone, Default)]
pub struct MemoryTty {
    state: Rc<RefCell<MemoryState>>,
}

#[cfg(any(test, feature = "testing"))]
impl MemoryTty {
    /// A cooked terminal with no known window size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cooked terminal whose driver reports `size`.
    #[must_use]
    pub fn with_size(size: Size) -> Self {
        let tty = Self::new();
        tty.state.borrow_mut().size = Some(size);
        tty
    }

    /// Current attributes.
    #[must_use]
    pub fn attrs(&self) -> MemoryAttrs {
        self.state.borrow().attrs
    }

    /// Number of successful `set_attrs` calls so far.
    #[must_use]
    pub fn set_calls(&self) -> usize {
        self.state.borrow().set_calls
    }

    /// Make every future `get_attrs` fail.
    pub fn fail_get(&self, fail: bool) {
        self.state.borrow_mut().fail_get = fail;
    }

    /// Make every future `set_attrs` fail.
    pub fn fail_set(&self, fail: bool) {
        self.state.borrow_mut().fail_set = fail;
    }
}

#[cfg(any(test, feature = "testing"))]
impl TtyDevice for MemoryTty {
    type Attrs = MemoryAttrs;

    fn get_attrs(&mut self) -> io::Result<MemoryAttrs> {
        let state = self.state.borrow();
        if state.fail_get {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "not a tty"));
        }
        Ok(state.attrs)
    }

    fn set_attrs(&mut self, attrs: &MemoryAttrs) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_set {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "not a tty"));
        }
        state.attrs = *attrs;
        state.set_calls += 1;
        Ok(())
    }

    fn make_raw(_original: &MemoryAttrs, read_timeout: u8) -> MemoryAttrs {
        MemoryAttrs {
            cooked: false,
            vmin: 0,
            vtime: read_timeout,
        }
    }

    fn window_size(&self) -> Option<Size> {
        self.state.borrow().size
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Default inter-byte read timeout: one tenth of a second.
pub const DEFAULT_READ_TIMEOUT: u8 = 1;

/// Raw-mode session with RAII cleanup.
///
/// Call [`enter`](Self::enter) to switch the device to raw mode. The
/// original attributes are restored by [`leave`](Self::leave), when the
/// session is dropped, or by the panic hook.
///
/// # Example
///
/// ```no_run
/// use killo_term::terminal::{StdinTty, Terminal};
///
/// let mut term = Terminal::new(StdinTty);
/// term.enter()?;
/// // ... render frames, handle input ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), killo_term::Error>(())
/// ```
pub struct Terminal<D: TtyDevice> {
    device: D,

    /// Original attributes saved before entering raw mode. `Some` exactly
    /// while raw mode is active.
    saved: Option<D::Attrs>,

    /// `VTIME` for raw mode, in tenths of a second.
    read_timeout: u8,
}

impl<D: TtyDevice> Terminal<D> {
    /// Create a session for `device` with the default read timeout.
    ///
    /// Does **not** enter raw mode; call [`enter`](Self::enter) for that.
    #[must_use]
    pub const fn new(device: D) -> Self {
        Self::with_read_timeout(device, DEFAULT_READ_TIMEOUT)
    }

    /// Create a session with a custom read timeout (tenths of a second).
    #[must_use]
    pub const fn with_read_timeout(device: D, read_timeout: u8) -> Self {
        Self {
            device,
            saved: None,
            read_timeout,
        }
    }

    /// Whether raw mode is currently active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.saved.is_some()
    }

    /// Window size as reported by the device driver.
    #[must_use]
    pub fn window_size(&self) -> Option<Size> {
        self.device.window_size()
    }

    /// Enter raw mode.
    ///
    /// Captures the current attributes, arms the emergency restore, then
    /// applies the raw attribute set. Idempotent: calling `enter()` while
    /// already active is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalIo`] if the attributes cannot be read or applied.
    pub fn enter(&mut self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }

        let original = self
            .device
            .get_attrs()
            .map_err(|e| Error::io("tcgetattr", e))?;

        // Armed before the switch so there is no window in which raw mode
        // is on but nothing knows how to undo it.
        self.device.arm_emergency_restore(&original);

        let raw = D::make_raw(&original, self.read_timeout);
        if let Err(e) = self.device.set_attrs(&raw) {
            self.device.disarm_emergency_restore();
            return Err(Error::io("tcsetattr", e));
        }

        self.saved = Some(original);
        tracing::debug!(read_timeout = self.read_timeout, "entered raw mode");
        Ok(())
    }

    /// Leave raw mode, reapplying the saved attributes.
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalIo`] if the saved attributes cannot be reapplied.
    /// The session stays active so a later `leave()` (or drop) retries.
    pub fn leave(&mut self) -> Result<()> {
        let Some(original) = self.saved.as_ref() else {
            return Ok(());
        };

        self.device
            .set_attrs(original)
            .map_err(|e| Error::io("tcsetattr", e))?;

        self.device.disarm_emergency_restore();
        self.saved = None;
        tracing::debug!("left raw mode");
        Ok(())
    }
}

impl<D: TtyDevice> Drop for Terminal<D> {
    fn drop(&mut self) {
        if let Err(err) = self.leave() {
            tracing::error!(%err, "failed to restore terminal attributes");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ByteQueue;
    use pretty_assertions::assert_eq;

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_degenerate() {
        assert!(Size { cols: 0, rows: 24 }.is_degenerate());
        assert!(Size { cols: 80, rows: 0 }.is_degenerate());
        assert!(!Size { cols: 1, rows: 1 }.is_degenerate());
    }

    // ── Terminal queries ─────────────────────────────────────────────

    #[test]
    fn query_window_size_does_not_panic() {
        let _ = query_window_size();
    }

    // ── Cursor report parsing ────────────────────────────────────────

    #[test]
    fn parse_report_typical() {
        assert_eq!(
            parse_cursor_report(b"\x1b[24;80"),
            Some(Size { cols: 80, rows: 24 })
        );
    }

    #[test]
    fn parse_report_with_terminator() {
        assert_eq!(
            parse_cursor_report(b"\x1b[50;132R"),
            Some(Size { cols: 132, rows: 50 })
        );
    }

    #[test]
    fn parse_report_rejects_missing_csi() {
        assert_eq!(parse_cursor_report(b"24;80"), None);
        assert_eq!(parse_cursor_report(b"\x1bO24;80"), None);
        assert_eq!(parse_cursor_report(b""), None);
    }

    #[test]
    fn parse_report_rejects_missing_numbers() {
        assert_eq!(parse_cursor_report(b"\x1b[;80"), None);
        assert_eq!(parse_cursor_report(b"\x1b[24;"), None);
        assert_eq!(parse_cursor_report(b"\x1b[24"), None);
    }

    #[test]
    fn parse_report_rejects_zero_dimension() {
        assert_eq!(parse_cursor_report(b"\x1b[0;80"), None);
        assert_eq!(parse_cursor_report(b"\x1b[24;0"), None);
    }

    #[test]
    fn parse_report_rejects_overflow() {
        assert_eq!(parse_cursor_report(b"\x1b[70000;80"), None);
    }

    // ── Probe ────────────────────────────────────────────────────────

    #[test]
    fn probe_sends_request_and_parses_reply() {
        let mut out = Vec::new();
        let mut src = ByteQueue::from_bytes(b"\x1b[40;120R");

        let size = probe_window_size(&mut out, &mut src);

        assert_eq!(size, Some(Size { cols: 120, rows: 40 }));
        assert_eq!(out, b"\x1b[999C\x1b[999B\x1b[6n");
    }

    #[test]
    fn probe_stops_at_terminator() {
        let mut out = Vec::new();
        let mut src = ByteQueue::from_bytes(b"\x1b[40;120Rq");

        probe_window_size(&mut out, &mut src);

        // The byte after `R` is left for the key decoder.
        assert_eq!(src.remaining(), 1);
    }

    #[test]
    fn probe_gives_up_on_timeout() {
        let mut out = Vec::new();
        let mut src = ByteQueue::from_bytes(b"\x1b[40;");
        assert_eq!(probe_window_size(&mut out, &mut src), None);
    }

    #[test]
    fn probe_reads_at_most_the_limit() {
        let mut reply = vec![b'9'; 64];
        reply.push(b'R');
        let mut src = ByteQueue::from_bytes(&reply);
        let mut out = Vec::new();

        assert_eq!(probe_window_size(&mut out, &mut src), None);
        assert_eq!(src.remaining(), 65 - PROBE_REPLY_LIMIT);
    }

    #[test]
    fn probe_write_failure_yields_none() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut src = ByteQueue::from_bytes(b"\x1b[24;80R");
        assert_eq!(probe_window_size(&mut Broken, &mut src), None);
    }

    // ── Geometry resolution ──────────────────────────────────────────

    #[test]
    fn resolve_prefers_direct_query() {
        let mut out = Vec::new();
        let mut src = ByteQueue::new();
        let size = resolve_geometry(Some(Size { cols: 80, rows: 24 }), &mut out, &mut src);

        assert_eq!(size.unwrap(), Size { cols: 80, rows: 24 });
        assert!(out.is_empty(), "no probe when the driver answers");
    }

    #[test]
    fn resolve_falls_back_on_degenerate_direct_size() {
        let mut out = Vec::new();
        let mut src = ByteQueue::from_bytes(b"\x1b[30;100R");
        let size = resolve_geometry(Some(Size { cols: 0, rows: 0 }), &mut out, &mut src);

        assert_eq!(size.unwrap(), Size { cols: 100, rows: 30 });
        assert!(!out.is_empty());
    }

    #[test]
    fn resolve_falls_back_when_direct_missing() {
        let mut out = Vec::new();
        let mut src = ByteQueue::from_bytes(b"\x1b[12;40R");
        let size = resolve_geometry(None, &mut out, &mut src);
        assert_eq!(size.unwrap(), Size { cols: 40, rows: 12 });
    }

    #[test]
    fn resolve_fails_when_both_strategies_fail() {
        let mut out = Vec::new();
        let mut src = ByteQueue::from_bytes(b"garbage");
        let err = resolve_geometry(None, &mut out, &mut src).unwrap_err();
        assert!(matches!(err, Error::GeometryUnavailable));
    }

    // ── Raw attributes ───────────────────────────────────────────────

    #[cfg(unix)]
    #[test]
    fn raw_attributes_clear_line_discipline() {
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        original.c_iflag = libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON;
        original.c_oflag = libc::OPOST;
        original.c_lflag = libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG;
        original.c_cc[libc::VMIN] = 1;

        let raw = raw_attributes(&original, 1);

        assert_eq!(raw.c_iflag, 0);
        assert_eq!(raw.c_oflag & libc::OPOST, 0);
        assert_eq!(raw.c_lflag, 0);
        assert_eq!(raw.c_cflag & libc::CS8, libc::CS8);
        assert_eq!(raw.c_cc[libc::VMIN], 0);
        assert_eq!(raw.c_cc[libc::VTIME], 1);
    }

    #[cfg(unix)]
    #[test]
    fn raw_attributes_preserve_unrelated_flags() {
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        original.c_iflag = libc::IGNPAR | libc::ICRNL;
        original.c_lflag = libc::ECHOE | libc::ECHO;

        let raw = raw_attributes(&original, 3);

        assert_eq!(raw.c_iflag, libc::IGNPAR);
        assert_eq!(raw.c_lflag, libc::ECHOE);
        assert_eq!(raw.c_cc[libc::VTIME], 3);
    }

    // ── Terminal session ─────────────────────────────────────────────

    #[test]
    fn enter_switches_to_raw() {
        let tty = MemoryTty::new();
        let mut term = Terminal::new(tty.clone());

        term.enter().unwrap();

        assert!(term.is_active());
        assert_eq!(
            tty.attrs(),
            MemoryAttrs {
                cooked: false,
                vmin: 0,
                vtime: DEFAULT_READ_TIMEOUT,
            }
        );
    }

    #[test]
    fn custom_read_timeout_reaches_device() {
        let tty = MemoryTty::new();
        let mut term = Terminal::with_read_timeout(tty.clone(), 5);
        term.enter().unwrap();
        assert_eq!(tty.attrs().vtime, 5);
    }

    #[test]
    fn leave_restores_original() {
        let tty = MemoryTty::new();
        let before = tty.attrs();
        let mut term = Terminal::new(tty.clone());

        term.enter().unwrap();
        term.leave().unwrap();

        assert!(!term.is_active());
        assert_eq!(tty.attrs(), before);
    }

    #[test]
    fn drop_restores_original() {
        let tty = MemoryTty::new();
        let before = tty.attrs();
        {
            let mut term = Terminal::new(tty.clone());
            term.enter().unwrap();
            assert_ne!(tty.attrs(), before);
        }
        assert_eq!(tty.attrs(), before);
    }

    #[test]
    fn double_enter_is_idempotent() {
        let tty = MemoryTty::new();
        let before = tty.attrs();
        let mut term = Terminal::new(tty.clone());

        term.enter().unwrap();
        term.enter().unwrap();
        assert_eq!(tty.set_calls(), 1);

        term.leave().unwrap();
        assert_eq!(tty.attrs(), before);
    }

    #[test]
    fn double_leave_is_idempotent() {
        let tty = MemoryTty::new();
        let mut term = Terminal::new(tty.clone());
        term.enter().unwrap();
        term.leave().unwrap();
        term.leave().unwrap();
        assert_eq!(tty.set_calls(), 2);
    }

    #[test]
    fn leave_without_enter_is_noop() {
        let tty = MemoryTty::new();
        let mut term = Terminal::new(tty.clone());
        term.leave().unwrap();
        drop(term);
        assert_eq!(tty.set_calls(), 0);
    }

    #[test]
    fn multiple_cycles_round_trip() {
        let tty = MemoryTty::new();
        let before = tty.attrs();
        let mut term = Terminal::new(tty.clone());
        for _ in 0..3 {
            term.enter().unwrap();
            term.leave().unwrap();
            assert_eq!(tty.attrs(), before);
        }
    }

    #[test]
    fn enter_reports_get_failure() {
        let tty = MemoryTty::new();
        tty.fail_get(true);
        let mut term = Terminal::new(tty);

        let err = term.enter().unwrap_err();
        assert!(matches!(err, Error::TerminalIo { op: "tcgetattr", .. }));
        assert!(!term.is_active());
    }

    #[test]
    fn enter_reports_set_failure() {
        let tty = MemoryTty::new();
        tty.fail_set(true);
        let mut term = Terminal::new(tty.clone());

        let err = term.enter().unwrap_err();
        assert!(matches!(err, Error::TerminalIo { op: "tcsetattr", .. }));
        assert!(!term.is_active());
        assert_eq!(tty.attrs(), MemoryAttrs::default());
    }

    #[test]
    fn failed_leave_keeps_session_active_for_retry() {
        let tty = MemoryTty::new();
        let before = tty.attrs();
        let mut term = Terminal::new(tty.clone());
        term.enter().unwrap();

        tty.fail_set(true);
        assert!(term.leave().is_err());
        assert!(term.is_active());

        tty.fail_set(false);
        drop(term);
        assert_eq!(tty.attrs(), before);
    }

    #[test]
    fn window_size_comes_from_device() {
        let size = Size { cols: 100, rows: 30 };
        let term = Terminal::new(MemoryTty::with_size(size));
        assert_eq!(term.window_size(), Some(size));
        assert_eq!(Terminal::new(MemoryTty::new()).window_size(), None);
    }
}
