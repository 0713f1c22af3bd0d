// SPDX-License-Identifier: MIT
//
// Fatal terminal errors.
//
// Only two things can go wrong in a way the editor cares about: a terminal
// system call failed, or we could not work out how big the screen is. Both
// are fatal: a terminal left half-configured is not safe to keep drawing
// into. Read timeouts and unrecognized escape sequences are *not* errors and
// never reach this type.

use std::io;

use thiserror::Error;

/// A fatal terminal failure.
#[derive(Debug, Error)]
pub enum Error {
    /// A terminal system call (`tcgetattr`, `tcsetattr`, `read`, `write`)
    /// failed for a reason other than a read timeout.
    #[error("{op}: {source}")]
    TerminalIo {
        /// The operation that failed, named after the system call.
        op: &'static str,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Neither the `TIOCGWINSZ` query nor the cursor-position probe could
    /// determine the viewport dimensions.
    #[error("get_window_size: terminal dimensions unavailable")]
    GeometryUnavailable,
}

impl Error {
    /// Wrap an OS error with the name of the failing operation.
    #[must_use]
    pub const fn io(op: &'static str, source: io::Error) -> Self {
        Self::TerminalIo { op, source }
    }
}

/// Result alias for fallible terminal operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_io_display_names_operation_and_cause() {
        let err = Error::io("tcsetattr", io::Error::new(io::ErrorKind::Unsupported, "not a tty"));
        let msg = err.to_string();
        assert_eq!(msg, "tcsetattr: not a tty");
    }

    #[test]
    fn terminal_io_exposes_source() {
        use std::error::Error as _;

        let err = Error::io("read", io::Error::other("boom"));
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("boom"));
    }

    #[test]
    fn geometry_unavailable_display() {
        assert_eq!(
            Error::GeometryUnavailable.to_string(),
            "get_window_size: terminal dimensions unavailable"
        );
    }
}
