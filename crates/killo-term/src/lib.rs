// SPDX-License-Identifier: MIT
//
// killo-term — terminal control for killo.
//
// Everything that touches the controlling terminal lives here: the raw-mode
// session and its guaranteed restore, the key decoder that turns stdin bytes
// into logical keys, the ANSI sequences we emit, and the output buffer that
// lets a whole frame leave the process in one write().
//
// Like the rest of the workspace, this crate talks to the terminal through
// raw termios and hand-written escape sequences rather than a TUI framework.
// The OS boundary is two small traits (`TtyDevice`, `ByteSource`) so the
// protocol logic can be driven from memory in tests.

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod terminal;

pub use error::{Error, Result};
