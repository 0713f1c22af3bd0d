// SPDX-License-Identifier: MIT
//
// killo — a minimal terminal text editor.
//
// This is the binary that wires the two crates together:
//
//   killo-term   → raw mode, key decoding, output batching, event loop
//   killo-editor → viewport, options, frame compositor
//
// The Editor struct implements killo-term's App trait. Each keypress flows
// through:
//
//   stdin → read_key → on_key → viewport move
//   paint → screen::draw → OutputBuffer → one write to fd 1
//
// Ctrl-Q quits. Arrows move the cursor one cell, Page Up / Page Down a full
// screen height. Every other key is read and ignored.

mod logging;

use std::io::Write;
use std::process;

use killo_editor::options::Options;
use killo_editor::screen;
use killo_editor::viewport::{Direction, PageDirection, Viewport};
use killo_term::event_loop::{Action, App, EventLoop};
use killo_term::input::{ByteSource, Key, StdinBytes, ctrl_key};
use killo_term::output::{OutputBuffer, StdoutFd};
use killo_term::terminal::{StdinTty, Terminal, TtyDevice};

/// The quit chord.
const QUIT: u8 = ctrl_key(b'q');

// ─── Editor ─────────────────────────────────────────────────────────────────

/// Editor state: the viewport and the options it is drawn with.
struct Editor {
    viewport: Viewport,
    options: Options,
}

impl Editor {
    const fn new(viewport: Viewport, options: Options) -> Self {
        Self { viewport, options }
    }
}

impl App for Editor {
    fn on_key(&mut self, key: Key) -> Action {
        match key {
            Key::Byte(QUIT) => return Action::Quit,
            Key::ArrowUp => self.viewport.move_cursor(Direction::Up),
            Key::ArrowDown => self.viewport.move_cursor(Direction::Down),
            Key::ArrowLeft => self.viewport.move_cursor(Direction::Left),
            Key::ArrowRight => self.viewport.move_cursor(Direction::Right),
            Key::PageUp => self.viewport.page(PageDirection::Up),
            Key::PageDown => self.viewport.page(PageDirection::Down),
            Key::Byte(_) | Key::Escape => {}
        }
        Action::Continue
    }

    fn paint(&mut self, out: &mut OutputBuffer) {
        screen::draw(&self.viewport, &self.options, out);
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Enter raw mode, size the screen, and run the editor until it quits.
///
/// Returns with the screen cleared and the terminal restored either way.
fn run_session<D, S, W>(
    event_loop: &mut EventLoop<D, S, W>,
    options: Options,
) -> killo_term::Result<()>
where
    D: TtyDevice,
    S: ByteSource,
    W: Write,
{
    let size = event_loop.start()?;
    tracing::info!(cols = size.cols, rows = size.rows, "screen size");

    let mut editor = Editor::new(Viewport::new(size), options);
    event_loop.run(&mut editor)
}

fn main() {
    logging::init(&logging::LogConfig::from_env());

    let options = Options::default();
    let terminal = Terminal::with_read_timeout(StdinTty, options.read_timeout);
    let mut event_loop = EventLoop::with_terminal(terminal, StdinBytes, StdoutFd);

    let result = run_session(&mut event_loop, options);
    // Drop the session before exiting: process::exit skips destructors.
    drop(event_loop);

    if let Err(e) = result {
        eprintln!("killo: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
