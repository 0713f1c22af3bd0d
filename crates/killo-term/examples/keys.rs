// SPDX-License-Identifier: MIT
//
// killo-term key viewer — shows each decoded key as it arrives.
//
// Wires the whole pipeline without the editor on top: Terminal (raw mode)
// → StdinBytes → read_key → App → OutputBuffer → single write(). Handy for
// checking what a terminal sends for arrows and paging keys. Ctrl-Q quits.
//
// Usage:
//   cargo run -p killo-term --example keys

use std::collections::VecDeque;
use std::process;

use killo_term::ansi;
use killo_term::event_loop::{Action, App, EventLoop};
use killo_term::input::{Key, StdinBytes, ctrl_key};
use killo_term::output::{OutputBuffer, StdoutFd};
use killo_term::terminal::{Size, StdinTty};

/// Keys kept on screen.
const MAX_LOG_ENTRIES: usize = 100;

struct KeyLog {
    size: Size,
    log: VecDeque<String>,
    count: u64,
}

impl KeyLog {
    fn new(size: Size) -> Self {
        Self {
            size,
            log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            count: 0,
        }
    }

    fn describe(key: Key) -> String {
        match key {
            Key::Byte(b) if b.is_ascii_graphic() || b == b' ' => {
                format!("{:?} (0x{b:02x})", char::from(b))
            }
            Key::Byte(b) if b < 0x20 => {
                format!("Ctrl-{} (0x{b:02x})", char::from(b | 0x40))
            }
            Key::Byte(b) => format!("byte 0x{b:02x}"),
            other => format!("{other:?}"),
        }
    }
}

impl App for KeyLog {
    fn on_key(&mut self, key: Key) -> Action {
        if key == Key::Byte(ctrl_key(b'q')) {
            return Action::Quit;
        }
        self.count += 1;
        if self.log.len() >= MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(format!("#{:<5} {}", self.count, Self::describe(key)));
        Action::Continue
    }

    fn paint(&mut self, out: &mut OutputBuffer) {
        let cols = usize::from(self.size.cols);
        let rows = usize::from(self.size.rows);

        ansi::cursor_hide(out).ok();
        ansi::cursor_home(out).ok();

        let header = format!(" killo-term keys: {} seen, Ctrl-Q quits", self.count);
        let body = rows.saturating_sub(1);
        let skip = self.log.len().saturating_sub(body);
        let lines = std::iter::once(header).chain(self.log.iter().skip(skip).cloned());

        for (y, line) in lines.chain(std::iter::repeat(String::new())).take(rows).enumerate() {
            let end = line.len().min(cols);
            out.append(&line.as_bytes()[..end]);
            ansi::clear_line_right(out).ok();
            if y + 1 < rows {
                out.append(b"\r\n");
            }
        }

        ansi::cursor_show(out).ok();
    }
}

fn main() {
    let mut event_loop = EventLoop::new(StdinTty, StdinBytes, StdoutFd);

    let result = event_loop.start().and_then(|size| {
        let mut app = KeyLog::new(size);
        event_loop.run(&mut app)
    });
    drop(event_loop);

    if let Err(e) = result {
        eprintln!("keys: {e}");
        process::exit(1);
    }
}
