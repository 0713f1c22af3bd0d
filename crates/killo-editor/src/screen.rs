//! Frame compositor — one full repaint, one write.
//!
//! Every refresh builds the complete screen in an [`OutputBuffer`] before
//! anything reaches the terminal. The byte order is fixed:
//!
//! 1. hide the cursor (so it doesn't flicker across the screen while drawing)
//! 2. home the cursor
//! 3. every row: filler glyph or the centered banner, then erase-to-EOL,
//!    then `\r\n` unless it is the last row
//! 4. place the cursor (1-indexed on the wire)
//! 5. show the cursor
//!
//! Rows are erased individually instead of clearing the whole screen first;
//! a full clear followed by a redraw is exactly the flash this avoids.

use std::io::{self, Write};

use killo_term::ansi;
use killo_term::output::OutputBuffer;

use crate::options::Options;
use crate::viewport::Viewport;

/// Paint the whole screen for `viewport` into `out`.
pub fn draw(viewport: &Viewport, options: &Options, out: &mut OutputBuffer) {
    // Writes into an OutputBuffer cannot fail.
    ansi::cursor_hide(out).ok();
    ansi::cursor_home(out).ok();

    draw_rows(viewport, options, out);

    let cursor = viewport.cursor();
    ansi::cursor_to(out, cursor.x, cursor.y).ok();
    ansi::cursor_show(out).ok();
}

/// Build a frame and write it to `w` in one `write_all`.
///
/// # Errors
///
/// Returns an error if writing to `w` fails.
pub fn render(viewport: &Viewport, options: &Options, w: &mut impl Write) -> io::Result<()> {
    let mut frame = OutputBuffer::new();
    draw(viewport, options, &mut frame);
    frame.flush_to(w)
}

fn draw_rows(viewport: &Viewport, options: &Options, out: &mut OutputBuffer) {
    let size = viewport.size();
    let banner_row = viewport.banner_row();

    for y in 0..size.rows {
        if y == banner_row {
            draw_banner(options, usize::from(size.cols), out);
        } else {
            out.append(&[options.filler]);
        }

        ansi::clear_line_right(out).ok();

        if y + 1 < size.rows {
            out.append(b"\r\n");
        }
    }
}

/// The banner, truncated to `cols` and centered by left padding. The first
/// padding cell carries the filler glyph so the left margin stays unbroken.
fn draw_banner(options: &Options, cols: usize, out: &mut OutputBuffer) {
    let text = options.banner.as_bytes();
    let text = &text[..text.len().min(cols)];

    let mut padding = (cols - text.len()) / 2;
    if padding > 0 {
        out.append(&[options.filler]);
        padding -= 1;
    }
    out.append_repeated(b' ', padding);
    out.append(text);
}

// ─── Tests ──────────────────────────────────────────────────────────────────
