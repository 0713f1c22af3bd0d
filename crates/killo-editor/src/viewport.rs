//! Viewport — screen dimensions and the cursor inside them.
//!
//! The viewport is fixed for the whole session: its size is resolved once at
//! startup and never changes. The cursor lives in screen coordinates
//! (0-indexed, `x` is the column, `y` the row) and can never leave the
//! screen. Moves past an edge are clamped, not wrapped, and never an error.
//!
//! Page Up / Page Down are defined as exactly `rows` single-row steps, so
//! they stop at the edge the same way a run of arrow presses would.

use killo_term::terminal::Size;

/// A single-step cursor direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Direction of a page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Up,
    Down,
}

impl PageDirection {
    /// The single-step direction a page move repeats.
    #[must_use]
    pub const fn step(self) -> Direction {
        match self {
            Self::Up => Direction::Up,
            Self::Down => Direction::Down,
        }
    }
}

/// Cursor position in screen cells, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
}

impl Cursor {
    /// The top-left corner.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a cursor at `(x, y)`.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Move `cursor` one cell in `direction`, clamped to `bounds`.
///
/// Saturates at 0 on the low side and at `bound - 1` on the high side.
#[must_use]
pub const fn step(cursor: Cursor, direction: Direction, bounds: Size) -> Cursor {
    let Cursor { mut x, mut y } = cursor;
    match direction {
        Direction::Left => x = x.saturating_sub(1),
        Direction::Right => {
            if x < bounds.cols.saturating_sub(1) {
                x += 1;
            }
        }
        Direction::Up => y = y.saturating_sub(1),
        Direction::Down => {
            if y < bounds.rows.saturating_sub(1) {
                y += 1;
            }
        }
    }
    Cursor { x, y }
}

/// The visible screen area and the cursor within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    size: Size,
    cursor: Cursor,
}

impl Viewport {
    /// A viewport of `size` with the cursor at the origin.
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self {
            size,
            cursor: Cursor::ORIGIN,
        }
    }

    /// Screen dimensions.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Current cursor position.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Row that carries the welcome banner: one third of the way down.
    #[inline]
    #[must_use]
    pub const fn banner_row(&self) -> u16 {
        self.size.rows / 3
    }

    /// Move the cursor one cell, clamped to the screen.
    pub fn move_cursor(&mut self, direction: Direction) {
        self.cursor = step(self.cursor, direction, self.size);
    }

    /// Move the cursor a full screen height up or down.
    ///
    /// Exactly `rows` single steps; the clamp applies to each one.
    pub fn page(&mut self, direction: PageDirection) {
        for _ in 0..self.size.rows {
            self.move_cursor(direction.step());
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
