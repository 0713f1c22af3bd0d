//! # killo-editor — Editor core for killo
//!
//! - **[`viewport`]** — screen size, cursor position, clamped moves and pages
//! - **[`screen`]** — the frame compositor: one full repaint, one write
//! - **[`options`]** — editor options and their defaults
//!
//! There is no text buffer yet; the screen shows filler rows and a welcome
//! banner, and the cursor roams the empty viewport.

pub mod options;
pub mod screen;
pub mod viewport;
