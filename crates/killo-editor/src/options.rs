//! Editor options.
//!
//! The handful of knobs the editor has, with their defaults. Nothing reads
//! these from disk; key bindings in particular are fixed.
//!
//! | Option         | Type   | Default                            |
//! |----------------|--------|------------------------------------|
//! | `read_timeout` | `u8`   | 1 (tenths of a second)             |
//! | `banner`       | string | `Kilo editor -- version <version>` |
//! | `filler`       | byte   | `~`                                |

use killo_term::terminal::DEFAULT_READ_TIMEOUT;

/// The crate version shown in the banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Editor options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Raw-mode inter-byte read timeout, in tenths of a second.
    pub read_timeout: u8,

    /// Welcome text drawn centered on the banner row.
    pub banner: String,

    /// Glyph drawn at the start of every row past the end of the content.
    pub filler: u8,
}

impl Options {
    /// Default banner text for this version.
    #[must_use]
    pub fn default_banner() -> String {
        format!("Kilo editor -- version {VERSION}")
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            banner: Self::default_banner(),
            filler: b'~',
        }
    }
}
