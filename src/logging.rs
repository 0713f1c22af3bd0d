// SPDX-License-Identifier: MIT
//
// Log setup.
//
// stdout belongs to the frame and stderr shares the same terminal, so logs
// can only go to a file. `KILLO_LOG` names it; without it no subscriber is
// installed and every `tracing` call is a no-op. `RUST_LOG` filters as
// usual, defaulting to `debug`.

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Environment variable naming the log file.
pub const LOG_PATH_VAR: &str = "KILLO_LOG";

/// Where logs go, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Log file path. `None` disables logging.
    pub path: Option<PathBuf>,
}

impl LogConfig {
    /// Read the configuration from `KILLO_LOG`. Empty means unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_value(env::var_os(LOG_PATH_VAR).map(PathBuf::from))
    }

    fn from_value(path: Option<PathBuf>) -> Self {
        Self {
            path: path.filter(|p| !p.as_os_str().is_empty()),
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// Called before raw mode is entered, so a log file that can't be created
/// is reported on stderr and the editor runs without logging.
pub fn init(config: &LogConfig) {
    let Some(path) = &config.path else {
        return;
    };

    let file = match File::create(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("killo: cannot open log file {}: {err}", path.display());
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();

    if installed.is_ok() {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "killo starting");
    }
}
