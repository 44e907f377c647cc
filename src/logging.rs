//! Tracing setup
//!
//! The TUI owns the terminal, so log output goes to a file. Nothing is
//! installed unless `STEPVIZ_LOG` is set, e.g. `STEPVIZ_LOG=stepviz=debug`.

use std::fs::OpenOptions;
use std::sync::{Mutex, Once};

/// Filter directives, `EnvFilter` syntax
pub const LOG_ENV: &str = "STEPVIZ_LOG";

/// Destination file for log records
pub const LOG_FILE_ENV: &str = "STEPVIZ_LOG_FILE";

pub const DEFAULT_LOG_FILE: &str = "stepviz.log";

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times; only the first call has an effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let Ok(directives) = std::env::var(LOG_ENV) else {
            return;
        };
        let path = std::env::var(LOG_FILE_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("Warning: cannot open log file '{}': {}", path, err);
                return;
            }
        };

        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|err| {
            eprintln!("Warning: invalid {} value '{}': {}", LOG_ENV, directives, err);
            EnvFilter::new("info")
        });
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .try_init();
    });
}
