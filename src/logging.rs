use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "SPINEGUARD_LOG";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Log to a file; the terminal belongs to the TUI.
/// Logging stays off when the file can't be opened.
pub fn init_file(path: &Path) {
    let _ = TRACING_INIT.get_or_init(|| {
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter("info"))
            .try_init();
    });
}

/// Log to stderr for the headless commands
pub fn init_stderr() {
    let _ = TRACING_INIT.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(env_filter("warn"))
            .try_init();
    });
}
