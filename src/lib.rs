// Library surface for the binary, headless runs and integration tests.
pub mod achievements;
pub mod angles;
pub mod app;
pub mod app_dirs;
pub mod breaks;
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod feedback;
pub mod history;
pub mod landmarks;
pub mod logging;
pub mod monitor;
pub mod replay;
pub mod report;
pub mod runtime;
pub mod session;
pub mod time_series;
pub mod ui;
pub mod util;

pub use error::{Error, Result};
