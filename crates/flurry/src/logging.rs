//! File logging.
//!
//! The terminal belongs to the UI, so log output goes to a file under the
//! platform data directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use directories::ProjectDirs;
use env_logger::{Env, Target};

/// Environment variable holding the log filter (`env_logger` syntax).
pub const LOG_ENV: &str = "FLURRY_LOG";

/// Start logging to the log file. Returns its path on success.
///
/// Any failure leaves logging disabled; it never stops the app.
pub fn init() -> Option<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    env_logger::Builder::from_env(Env::new().filter_or(LOG_ENV, "info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .ok()?;

    Some(path)
}

fn log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flurry").map(|dirs| dirs.data_local_dir().join("flurry.log"))
}
