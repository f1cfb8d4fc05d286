use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing_subscriber::EnvFilter;

use crate::errors::DatagresError;

const LOG_FILE: &str = "datagres.log";

/// Send tracing output to `<dir>/datagres.log`. The terminal is in raw mode
/// while the app runs, so nothing is written to stderr.
///
/// `RUST_LOG` takes precedence over `default_level`.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init(dir: &Path, default_level: &str) -> Result<PathBuf, DatagresError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| DatagresError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| DatagresError::Logging(e.to_string()))?;

    Ok(path)
}
