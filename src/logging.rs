//! Tracing setup.
//!
//! The terminal belongs to the UI, so events only go to a file, and only
//! when `logging.file` is configured.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },
    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

/// Filter precedence: `MOLANCO_LOG`, then `RUST_LOG`, then `settings.level`.
pub fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_env("MOLANCO_LOG") {
        return Ok(filter);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level).map_err(|e| LoggingError::Filter {
        directive: settings.level.clone(),
        reason: e.to_string(),
    })
}

fn open_log_file(path: &PathBuf) -> Result<File, LoggingError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LoggingError::Open {
            path: path.clone(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.clone(),
            source,
        })
}

/// Install the global subscriber. Returns `Ok(false)` when logging is off.
pub fn init(settings: &LoggingSettings) -> Result<bool, LoggingError> {
    let Some(path) = settings.file.as_ref() else {
        return Ok(false);
    };

    let filter = build_filter(settings)?;
    let file = open_log_file(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_is_off_without_a_file() {
        let settings = LoggingSettings::default();
        assert!(!init(&settings).unwrap());
    }

    #[test]
    fn bad_level_is_reported() {
        let settings = LoggingSettings {
            file: None,
            level: "molanco=loudest".to_string(),
        };
        if std::env::var_os("MOLANCO_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(
                build_filter(&settings),
                Err(LoggingError::Filter { .. })
            ));
        }
    }

    #[test]
    fn log_file_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("molanco.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
