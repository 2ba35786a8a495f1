//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services as
//! `Arc<CoreConfig>`. Nothing in the core reads process environment variables while
//! handling a request.

use crate::constants::DEFAULT_DATA_DIR;
use crate::error::{ArchivalError, ArchivalResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    pub fn new(data_dir: PathBuf) -> ArchivalResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ArchivalError::InvalidInput(
                "data directory cannot be empty".into(),
            ));
        }
        Ok(Self { data_dir })
    }

    /// Root directory of the file-backed record store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Resolve the data directory from an optional raw value (typically `MPR_DATA_DIR`).
///
/// `None` or a blank value falls back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_data_dir() {
        let err = CoreConfig::new(PathBuf::new()).expect_err("empty path");
        assert!(matches!(err, ArchivalError::InvalidInput(_)));
    }

    #[test]
    fn env_value_falls_back_to_default() {
        assert_eq!(data_dir_from_env_value(None), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            data_dir_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            data_dir_from_env_value(Some(" /srv/records ".into())),
            PathBuf::from("/srv/records")
        );
    }
}
