//! Environment-driven runtime configuration.
//!
//! # Invariants
//! - An unset or blank database path means "no remote handle".
//! - Log directories must be absolute.

use crate::logging::{default_log_level, LoggingConfig};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "LEARNBOARD_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "LEARNBOARD_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "LEARNBOARD_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Log directory is relative.
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Settings needed to wire a dashboard process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// SQLite document database; `None` runs the dashboard local-only.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// File log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl DashboardConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_dir = non_blank(LOG_DIR_ENV).map(PathBuf::from);
        if let Some(dir) = &log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }

        Ok(Self {
            db_path: non_blank(DB_PATH_ENV).map(PathBuf::from),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
        })
    }

    /// Logging settings, when a log directory is configured.
    pub fn logging(&self) -> Option<LoggingConfig> {
        self.log_dir.as_ref().map(|dir| LoggingConfig {
            level: self.log_level.clone(),
            log_dir: dir.clone(),
            duplicate_to_stderr: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DashboardConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_local_only() {
        let config = DashboardConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, None);
        assert!(config.logging().is_none());
    }

    #[test]
    fn blank_db_path_is_treated_as_unset() {
        let config = DashboardConfig::from_lookup(lookup_from(&[(DB_PATH_ENV, "  ")])).unwrap();
        assert_eq!(config.db_path, None);
    }

    #[test]
    fn reads_all_keys() {
        let dir = std::env::temp_dir();
        let dir_text = dir.to_str().unwrap().to_string();
        let config = DashboardConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, "/tmp/board.sqlite3"),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, dir_text.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/board.sqlite3")));
        let logging = config.logging().unwrap();
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.log_dir, dir);
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = DashboardConfig::from_lookup(lookup_from(&[(LOG_DIR_ENV, "logs")])).unwrap_err();
        assert_eq!(err, ConfigError::RelativeLogDir(PathBuf::from("logs")));
    }
}
