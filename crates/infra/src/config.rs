//! Configuration loading and representation.
//!
//! | variable | default |
//! |---|---|
//! | `TALLY_DATA_DIR` | `./tally-data` |
//! | `TALLY_LOG_FORMAT` | `json` (`json` or `pretty`) |
//! | `TALLY_VERIFY_ON_WRITE` | `true` |

use std::path::PathBuf;

use thiserror::Error;

use tally_observability::LogFormat;

use crate::persistent::LedgerOptions;

pub const DATA_DIR_VAR: &str = "TALLY_DATA_DIR";
pub const LOG_FORMAT_VAR: &str = "TALLY_LOG_FORMAT";
pub const VERIFY_ON_WRITE_VAR: &str = "TALLY_VERIFY_ON_WRITE";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyConfig {
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
    pub verify_on_write: bool,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tally-data"),
            log_format: LogFormat::Json,
            verify_on_write: true,
        }
    }
}

impl TallyConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup` (unset and blank values use the
    /// defaults).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let data_dir = get(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let log_format = match get(LOG_FORMAT_VAR) {
            Some(raw) => raw.parse().map_err(|e: tally_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    var: LOG_FORMAT_VAR,
                    message: e.to_string(),
                }
            })?,
            None => defaults.log_format,
        };

        let verify_on_write = match get(VERIFY_ON_WRITE_VAR) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: VERIFY_ON_WRITE_VAR,
                message: format!("expected true/false, got '{raw}'"),
            })?,
            None => defaults.verify_on_write,
        };

        Ok(Self {
            data_dir,
            log_format,
            verify_on_write,
        })
    }

    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            verify_on_write: self.verify_on_write,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
