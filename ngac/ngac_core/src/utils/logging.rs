//! Logging utilities.
//!
//! The engine logs through the `log` facade. This module defines the level
//! names accepted in configuration and on the command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log level, ordered by increasing severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose traversal and decision detail.
    Trace,

    /// Mutations and commits.
    Debug,

    /// Informational messages.
    #[default]
    Info,

    /// Obligation failures and partial commits.
    #[serde(alias = "warn")]
    Warning,

    /// Error messages.
    Error,
}

impl LogLevel {
    /// Get the name of this log level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// The equivalent filter for the `log` facade.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Trace => log::LevelFilter::Trace,
            Self::Debug => log::LevelFilter::Debug,
            Self::Info => log::LevelFilter::Info,
            Self::Warning => log::LevelFilter::Warn,
            Self::Error => log::LevelFilter::Error,
        }
    }

    /// Check if this log level is at least as severe as the given level.
    pub fn is_at_least(&self, level: LogLevel) -> bool {
        *self >= level
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Parse a level name. Case-insensitive; accepts `warn` and `err`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            other => Err(format!("unknown log level {}", other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
