//! Utility types: configuration and logging helpers.

pub mod config;
pub mod logging;

pub use config::{EppConfig, NgacConfig, SuperPolicyConfig};
pub use logging::LogLevel;
