//! Engine configuration.
//!
//! Configuration is plain data threaded through constructors. Nothing here
//! is process-global.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::OperationSet;
use crate::utils::LogLevel;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NgacConfig {
    /// Names of the bootstrap policy elements.
    pub super_policy: SuperPolicyConfig,

    /// Operations `*r` expands to.
    pub resource_operations: Vec<String>,

    /// Event processing limits.
    pub epp: EppConfig,

    /// Level used by front-ends that install a logger.
    pub log_level: LogLevel,
}

impl NgacConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The resource operations as an operation set.
    pub fn resource_ops(&self) -> OperationSet {
        self.resource_operations.iter().cloned().collect()
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.super_policy.validate()?;
        if self.epp.max_event_depth == 0 {
            return Err(Error::Config("epp.max_event_depth must be at least 1".into()));
        }
        if let Some(op) = self
            .resource_operations
            .iter()
            .find(|op| op.starts_with('*') || crate::model::operations::is_admin_op(op))
        {
            return Err(Error::Config(format!(
                "{} cannot be declared as a resource operation",
                op
            )));
        }
        Ok(())
    }
}

/// Names of the elements of the super policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperPolicyConfig {
    /// The super user.
    pub super_user: String,

    /// The user attribute the super user is assigned to.
    pub super_ua1: String,

    /// The user attribute granted `*` on `super_ua1`.
    pub super_ua2: String,

    /// The object attribute holding every policy class rep.
    pub super_oa: String,

    /// The super policy class.
    pub super_pc: String,
}

impl Default for SuperPolicyConfig {
    fn default() -> Self {
        Self {
            super_user: "super".into(),
            super_ua1: "super_ua1".into(),
            super_ua2: "super_ua2".into(),
            super_oa: "super_oa".into(),
            super_pc: "super_pc".into(),
        }
    }
}

impl SuperPolicyConfig {
    /// The rep node of the super policy class.
    pub fn super_pc_rep(&self) -> String {
        rep_name(&self.super_pc)
    }

    pub fn validate(&self) -> Result<()> {
        let names = [
            &self.super_user,
            &self.super_ua1,
            &self.super_ua2,
            &self.super_oa,
            &self.super_pc,
        ];
        if names.iter().any(|n| n.is_empty()) {
            return Err(Error::Config("super policy names cannot be empty".into()));
        }
        let unique: std::collections::HashSet<_> = names.iter().collect();
        if unique.len() != names.len() {
            return Err(Error::Config("super policy names must be distinct".into()));
        }
        Ok(())
    }
}

/// Limits on obligation processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EppConfig {
    /// Deepest chain of events obligation responses may raise.
    pub max_event_depth: usize,
}

impl Default for EppConfig {
    fn default() -> Self {
        Self { max_event_depth: 16 }
    }
}

/// Name of the rep object attribute of policy class `pc`.
pub fn rep_name(pc: &str) -> String {
    format!("{}_rep", pc)
}

/// Name of the default user attribute of policy class `pc`.
pub fn default_ua_name(pc: &str) -> String {
    format!("{}_default_UA", pc)
}

/// Name of the default object attribute of policy class `pc`.
pub fn default_oa_name(pc: &str) -> String {
    format!("{}_default_OA", pc)
}
