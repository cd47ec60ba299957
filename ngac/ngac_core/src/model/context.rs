//! Identity of the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The acting user and, optionally, the process it acts through.
///
/// The identity is trusted as supplied; authenticating it is the embedding
/// application's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserContext {
    /// Name of the user node.
    pub user: String,

    /// Process identifier, used to match process prohibitions.
    #[serde(default)]
    pub process: Option<String>,
}

impl UserContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            process: None,
        }
    }

    /// Attach a process identifier.
    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.process = Some(process.into());
        self
    }

    /// The process identifier, or the empty string when there is none.
    pub fn process_str(&self) -> &str {
        self.process.as_deref().unwrap_or("")
    }
}

impl fmt::Display for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.process {
            Some(process) => write!(f, "{}@{}", self.user, process),
            None => f.write_str(&self.user),
        }
    }
}
