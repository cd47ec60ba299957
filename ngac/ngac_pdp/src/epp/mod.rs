//! Event processing point.
//!
//! Successful mutations made through a [`UserPdp`](crate::UserPdp) raise
//! events. The [`EventProcessor`] matches each event against the rules of
//! every enabled obligation with a [`PatternMatcher`] and runs the responses
//! of the rules that match, with the permissions of the obligation's
//! defining user.

pub mod functions;
pub mod matcher;
pub mod processor;

pub use functions::{FunctionContext, FunctionEvaluator, FunctionExecutor, Value};
pub use matcher::PatternMatcher;
pub use processor::EventProcessor;

use std::sync::Arc;

use ngac_core::EppConfig;

/// Configuration of the event processor.
#[derive(Clone, Default)]
pub struct EppOptions {
    /// Functions registered on top of the built-ins.
    pub executors: Vec<Arc<dyn FunctionExecutor>>,
    pub config: EppConfig,
}

impl EppOptions {
    pub fn new(config: EppConfig) -> Self {
        Self {
            executors: Vec::new(),
            config,
        }
    }

    /// Add a function, replacing any built-in or earlier function with the
    /// same name.
    pub fn with_executor(mut self, executor: Arc<dyn FunctionExecutor>) -> Self {
        self.executors.push(executor);
        self
    }
}
