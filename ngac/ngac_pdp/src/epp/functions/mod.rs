//! The function-call language of obligation responses.
//!
//! A response names functions and passes them literal or nested
//! arguments. Each name is looked up in a [`FunctionEvaluator`], which
//! holds one [`FunctionExecutor`] per function. The built-in executors are
//! registered on construction; embedding applications can add their own or
//! replace built-ins.

mod builtins;

pub use builtins::builtins;

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use ngac_core::error::{EppError, Result};
use ngac_core::model::{Arg, Condition, EventContext, Function, Node, Properties};
use ngac_core::traits::PolicyStore;

/// The result of evaluating a function or argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    Node(Node),
    List(Vec<Value>),
    Map(Properties),
}

impl Value {
    /// Whether the value counts as true in a condition.
    ///
    /// `Null`, `false` and empty strings, lists and maps are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::String(s) => !s.is_empty(),
            Self::Node(_) => true,
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
        }
    }

    /// Short name of the value kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Node(_) => "node",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::String(s) => f.write_str(s),
            Self::Node(node) => f.write_str(&node.name),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Self::Map(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort();
                for (i, (key, value)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// What a function sees while it runs.
pub struct FunctionContext<'a> {
    /// The stores, as seen by the obligation's defining user.
    pub store: &'a dyn PolicyStore,
    /// The event being responded to.
    pub event: &'a EventContext,
    /// Evaluator for nested arguments.
    pub evaluator: &'a FunctionEvaluator,
}

impl<'a> FunctionContext<'a> {
    pub fn new(
        store: &'a dyn PolicyStore,
        event: &'a EventContext,
        evaluator: &'a FunctionEvaluator,
    ) -> Self {
        Self {
            store,
            event,
            evaluator,
        }
    }

    /// Evaluate one argument.
    pub fn eval(&self, arg: &Arg) -> Result<Value> {
        self.evaluator.eval_arg(self, arg)
    }

    /// Evaluate an argument to a node. A string is looked up by name.
    pub fn eval_node(&self, function: &str, arg: &Arg) -> Result<Node> {
        match self.eval(arg)? {
            Value::Node(node) => Ok(node),
            Value::String(name) => self.store.graph().node(&name),
            other => Err(EppError::InvalidArgument {
                function: function.to_string(),
                reason: format!("expected a node, got a {}", other.kind()),
            }
            .into()),
        }
    }

    /// Evaluate an argument to a string. A node evaluates to its name.
    pub fn eval_string(&self, function: &str, arg: &Arg) -> Result<String> {
        match self.eval(arg)? {
            Value::String(s) => Ok(s),
            Value::Node(node) => Ok(node.name),
            other => Err(EppError::InvalidArgument {
                function: function.to_string(),
                reason: format!("expected a string, got a {}", other.kind()),
            }
            .into()),
        }
    }
}

/// A function callable from obligation responses.
pub trait FunctionExecutor: Send + Sync {
    /// Name the function is called by.
    fn name(&self) -> &str;

    /// Number of arguments the function takes. For a variadic function,
    /// the minimum.
    fn num_params(&self) -> usize;

    fn variadic(&self) -> bool {
        false
    }

    /// Run the function. `args` are unevaluated; the executor evaluates
    /// what it needs through `ctx`.
    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value>;
}

/// Registry of function executors, keyed by name.
pub struct FunctionEvaluator {
    executors: DashMap<String, Arc<dyn FunctionExecutor>>,
}

impl FunctionEvaluator {
    /// An evaluator with the built-in functions registered.
    pub fn new() -> Self {
        let evaluator = Self::empty();
        for executor in builtins() {
            evaluator.register(executor);
        }
        evaluator
    }

    /// An evaluator with no functions.
    pub fn empty() -> Self {
        Self {
            executors: DashMap::new(),
        }
    }

    /// Register an executor, replacing any with the same name.
    pub fn register(&self, executor: Arc<dyn FunctionExecutor>) {
        self.executors.insert(executor.name().to_string(), executor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    /// Names of the registered functions, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Evaluate a function call.
    ///
    /// # Errors
    ///
    /// `EppError::UnknownFunction` for an unregistered name and
    /// `EppError::WrongArgCount` for a call with the wrong number of
    /// arguments, before the executor runs.
    pub fn eval(&self, ctx: &FunctionContext<'_>, function: &Function) -> Result<Value> {
        let executor = self
            .executors
            .get(&function.name)
            .map(|e| e.value().clone())
            .ok_or_else(|| EppError::UnknownFunction(function.name.clone()))?;

        let expected = executor.num_params();
        let actual = function.args.len();
        let arity_ok = if executor.variadic() {
            actual >= expected
        } else {
            actual == expected
        };
        if !arity_ok {
            return Err(EppError::WrongArgCount {
                name: function.name.clone(),
                expected,
                actual,
            }
            .into());
        }

        executor.exec(ctx, &function.args)
    }

    /// Evaluate an argument: literals evaluate to strings, calls to their
    /// result.
    pub fn eval_arg(&self, ctx: &FunctionContext<'_>, arg: &Arg) -> Result<Value> {
        match arg {
            Arg::Value(s) => Ok(Value::String(s.clone())),
            Arg::Function(function) => self.eval(ctx, function),
        }
    }

    /// Whether every `all` call is truthy and every `none` call is falsy.
    pub fn eval_condition(&self, ctx: &FunctionContext<'_>, condition: &Condition) -> Result<bool> {
        for function in &condition.all {
            if !self.eval(ctx, function)?.is_truthy() {
                return Ok(false);
            }
        }
        for function in &condition.none {
            if self.eval(ctx, function)?.is_truthy() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Default for FunctionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
