//! Error types for the NGAC engine.
//!
//! The errors are organized by subsystem, with each subsystem having its own
//! error type. The root error type, `Error`, wraps any of the
//! subsystem-specific errors so callers can handle failures uniformly at the
//! top level while still matching on the precise cause.
//!
//! Every variant except [`Error::Invariant`] and a partially applied commit
//! describes a caller or policy mistake: nothing was mutated and the caller
//! may retry with corrected input.

use crate::id::TxId;
use crate::model::NodeType;
use thiserror::Error;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the NGAC engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Graph structure errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Prohibition store errors
    #[error("Prohibition error: {0}")]
    Prohibition(#[from] ProhibitionError),

    /// Obligation store errors
    #[error("Obligation error: {0}")]
    Obligation(#[from] ObligationError),

    /// Permission gating errors
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Obligation rule evaluation errors
    #[error("EPP error: {0}")]
    Epp(#[from] EppError),

    /// Transaction errors
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A state that correct operation never reaches
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Whether the error left every store untouched.
    ///
    /// Returns `false` for invariant violations and for commits that failed
    /// after some buffered commands were already applied.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Invariant(_) => false,
            Self::Transaction(TransactionError::Commit { applied, .. }) => *applied == 0,
            _ => true,
        }
    }

    /// Whether this is a permission denial from the guard.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised by graph stores and the administrative layer.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Node with the given name does not exist
    #[error("node {0} does not exist")]
    NodeNotFound(String),

    /// A node with the given name already exists
    #[error("a node with the name {0} already exists")]
    NodeExists(String),

    /// Node names cannot be empty
    #[error("node name cannot be empty")]
    EmptyName,

    /// A non policy class node was created without a parent
    #[error("node {0} must be assigned to at least one parent")]
    MissingParent(String),

    /// The child/parent type pair is not a valid assignment
    #[error("cannot assign {child} ({child_type}) to {parent} ({parent_type})")]
    InvalidAssignment {
        /// Child node name
        child: String,
        /// Child node type
        child_type: NodeType,
        /// Parent node name
        parent: String,
        /// Parent node type
        parent_type: NodeType,
    },

    /// The assignment edge already exists
    #[error("{child} is already assigned to {parent}")]
    AssignmentExists {
        /// Child node name
        child: String,
        /// Parent node name
        parent: String,
    },

    /// The source/target type pair is not a valid association
    #[error("cannot associate {source_node} ({source_type}) with {target} ({target_type})")]
    InvalidAssociation {
        /// Source node name
        source_node: String,
        /// Source node type
        source_type: NodeType,
        /// Target node name
        target: String,
        /// Target node type
        target_type: NodeType,
    },

    /// Node still has children and cannot be deleted
    #[error("cannot delete {0}, nodes are still assigned to it")]
    HasChildren(String),
}

/// Errors raised by prohibition stores.
#[derive(Debug, Error)]
pub enum ProhibitionError {
    /// Prohibition with the given name does not exist
    #[error("prohibition {0} does not exist")]
    NotFound(String),

    /// A prohibition with the given name already exists
    #[error("a prohibition with the name {0} already exists")]
    Exists(String),

    /// The prohibition definition is malformed
    #[error("invalid prohibition: {0}")]
    Invalid(String),
}

/// Errors raised by obligation stores.
#[derive(Debug, Error)]
pub enum ObligationError {
    /// Obligation with the given label does not exist
    #[error("obligation {0} does not exist")]
    NotFound(String),

    /// An obligation with the given label already exists
    #[error("an obligation with the label {0} already exists")]
    Exists(String),

    /// The obligation definition is malformed
    #[error("invalid obligation: {0}")]
    Invalid(String),
}

/// Errors raised when the acting user lacks a required permission.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The user does not hold every listed operation on the target
    #[error("{user} does not have [{}] on {target}", operations.join(", "))]
    Denied {
        /// Acting user
        user: String,
        /// Node the permission was checked on
        target: String,
        /// Operations that were required
        operations: Vec<String>,
    },
}

/// Errors raised while matching events and executing obligation responses.
#[derive(Debug, Error)]
pub enum EppError {
    /// No executor is registered under the function name
    #[error("unknown function {0}")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments
    #[error("function {name} expects {expected} arguments, got {actual}")]
    WrongArgCount {
        /// Function name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Arguments supplied
        actual: usize,
    },

    /// An argument evaluated to a value of the wrong kind
    #[error("invalid argument to {function}: {reason}")]
    InvalidArgument {
        /// Function name
        function: String,
        /// What was wrong with it
        reason: String,
    },

    /// A context-sensitive function was evaluated for the wrong event kind
    #[error("function {function} cannot be evaluated for a {event} event")]
    UnexpectedEvent {
        /// Function name
        function: String,
        /// Name of the event that fired
        event: String,
    },

    /// A node reference in a rule did not resolve to a node
    #[error("could not resolve node: {0}")]
    NodeResolution(String),

    /// Obligation responses triggered too many nested events
    #[error("event processing exceeded the maximum depth of {0}")]
    DepthExceeded(usize),
}

/// Errors raised by the transaction layer.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Replaying the buffered commands failed part way through.
    ///
    /// The first `applied` commands were written to the backing stores and
    /// are not rolled back.
    #[error("commit of transaction {tx} failed after {applied} of {total} commands: {source}")]
    Commit {
        /// Transaction identifier
        tx: TxId,
        /// Commands applied before the failure
        applied: usize,
        /// Commands buffered in the transaction
        total: usize,
        /// The replay failure
        source: Box<Error>,
    },
}
