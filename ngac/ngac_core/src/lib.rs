//! # NGAC Core
//!
//! `ngac_core` provides the building blocks shared by every layer of the
//! NGAC authorization engine: the error hierarchy, identifiers, the policy
//! data model, the store traits and graph traversal.
//!
//! ## Model
//!
//! Access decisions are derived from a directed acyclic graph of policy
//! elements. Users and objects are assigned to attributes, attributes to
//! other attributes and finally to policy classes. Associations grant a
//! user attribute a set of operations on a target attribute; prohibitions
//! take operations away; obligations react to policy events with further
//! administrative changes.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for every subsystem
//! - **id**: Identifiers for transactions and events
//! - **model**: Nodes, operations, prohibitions, obligations and events
//! - **traits**: Store interfaces
//! - **search**: Graph traversal
//! - **utils**: Configuration and logging helpers
//! - **macros**: Logging and validation macros

pub mod error;
pub mod id;
pub mod macros;
pub mod model;
pub mod search;
pub mod traits;
pub mod utils;

pub use utils::config;

// Re-export key types and traits for convenience
pub use error::{Error, Result};
pub use id::{EventId, TxId};
pub use model::{Node, NodeType, OperationSet, Properties, UserContext};
pub use traits::{Graph, Obligations, PolicyStore, Prohibitions, TxFn};
pub use utils::{EppConfig, LogLevel, NgacConfig, SuperPolicyConfig};
