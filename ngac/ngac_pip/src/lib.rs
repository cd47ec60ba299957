//! # NGAC PIP
//!
//! In-memory implementations of the policy stores and the transaction layer
//! that buffers mutations over them.
//!
//! - [`MemGraph`]: policy elements, assignments and associations
//! - [`MemProhibitions`]: prohibitions indexed by name and subject
//! - [`MemObligations`]: obligations in insertion order
//! - [`MemPolicyStore`]: the three stores with transactions
//! - [`tx`]: overlays and the ordered command log

pub mod graph;
pub mod obligations;
pub mod prohibitions;
pub mod store;
pub mod tx;

pub use graph::MemGraph;
pub use obligations::MemObligations;
pub use prohibitions::MemProhibitions;
pub use store::MemPolicyStore;
pub use tx::Transaction;
