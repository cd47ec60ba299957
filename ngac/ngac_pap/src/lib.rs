//! # NGAC PAP
//!
//! The policy administration point: structural rules every administrative
//! change must satisfy, and the super policy that gives one user control
//! over the whole graph.
//!
//! - [`GraphAdmin`], [`ProhibitionsAdmin`], [`ObligationsAdmin`]: validating
//!   wrappers around any store
//! - [`SuperPolicy`]: idempotent bootstrap of the super policy
//! - [`Pap`]: a policy store with both in place

pub mod graph;
pub mod obligations;
pub mod pap;
pub mod prohibitions;
pub mod super_policy;

pub use graph::{check_node, GraphAdmin};
pub use obligations::ObligationsAdmin;
pub use pap::{AdminView, Pap};
pub use prohibitions::ProhibitionsAdmin;
pub use super_policy::SuperPolicy;
