//! Store interfaces.
//!
//! Every layer of the engine speaks these traits:
//!
//! - `Graph`: policy elements, assignments and associations
//! - `Prohibitions`: negative authorizations
//! - `Obligations`: event-triggered administrative rules
//! - `PolicyStore`: the three stores plus transactions

pub mod graph;
pub mod obligations;
pub mod prohibitions;
pub mod store;

pub use graph::Graph;
pub use obligations::Obligations;
pub use prohibitions::Prohibitions;
pub use store::{PolicyStore, TxFn};
