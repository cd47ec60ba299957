//! # NGAC Decider
//!
//! Read-only access decisions over a policy graph.
//!
//! - [`PReviewDecider`]: which operations a user holds on a node
//! - [`PReviewAuditor`]: which paths grant them
//!
//! Operations granted through different policy classes are intersected:
//! a user holds an operation on a target only if every policy class the
//! target is contained in grants it. Wildcards are expanded per policy
//! class before the intersection, so a class granting `*` never restricts
//! the others. Prohibitions are applied after the intersection.

pub mod auditor;
pub mod decider;

pub use auditor::{Explain, PReviewAuditor, Path, PolicyClassExplain};
pub use decider::{Decision, PReviewDecider};
