//! # NGAC PDP
//!
//! Permission-checked access to a policy and the processing of the events
//! it raises.
//!
//! - [`Pdp`]: entry point, shared by every user
//! - [`UserPdp`]: the policy as one user sees it, a [`PolicyStore`] whose
//!   every call passes the [`Guard`]
//! - [`epp`]: obligation matching, responses and the function language
//!
//! ```text
//! UserPdp ──> services (guard) ──> Pap (admin rules) ──> store
//!    │                                                     │
//!    └──────────── events after commit ──> EventProcessor ─┘
//! ```
//!
//! [`PolicyStore`]: ngac_core::traits::PolicyStore

pub mod epp;
mod events;
pub mod guard;
pub mod pdp;
pub mod services;

pub use epp::{EppOptions, EventProcessor, FunctionExecutor, PatternMatcher};
pub use guard::Guard;
pub use pdp::{Pdp, UserPdp};
pub use services::{GraphService, ObligationsService, ProhibitionsService, ServiceView};
