//! Permission checks for administrative operations.

use std::sync::Arc;

use ngac_core::error::{AuthorizationError, Result};
use ngac_core::model::{OperationSet, Prohibition, ProhibitionSubject, UserContext};
use ngac_core::traits::{Graph, Prohibitions};
use ngac_core::SuperPolicyConfig;
use ngac_decider::PReviewDecider;
use ngac_pap::check_node;

/// Checks that a user holds the admin operations an action requires.
///
/// A guard decides over the view it was built from, so inside a
/// transaction it sees the buffered changes.
pub struct Guard {
    user: UserContext,
    graph: Arc<dyn Graph>,
    decider: PReviewDecider,
    super_pc_rep: String,
}

impl Guard {
    pub fn new(
        user: UserContext,
        graph: Arc<dyn Graph>,
        prohibitions: Arc<dyn Prohibitions>,
        resource_ops: OperationSet,
        super_policy: &SuperPolicyConfig,
    ) -> Self {
        Self {
            user,
            decider: PReviewDecider::new(graph.clone(), prohibitions, resource_ops),
            graph,
            super_pc_rep: super_policy.super_pc_rep(),
        }
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }

    /// The rep of the super policy class, where global operations are
    /// checked.
    pub fn super_pc_rep(&self) -> &str {
        &self.super_pc_rep
    }

    /// Fail with `AuthorizationError::Denied` unless the user holds every
    /// operation of `ops` on `target`. A policy class is checked on its rep.
    pub fn check(&self, target: &str, ops: &[&str]) -> Result<()> {
        let node = check_node(self.graph.as_ref(), target)?;
        let required: OperationSet = ops.iter().copied().collect();
        if self
            .decider
            .check(&self.user.user, self.user.process.as_deref(), &node, &required)?
        {
            return Ok(());
        }

        log::debug!("{} denied {:?} on {}", self.user, ops, node);
        Err(AuthorizationError::Denied {
            user: self.user.user.clone(),
            target: node,
            operations: ops.iter().map(|op| op.to_string()).collect(),
        }
        .into())
    }

    /// Whether the user holds any operation on `target`.
    pub fn can_see(&self, target: &str) -> Result<bool> {
        let node = check_node(self.graph.as_ref(), target)?;
        self.decider
            .check(&self.user.user, self.user.process.as_deref(), &node, &OperationSet::new())
    }

    /// The names of `names` the user can see.
    pub fn visible(&self, names: impl IntoIterator<Item = String>) -> Result<Vec<String>> {
        let mut kept = Vec::new();
        for name in names {
            if self.can_see(&name)? {
                kept.push(name);
            }
        }
        Ok(kept)
    }

    /// Check `op` on every node a prohibition refers to: the subject (the
    /// super policy class rep for a process) and every container.
    pub fn check_prohibition(&self, prohibition: &Prohibition, op: &str) -> Result<()> {
        match &prohibition.subject {
            ProhibitionSubject::Node(name) => self.check(name, &[op])?,
            ProhibitionSubject::Process(_) => self.check(&self.super_pc_rep, &[op])?,
        }
        for container in prohibition.containers.keys() {
            self.check(container, &[op])?;
        }
        Ok(())
    }
}
