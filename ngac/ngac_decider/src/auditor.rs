//! Explanations of access decisions.
//!
//! The auditor reports, for each policy class the target is contained in,
//! which chains of assignments and associations connect the user to the
//! target. A path reads from the user up to the attribute holding the
//! association, then from the association target down to the target:
//!
//! ```text
//! u1-ua1-oa1-o1 ops=[read, write]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::model::OperationSet;
use ngac_core::traits::{Graph, Prohibitions};

use crate::decider::PReviewDecider;

/// One chain from a user to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Node names from the user to the target.
    pub nodes: Vec<String>,
    /// Resolved operations of the association on the path.
    pub operations: OperationSet,
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ops={}", self.nodes.join("-"), self.operations)
    }
}

/// The paths through one policy class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyClassExplain {
    /// Union of the operations of every path.
    pub operations: OperationSet,
    /// Every path through the policy class, sorted.
    pub paths: Vec<Path>,
}

/// Why a user holds the operations it holds on a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explain {
    /// Operations the user holds on the target.
    pub permissions: OperationSet,
    /// Paths and operations per policy class of the target.
    pub policy_classes: BTreeMap<String, PolicyClassExplain>,
    /// Prohibitions that removed operations.
    pub prohibitions: Vec<String>,
}

impl fmt::Display for Explain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "permissions: {}", self.permissions)?;
        for (pc, explain) in &self.policy_classes {
            writeln!(f, "{}: {}", pc, explain.operations)?;
            for path in &explain.paths {
                writeln!(f, "  {}", path)?;
            }
        }
        if !self.prohibitions.is_empty() {
            writeln!(f, "prohibitions: {}", self.prohibitions.join(", "))?;
        }
        Ok(())
    }
}

/// A user-side chain ending at an attribute with an association.
struct UserPath {
    nodes: Vec<String>,
    assoc_target: String,
    operations: OperationSet,
}

/// Explains access decisions.
pub struct PReviewAuditor {
    decider: PReviewDecider,
}

impl PReviewAuditor {
    pub fn new(
        graph: Arc<dyn Graph>,
        prohibitions: Arc<dyn Prohibitions>,
        resource_ops: OperationSet,
    ) -> Self {
        Self {
            decider: PReviewDecider::new(graph, prohibitions, resource_ops),
        }
    }

    /// Explain the operations `user` holds on `target`.
    pub fn explain(&self, user: &str, target: &str) -> Result<Explain> {
        let decision = self.decider.decide(user, None, target)?;
        let user_paths = self.user_paths(user)?;
        let target_paths = self.target_paths(target)?;
        let resource_ops = self.decider.resource_ops();

        let mut policy_classes: BTreeMap<String, PolicyClassExplain> = BTreeMap::new();
        for target_path in &target_paths {
            let pc = match target_path.last() {
                Some(pc) => pc.clone(),
                None => continue,
            };
            let explain = policy_classes.entry(pc).or_default();

            for user_path in &user_paths {
                let Some(pos) = target_path.iter().position(|n| *n == user_path.assoc_target)
                else {
                    continue;
                };

                let mut nodes = user_path.nodes.clone();
                nodes.extend(target_path[..=pos].iter().rev().cloned());
                let path = Path {
                    nodes,
                    operations: user_path.operations.resolve(resource_ops),
                };

                explain.operations.extend_from(&path.operations);
                if !explain.paths.contains(&path) {
                    explain.paths.push(path);
                }
            }
        }

        for explain in policy_classes.values_mut() {
            explain
                .paths
                .sort_by(|a, b| a.nodes.cmp(&b.nodes));
        }

        Ok(Explain {
            permissions: decision.allowed,
            policy_classes,
            prohibitions: decision.prohibited_by,
        })
    }

    /// Every chain from `user` up to an attribute with an association, one
    /// per association.
    fn user_paths(&self, user: &str) -> Result<Vec<UserPath>> {
        let graph = self.decider.graph();
        let mut found = Vec::new();
        let mut stack = vec![vec![user.to_string()]];

        while let Some(path) = stack.pop() {
            let Some(last) = path.last() else {
                continue;
            };
            for (assoc_target, ops) in graph.source_associations(last)? {
                found.push(UserPath {
                    nodes: path.clone(),
                    assoc_target,
                    operations: ops,
                });
            }
            for parent in graph.parents(last)? {
                let mut next = path.clone();
                next.push(parent);
                stack.push(next);
            }
        }

        Ok(found)
    }

    /// Every chain from `target` up to a policy class, target first.
    fn target_paths(&self, target: &str) -> Result<Vec<Vec<String>>> {
        let graph = self.decider.graph();
        let pcs: HashSet<String> = graph.policy_classes()?;
        let mut found = Vec::new();
        let mut stack = vec![vec![target.to_string()]];

        while let Some(path) = stack.pop() {
            let Some(last) = path.last() else {
                continue;
            };
            if pcs.contains(last) {
                found.push(path);
                continue;
            }
            for parent in graph.parents(last)? {
                let mut next = path.clone();
                next.push(parent);
                stack.push(next);
            }
        }

        Ok(found)
    }
}
