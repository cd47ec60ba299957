//! Permission decisions.
//!
//! A decision walks the graph twice. The user side walks up from the
//! subject collecting every association reachable through its attributes
//! (the "border targets") and every prohibition that applies to the
//! subject, its attributes or the process. The target side walks up from
//! the target in post order, carrying a map of policy class to granted
//! operations from each node to the nodes assigned to it. The target's map
//! then holds, per policy class, the operations of every association whose
//! target lies on a path from the target to that class.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::model::{NodeType, OperationSet, Prohibition};
use ngac_core::traits::{Graph, Prohibitions};

/// What the subject side of a decision contributes.
#[derive(Debug, Default)]
pub(crate) struct UserReach {
    /// Association target -> union of granted operations.
    pub border: HashMap<String, OperationSet>,
    /// Prohibitions on the subject, its attributes or the process.
    pub prohibitions: Vec<Prohibition>,
}

/// What the target side of a decision contributes.
#[derive(Debug, Default)]
pub(crate) struct TargetReach {
    /// Policy class -> operations granted through it, unresolved.
    pub policy_classes: HashMap<String, OperationSet>,
    /// The target and every node it is contained in.
    pub reached: HashSet<String>,
}

/// The outcome of a decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    /// Operations the subject holds on the target.
    pub allowed: OperationSet,
    /// Names of the prohibitions that removed operations.
    pub prohibited_by: Vec<String>,
}

/// Per-query node arena for the target walk.
#[derive(Default)]
struct Arena {
    index: HashMap<String, usize>,
    names: Vec<String>,
    maps: Vec<Option<HashMap<String, OperationSet>>>,
}

impl Arena {
    /// Index of `name`, and whether it was newly added.
    fn intern(&mut self, name: &str) -> (usize, bool) {
        if let Some(&idx) = self.index.get(name) {
            return (idx, false);
        }
        let idx = self.names.len();
        self.index.insert(name.to_string(), idx);
        self.names.push(name.to_string());
        self.maps.push(None);
        (idx, true)
    }
}

/// Decides which operations a user holds on a node.
pub struct PReviewDecider {
    graph: Arc<dyn Graph>,
    prohibitions: Arc<dyn Prohibitions>,
    resource_ops: OperationSet,
}

impl PReviewDecider {
    /// Create a decider.
    ///
    /// # Arguments
    ///
    /// * `graph` - The policy graph to decide over.
    /// * `prohibitions` - The prohibitions to apply.
    /// * `resource_ops` - The operations `*r` expands to.
    pub fn new(
        graph: Arc<dyn Graph>,
        prohibitions: Arc<dyn Prohibitions>,
        resource_ops: OperationSet,
    ) -> Self {
        Self {
            graph,
            prohibitions,
            resource_ops,
        }
    }

    /// The operations `*r` expands to.
    pub fn resource_ops(&self) -> &OperationSet {
        &self.resource_ops
    }

    pub(crate) fn graph(&self) -> &dyn Graph {
        self.graph.as_ref()
    }

    /// Whether `subject` holds every operation of `perms` on `target`.
    ///
    /// With an empty `perms`, whether it holds any operation at all.
    /// Wildcards in `perms` are expanded first.
    ///
    /// # Arguments
    ///
    /// * `subject` - The user (or user attribute) asking.
    /// * `process` - Process the subject acts through, if any.
    /// * `target` - The node to check.
    /// * `perms` - The operations required.
    pub fn check(
        &self,
        subject: &str,
        process: Option<&str>,
        target: &str,
        perms: &OperationSet,
    ) -> Result<bool> {
        let allowed = self.list(subject, process, target)?;
        if perms.is_empty() {
            return Ok(!allowed.is_empty());
        }
        Ok(allowed.contains_all(&perms.expand(&self.resource_ops)))
    }

    /// Every operation `subject` holds on `target`, wildcards expanded.
    pub fn list(&self, subject: &str, process: Option<&str>, target: &str) -> Result<OperationSet> {
        Ok(self.decide(subject, process, target)?.allowed)
    }

    /// The decision for `subject` on `target`, including which prohibitions
    /// applied.
    pub fn decide(&self, subject: &str, process: Option<&str>, target: &str) -> Result<Decision> {
        let user = self.user_reach(subject, process)?;
        self.decide_with(&user, target)
    }

    /// The nodes of `nodes` on which `subject` holds every operation of
    /// `perms`.
    pub fn filter(
        &self,
        subject: &str,
        process: Option<&str>,
        nodes: Vec<String>,
        perms: &OperationSet,
    ) -> Result<Vec<String>> {
        let user = self.user_reach(subject, process)?;
        let required = perms.expand(&self.resource_ops);

        let mut kept = Vec::with_capacity(nodes.len());
        for node in nodes {
            let allowed = self.decide_with(&user, &node)?.allowed;
            let keep = if required.is_empty() {
                !allowed.is_empty()
            } else {
                allowed.contains_all(&required)
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Children of `target` on which `subject` holds any operation.
    pub fn children(
        &self,
        subject: &str,
        process: Option<&str>,
        target: &str,
    ) -> Result<HashSet<String>> {
        let children = self.graph.children(target)?.into_iter().collect();
        Ok(self
            .filter(subject, process, children, &OperationSet::new())?
            .into_iter()
            .collect())
    }

    /// Every non policy class node on which `subject` holds any operation,
    /// with those operations.
    pub fn capability_list(
        &self,
        subject: &str,
        process: Option<&str>,
    ) -> Result<HashMap<String, OperationSet>> {
        let user = self.user_reach(subject, process)?;

        let mut capabilities = HashMap::new();
        for node in self.graph.nodes()? {
            if node.node_type == NodeType::PC {
                continue;
            }
            let allowed = self.decide_with(&user, &node.name)?.allowed;
            if !allowed.is_empty() {
                capabilities.insert(node.name, allowed);
            }
        }
        Ok(capabilities)
    }

    /// Every user holding any operation on `target`, with those operations.
    pub fn generate_acl(
        &self,
        target: &str,
        process: Option<&str>,
    ) -> Result<HashMap<String, OperationSet>> {
        let mut acl = HashMap::new();
        for user in self
            .graph
            .search(Some(NodeType::U), &Default::default())?
        {
            let allowed = self.list(&user.name, process, target)?;
            if !allowed.is_empty() {
                acl.insert(user.name, allowed);
            }
        }
        Ok(acl)
    }

    pub(crate) fn decide_with(&self, user: &UserReach, target: &str) -> Result<Decision> {
        let target_reach = self.target_reach(target, &user.border)?;

        let mut allowed = match self.combine(&target_reach.policy_classes) {
            Some(ops) => ops,
            None => return Ok(Decision::default()),
        };

        let mut prohibited_by = Vec::new();
        for prohibition in &user.prohibitions {
            if applies(prohibition, &target_reach.reached) {
                let before = allowed.len();
                allowed.remove_all(&prohibition.operations.resolve(&self.resource_ops));
                if allowed.len() < before {
                    prohibited_by.push(prohibition.name.clone());
                }
            }
        }

        log::trace!(
            "decision on {}: allowed={} prohibited_by={:?}",
            target,
            allowed,
            prohibited_by
        );
        Ok(Decision {
            allowed,
            prohibited_by,
        })
    }

    /// Intersect the resolved per policy class operations.
    ///
    /// `None` if the target reaches no policy class or any policy class
    /// grants nothing.
    fn combine(&self, policy_classes: &HashMap<String, OperationSet>) -> Option<OperationSet> {
        let mut combined: Option<OperationSet> = None;
        for ops in policy_classes.values() {
            let resolved = ops.resolve(&self.resource_ops);
            if resolved.is_empty() {
                return None;
            }
            combined = Some(match combined {
                Some(acc) => acc.intersection(&resolved),
                None => resolved,
            });
        }
        combined
    }

    /// Walk up from the subject collecting border targets and prohibitions.
    pub(crate) fn user_reach(&self, subject: &str, process: Option<&str>) -> Result<UserReach> {
        let mut reach = UserReach::default();
        let mut seen_prohibitions = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![subject.to_string()];
        visited.insert(subject.to_string());

        while let Some(node) = stack.pop() {
            for (target, ops) in self.graph.source_associations(&node)? {
                reach.border.entry(target).or_default().extend_from(&ops);
            }
            for prohibition in self.prohibitions.prohibitions_for(&node)? {
                if seen_prohibitions.insert(prohibition.name.clone()) {
                    reach.prohibitions.push(prohibition);
                }
            }
            for parent in self.graph.parents(&node)? {
                if visited.insert(parent.clone()) {
                    stack.push(parent);
                }
            }
        }

        if let Some(process) = process.filter(|p| !p.is_empty()) {
            for prohibition in self.prohibitions.prohibitions_for(process)? {
                if prohibition.subject.key() == process
                    && seen_prohibitions.insert(prohibition.name.clone())
                {
                    reach.prohibitions.push(prohibition);
                }
            }
        }

        Ok(reach)
    }

    /// Post-order walk up from the target propagating policy class maps.
    pub(crate) fn target_reach(
        &self,
        target: &str,
        border: &HashMap<String, OperationSet>,
    ) -> Result<TargetReach> {
        struct Frame {
            node: usize,
            parents: Vec<String>,
            next: usize,
        }

        let pcs = self.graph.policy_classes()?;
        let mut arena = Arena::default();
        let (root, _) = arena.intern(target);
        let mut stack = vec![Frame {
            node: root,
            parents: self.graph.parents(target)?.into_iter().collect(),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.parents.len() {
                let parent = frame.parents[frame.next].clone();
                frame.next += 1;
                let (idx, fresh) = arena.intern(&parent);
                if fresh {
                    let parents = self.graph.parents(&parent)?.into_iter().collect();
                    stack.push(Frame {
                        node: idx,
                        parents,
                        next: 0,
                    });
                }
                continue;
            }

            let frame = match stack.pop() {
                Some(frame) => frame,
                None => break,
            };
            let name = arena.names[frame.node].clone();

            let mut map: HashMap<String, OperationSet> = HashMap::new();
            if pcs.contains(&name) {
                map.insert(name.clone(), OperationSet::new());
            }
            for parent in &frame.parents {
                let parent_map = arena
                    .index
                    .get(parent)
                    .and_then(|&idx| arena.maps[idx].as_ref());
                if let Some(parent_map) = parent_map {
                    for (pc, ops) in parent_map {
                        map.entry(pc.clone()).or_default().extend_from(ops);
                    }
                }
            }
            if let Some(ops) = border.get(&name) {
                for pc_ops in map.values_mut() {
                    pc_ops.extend_from(ops);
                }
            }
            arena.maps[frame.node] = Some(map);
        }

        let policy_classes = arena.maps[root].take().unwrap_or_default();
        Ok(TargetReach {
            policy_classes,
            reached: arena.names.into_iter().collect(),
        })
    }
}

/// Whether a prohibition applies to a target, given the target and every
/// node it is contained in.
///
/// A container matches when it was reached, or when it was not reached and
/// is a complement container. Intersection prohibitions need every container
/// to match, union prohibitions at least one. A prohibition without
/// containers never applies.
pub(crate) fn applies(prohibition: &Prohibition, reached: &HashSet<String>) -> bool {
    if prohibition.containers.is_empty() {
        return false;
    }
    let mut matches = prohibition
        .containers
        .iter()
        .map(|(container, complement)| reached.contains(container) != *complement);
    if prohibition.intersection {
        matches.all(|m| m)
    } else {
        matches.any(|m| m)
    }
}
