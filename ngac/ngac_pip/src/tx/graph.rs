//! Transactional graph overlay.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ngac_core::error::{GraphError, Result};
use ngac_core::model::{Node, NodeType, OperationSet, Properties};
use ngac_core::traits::Graph;

use super::{CommandLog, TxCommand};
use crate::graph::describe;

type Pair = (String, String);

/// Buffered graph state of one transaction.
#[derive(Debug, Default)]
struct Overlay {
    /// Nodes created in the transaction, with any later updates applied.
    nodes: HashMap<String, Node>,
    policy_classes: HashSet<String>,

    /// Property replacements for backing nodes.
    updated: HashMap<String, Properties>,

    /// Names deleted in the transaction. Backing state under these names is
    /// ignored from then on, even if the name is created again.
    shadowed: HashSet<String>,

    /// (child, parent) edges added in the transaction.
    assigned: HashSet<Pair>,
    /// (child, parent) edges removed in the transaction.
    deassigned: HashSet<Pair>,

    /// (source, target) associations added in the transaction.
    associated: HashMap<Pair, OperationSet>,
    /// (source, target) associations removed in the transaction.
    dissociated: HashSet<Pair>,
}

impl Overlay {
    /// Whether backing-store state for `name` is still visible.
    fn backed(&self, name: &str) -> bool {
        !self.shadowed.contains(name) && !self.nodes.contains_key(name)
    }
}

/// A graph that buffers mutations over a backing graph.
///
/// Reads merge the buffered state with the backing graph; writes are
/// validated against that merged view and appended to the transaction's
/// command log.
pub struct TxGraph {
    target: Arc<dyn Graph>,
    overlay: Mutex<Overlay>,
    log: CommandLog,
}

impl TxGraph {
    pub(crate) fn new(target: Arc<dyn Graph>, log: CommandLog) -> Self {
        Self {
            target,
            overlay: Mutex::new(Overlay::default()),
            log,
        }
    }

    fn record(&self, command: TxCommand) {
        self.log.lock().push(command);
    }

    fn exists_in(&self, ov: &Overlay, name: &str) -> Result<bool> {
        if ov.nodes.contains_key(name) {
            return Ok(true);
        }
        if ov.shadowed.contains(name) {
            return Ok(false);
        }
        self.target.exists(name)
    }

    fn node_in(&self, ov: &Overlay, name: &str) -> Result<Node> {
        if let Some(node) = ov.nodes.get(name) {
            return Ok(node.clone());
        }
        if ov.shadowed.contains(name) {
            return Err(GraphError::NodeNotFound(name.to_string()).into());
        }
        let mut node = self.target.node(name)?;
        if let Some(properties) = ov.updated.get(name) {
            node.properties = properties.clone();
        }
        Ok(node)
    }

    fn nodes_in(&self, ov: &Overlay) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self
            .target
            .nodes()?
            .into_iter()
            .filter(|n| ov.backed(&n.name))
            .map(|mut n| {
                if let Some(properties) = ov.updated.get(&n.name) {
                    n.properties = properties.clone();
                }
                n
            })
            .collect();
        nodes.extend(ov.nodes.values().cloned());
        Ok(nodes)
    }

    fn parents_in(&self, ov: &Overlay, name: &str) -> Result<HashSet<String>> {
        if !self.exists_in(ov, name)? {
            return Err(GraphError::NodeNotFound(name.to_string()).into());
        }

        let mut parents = HashSet::new();
        if ov.backed(name) {
            for parent in self.target.parents(name)? {
                if !ov.shadowed.contains(&parent)
                    && !ov.deassigned.contains(&(name.to_string(), parent.clone()))
                {
                    parents.insert(parent);
                }
            }
        }
        parents.extend(
            ov.assigned
                .iter()
                .filter(|(child, _)| child == name)
                .map(|(_, parent)| parent.clone()),
        );
        Ok(parents)
    }

    fn children_in(&self, ov: &Overlay, name: &str) -> Result<HashSet<String>> {
        if !self.exists_in(ov, name)? {
            return Err(GraphError::NodeNotFound(name.to_string()).into());
        }

        let mut children = HashSet::new();
        if ov.backed(name) {
            for child in self.target.children(name)? {
                if !ov.shadowed.contains(&child)
                    && !ov.deassigned.contains(&(child.clone(), name.to_string()))
                {
                    children.insert(child);
                }
            }
        }
        children.extend(
            ov.assigned
                .iter()
                .filter(|(_, parent)| parent == name)
                .map(|(child, _)| child.clone()),
        );
        Ok(children)
    }

    fn check_assignment(
        &self,
        ov: &Overlay,
        child: &str,
        child_type: NodeType,
        parent: &str,
    ) -> Result<()> {
        let parent_type = self.node_in(ov, parent)?.node_type;
        if !child_type.can_assign_to(parent_type) {
            return Err(GraphError::InvalidAssignment {
                child: child.to_string(),
                child_type,
                parent: parent.to_string(),
                parent_type,
            }
            .into());
        }
        Ok(())
    }

    fn check_new_name(&self, ov: &Overlay, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(GraphError::EmptyName.into());
        }
        if self.exists_in(ov, name)? {
            return Err(GraphError::NodeExists(name.to_string()).into());
        }
        Ok(())
    }
}

impl Graph for TxGraph {
    fn create_policy_class(&self, name: &str, properties: Properties) -> Result<Node> {
        let mut ov = self.overlay.lock();
        self.check_new_name(&ov, name)?;

        let node = Node::new(name, NodeType::PC, properties.clone());
        ov.nodes.insert(name.to_string(), node.clone());
        ov.policy_classes.insert(name.to_string());
        self.record(TxCommand::CreatePolicyClass {
            name: name.to_string(),
            properties,
        });
        Ok(node)
    }

    fn create_node(
        &self,
        name: &str,
        node_type: NodeType,
        properties: Properties,
        initial_parent: &str,
        additional_parents: &[String],
    ) -> Result<Node> {
        if node_type == NodeType::PC {
            return self.create_policy_class(name, properties);
        }

        let mut ov = self.overlay.lock();
        self.check_new_name(&ov, name)?;
        if initial_parent.is_empty() {
            return Err(GraphError::MissingParent(name.to_string()).into());
        }

        let mut parents = vec![initial_parent.to_string()];
        for parent in additional_parents {
            if !parents.contains(parent) {
                parents.push(parent.clone());
            }
        }
        for parent in &parents {
            self.check_assignment(&ov, name, node_type, parent)?;
        }

        let node = Node::new(name, node_type, properties.clone());
        ov.nodes.insert(name.to_string(), node.clone());
        for parent in parents {
            ov.deassigned.remove(&(name.to_string(), parent.clone()));
            ov.assigned.insert((name.to_string(), parent));
        }
        self.record(TxCommand::CreateNode {
            name: name.to_string(),
            node_type,
            properties,
            initial_parent: initial_parent.to_string(),
            additional_parents: additional_parents.to_vec(),
        });
        Ok(node)
    }

    fn update_node(&self, name: &str, properties: Properties) -> Result<()> {
        let mut ov = self.overlay.lock();
        let local = ov.nodes.contains_key(name);
        if local {
            if let Some(node) = ov.nodes.get_mut(name) {
                node.properties = properties.clone();
            }
        } else if self.exists_in(&ov, name)? {
            ov.updated.insert(name.to_string(), properties.clone());
        } else {
            return Err(GraphError::NodeNotFound(name.to_string()).into());
        }

        self.record(TxCommand::UpdateNode {
            name: name.to_string(),
            properties,
        });
        Ok(())
    }

    fn remove_node(&self, name: &str) -> Result<()> {
        let mut ov = self.overlay.lock();
        ov.nodes.remove(name);
        ov.policy_classes.remove(name);
        ov.updated.remove(name);
        ov.shadowed.insert(name.to_string());
        ov.assigned
            .retain(|(child, parent)| child != name && parent != name);
        ov.associated
            .retain(|(source, target), _| source != name && target != name);

        self.record(TxCommand::RemoveNode {
            name: name.to_string(),
        });
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        let ov = self.overlay.lock();
        self.exists_in(&ov, name)
    }

    fn policy_classes(&self) -> Result<HashSet<String>> {
        let ov = self.overlay.lock();
        let mut pcs: HashSet<String> = self
            .target
            .policy_classes()?
            .into_iter()
            .filter(|pc| ov.backed(pc))
            .collect();
        pcs.extend(ov.policy_classes.iter().cloned());
        Ok(pcs)
    }

    fn nodes(&self) -> Result<Vec<Node>> {
        let ov = self.overlay.lock();
        self.nodes_in(&ov)
    }

    fn node(&self, name: &str) -> Result<Node> {
        let ov = self.overlay.lock();
        self.node_in(&ov, name)
    }

    fn node_from_details(
        &self,
        node_type: Option<NodeType>,
        properties: &Properties,
    ) -> Result<Node> {
        let mut found = self.search(node_type, properties)?;
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::NodeNotFound(describe(node_type, properties)).into())
    }

    fn search(&self, node_type: Option<NodeType>, properties: &Properties) -> Result<Vec<Node>> {
        let ov = self.overlay.lock();
        Ok(self
            .nodes_in(&ov)?
            .into_iter()
            .filter(|n| n.matches(node_type, properties))
            .collect())
    }

    fn children(&self, name: &str) -> Result<HashSet<String>> {
        let ov = self.overlay.lock();
        self.children_in(&ov, name)
    }

    fn parents(&self, name: &str) -> Result<HashSet<String>> {
        let ov = self.overlay.lock();
        self.parents_in(&ov, name)
    }

    fn assign(&self, child: &str, parent: &str) -> Result<()> {
        let mut ov = self.overlay.lock();
        let child_type = self.node_in(&ov, child)?.node_type;
        self.check_assignment(&ov, child, child_type, parent)?;
        if self.parents_in(&ov, child)?.contains(parent) {
            return Err(GraphError::AssignmentExists {
                child: child.to_string(),
                parent: parent.to_string(),
            }
            .into());
        }

        let pair = (child.to_string(), parent.to_string());
        ov.deassigned.remove(&pair);
        ov.assigned.insert(pair);
        self.record(TxCommand::Assign {
            child: child.to_string(),
            parent: parent.to_string(),
        });
        Ok(())
    }

    fn deassign(&self, child: &str, parent: &str) -> Result<()> {
        let mut ov = self.overlay.lock();
        let pair = (child.to_string(), parent.to_string());
        ov.assigned.remove(&pair);
        ov.deassigned.insert(pair);
        self.record(TxCommand::Deassign {
            child: child.to_string(),
            parent: parent.to_string(),
        });
        Ok(())
    }

    fn is_assigned(&self, child: &str, parent: &str) -> Result<bool> {
        let ov = self.overlay.lock();
        if !self.exists_in(&ov, child)? {
            return Ok(false);
        }
        Ok(self.parents_in(&ov, child)?.contains(parent))
    }

    fn associate(&self, ua: &str, target: &str, operations: OperationSet) -> Result<()> {
        let mut ov = self.overlay.lock();
        let source_type = self.node_in(&ov, ua)?.node_type;
        let target_type = self.node_in(&ov, target)?.node_type;
        if !source_type.can_associate_with(target_type) {
            return Err(GraphError::InvalidAssociation {
                source_node: ua.to_string(),
                source_type,
                target: target.to_string(),
                target_type,
            }
            .into());
        }

        let pair = (ua.to_string(), target.to_string());
        ov.dissociated.remove(&pair);
        ov.associated.insert(pair, operations.clone());
        self.record(TxCommand::Associate {
            ua: ua.to_string(),
            target: target.to_string(),
            operations,
        });
        Ok(())
    }

    fn dissociate(&self, ua: &str, target: &str) -> Result<()> {
        let mut ov = self.overlay.lock();
        let pair = (ua.to_string(), target.to_string());
        ov.associated.remove(&pair);
        ov.dissociated.insert(pair);
        self.record(TxCommand::Dissociate {
            ua: ua.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    fn source_associations(&self, source: &str) -> Result<HashMap<String, OperationSet>> {
        let ov = self.overlay.lock();
        if !self.exists_in(&ov, source)? {
            return Err(GraphError::NodeNotFound(source.to_string()).into());
        }

        let mut associations = HashMap::new();
        if ov.backed(source) {
            for (target, ops) in self.target.source_associations(source)? {
                if !ov.shadowed.contains(&target)
                    && !ov.dissociated.contains(&(source.to_string(), target.clone()))
                {
                    associations.insert(target, ops);
                }
            }
        }
        for ((s, target), ops) in &ov.associated {
            if s == source {
                associations.insert(target.clone(), ops.clone());
            }
        }
        Ok(associations)
    }

    fn target_associations(&self, target: &str) -> Result<HashMap<String, OperationSet>> {
        let ov = self.overlay.lock();
        if !self.exists_in(&ov, target)? {
            return Err(GraphError::NodeNotFound(target.to_string()).into());
        }

        let mut associations = HashMap::new();
        if ov.backed(target) {
            for (source, ops) in self.target.target_associations(target)? {
                if !ov.shadowed.contains(&source)
                    && !ov.dissociated.contains(&(source.clone(), target.to_string()))
                {
                    associations.insert(source, ops);
                }
            }
        }
        for ((source, t), ops) in &ov.associated {
            if t == target {
                associations.insert(source.clone(), ops.clone());
            }
        }
        Ok(associations)
    }
}
