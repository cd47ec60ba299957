//! In-memory policy graph.
//!
//! Assignments and associations live in two independent adjacency
//! structures, each indexed in both directions, so an assignment and an
//! association between the same pair of nodes never interfere.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use ngac_core::error::{GraphError, Result};
use ngac_core::log_event;
use ngac_core::model::{Node, NodeType, OperationSet, Properties};
use ngac_core::traits::Graph;
use ngac_core::utils::LogLevel;

#[derive(Debug, Default)]
struct GraphState {
    nodes: HashMap<String, Node>,
    policy_classes: HashSet<String>,

    /// child -> parents
    parents: HashMap<String, HashSet<String>>,
    /// parent -> children
    children: HashMap<String, HashSet<String>>,

    /// source -> target -> operations
    outgoing: HashMap<String, HashMap<String, OperationSet>>,
    /// target -> source -> operations
    incoming: HashMap<String, HashMap<String, OperationSet>>,
}

impl GraphState {
    fn node(&self, name: &str) -> Result<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()).into())
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(GraphError::EmptyName.into());
        }
        if self.nodes.contains_key(name) {
            return Err(GraphError::NodeExists(name.to_string()).into());
        }
        Ok(())
    }

    fn check_assignment(&self, child: &str, child_type: NodeType, parent: &str) -> Result<()> {
        let parent_type = self.node(parent)?.node_type;
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

    fn insert_node(&mut self, node: Node) {
        let name = node.name.clone();
        self.parents.insert(name.clone(), HashSet::new());
        self.children.insert(name.clone(), HashSet::new());
        self.outgoing.insert(name.clone(), HashMap::new());
        self.incoming.insert(name.clone(), HashMap::new());
        self.nodes.insert(name, node);
    }

    fn link(&mut self, child: &str, parent: &str) {
        self.parents
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());
        self.children
            .entry(parent.to_string())
            .or_default()
            .insert(child.to_string());
    }

    fn unlink(&mut self, child: &str, parent: &str) -> bool {
        let removed = self
            .parents
            .get_mut(child)
            .map_or(false, |p| p.remove(parent));
        if let Some(children) = self.children.get_mut(parent) {
            children.remove(child);
        }
        removed
    }

    fn unassociate(&mut self, source: &str, target: &str) -> bool {
        let removed = self
            .outgoing
            .get_mut(source)
            .map_or(false, |t| t.remove(target).is_some());
        if let Some(sources) = self.incoming.get_mut(target) {
            sources.remove(source);
        }
        removed
    }
}

/// A policy graph held in memory.
///
/// Every call takes the internal lock once, so each call is atomic. A
/// sequence of calls is not; use a transaction for that.
#[derive(Debug, Default)]
pub struct MemGraph {
    state: RwLock<GraphState>,
}

impl MemGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }
}

impl Graph for MemGraph {
    fn create_policy_class(&self, name: &str, properties: Properties) -> Result<Node> {
        let mut state = self.state.write();
        state.check_new_name(name)?;

        let node = Node::new(name, NodeType::PC, properties);
        state.insert_node(node.clone());
        state.policy_classes.insert(name.to_string());

        log_event!(LogLevel::Debug, "policy class created", name => name);
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

        let mut state = self.state.write();
        state.check_new_name(name)?;
        if initial_parent.is_empty() {
            return Err(GraphError::MissingParent(name.to_string()).into());
        }

        let mut parents = vec![initial_parent];
        for parent in additional_parents {
            if !parents.contains(&parent.as_str()) {
                parents.push(parent.as_str());
            }
        }
        for parent in &parents {
            state.check_assignment(name, node_type, parent)?;
        }

        let node = Node::new(name, node_type, properties);
        state.insert_node(node.clone());
        for parent in parents {
            state.link(name, parent);
        }

        log_event!(LogLevel::Debug, "node created",
            name => name,
            node_type => node_type,
            parent => initial_parent,
        );
        Ok(node)
    }

    fn update_node(&self, name: &str, properties: Properties) -> Result<()> {
        let mut state = self.state.write();
        let node = state
            .nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;
        node.properties = properties;
        Ok(())
    }

    fn remove_node(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.nodes.remove(name).is_none() {
            return Ok(());
        }
        state.policy_classes.remove(name);

        for parent in state.parents.remove(name).unwrap_or_default() {
            if let Some(children) = state.children.get_mut(&parent) {
                children.remove(name);
            }
        }
        for child in state.children.remove(name).unwrap_or_default() {
            if let Some(parents) = state.parents.get_mut(&child) {
                parents.remove(name);
            }
        }
        for target in state.outgoing.remove(name).unwrap_or_default().into_keys() {
            if let Some(sources) = state.incoming.get_mut(&target) {
                sources.remove(name);
            }
        }
        for source in state.incoming.remove(name).unwrap_or_default().into_keys() {
            if let Some(targets) = state.outgoing.get_mut(&source) {
                targets.remove(name);
            }
        }

        log_event!(LogLevel::Debug, "node removed", name => name);
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.read().nodes.contains_key(name))
    }

    fn policy_classes(&self) -> Result<HashSet<String>> {
        Ok(self.state.read().policy_classes.clone())
    }

    fn nodes(&self) -> Result<Vec<Node>> {
        Ok(self.state.read().nodes.values().cloned().collect())
    }

    fn node(&self, name: &str) -> Result<Node> {
        self.state.read().node(name).cloned()
    }

    fn node_from_details(
        &self,
        node_type: Option<NodeType>,
        properties: &Properties,
    ) -> Result<Node> {
        let state = self.state.read();
        let mut matches: Vec<&Node> = state
            .nodes
            .values()
            .filter(|n| n.matches(node_type, properties))
            .collect();
        // First by name so repeated lookups agree.
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
            .first()
            .map(|n| (*n).clone())
            .ok_or_else(|| GraphError::NodeNotFound(describe(node_type, properties)).into())
    }

    fn search(&self, node_type: Option<NodeType>, properties: &Properties) -> Result<Vec<Node>> {
        Ok(self
            .state
            .read()
            .nodes
            .values()
            .filter(|n| n.matches(node_type, properties))
            .cloned()
            .collect())
    }

    fn children(&self, name: &str) -> Result<HashSet<String>> {
        let state = self.state.read();
        state.node(name)?;
        Ok(state.children.get(name).cloned().unwrap_or_default())
    }

    fn parents(&self, name: &str) -> Result<HashSet<String>> {
        let state = self.state.read();
        state.node(name)?;
        Ok(state.parents.get(name).cloned().unwrap_or_default())
    }

    fn assign(&self, child: &str, parent: &str) -> Result<()> {
        let mut state = self.state.write();
        let child_type = state.node(child)?.node_type;
        state.check_assignment(child, child_type, parent)?;

        if state
            .parents
            .get(child)
            .map_or(false, |p| p.contains(parent))
        {
            return Err(GraphError::AssignmentExists {
                child: child.to_string(),
                parent: parent.to_string(),
            }
            .into());
        }

        state.link(child, parent);
        log_event!(LogLevel::Debug, "assigned", child => child, parent => parent);
        Ok(())
    }

    fn deassign(&self, child: &str, parent: &str) -> Result<()> {
        if self.state.write().unlink(child, parent) {
            log_event!(LogLevel::Debug, "deassigned", child => child, parent => parent);
        }
        Ok(())
    }

    fn is_assigned(&self, child: &str, parent: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .parents
            .get(child)
            .map_or(false, |p| p.contains(parent)))
    }

    fn associate(&self, ua: &str, target: &str, operations: OperationSet) -> Result<()> {
        let mut state = self.state.write();
        let source_type = state.node(ua)?.node_type;
        let target_type = state.node(target)?.node_type;
        if !source_type.can_associate_with(target_type) {
            return Err(GraphError::InvalidAssociation {
                source_node: ua.to_string(),
                source_type,
                target: target.to_string(),
                target_type,
            }
            .into());
        }

        log_event!(LogLevel::Debug, "associated",
            ua => ua,
            target => target,
            operations => operations,
        );
        state
            .outgoing
            .entry(ua.to_string())
            .or_default()
            .insert(target.to_string(), operations.clone());
        state
            .incoming
            .entry(target.to_string())
            .or_default()
            .insert(ua.to_string(), operations);
        Ok(())
    }

    fn dissociate(&self, ua: &str, target: &str) -> Result<()> {
        if self.state.write().unassociate(ua, target) {
            log_event!(LogLevel::Debug, "dissociated", ua => ua, target => target);
        }
        Ok(())
    }

    fn source_associations(&self, source: &str) -> Result<HashMap<String, OperationSet>> {
        let state = self.state.read();
        state.node(source)?;
        Ok(state.outgoing.get(source).cloned().unwrap_or_default())
    }

    fn target_associations(&self, target: &str) -> Result<HashMap<String, OperationSet>> {
        let state = self.state.read();
        state.node(target)?;
        Ok(state.incoming.get(target).cloned().unwrap_or_default())
    }
}

/// Human-readable form of a type and property query, for error messages.
pub(crate) fn describe(node_type: Option<NodeType>, properties: &Properties) -> String {
    let mut pairs: Vec<String> = properties
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    pairs.sort();
    match node_type {
        Some(t) => format!("type={} {{{}}}", t, pairs.join(", ")),
        None => format!("{{{}}}", pairs.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngac_core::error::Error;
    use ngac_core::model::props;

    fn graph() -> MemGraph {
        let graph = MemGraph::new();
        graph.create_policy_class("pc1", Properties::new()).unwrap();
        graph
            .create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])
            .unwrap();
        graph
            .create_node("ua1", NodeType::UA, Properties::new(), "pc1", &[])
            .unwrap();
        graph
    }

    #[test]
    fn test_create_and_read() {
        let graph = graph();
        let node = graph
            .create_node(
                "o1",
                NodeType::O,
                props([("owner", "alice")]),
                "oa1",
                &[],
            )
            .unwrap();

        assert_eq!(graph.node("o1").unwrap(), node);
        assert!(graph.exists("o1").unwrap());
        assert_eq!(graph.parents("o1").unwrap(), HashSet::from(["oa1".to_string()]));
        assert!(graph.children("oa1").unwrap().contains("o1"));
        assert_eq!(graph.policy_classes().unwrap(), HashSet::from(["pc1".to_string()]));
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let graph = graph();

        assert!(matches!(
            graph.create_policy_class("", Properties::new()),
            Err(Error::Graph(GraphError::EmptyName))
        ));
        assert!(matches!(
            graph.create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[]),
            Err(Error::Graph(GraphError::NodeExists(_)))
        ));
        assert!(matches!(
            graph.create_node("o1", NodeType::O, Properties::new(), "missing", &[]),
            Err(Error::Graph(GraphError::NodeNotFound(_)))
        ));
        assert!(matches!(
            graph.create_node("o1", NodeType::O, Properties::new(), "ua1", &[]),
            Err(Error::Graph(GraphError::InvalidAssignment { .. }))
        ));
        // A failed additional parent leaves nothing behind.
        assert!(graph
            .create_node("o1", NodeType::O, Properties::new(), "oa1", &["ua1".into()])
            .is_err());
        assert!(!graph.exists("o1").unwrap());
    }

    #[test]
    fn test_assign_errors_are_distinct() {
        let graph = graph();
        graph
            .create_node("oa2", NodeType::OA, Properties::new(), "pc1", &[])
            .unwrap();

        graph.assign("oa2", "oa1").unwrap();
        assert!(matches!(
            graph.assign("oa2", "oa1"),
            Err(Error::Graph(GraphError::AssignmentExists { .. }))
        ));
        assert!(matches!(
            graph.assign("oa2", "ua1"),
            Err(Error::Graph(GraphError::InvalidAssignment { .. }))
        ));
        assert!(graph.is_assigned("oa2", "oa1").unwrap());

        graph.deassign("oa2", "oa1").unwrap();
        assert!(!graph.is_assigned("oa2", "oa1").unwrap());
        // Deassigning a missing edge is a no-op.
        graph.deassign("oa2", "oa1").unwrap();
    }

    #[test]
    fn test_associations_and_assignments_coexist() {
        let graph = graph();
        graph
            .create_node("ua2", NodeType::UA, Properties::new(), "ua1", &[])
            .unwrap();
        graph
            .associate("ua2", "ua1", OperationSet::from(["read"]))
            .unwrap();

        assert!(graph.is_assigned("ua2", "ua1").unwrap());
        assert_eq!(
            graph.source_associations("ua2").unwrap().get("ua1"),
            Some(&OperationSet::from(["read"]))
        );

        graph.deassign("ua2", "ua1").unwrap();
        assert!(graph.target_associations("ua1").unwrap().contains_key("ua2"));

        graph.dissociate("ua2", "ua1").unwrap();
        assert!(graph.target_associations("ua1").unwrap().is_empty());
        graph.dissociate("ua2", "ua1").unwrap();
    }

    #[test]
    fn test_reassociate_overwrites() {
        let graph = graph();
        graph
            .associate("ua1", "oa1", OperationSet::from(["read"]))
            .unwrap();
        graph
            .associate("ua1", "oa1", OperationSet::from(["write"]))
            .unwrap();
        let assocs = graph.source_associations("ua1").unwrap();
        assert_eq!(assocs.len(), 1);
        assert_eq!(assocs["oa1"], OperationSet::from(["write"]));
        assert_eq!(graph.target_associations("oa1").unwrap()["ua1"], assocs["oa1"]);

        assert!(matches!(
            graph.associate("oa1", "ua1", OperationSet::all()),
            Err(Error::Graph(GraphError::InvalidAssociation { .. }))
        ));
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let graph = graph();
        graph
            .create_node("o1", NodeType::O, Properties::new(), "oa1", &[])
            .unwrap();
        graph
            .associate("ua1", "oa1", OperationSet::from(["read"]))
            .unwrap();

        graph.remove_node("oa1").unwrap();
        assert!(!graph.exists("oa1").unwrap());
        assert!(graph.parents("o1").unwrap().is_empty());
        assert!(!graph.children("pc1").unwrap().contains("oa1"));
        assert!(graph.source_associations("ua1").unwrap().is_empty());

        graph.remove_node("oa1").unwrap();
    }

    #[test]
    fn test_search_and_details() {
        let graph = graph();
        graph
            .create_node("o1", NodeType::O, props([("k", "v")]), "oa1", &[])
            .unwrap();
        graph
            .create_node("o2", NodeType::O, props([("k", "v")]), "oa1", &[])
            .unwrap();

        let found = graph.search(Some(NodeType::O), &props([("k", "v")])).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(
            graph
                .node_from_details(Some(NodeType::O), &props([("k", "v")]))
                .unwrap()
                .name,
            "o1"
        );
        assert!(graph
            .node_from_details(Some(NodeType::UA), &props([("k", "v")]))
            .is_err());

        graph.update_node("o2", props([("k", "w")])).unwrap();
        assert_eq!(graph.node("o2").unwrap().properties["k"], "w");
        assert!(graph.update_node("missing", Properties::new()).is_err());
    }
}
