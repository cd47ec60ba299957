//! Permission-gated graph access.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ngac_core::error::{GraphError, Result};
use ngac_core::model::operations::{
    ASSIGN, ASSIGN_TO, ASSOCIATE, CREATE_NODE, CREATE_POLICY_CLASS, DEASSIGN, DEASSIGN_FROM,
    DELETE_NODE, DISSOCIATE, GET_ASSOCIATIONS, UPDATE_NODE,
};
use ngac_core::model::{Event, EventContext, Node, NodeType, OperationSet, Properties};
use ngac_core::traits::Graph;

use crate::events::Dispatch;
use crate::guard::Guard;

/// A graph on which every call is checked against the acting user's
/// permissions and every mutation raises its event.
///
/// Nodes the user holds no permission on read as absent.
pub struct GraphService {
    graph: Arc<dyn Graph>,
    guard: Arc<Guard>,
    dispatch: Dispatch,
}

impl GraphService {
    pub(crate) fn new(graph: Arc<dyn Graph>, guard: Arc<Guard>, dispatch: Dispatch) -> Self {
        Self {
            graph,
            guard,
            dispatch,
        }
    }

    fn emit(&self, target: Node, event: Event) -> Result<()> {
        self.dispatch
            .emit(EventContext::new(self.guard.user().clone(), target, event))
    }

    /// The node, if it exists and the user can see it.
    fn visible_node(&self, name: &str) -> Result<Node> {
        let node = self.graph.node(name)?;
        if !self.guard.can_see(name)? {
            return Err(GraphError::NodeNotFound(name.to_string()).into());
        }
        Ok(node)
    }

    fn visible_nodes(&self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        let mut kept = Vec::with_capacity(nodes.len());
        for node in nodes {
            if self.guard.can_see(&node.name)? {
                kept.push(node);
            }
        }
        Ok(kept)
    }
}

impl Graph for GraphService {
    fn create_policy_class(&self, name: &str, properties: Properties) -> Result<Node> {
        self.guard
            .check(self.guard.super_pc_rep(), &[CREATE_POLICY_CLASS])?;
        self.graph.create_policy_class(name, properties)
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

        let mut parents = vec![initial_parent.to_string()];
        parents.extend(additional_parents.iter().cloned());
        for parent in parents.iter().filter(|p| !p.is_empty()) {
            self.guard.check(parent, &[CREATE_NODE])?;
        }

        let node = self.graph.create_node(
            name,
            node_type,
            properties,
            initial_parent,
            additional_parents,
        )?;
        self.emit(node.clone(), Event::CreateNode { parents })?;
        Ok(node)
    }

    fn update_node(&self, name: &str, properties: Properties) -> Result<()> {
        self.guard.check(name, &[UPDATE_NODE])?;
        self.graph.update_node(name, properties)
    }

    fn remove_node(&self, name: &str) -> Result<()> {
        let node = self.graph.node(name)?;
        self.guard.check(name, &[DELETE_NODE])?;
        for parent in self.graph.parents(name)? {
            self.guard.check(&parent, &[DEASSIGN_FROM])?;
        }

        self.graph.remove_node(name)?;
        self.emit(node, Event::DeleteNode)
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.graph.exists(name)? && self.guard.can_see(name)?)
    }

    fn policy_classes(&self) -> Result<HashSet<String>> {
        Ok(self
            .guard
            .visible(self.graph.policy_classes()?)?
            .into_iter()
            .collect())
    }

    fn nodes(&self) -> Result<Vec<Node>> {
        self.visible_nodes(self.graph.nodes()?)
    }

    fn node(&self, name: &str) -> Result<Node> {
        self.visible_node(name)
    }

    fn node_from_details(
        &self,
        node_type: Option<NodeType>,
        properties: &Properties,
    ) -> Result<Node> {
        let mut found = self.search(node_type, properties)?;
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.into_iter().next().ok_or_else(|| {
            GraphError::NodeNotFound(match node_type {
                Some(t) => format!("{} with {:?}", t, properties),
                None => format!("node with {:?}", properties),
            })
            .into()
        })
    }

    fn search(&self, node_type: Option<NodeType>, properties: &Properties) -> Result<Vec<Node>> {
        self.visible_nodes(self.graph.search(node_type, properties)?)
    }

    fn children(&self, name: &str) -> Result<HashSet<String>> {
        self.visible_node(name)?;
        Ok(self
            .guard
            .visible(self.graph.children(name)?)?
            .into_iter()
            .collect())
    }

    fn parents(&self, name: &str) -> Result<HashSet<String>> {
        self.visible_node(name)?;
        Ok(self
            .guard
            .visible(self.graph.parents(name)?)?
            .into_iter()
            .collect())
    }

    fn assign(&self, child: &str, parent: &str) -> Result<()> {
        let child_node = self.graph.node(child)?;
        let parent_node = self.graph.node(parent)?;
        self.guard.check(child, &[ASSIGN])?;
        self.guard.check(parent, &[ASSIGN_TO])?;

        self.graph.assign(child, parent)?;
        self.emit(
            child_node.clone(),
            Event::Assign {
                parent: parent_node.clone(),
            },
        )?;
        self.emit(parent_node, Event::AssignTo { child: child_node })
    }

    fn deassign(&self, child: &str, parent: &str) -> Result<()> {
        let child_node = self.graph.node(child)?;
        let parent_node = self.graph.node(parent)?;
        self.guard.check(child, &[DEASSIGN])?;
        self.guard.check(parent, &[DEASSIGN_FROM])?;

        self.graph.deassign(child, parent)?;
        self.emit(
            child_node.clone(),
            Event::Deassign {
                parent: parent_node.clone(),
            },
        )?;
        self.emit(parent_node, Event::DeassignFrom { child: child_node })
    }

    fn is_assigned(&self, child: &str, parent: &str) -> Result<bool> {
        self.visible_node(child)?;
        self.visible_node(parent)?;
        self.graph.is_assigned(child, parent)
    }

    fn associate(&self, ua: &str, target: &str, operations: OperationSet) -> Result<()> {
        let source = self.graph.node(ua)?;
        let target_node = self.graph.node(target)?;
        self.guard.check(ua, &[ASSOCIATE])?;
        self.guard.check(target, &[ASSOCIATE])?;

        self.graph.associate(ua, target, operations.clone())?;
        self.emit(target_node, Event::Associate { source, operations })
    }

    fn dissociate(&self, ua: &str, target: &str) -> Result<()> {
        let source = self.graph.node(ua)?;
        let target_node = self.graph.node(target)?;
        self.guard.check(ua, &[DISSOCIATE])?;
        self.guard.check(target, &[DISSOCIATE])?;

        self.graph.dissociate(ua, target)?;
        self.emit(target_node, Event::Dissociate { source })
    }

    fn source_associations(&self, source: &str) -> Result<HashMap<String, OperationSet>> {
        self.guard.check(source, &[GET_ASSOCIATIONS])?;
        self.graph.source_associations(source)
    }

    fn target_associations(&self, target: &str) -> Result<HashMap<String, OperationSet>> {
        self.guard.check(target, &[GET_ASSOCIATIONS])?;
        self.graph.target_associations(target)
    }
}
