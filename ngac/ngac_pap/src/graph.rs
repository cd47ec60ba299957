//! Administrative graph layer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ngac_core::config::{default_oa_name, default_ua_name, rep_name};
use ngac_core::ensure_exists;
use ngac_core::error::{GraphError, Result};
use ngac_core::log_event;
use ngac_core::model::{Node, NodeType, OperationSet, Properties};
use ngac_core::traits::Graph;
use ngac_core::utils::LogLevel;

use crate::super_policy::SuperPolicy;

/// A graph that enforces the administrative rules on top of any other
/// graph.
///
/// - names must be non-empty and unused, parents must exist;
/// - a node with children cannot be removed;
/// - a user or object attribute created directly under a policy class is
///   placed in that class's default attribute instead;
/// - every policy class gets default attributes and a rep node.
pub struct GraphAdmin {
    graph: Arc<dyn Graph>,
    super_policy: SuperPolicy,
}

impl GraphAdmin {
    /// Wrap `graph`.
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph to administer.
    /// * `super_policy` - The super policy new policy classes hook into.
    pub fn new(graph: Arc<dyn Graph>, super_policy: SuperPolicy) -> Self {
        Self {
            graph,
            super_policy,
        }
    }

    /// The parent a node of `node_type` is really placed in when `parent`
    /// is declared.
    fn placement(&self, node_type: NodeType, parent: &str) -> Result<String> {
        let parent_type = self.graph.node(parent)?.node_type;
        Ok(match (node_type, parent_type) {
            (NodeType::UA, NodeType::PC) => default_ua_name(parent),
            (NodeType::OA, NodeType::PC) => default_oa_name(parent),
            _ => parent.to_string(),
        })
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(GraphError::EmptyName.into());
        }
        if self.graph.exists(name)? {
            return Err(GraphError::NodeExists(name.to_string()).into());
        }
        Ok(())
    }

    /// Remove a policy class together with its default attributes and rep.
    fn remove_policy_class(&self, pc: &str) -> Result<()> {
        let defaults = [default_ua_name(pc), default_oa_name(pc)];
        for child in self.graph.children(pc)? {
            if !defaults.contains(&child) || !self.graph.children(&child)?.is_empty() {
                return Err(GraphError::HasChildren(pc.to_string()).into());
            }
        }

        for default in &defaults {
            self.graph.remove_node(default)?;
        }
        self.graph.remove_node(&rep_name(pc))?;
        self.graph.remove_node(pc)
    }
}

impl Graph for GraphAdmin {
    fn create_policy_class(&self, name: &str, properties: Properties) -> Result<Node> {
        self.check_new_name(name)?;
        for derived in [default_ua_name(name), default_oa_name(name), rep_name(name)] {
            if self.graph.exists(&derived)? {
                return Err(GraphError::NodeExists(derived).into());
            }
        }

        let node = self.graph.create_policy_class(name, properties)?;
        self.super_policy.configure_policy_class(self.graph.as_ref(), name)?;

        log_event!(LogLevel::Info, "policy class created", name => name);
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

        self.check_new_name(name)?;
        if initial_parent.is_empty() {
            return Err(GraphError::MissingParent(name.to_string()).into());
        }
        ensure_exists!(self.graph, initial_parent);
        for parent in additional_parents {
            ensure_exists!(self.graph, parent);
        }

        let initial = self.placement(node_type, initial_parent)?;
        let additional = additional_parents
            .iter()
            .map(|p| self.placement(node_type, p))
            .collect::<Result<Vec<String>>>()?;

        self.graph
            .create_node(name, node_type, properties, &initial, &additional)
    }

    fn update_node(&self, name: &str, properties: Properties) -> Result<()> {
        ensure_exists!(self.graph, name);
        self.graph.update_node(name, properties)
    }

    fn remove_node(&self, name: &str) -> Result<()> {
        let node = self.graph.node(name)?;
        if node.node_type == NodeType::PC {
            return self.remove_policy_class(name);
        }
        if !self.graph.children(name)?.is_empty() {
            return Err(GraphError::HasChildren(name.to_string()).into());
        }
        self.graph.remove_node(name)
    }

    fn exists(&self, name: &str) -> Result<bool> {
        self.graph.exists(name)
    }

    fn policy_classes(&self) -> Result<HashSet<String>> {
        self.graph.policy_classes()
    }

    fn nodes(&self) -> Result<Vec<Node>> {
        self.graph.nodes()
    }

    fn node(&self, name: &str) -> Result<Node> {
        self.graph.node(name)
    }

    fn node_from_details(
        &self,
        node_type: Option<NodeType>,
        properties: &Properties,
    ) -> Result<Node> {
        self.graph.node_from_details(node_type, properties)
    }

    fn search(&self, node_type: Option<NodeType>, properties: &Properties) -> Result<Vec<Node>> {
        self.graph.search(node_type, properties)
    }

    fn children(&self, name: &str) -> Result<HashSet<String>> {
        self.graph.children(name)
    }

    fn parents(&self, name: &str) -> Result<HashSet<String>> {
        self.graph.parents(name)
    }

    fn assign(&self, child: &str, parent: &str) -> Result<()> {
        ensure_exists!(self.graph, child, parent);
        self.graph.assign(child, parent)
    }

    fn deassign(&self, child: &str, parent: &str) -> Result<()> {
        ensure_exists!(self.graph, child, parent);
        self.graph.deassign(child, parent)
    }

    fn is_assigned(&self, child: &str, parent: &str) -> Result<bool> {
        ensure_exists!(self.graph, child, parent);
        self.graph.is_assigned(child, parent)
    }

    fn associate(&self, ua: &str, target: &str, operations: OperationSet) -> Result<()> {
        ensure_exists!(self.graph, ua, target);
        self.graph.associate(ua, target, operations)
    }

    fn dissociate(&self, ua: &str, target: &str) -> Result<()> {
        ensure_exists!(self.graph, ua, target);
        self.graph.dissociate(ua, target)
    }

    fn source_associations(&self, source: &str) -> Result<HashMap<String, OperationSet>> {
        self.graph.source_associations(source)
    }

    fn target_associations(&self, target: &str) -> Result<HashMap<String, OperationSet>> {
        self.graph.target_associations(target)
    }
}

/// The rep node of `name` if it is a policy class, otherwise `name`.
///
/// Permission checks on a policy class are made on its rep.
pub fn check_node(graph: &dyn Graph, name: &str) -> Result<String> {
    if graph.policy_classes()?.contains(name) {
        let rep = rep_name(name);
        ensure_exists!(graph, &rep);
        return Ok(rep);
    }
    Ok(name.to_string())
}
