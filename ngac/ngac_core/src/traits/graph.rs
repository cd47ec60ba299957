//! Policy graph trait.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::model::{Node, NodeType, OperationSet, Properties};

/// Storage for policy elements, assignments and associations.
///
/// Implementations hold their state behind interior locks so a graph can be
/// shared as `Arc<dyn Graph>`. Each call is atomic on its own; sequences of
/// calls are not.
///
/// The raw store checks only what it needs to stay consistent: unique
/// names, existing parents, and valid assignment and association type
/// pairs. Removing a missing node, edge or association is a no-op.
pub trait Graph: Send + Sync {
    /// Create a policy class node.
    ///
    /// # Errors
    ///
    /// `GraphError::EmptyName` or `GraphError::NodeExists`.
    fn create_policy_class(&self, name: &str, properties: Properties) -> Result<Node>;

    /// Create a non policy class node assigned to `initial_parent` and every
    /// node in `additional_parents`.
    ///
    /// # Errors
    ///
    /// Fails on an empty or duplicate name, a missing parent, or a parent
    /// the node type cannot be assigned to. Nothing is created on failure.
    fn create_node(
        &self,
        name: &str,
        node_type: NodeType,
        properties: Properties,
        initial_parent: &str,
        additional_parents: &[String],
    ) -> Result<Node>;

    /// Replace the properties of a node.
    fn update_node(&self, name: &str, properties: Properties) -> Result<()>;

    /// Delete a node and every edge touching it.
    fn remove_node(&self, name: &str) -> Result<()>;

    fn exists(&self, name: &str) -> Result<bool>;

    /// Names of every policy class.
    fn policy_classes(&self) -> Result<HashSet<String>>;

    /// Every node in the graph.
    fn nodes(&self) -> Result<Vec<Node>>;

    /// The node with the given name, or `GraphError::NodeNotFound`.
    fn node(&self, name: &str) -> Result<Node>;

    /// The first node matching the type and property subset.
    fn node_from_details(&self, node_type: Option<NodeType>, properties: &Properties)
        -> Result<Node>;

    /// Every node matching the type and property subset.
    fn search(&self, node_type: Option<NodeType>, properties: &Properties) -> Result<Vec<Node>>;

    /// Names of the nodes assigned to `name`.
    fn children(&self, name: &str) -> Result<HashSet<String>>;

    /// Names of the nodes `name` is assigned to.
    fn parents(&self, name: &str) -> Result<HashSet<String>>;

    /// Assign `child` to `parent`.
    ///
    /// # Errors
    ///
    /// `NodeNotFound`, `InvalidAssignment` for a disallowed type pair and
    /// `AssignmentExists` for a duplicate edge.
    fn assign(&self, child: &str, parent: &str) -> Result<()>;

    fn deassign(&self, child: &str, parent: &str) -> Result<()>;

    fn is_assigned(&self, child: &str, parent: &str) -> Result<bool>;

    /// Grant `operations` from a user attribute on a target attribute,
    /// replacing any operations already granted between the pair.
    fn associate(&self, ua: &str, target: &str, operations: OperationSet) -> Result<()>;

    fn dissociate(&self, ua: &str, target: &str) -> Result<()>;

    /// Associations whose source is `source`, keyed by target.
    fn source_associations(&self, source: &str) -> Result<HashMap<String, OperationSet>>;

    /// Associations whose target is `target`, keyed by source.
    fn target_associations(&self, target: &str) -> Result<HashMap<String, OperationSet>>;
}
