//! Policy element model.
//!
//! Nodes are the vertices of the policy graph. They are identified by a
//! globally unique name, carry an immutable [`NodeType`] and a mutable
//! property map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// String properties attached to a node.
pub type Properties = HashMap<String, String>;

/// The five kinds of policy element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    /// Policy class.
    PC,
    /// Object attribute.
    OA,
    /// User attribute.
    UA,
    /// Object.
    O,
    /// User.
    U,
}

impl NodeType {
    /// Every node type, in declaration order.
    pub const ALL: [NodeType; 5] = [Self::PC, Self::OA, Self::UA, Self::O, Self::U];

    /// Short name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PC => "PC",
            Self::OA => "OA",
            Self::UA => "UA",
            Self::O => "O",
            Self::U => "U",
        }
    }

    /// Whether `self` may be assigned to a parent of type `parent`.
    ///
    /// The valid pairs are U→UA, UA→UA, UA→PC, O→OA, OA→OA and OA→PC. No
    /// sequence of valid pairs leads back to a lower type, so assignment
    /// graphs are acyclic by construction.
    pub fn can_assign_to(&self, parent: NodeType) -> bool {
        matches!(
            (self, parent),
            (Self::U, Self::UA)
                | (Self::UA, Self::UA)
                | (Self::UA, Self::PC)
                | (Self::O, Self::OA)
                | (Self::OA, Self::OA)
                | (Self::OA, Self::PC)
        )
    }

    /// Whether `self` may be the source of an association to a `target` type.
    pub fn can_associate_with(&self, target: NodeType) -> bool {
        matches!((self, target), (Self::UA, Self::UA) | (Self::UA, Self::OA))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    /// Parse a node type. Case-insensitive; accepts the short names and the
    /// long names (`policy_class`, `object_attribute`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc" | "policy_class" => Ok(Self::PC),
            "oa" | "object_attribute" => Ok(Self::OA),
            "ua" | "user_attribute" => Ok(Self::UA),
            "o" | "object" => Ok(Self::O),
            "u" | "user" => Ok(Self::U),
            other => Err(format!("unknown node type {}", other)),
        }
    }
}

/// A policy element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique name.
    pub name: String,

    /// Type of the element.
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Arbitrary string properties.
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create a new node.
    pub fn new(name: impl Into<String>, node_type: NodeType, properties: Properties) -> Self {
        Self {
            name: name.into(),
            node_type,
            properties,
        }
    }

    /// Whether every entry of `properties` is present on this node with the
    /// same value. An empty map matches every node.
    pub fn has_properties(&self, properties: &Properties) -> bool {
        properties
            .iter()
            .all(|(key, value)| self.properties.get(key) == Some(value))
    }

    /// Whether this node matches an optional type and a property subset.
    pub fn matches(&self, node_type: Option<NodeType>, properties: &Properties) -> bool {
        node_type.map_or(true, |t| t == self.node_type) && self.has_properties(properties)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.node_type)
    }
}

/// Build a property map from key/value pairs.
pub fn props<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Properties
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_table() {
        let valid = [
            (NodeType::U, NodeType::UA),
            (NodeType::UA, NodeType::UA),
            (NodeType::UA, NodeType::PC),
            (NodeType::O, NodeType::OA),
            (NodeType::OA, NodeType::OA),
            (NodeType::OA, NodeType::PC),
        ];

        for child in NodeType::ALL {
            for parent in NodeType::ALL {
                assert_eq!(
                    child.can_assign_to(parent),
                    valid.contains(&(child, parent)),
                    "{} -> {}",
                    child,
                    parent
                );
            }
        }
    }

    #[test]
    fn test_association_table() {
        for source in NodeType::ALL {
            for target in NodeType::ALL {
                let expected =
                    source == NodeType::UA && matches!(target, NodeType::UA | NodeType::OA);
                assert_eq!(source.can_associate_with(target), expected);
            }
        }
    }

    #[test]
    fn test_node_type_parse() {
        assert_eq!("ua".parse::<NodeType>().unwrap(), NodeType::UA);
        assert_eq!("Policy_Class".parse::<NodeType>().unwrap(), NodeType::PC);
        assert!("group".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_property_subset_match() {
        let node = Node::new(
            "o1",
            NodeType::O,
            props([("owner", "alice"), ("kind", "doc")]),
        );
        assert!(node.has_properties(&Properties::new()));
        assert!(node.has_properties(&props([("owner", "alice")])));
        assert!(!node.has_properties(&props([("owner", "bob")])));
        assert!(node.matches(Some(NodeType::O), &props([("kind", "doc")])));
        assert!(!node.matches(Some(NodeType::OA), &Properties::new()));
    }
}
