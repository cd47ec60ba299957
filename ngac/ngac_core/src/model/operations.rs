//! Operations and operation sets.
//!
//! Associations and prohibitions carry sets of operation names. Three
//! reserved wildcard tokens are stored as written and only expanded at
//! decision time by [`OperationSet::resolve`].

use serde::{Deserialize, Serialize};
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

/// Every admin and resource operation.
pub const ALL_OPS: &str = "*";
/// Every admin operation.
pub const ALL_ADMIN_OPS: &str = "*a";
/// Every resource operation.
pub const ALL_RESOURCE_OPS: &str = "*r";

pub const CREATE_POLICY_CLASS: &str = "create policy class";
pub const CREATE_NODE: &str = "create node";
pub const UPDATE_NODE: &str = "update node";
pub const DELETE_NODE: &str = "delete node";
pub const ASSIGN: &str = "assign";
pub const ASSIGN_TO: &str = "assign to";
pub const DEASSIGN: &str = "deassign";
pub const DEASSIGN_FROM: &str = "deassign from";
pub const ASSOCIATE: &str = "associate";
pub const DISSOCIATE: &str = "dissociate";
pub const GET_ASSOCIATIONS: &str = "get associations";
pub const CREATE_PROHIBITION: &str = "create prohibition";
pub const VIEW_PROHIBITION: &str = "view prohibition";
pub const UPDATE_PROHIBITION: &str = "update prohibition";
pub const DELETE_PROHIBITION: &str = "delete prohibition";
pub const ADD_OBLIGATION: &str = "add obligation";
pub const GET_OBLIGATION: &str = "get obligation";
pub const UPDATE_OBLIGATION: &str = "update obligation";
pub const DELETE_OBLIGATION: &str = "delete obligation";
pub const ENABLE_OBLIGATION: &str = "enable obligation";
pub const OBJECT_ACCESS: &str = "object access";
pub const RESET: &str = "reset";

/// The admin operations `*a` expands to.
pub const ADMIN_OPS: &[&str] = &[
    CREATE_POLICY_CLASS,
    CREATE_NODE,
    UPDATE_NODE,
    DELETE_NODE,
    ASSIGN,
    ASSIGN_TO,
    DEASSIGN,
    DEASSIGN_FROM,
    ASSOCIATE,
    DISSOCIATE,
    GET_ASSOCIATIONS,
    CREATE_PROHIBITION,
    VIEW_PROHIBITION,
    UPDATE_PROHIBITION,
    DELETE_PROHIBITION,
    ADD_OBLIGATION,
    GET_OBLIGATION,
    UPDATE_OBLIGATION,
    DELETE_OBLIGATION,
    ENABLE_OBLIGATION,
    OBJECT_ACCESS,
    RESET,
];

/// Whether `op` is one of the admin operations.
pub fn is_admin_op(op: &str) -> bool {
    ADMIN_OPS.contains(&op)
}

/// An ordered set of operation names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSet(BTreeSet<String>);

impl OperationSet {
    /// An empty set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// The set containing only `*`.
    pub fn all() -> Self {
        Self::from([ALL_OPS])
    }

    /// The admin operations, expanded.
    pub fn admin() -> Self {
        ADMIN_OPS.iter().copied().collect()
    }

    /// Add an operation. Returns whether it was newly inserted.
    pub fn insert(&mut self, op: impl Into<String>) -> bool {
        self.0.insert(op.into())
    }

    /// Remove an operation. Returns whether it was present.
    pub fn remove(&mut self, op: &str) -> bool {
        self.0.remove(op)
    }

    pub fn contains(&self, op: &str) -> bool {
        self.0.contains(op)
    }

    /// Whether every operation of `other` is in this set.
    pub fn contains_all(&self, other: &OperationSet) -> bool {
        other.0.is_subset(&self.0)
    }

    /// Whether at least one operation of `other` is in this set.
    pub fn contains_any(&self, other: &OperationSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    /// Add every operation of `other`.
    pub fn extend_from(&mut self, other: &OperationSet) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Keep only the operations also in `other`.
    pub fn retain_in(&mut self, other: &OperationSet) {
        self.0.retain(|op| other.0.contains(op));
    }

    /// Remove every operation of `other`.
    pub fn remove_all(&mut self, other: &OperationSet) {
        self.0.retain(|op| !other.0.contains(op));
    }

    pub fn union(&self, other: &OperationSet) -> OperationSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    pub fn intersection(&self, other: &OperationSet) -> OperationSet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Whether the set holds any wildcard token.
    pub fn has_wildcard(&self) -> bool {
        self.contains(ALL_OPS) || self.contains(ALL_ADMIN_OPS) || self.contains(ALL_RESOURCE_OPS)
    }

    /// Expand wildcards and drop unknown operations.
    ///
    /// `*` expands to the admin operations and `resource_ops`, `*a` to the
    /// admin operations and `*r` to `resource_ops`. Any remaining operation
    /// that is neither an admin operation nor in `resource_ops` is dropped.
    pub fn resolve(&self, resource_ops: &OperationSet) -> OperationSet {
        let mut resolved = OperationSet::new();

        for op in &self.0 {
            match op.as_str() {
                ALL_OPS => {
                    resolved.0.extend(ADMIN_OPS.iter().map(|s| s.to_string()));
                    resolved.extend_from(resource_ops);
                }
                ALL_ADMIN_OPS => resolved.0.extend(ADMIN_OPS.iter().map(|s| s.to_string())),
                ALL_RESOURCE_OPS => resolved.extend_from(resource_ops),
                other if is_admin_op(other) || resource_ops.contains(other) => {
                    resolved.0.insert(other.to_string());
                }
                _ => {}
            }
        }

        resolved
    }

    /// Expand wildcards, keeping every other operation as written.
    pub fn expand(&self, resource_ops: &OperationSet) -> OperationSet {
        let mut expanded = OperationSet::new();
        for op in &self.0 {
            match op.as_str() {
                ALL_OPS | ALL_ADMIN_OPS | ALL_RESOURCE_OPS => {
                    expanded.extend_from(&OperationSet::from([op.as_str()]).resolve(resource_ops))
                }
                other => {
                    expanded.insert(other);
                }
            }
        }
        expanded
    }

    /// Sorted vector of the operation names.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for OperationSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for OperationSet {
    fn from(ops: [S; N]) -> Self {
        ops.into_iter().collect()
    }
}

impl From<Vec<String>> for OperationSet {
    fn from(ops: Vec<String>) -> Self {
        ops.into_iter().collect()
    }
}

impl IntoIterator for OperationSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a OperationSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, op) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", op)?;
        }
        write!(f, "]")
    }
}
