//! Prohibition model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::OperationSet;

/// Who a prohibition applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProhibitionSubject {
    /// A user or user attribute, by node name. Applies to every user
    /// contained in the attribute.
    Node(String),

    /// A process identifier.
    Process(String),
}

impl ProhibitionSubject {
    /// The node name or process id.
    pub fn key(&self) -> &str {
        match self {
            Self::Node(name) => name,
            Self::Process(id) => id,
        }
    }
}

impl std::fmt::Display for ProhibitionSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(name) => write!(f, "node {}", name),
            Self::Process(id) => write!(f, "process {}", id),
        }
    }
}

/// A named negative-authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prohibition {
    /// Unique name of the prohibition.
    pub name: String,

    /// Who the prohibition applies to.
    pub subject: ProhibitionSubject,

    /// Operations that are denied.
    pub operations: OperationSet,

    /// Container node names, each mapped to its complement flag.
    ///
    /// A complement container matches targets that are *not* contained in
    /// it.
    #[serde(default)]
    pub containers: BTreeMap<String, bool>,

    /// Whether the target must satisfy every container (`true`) or any
    /// container (`false`).
    #[serde(default)]
    pub intersection: bool,
}

impl Prohibition {
    /// Start building a prohibition.
    pub fn builder(name: impl Into<String>, subject: ProhibitionSubject) -> ProhibitionBuilder {
        ProhibitionBuilder {
            prohibition: Prohibition {
                name: name.into(),
                subject,
                operations: OperationSet::new(),
                containers: BTreeMap::new(),
                intersection: false,
            },
        }
    }
}

/// Builder for [`Prohibition`].
#[derive(Debug, Clone)]
pub struct ProhibitionBuilder {
    prohibition: Prohibition,
}

impl ProhibitionBuilder {
    /// Set the denied operations.
    pub fn operations(mut self, operations: OperationSet) -> Self {
        self.prohibition.operations = operations;
        self
    }

    /// Add a container.
    pub fn container(mut self, name: impl Into<String>, complement: bool) -> Self {
        self.prohibition.containers.insert(name.into(), complement);
        self
    }

    /// Require every container to match.
    pub fn intersection(mut self, intersection: bool) -> Self {
        self.prohibition.intersection = intersection;
        self
    }

    pub fn build(self) -> Prohibition {
        self.prohibition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let prohibition = Prohibition::builder("deny-u1", ProhibitionSubject::Node("u1".into()))
            .operations(OperationSet::from(["write"]))
            .container("oa1", false)
            .container("oa2", true)
            .intersection(true)
            .build();

        assert_eq!(prohibition.subject.key(), "u1");
        assert_eq!(prohibition.containers.len(), 2);
        assert_eq!(prohibition.containers.get("oa2"), Some(&true));
        assert!(prohibition.intersection);
    }

    #[test]
    fn test_serde_shape() {
        let prohibition = Prohibition::builder("p", ProhibitionSubject::Process("1234".into()))
            .operations(OperationSet::from(["read"]))
            .build();
        let json = serde_json::to_value(&prohibition).unwrap();
        assert_eq!(json["subject"]["kind"], "process");
        assert_eq!(json["operations"][0], "read");

        let back: Prohibition = serde_json::from_value(json).unwrap();
        assert_eq!(back, prohibition);
    }
}
