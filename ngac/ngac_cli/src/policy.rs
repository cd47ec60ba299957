//! Declarative policy files.
//!
//! A policy file holds the engine configuration and the policy to load,
//! in TOML (or JSON for files ending in `.json`):
//!
//! ```toml
//! [config]
//! resource_operations = ["read", "write"]
//!
//! [[nodes]]
//! name = "pc1"
//! type = "PC"
//!
//! [[nodes]]
//! name = "ua1"
//! type = "UA"
//! parents = ["pc1"]
//!
//! [[associations]]
//! source = "ua1"
//! target = "oa1"
//! operations = ["read", "write"]
//! ```
//!
//! Everything is loaded by the super user in a single transaction, so a
//! file either loads completely or not at all.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use ngac_core::error::{Error, Result};
use ngac_core::model::{NodeType, Obligation, OperationSet, Prohibition, Properties, UserContext};
use ngac_core::traits::PolicyStore;
use ngac_core::NgacConfig;
use ngac_pdp::Pdp;
use ngac_pip::MemPolicyStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFile {
    pub config: NgacConfig,

    /// Nodes in creation order. Parents must come first.
    pub nodes: Vec<NodeDef>,

    /// Assignments beyond the ones made when creating nodes.
    pub assignments: Vec<AssignmentDef>,

    pub associations: Vec<AssociationDef>,
    pub prohibitions: Vec<Prohibition>,
    pub obligations: Vec<Obligation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default)]
    pub properties: Properties,

    /// Empty for policy classes, at least one entry otherwise.
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDef {
    pub child: String,
    pub parent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationDef {
    pub source: String,
    pub target: String,
    pub operations: OperationSet,
}

impl PolicyFile {
    /// Read and parse a policy file. The format follows the extension.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let policy: Self = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        };

        policy.config.validate().context("invalid [config]")?;
        Ok(policy)
    }

    /// Build an engine over a fresh in-memory store and load the policy
    /// into it as the super user.
    pub fn load(&self) -> anyhow::Result<Pdp> {
        let pdp = Pdp::from_config(Arc::new(MemPolicyStore::new()), &self.config)
            .context("failed to set up the engine")?;

        let super_user = UserContext::new(self.config.super_policy.super_user.as_str());
        pdp.with_user(super_user)
            .run_tx(&mut |tx| self.apply(tx))
            .context("failed to load policy")?;

        log::info!(
            "loaded {} nodes, {} associations, {} prohibitions, {} obligations",
            self.nodes.len(),
            self.associations.len(),
            self.prohibitions.len(),
            self.obligations.len()
        );
        Ok(pdp)
    }

    fn apply(&self, store: &dyn PolicyStore) -> Result<()> {
        let graph = store.graph();
        for node in &self.nodes {
            if node.node_type == NodeType::PC {
                graph.create_policy_class(&node.name, node.properties.clone())?;
                continue;
            }
            let (parent, additional) = node
                .parents
                .split_first()
                .ok_or_else(|| Error::Config(format!("node {} has no parents", node.name)))?;
            graph.create_node(
                &node.name,
                node.node_type,
                node.properties.clone(),
                parent,
                additional,
            )?;
        }

        for assignment in &self.assignments {
            graph.assign(&assignment.child, &assignment.parent)?;
        }
        for association in &self.associations {
            graph.associate(
                &association.source,
                &association.target,
                association.operations.clone(),
            )?;
        }

        let prohibitions = store.prohibitions();
        for prohibition in &self.prohibitions {
            prohibitions.add(prohibition.clone())?;
        }

        let obligations = store.obligations();
        for obligation in &self.obligations {
            obligations.add(obligation.clone(), obligation.enabled)?;
        }
        Ok(())
    }
}
