//! Super policy bootstrap.
//!
//! The super policy gives one user, the super user, every permission on
//! every node. It consists of:
//!
//! ```text
//! super_pc
//! ├── super_ua1 ── * ──> super_oa
//! │     └── super                └── <pc>_rep (one per policy class)
//! ├── super_ua2 ── * ──> super_ua1
//! │     └── super
//! └── super_oa
//! ```
//!
//! Every other policy class gets a default user attribute and object
//! attribute, on which `super_ua1` is granted `*`.

use ngac_core::config::{default_oa_name, default_ua_name, rep_name};
use ngac_core::error::Result;
use ngac_core::log_event;
use ngac_core::model::{props, NodeType, OperationSet, Properties};
use ngac_core::traits::Graph;
use ngac_core::utils::LogLevel;
use ngac_core::SuperPolicyConfig;

/// Creates and repairs the super policy.
#[derive(Debug, Clone)]
pub struct SuperPolicy {
    config: SuperPolicyConfig,
}

impl SuperPolicy {
    pub fn new(config: SuperPolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuperPolicyConfig {
        &self.config
    }

    /// Create whatever part of the super policy is missing.
    ///
    /// Running it on a graph that already holds the super policy changes
    /// nothing.
    pub fn configure(&self, graph: &dyn Graph) -> Result<()> {
        let c = &self.config;

        if !graph.exists(&c.super_pc)? {
            graph.create_policy_class(&c.super_pc, Properties::new())?;
        }
        ensure_node(graph, &c.super_ua1, NodeType::UA, &c.super_pc, Properties::new())?;
        ensure_node(graph, &c.super_ua2, NodeType::UA, &c.super_pc, Properties::new())?;
        ensure_node(graph, &c.super_user, NodeType::U, &c.super_ua1, Properties::new())?;
        ensure_assigned(graph, &c.super_user, &c.super_ua2)?;
        ensure_node(graph, &c.super_oa, NodeType::OA, &c.super_pc, Properties::new())?;
        ensure_node(
            graph,
            &c.super_pc_rep(),
            NodeType::OA,
            &c.super_oa,
            props([("pc", c.super_pc.as_str())]),
        )?;

        ensure_associated(graph, &c.super_ua1, &c.super_oa)?;
        ensure_associated(graph, &c.super_ua2, &c.super_ua1)?;

        let mut pcs: Vec<String> = graph.policy_classes()?.into_iter().collect();
        pcs.sort();
        for pc in pcs.iter().filter(|pc| **pc != c.super_pc) {
            self.configure_policy_class(graph, pc)?;
        }

        log_event!(LogLevel::Debug, "super policy configured",
            super_user => c.super_user,
            policy_classes => pcs.len(),
        );
        Ok(())
    }

    /// Create whatever part of the default and rep structure of `pc` is
    /// missing.
    pub fn configure_policy_class(&self, graph: &dyn Graph, pc: &str) -> Result<()> {
        let c = &self.config;
        let default_ua = default_ua_name(pc);
        let default_oa = default_oa_name(pc);

        ensure_node(graph, &default_ua, NodeType::UA, pc, Properties::new())?;
        ensure_node(graph, &default_oa, NodeType::OA, pc, Properties::new())?;
        ensure_node(graph, &rep_name(pc), NodeType::OA, &c.super_oa, props([("pc", pc)]))?;
        ensure_associated(graph, &c.super_ua1, &default_ua)?;
        ensure_associated(graph, &c.super_ua1, &default_oa)?;
        Ok(())
    }
}

fn ensure_node(
    graph: &dyn Graph,
    name: &str,
    node_type: NodeType,
    parent: &str,
    properties: Properties,
) -> Result<()> {
    if graph.exists(name)? {
        return ensure_assigned(graph, name, parent);
    }
    graph.create_node(name, node_type, properties, parent, &[])?;
    Ok(())
}

fn ensure_assigned(graph: &dyn Graph, child: &str, parent: &str) -> Result<()> {
    if !graph.is_assigned(child, parent)? {
        graph.assign(child, parent)?;
    }
    Ok(())
}

fn ensure_associated(graph: &dyn Graph, ua: &str, target: &str) -> Result<()> {
    let all = OperationSet::all();
    if graph.source_associations(ua)?.get(target) != Some(&all) {
        graph.associate(ua, target, all)?;
    }
    Ok(())
}
