//! Buffered transaction commands.

use ngac_core::error::Result;
use ngac_core::model::{NodeType, Obligation, OperationSet, Prohibition, Properties};
use ngac_core::traits::{Graph, Obligations, Prohibitions};

/// A mutation recorded by a transaction, replayed against the backing
/// stores on commit.
#[derive(Debug, Clone)]
pub enum TxCommand {
    CreatePolicyClass {
        name: String,
        properties: Properties,
    },
    CreateNode {
        name: String,
        node_type: NodeType,
        properties: Properties,
        initial_parent: String,
        additional_parents: Vec<String>,
    },
    UpdateNode {
        name: String,
        properties: Properties,
    },
    RemoveNode {
        name: String,
    },
    Assign {
        child: String,
        parent: String,
    },
    Deassign {
        child: String,
        parent: String,
    },
    Associate {
        ua: String,
        target: String,
        operations: OperationSet,
    },
    Dissociate {
        ua: String,
        target: String,
    },
    AddProhibition(Prohibition),
    UpdateProhibition {
        name: String,
        prohibition: Prohibition,
    },
    RemoveProhibition {
        name: String,
    },
    AddObligation {
        obligation: Obligation,
        enable: bool,
    },
    UpdateObligation {
        label: String,
        obligation: Obligation,
    },
    RemoveObligation {
        label: String,
    },
    SetEnable {
        label: String,
        enabled: bool,
    },
}

impl TxCommand {
    /// Apply the command to the backing stores.
    pub fn apply(
        &self,
        graph: &dyn Graph,
        prohibitions: &dyn Prohibitions,
        obligations: &dyn Obligations,
    ) -> Result<()> {
        match self {
            Self::CreatePolicyClass { name, properties } => {
                graph.create_policy_class(name, properties.clone())?;
            }
            Self::CreateNode {
                name,
                node_type,
                properties,
                initial_parent,
                additional_parents,
            } => {
                graph.create_node(
                    name,
                    *node_type,
                    properties.clone(),
                    initial_parent,
                    additional_parents,
                )?;
            }
            Self::UpdateNode { name, properties } => {
                graph.update_node(name, properties.clone())?
            }
            Self::RemoveNode { name } => graph.remove_node(name)?,
            Self::Assign { child, parent } => graph.assign(child, parent)?,
            Self::Deassign { child, parent } => graph.deassign(child, parent)?,
            Self::Associate {
                ua,
                target,
                operations,
            } => graph.associate(ua, target, operations.clone())?,
            Self::Dissociate { ua, target } => graph.dissociate(ua, target)?,
            Self::AddProhibition(prohibition) => prohibitions.add(prohibition.clone())?,
            Self::UpdateProhibition { name, prohibition } => {
                prohibitions.update(name, prohibition.clone())?
            }
            Self::RemoveProhibition { name } => prohibitions.remove(name)?,
            Self::AddObligation { obligation, enable } => {
                obligations.add(obligation.clone(), *enable)?
            }
            Self::UpdateObligation { label, obligation } => {
                obligations.update(label, obligation.clone())?
            }
            Self::RemoveObligation { label } => obligations.remove(label)?,
            Self::SetEnable { label, enabled } => obligations.set_enable(label, *enabled)?,
        }
        Ok(())
    }
}
