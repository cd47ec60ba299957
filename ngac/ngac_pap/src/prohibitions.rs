//! Administrative prohibition layer.

use std::sync::Arc;

use ngac_core::error::{GraphError, ProhibitionError, Result};
use ngac_core::model::{NodeType, Prohibition, ProhibitionSubject};
use ngac_core::traits::{Graph, Prohibitions};

/// Validates prohibitions before they reach the underlying store.
pub struct ProhibitionsAdmin {
    prohibitions: Arc<dyn Prohibitions>,
    graph: Arc<dyn Graph>,
}

impl ProhibitionsAdmin {
    pub fn new(prohibitions: Arc<dyn Prohibitions>, graph: Arc<dyn Graph>) -> Self {
        Self {
            prohibitions,
            graph,
        }
    }

    fn check(&self, prohibition: &Prohibition) -> Result<()> {
        if prohibition.name.is_empty() {
            return Err(ProhibitionError::Invalid("name cannot be empty".into()).into());
        }

        match &prohibition.subject {
            ProhibitionSubject::Node(name) => {
                let node = self.graph.node(name)?;
                if !matches!(node.node_type, NodeType::U | NodeType::UA) {
                    return Err(ProhibitionError::Invalid(format!(
                        "subject {} is a {}, expected a user or user attribute",
                        name, node.node_type
                    ))
                    .into());
                }
            }
            ProhibitionSubject::Process(id) if id.is_empty() => {
                return Err(ProhibitionError::Invalid("process id cannot be empty".into()).into());
            }
            ProhibitionSubject::Process(_) => {}
        }

        for container in prohibition.containers.keys() {
            if !self.graph.exists(container)? {
                return Err(GraphError::NodeNotFound(container.clone()).into());
            }
        }
        Ok(())
    }

    fn ensure_found(&self, name: &str) -> Result<()> {
        if !self.prohibitions.exists(name)? {
            return Err(ProhibitionError::NotFound(name.to_string()).into());
        }
        Ok(())
    }
}

impl Prohibitions for ProhibitionsAdmin {
    fn add(&self, prohibition: Prohibition) -> Result<()> {
        self.check(&prohibition)?;
        if self.prohibitions.exists(&prohibition.name)? {
            return Err(ProhibitionError::Exists(prohibition.name).into());
        }
        self.prohibitions.add(prohibition)
    }

    fn get_all(&self) -> Result<Vec<Prohibition>> {
        self.prohibitions.get_all()
    }

    fn exists(&self, name: &str) -> Result<bool> {
        self.prohibitions.exists(name)
    }

    fn get(&self, name: &str) -> Result<Prohibition> {
        self.prohibitions.get(name)
    }

    fn prohibitions_for(&self, subject: &str) -> Result<Vec<Prohibition>> {
        self.prohibitions.prohibitions_for(subject)
    }

    fn update(&self, name: &str, prohibition: Prohibition) -> Result<()> {
        self.ensure_found(name)?;
        self.check(&prohibition)?;
        if prohibition.name != name && self.prohibitions.exists(&prohibition.name)? {
            return Err(ProhibitionError::Exists(prohibition.name).into());
        }
        self.prohibitions.update(name, prohibition)
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.ensure_found(name)?;
        self.prohibitions.remove(name)
    }
}

