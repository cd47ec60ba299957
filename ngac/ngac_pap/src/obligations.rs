//! Administrative obligation layer.

use std::collections::HashSet;
use std::sync::Arc;

use ngac_core::error::{ObligationError, Result};
use ngac_core::model::{NodeType, Obligation};
use ngac_core::traits::{Graph, Obligations};

/// Validates obligations before they reach the underlying store.
pub struct ObligationsAdmin {
    obligations: Arc<dyn Obligations>,
    graph: Arc<dyn Graph>,
}

impl ObligationsAdmin {
    pub fn new(obligations: Arc<dyn Obligations>, graph: Arc<dyn Graph>) -> Self {
        Self { obligations, graph }
    }

    fn check(&self, obligation: &Obligation) -> Result<()> {
        if obligation.label.is_empty() {
            return Err(ObligationError::Invalid("label cannot be empty".into()).into());
        }

        let user = self.graph.node(&obligation.user)?;
        if user.node_type != NodeType::U {
            return Err(ObligationError::Invalid(format!(
                "defining user {} is a {}, expected a user",
                user.name, user.node_type
            ))
            .into());
        }

        let mut labels = HashSet::new();
        for rule in &obligation.rules {
            if rule.label.is_empty() {
                return Err(ObligationError::Invalid(format!(
                    "{} has a rule without a label",
                    obligation.label
                ))
                .into());
            }
            if !labels.insert(rule.label.as_str()) {
                return Err(ObligationError::Invalid(format!(
                    "{} has two rules labelled {}",
                    obligation.label, rule.label
                ))
                .into());
            }
        }
        Ok(())
    }

    fn ensure_found(&self, label: &str) -> Result<()> {
        self.obligations.get(label).map(|_| ())
    }
}

impl Obligations for ObligationsAdmin {
    fn add(&self, obligation: Obligation, enable: bool) -> Result<()> {
        self.check(&obligation)?;
        self.obligations.add(obligation, enable)
    }

    fn get(&self, label: &str) -> Result<Obligation> {
        self.obligations.get(label)
    }

    fn update(&self, label: &str, obligation: Obligation) -> Result<()> {
        self.ensure_found(label)?;
        self.check(&obligation)?;
        self.obligations.update(label, obligation)
    }

    fn remove(&self, label: &str) -> Result<()> {
        self.ensure_found(label)?;
        self.obligations.remove(label)
    }

    fn get_all(&self) -> Result<Vec<Obligation>> {
        self.obligations.get_all()
    }

    fn set_enable(&self, label: &str, enabled: bool) -> Result<()> {
        self.ensure_found(label)?;
        self.obligations.set_enable(label, enabled)
    }
}
