//! In-memory obligation store.

use parking_lot::RwLock;

use ngac_core::error::{ObligationError, Result};
use ngac_core::log_event;
use ngac_core::model::Obligation;
use ngac_core::traits::Obligations;
use ngac_core::utils::LogLevel;

/// Obligations held in memory, in the order they were added.
#[derive(Debug, Default)]
pub struct MemObligations {
    obligations: RwLock<Vec<Obligation>>,
}

impl MemObligations {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Obligations for MemObligations {
    fn add(&self, mut obligation: Obligation, enable: bool) -> Result<()> {
        let mut obligations = self.obligations.write();
        if obligations.iter().any(|o| o.label == obligation.label) {
            return Err(ObligationError::Exists(obligation.label).into());
        }
        obligation.enabled = enable;
        log_event!(LogLevel::Debug, "obligation added",
            label => obligation.label,
            user => obligation.user,
            rules => obligation.rules.len(),
        );
        obligations.push(obligation);
        Ok(())
    }

    fn get(&self, label: &str) -> Result<Obligation> {
        self.obligations
            .read()
            .iter()
            .find(|o| o.label == label)
            .cloned()
            .ok_or_else(|| ObligationError::NotFound(label.to_string()).into())
    }

    fn update(&self, label: &str, obligation: Obligation) -> Result<()> {
        let mut obligations = self.obligations.write();
        if obligation.label != label && obligations.iter().any(|o| o.label == obligation.label)
        {
            return Err(ObligationError::Exists(obligation.label).into());
        }
        let slot = obligations
            .iter_mut()
            .find(|o| o.label == label)
            .ok_or_else(|| ObligationError::NotFound(label.to_string()))?;
        *slot = obligation;
        Ok(())
    }

    fn remove(&self, label: &str) -> Result<()> {
        self.obligations.write().retain(|o| o.label != label);
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Obligation>> {
        Ok(self.obligations.read().clone())
    }

    fn set_enable(&self, label: &str, enabled: bool) -> Result<()> {
        let mut obligations = self.obligations.write();
        let obligation = obligations
            .iter_mut()
            .find(|o| o.label == label)
            .ok_or_else(|| ObligationError::NotFound(label.to_string()))?;
        obligation.enabled = enabled;
        Ok(())
    }
}
