//! Transactional obligation overlay.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ngac_core::error::{ObligationError, Result};
use ngac_core::model::Obligation;
use ngac_core::traits::Obligations;

use super::{CommandLog, TxCommand};

#[derive(Debug, Default)]
struct Overlay {
    /// Obligations added or replaced in the transaction.
    local: HashMap<String, Obligation>,
    /// Labels added in the transaction, in order.
    added: Vec<String>,
    /// Labels removed in the transaction.
    removed: HashSet<String>,
}

/// Obligations that buffer mutations over a backing store.
pub struct TxObligations {
    target: Arc<dyn Obligations>,
    overlay: Mutex<Overlay>,
    log: CommandLog,
}

impl TxObligations {
    pub(crate) fn new(target: Arc<dyn Obligations>, log: CommandLog) -> Self {
        Self {
            target,
            overlay: Mutex::new(Overlay::default()),
            log,
        }
    }

    fn get_in(&self, ov: &Overlay, label: &str) -> Result<Option<Obligation>> {
        if let Some(obligation) = ov.local.get(label) {
            return Ok(Some(obligation.clone()));
        }
        if ov.removed.contains(label) {
            return Ok(None);
        }
        match self.target.get(label) {
            Ok(obligation) => Ok(Some(obligation)),
            Err(ngac_core::Error::Obligation(ObligationError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, ov: &mut Overlay, obligation: Obligation) {
        ov.removed.remove(&obligation.label);
        ov.local.insert(obligation.label.clone(), obligation);
    }
}

impl Obligations for TxObligations {
    fn add(&self, mut obligation: Obligation, enable: bool) -> Result<()> {
        let mut ov = self.overlay.lock();
        if self.get_in(&ov, &obligation.label)?.is_some() {
            return Err(ObligationError::Exists(obligation.label).into());
        }

        obligation.enabled = enable;
        ov.added.retain(|l| *l != obligation.label);
        ov.added.push(obligation.label.clone());
        self.put(&mut ov, obligation.clone());
        self.log
            .lock()
            .push(TxCommand::AddObligation { obligation, enable });
        Ok(())
    }

    fn get(&self, label: &str) -> Result<Obligation> {
        let ov = self.overlay.lock();
        self.get_in(&ov, label)?
            .ok_or_else(|| ObligationError::NotFound(label.to_string()).into())
    }

    fn update(&self, label: &str, obligation: Obligation) -> Result<()> {
        let mut ov = self.overlay.lock();
        if self.get_in(&ov, label)?.is_none() {
            return Err(ObligationError::NotFound(label.to_string()).into());
        }
        if obligation.label != label && self.get_in(&ov, &obligation.label)?.is_some() {
            return Err(ObligationError::Exists(obligation.label).into());
        }

        if obligation.label != label {
            ov.local.remove(label);
            ov.removed.insert(label.to_string());
            if let Some(slot) = ov.added.iter_mut().find(|l| *l == label) {
                *slot = obligation.label.clone();
            } else {
                ov.added.push(obligation.label.clone());
            }
        }
        self.put(&mut ov, obligation.clone());
        self.log.lock().push(TxCommand::UpdateObligation {
            label: label.to_string(),
            obligation,
        });
        Ok(())
    }

    fn remove(&self, label: &str) -> Result<()> {
        let mut ov = self.overlay.lock();
        ov.local.remove(label);
        ov.added.retain(|l| l != label);
        ov.removed.insert(label.to_string());
        self.log.lock().push(TxCommand::RemoveObligation {
            label: label.to_string(),
        });
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Obligation>> {
        let ov = self.overlay.lock();
        let mut all = Vec::new();
        for obligation in self.target.get_all()? {
            if ov.removed.contains(&obligation.label) && !ov.local.contains_key(&obligation.label) {
                continue;
            }
            if ov.added.contains(&obligation.label) {
                continue;
            }
            match ov.local.get(&obligation.label) {
                Some(local) => all.push(local.clone()),
                None => all.push(obligation),
            }
        }
        all.extend(ov.added.iter().filter_map(|l| ov.local.get(l).cloned()));
        Ok(all)
    }

    fn set_enable(&self, label: &str, enabled: bool) -> Result<()> {
        let mut ov = self.overlay.lock();
        let mut obligation = self
            .get_in(&ov, label)?
            .ok_or_else(|| ObligationError::NotFound(label.to_string()))?;
        obligation.enabled = enabled;
        self.put(&mut ov, obligation);
        self.log.lock().push(TxCommand::SetEnable {
            label: label.to_string(),
            enabled,
        });
        Ok(())
    }
}
