//! Transactional prohibition overlay.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use ngac_core::error::{ProhibitionError, Result};
use ngac_core::model::Prohibition;
use ngac_core::traits::Prohibitions;

use super::{CommandLog, TxCommand};

#[derive(Debug, Default)]
struct Overlay {
    /// Prohibitions added or replaced in the transaction.
    local: BTreeMap<String, Prohibition>,
    /// Names removed in the transaction.
    removed: HashSet<String>,
}

/// Prohibitions that buffer mutations over a backing store.
pub struct TxProhibitions {
    target: Arc<dyn Prohibitions>,
    overlay: Mutex<Overlay>,
    log: CommandLog,
}

impl TxProhibitions {
    pub(crate) fn new(target: Arc<dyn Prohibitions>, log: CommandLog) -> Self {
        Self {
            target,
            overlay: Mutex::new(Overlay::default()),
            log,
        }
    }

    fn exists_in(&self, ov: &Overlay, name: &str) -> Result<bool> {
        if ov.local.contains_key(name) {
            return Ok(true);
        }
        if ov.removed.contains(name) {
            return Ok(false);
        }
        self.target.exists(name)
    }
}

impl Prohibitions for TxProhibitions {
    fn add(&self, prohibition: Prohibition) -> Result<()> {
        let mut ov = self.overlay.lock();
        if self.exists_in(&ov, &prohibition.name)? {
            return Err(ProhibitionError::Exists(prohibition.name).into());
        }
        ov.local
            .insert(prohibition.name.clone(), prohibition.clone());
        self.log.lock().push(TxCommand::AddProhibition(prohibition));
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Prohibition>> {
        let ov = self.overlay.lock();
        let mut all: BTreeMap<String, Prohibition> = self
            .target
            .get_all()?
            .into_iter()
            .filter(|p| !ov.removed.contains(&p.name))
            .map(|p| (p.name.clone(), p))
            .collect();
        all.extend(ov.local.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(all.into_values().collect())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        let ov = self.overlay.lock();
        self.exists_in(&ov, name)
    }

    fn get(&self, name: &str) -> Result<Prohibition> {
        let ov = self.overlay.lock();
        if let Some(prohibition) = ov.local.get(name) {
            return Ok(prohibition.clone());
        }
        if ov.removed.contains(name) {
            return Err(ProhibitionError::NotFound(name.to_string()).into());
        }
        self.target.get(name)
    }

    fn prohibitions_for(&self, subject: &str) -> Result<Vec<Prohibition>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|p| p.subject.key() == subject)
            .collect())
    }

    fn update(&self, name: &str, prohibition: Prohibition) -> Result<()> {
        let mut ov = self.overlay.lock();
        if !self.exists_in(&ov, name)? {
            return Err(ProhibitionError::NotFound(name.to_string()).into());
        }
        if prohibition.name != name && self.exists_in(&ov, &prohibition.name)? {
            return Err(ProhibitionError::Exists(prohibition.name).into());
        }

        if prohibition.name != name {
            ov.local.remove(name);
            ov.removed.insert(name.to_string());
        }
        ov.local
            .insert(prohibition.name.clone(), prohibition.clone());
        self.log.lock().push(TxCommand::UpdateProhibition {
            name: name.to_string(),
            prohibition,
        });
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut ov = self.overlay.lock();
        ov.local.remove(name);
        ov.removed.insert(name.to_string());
        self.log.lock().push(TxCommand::RemoveProhibition {
            name: name.to_string(),
        });
        Ok(())
    }
}
