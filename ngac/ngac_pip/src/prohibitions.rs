//! In-memory prohibition store.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};

use ngac_core::error::{ProhibitionError, Result};
use ngac_core::log_event;
use ngac_core::model::Prohibition;
use ngac_core::traits::Prohibitions;
use ngac_core::utils::LogLevel;

#[derive(Debug, Default)]
struct ProhibitionState {
    /// Prohibitions by name.
    by_name: BTreeMap<String, Prohibition>,
    /// Prohibition names by subject key.
    by_subject: HashMap<String, HashSet<String>>,
}

impl ProhibitionState {
    fn insert(&mut self, prohibition: Prohibition) {
        self.by_subject
            .entry(prohibition.subject.key().to_string())
            .or_default()
            .insert(prohibition.name.clone());
        self.by_name.insert(prohibition.name.clone(), prohibition);
    }

    fn take(&mut self, name: &str) -> Option<Prohibition> {
        let prohibition = self.by_name.remove(name)?;
        let key = prohibition.subject.key();
        if let Some(names) = self.by_subject.get_mut(key) {
            names.remove(name);
            if names.is_empty() {
                self.by_subject.remove(key);
            }
        }
        Some(prohibition)
    }
}

/// Prohibitions held in memory, indexed by name and by subject.
#[derive(Debug, Default)]
pub struct MemProhibitions {
    state: RwLock<ProhibitionState>,
}

impl MemProhibitions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prohibitions for MemProhibitions {
    fn add(&self, prohibition: Prohibition) -> Result<()> {
        let mut state = self.state.write();
        if state.by_name.contains_key(&prohibition.name) {
            return Err(ProhibitionError::Exists(prohibition.name).into());
        }
        log_event!(LogLevel::Debug, "prohibition added",
            name => prohibition.name,
            subject => prohibition.subject,
        );
        state.insert(prohibition);
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Prohibition>> {
        Ok(self.state.read().by_name.values().cloned().collect())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.read().by_name.contains_key(name))
    }

    fn get(&self, name: &str) -> Result<Prohibition> {
        self.state
            .read()
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| ProhibitionError::NotFound(name.to_string()).into())
    }

    fn prohibitions_for(&self, subject: &str) -> Result<Vec<Prohibition>> {
        let state = self.state.read();
        let mut found: Vec<Prohibition> = state
            .by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .filter_map(|name| state.by_name.get(name).cloned())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    fn update(&self, name: &str, prohibition: Prohibition) -> Result<()> {
        let mut state = self.state.write();
        if !state.by_name.contains_key(name) {
            return Err(ProhibitionError::NotFound(name.to_string()).into());
        }
        if prohibition.name != name && state.by_name.contains_key(&prohibition.name) {
            return Err(ProhibitionError::Exists(prohibition.name).into());
        }
        state.take(name);
        state.insert(prohibition);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        if self.state.write().take(name).is_some() {
            log_event!(LogLevel::Debug, "prohibition removed", name => name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngac_core::error::Error;
    use ngac_core::model::{OperationSet, ProhibitionSubject};

    fn deny(name: &str, subject: &str) -> Prohibition {
        Prohibition::builder(name, ProhibitionSubject::Node(subject.into()))
            .operations(OperationSet::from(["write"]))
            .container("oa1", false)
            .build()
    }

    #[test]
    fn test_add_get_and_index() {
        let store = MemProhibitions::new();
        store.add(deny("p1", "u1")).unwrap();
        store.add(deny("p2", "u1")).unwrap();
        store.add(deny("p3", "ua1")).unwrap();

        assert_eq!(store.get("p1").unwrap().subject.key(), "u1");
        let for_u1: Vec<String> = store
            .prohibitions_for("u1")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(for_u1, vec!["p1", "p2"]);
        assert_eq!(store.get_all().unwrap().len(), 3);

        assert!(matches!(
            store.add(deny("p1", "u2")),
            Err(Error::Prohibition(ProhibitionError::Exists(_)))
        ));
    }

    #[test]
    fn test_update_reindexes_subject() {
        let store = MemProhibitions::new();
        store.add(deny("p1", "u1")).unwrap();

        store.update("p1", deny("p1", "u2")).unwrap();
        assert!(store.prohibitions_for("u1").unwrap().is_empty());
        assert_eq!(store.prohibitions_for("u2").unwrap().len(), 1);

        store.update("p1", deny("renamed", "u2")).unwrap();
        assert!(!store.exists("p1").unwrap());
        assert!(store.exists("renamed").unwrap());

        assert!(matches!(
            store.update("p1", deny("p1", "u1")),
            Err(Error::Prohibition(ProhibitionError::NotFound(_)))
        ));
    }

    #[test]
    fn test_remove() {
        let store = MemProhibitions::new();
        store.add(deny("p1", "u1")).unwrap();
        store.remove("p1").unwrap();
        assert!(store.get("p1").is_err());
        assert!(store.prohibitions_for("u1").unwrap().is_empty());
        store.remove("p1").unwrap();
    }
}
