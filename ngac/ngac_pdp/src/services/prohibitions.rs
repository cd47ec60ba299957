//! Permission-gated prohibition access.

use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::model::operations::{
    CREATE_PROHIBITION, DELETE_PROHIBITION, UPDATE_PROHIBITION, VIEW_PROHIBITION,
};
use ngac_core::model::Prohibition;
use ngac_core::traits::Prohibitions;

use crate::guard::Guard;

/// Prohibitions the acting user may only touch where it holds the
/// matching admin operation on the subject and every container.
pub struct ProhibitionsService {
    prohibitions: Arc<dyn Prohibitions>,
    guard: Arc<Guard>,
}

impl ProhibitionsService {
    pub(crate) fn new(prohibitions: Arc<dyn Prohibitions>, guard: Arc<Guard>) -> Self {
        Self {
            prohibitions,
            guard,
        }
    }

    fn can_view(&self, prohibition: &Prohibition) -> bool {
        self.guard
            .check_prohibition(prohibition, VIEW_PROHIBITION)
            .is_ok()
    }

    fn viewable(&self, prohibitions: Vec<Prohibition>) -> Vec<Prohibition> {
        prohibitions
            .into_iter()
            .filter(|p| self.can_view(p))
            .collect()
    }
}

impl Prohibitions for ProhibitionsService {
    fn add(&self, prohibition: Prohibition) -> Result<()> {
        self.guard
            .check_prohibition(&prohibition, CREATE_PROHIBITION)?;
        self.prohibitions.add(prohibition)
    }

    fn get_all(&self) -> Result<Vec<Prohibition>> {
        Ok(self.viewable(self.prohibitions.get_all()?))
    }

    fn exists(&self, name: &str) -> Result<bool> {
        if !self.prohibitions.exists(name)? {
            return Ok(false);
        }
        Ok(self.can_view(&self.prohibitions.get(name)?))
    }

    fn get(&self, name: &str) -> Result<Prohibition> {
        let prohibition = self.prohibitions.get(name)?;
        self.guard
            .check_prohibition(&prohibition, VIEW_PROHIBITION)?;
        Ok(prohibition)
    }

    fn prohibitions_for(&self, subject: &str) -> Result<Vec<Prohibition>> {
        Ok(self.viewable(self.prohibitions.prohibitions_for(subject)?))
    }

    fn update(&self, name: &str, prohibition: Prohibition) -> Result<()> {
        let current = self.prohibitions.get(name)?;
        self.guard
            .check_prohibition(&current, UPDATE_PROHIBITION)?;
        self.guard
            .check_prohibition(&prohibition, UPDATE_PROHIBITION)?;
        self.prohibitions.update(name, prohibition)
    }

    fn remove(&self, name: &str) -> Result<()> {
        let current = self.prohibitions.get(name)?;
        self.guard
            .check_prohibition(&current, DELETE_PROHIBITION)?;
        self.prohibitions.remove(name)
    }
}
