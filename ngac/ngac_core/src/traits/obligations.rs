//! Obligation store trait.

use crate::error::Result;
use crate::model::Obligation;

/// Storage for obligations, keyed by label.
pub trait Obligations: Send + Sync {
    /// Add an obligation with the given enabled flag. Fails with
    /// `ObligationError::Exists` if the label is taken.
    fn add(&self, obligation: Obligation, enable: bool) -> Result<()>;

    /// The obligation with the given label, or `ObligationError::NotFound`.
    fn get(&self, label: &str) -> Result<Obligation>;

    /// Replace the obligation stored under `label`.
    fn update(&self, label: &str, obligation: Obligation) -> Result<()>;

    /// Delete an obligation. Missing labels are ignored.
    fn remove(&self, label: &str) -> Result<()>;

    /// Every obligation in the order they were added.
    fn get_all(&self) -> Result<Vec<Obligation>>;

    fn set_enable(&self, label: &str, enabled: bool) -> Result<()>;

    /// Enabled obligations in the order they were added.
    fn get_enabled(&self) -> Result<Vec<Obligation>> {
        Ok(self.get_all()?.into_iter().filter(|o| o.enabled).collect())
    }
}
