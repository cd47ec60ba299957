//! Prohibition store trait.

use crate::error::Result;
use crate::model::Prohibition;

/// Storage for prohibitions, indexed by name and by subject.
pub trait Prohibitions: Send + Sync {
    /// Add a prohibition. Fails with `ProhibitionError::Exists` if the name
    /// is taken.
    fn add(&self, prohibition: Prohibition) -> Result<()>;

    /// Every prohibition, ordered by name.
    fn get_all(&self) -> Result<Vec<Prohibition>>;

    fn exists(&self, name: &str) -> Result<bool>;

    /// The prohibition with the given name, or `ProhibitionError::NotFound`.
    fn get(&self, name: &str) -> Result<Prohibition>;

    /// Prohibitions whose subject key (node name or process id) is `subject`.
    fn prohibitions_for(&self, subject: &str) -> Result<Vec<Prohibition>>;

    /// Replace the prohibition stored under `name`. The replacement may
    /// carry a different name.
    fn update(&self, name: &str, prohibition: Prohibition) -> Result<()>;

    /// Delete a prohibition. Missing names are ignored.
    fn remove(&self, name: &str) -> Result<()>;
}
