//! Policy store trait.

use std::sync::Arc;

use crate::error::Result;
use crate::traits::{Graph, Obligations, Prohibitions};

/// Body of a transaction.
///
/// The closure receives a transactional view of the store it was run on.
/// Returning `Ok` commits every buffered mutation; returning `Err` discards
/// them.
pub type TxFn<'a> = dyn FnMut(&dyn PolicyStore) -> Result<()> + 'a;

/// The three policy stores plus transactions over them.
///
/// Implemented by the in-memory store, the administrative layer and the
/// permission-gated user PDP, so each layer can be stacked on the one
/// below.
pub trait PolicyStore: Send + Sync {
    fn graph(&self) -> Arc<dyn Graph>;

    fn prohibitions(&self) -> Arc<dyn Prohibitions>;

    fn obligations(&self) -> Arc<dyn Obligations>;

    /// Run `f` as one transaction.
    ///
    /// Called on a view already inside a transaction, `f` runs inline and
    /// commits with the enclosing transaction.
    fn run_tx(&self, f: &mut TxFn<'_>) -> Result<()>;
}
