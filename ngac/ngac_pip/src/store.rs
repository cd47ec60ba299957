//! In-memory policy store.

use parking_lot::Mutex;
use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::traits::{Graph, Obligations, PolicyStore, Prohibitions, TxFn};

use crate::graph::MemGraph;
use crate::obligations::MemObligations;
use crate::prohibitions::MemProhibitions;
use crate::tx::Transaction;

/// The three in-memory stores with transactions over them.
///
/// Commits are serialized by an internal lock. Two transactions may still
/// build their buffers against the same state and then commit conflicting
/// commands; running one transaction at a time is the caller's
/// responsibility.
pub struct MemPolicyStore {
    graph: Arc<MemGraph>,
    prohibitions: Arc<MemProhibitions>,
    obligations: Arc<MemObligations>,
    commit_lock: Mutex<()>,
}

impl MemPolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            graph: Arc::new(MemGraph::new()),
            prohibitions: Arc::new(MemProhibitions::new()),
            obligations: Arc::new(MemObligations::new()),
            commit_lock: Mutex::new(()),
        }
    }
}

impl Default for MemPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore for MemPolicyStore {
    fn graph(&self) -> Arc<dyn Graph> {
        self.graph.clone()
    }

    fn prohibitions(&self) -> Arc<dyn Prohibitions> {
        self.prohibitions.clone()
    }

    fn obligations(&self) -> Arc<dyn Obligations> {
        self.obligations.clone()
    }

    fn run_tx(&self, f: &mut TxFn<'_>) -> Result<()> {
        let tx = Transaction::begin(self.graph(), self.prohibitions(), self.obligations());
        match f(&tx) {
            Ok(()) => {
                let _commit = self.commit_lock.lock();
                tx.commit()
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }
}
