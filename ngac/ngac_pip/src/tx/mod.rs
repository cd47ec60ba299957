//! Transactions over the policy stores.
//!
//! A [`Transaction`] wraps a graph, a prohibition store and an obligation
//! store with overlays that buffer every mutation. Reads see the backing
//! state merged with the buffered changes. All three overlays append to one
//! command log, so [`Transaction::commit`] replays the mutations in the
//! order they were made, whichever store they touched.
//!
//! Commit is not atomic with respect to the backing stores: if a replayed
//! command fails, the commands before it stay applied and the failure is
//! reported as [`TransactionError::Commit`] with the applied count.

mod command;
mod graph;
mod obligations;
mod prohibitions;

pub use command::TxCommand;
pub use graph::TxGraph;
pub use obligations::TxObligations;
pub use prohibitions::TxProhibitions;

use parking_lot::Mutex;
use std::sync::Arc;

use ngac_core::error::{Result, TransactionError};
use ngac_core::id::TxId;
use ngac_core::log_event;
use ngac_core::traits::{Graph, Obligations, PolicyStore, Prohibitions, TxFn};
use ngac_core::utils::LogLevel;

pub(crate) type CommandLog = Arc<Mutex<Vec<TxCommand>>>;

/// The buffered state of one transaction.
///
/// A transaction is itself a [`PolicyStore`]; running a transaction on it
/// runs the body inline.
pub struct Transaction {
    id: TxId,
    graph: Arc<TxGraph>,
    prohibitions: Arc<TxProhibitions>,
    obligations: Arc<TxObligations>,
    log: CommandLog,
    target_graph: Arc<dyn Graph>,
    target_prohibitions: Arc<dyn Prohibitions>,
    target_obligations: Arc<dyn Obligations>,
}

impl Transaction {
    /// Start a transaction over the given stores.
    pub fn begin(
        graph: Arc<dyn Graph>,
        prohibitions: Arc<dyn Prohibitions>,
        obligations: Arc<dyn Obligations>,
    ) -> Self {
        let log: CommandLog = Arc::new(Mutex::new(Vec::new()));
        Self {
            id: TxId::new(),
            graph: Arc::new(TxGraph::new(graph.clone(), log.clone())),
            prohibitions: Arc::new(TxProhibitions::new(prohibitions.clone(), log.clone())),
            obligations: Arc::new(TxObligations::new(obligations.clone(), log.clone())),
            log,
            target_graph: graph,
            target_prohibitions: prohibitions,
            target_obligations: obligations,
        }
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    /// Number of buffered commands.
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Replay the buffered commands against the backing stores.
    pub fn commit(self) -> Result<()> {
        let commands = std::mem::take(&mut *self.log.lock());
        let total = commands.len();

        for (applied, command) in commands.iter().enumerate() {
            if let Err(e) = command.apply(
                self.target_graph.as_ref(),
                self.target_prohibitions.as_ref(),
                self.target_obligations.as_ref(),
            ) {
                log_event!(LogLevel::Warning, "commit failed",
                    tx => self.id,
                    applied => applied,
                    total => total,
                    error => e,
                );
                return Err(TransactionError::Commit {
                    tx: self.id,
                    applied,
                    total,
                    source: Box::new(e),
                }
                .into());
            }
        }

        log_event!(LogLevel::Debug, "transaction committed", tx => self.id, commands => total);
        Ok(())
    }

    /// Discard the buffered commands.
    pub fn rollback(self) {
        log_event!(LogLevel::Debug, "transaction rolled back",
            tx => self.id,
            commands => self.len(),
        );
    }
}

impl PolicyStore for Transaction {
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
        f(self)
    }
}
