//! Permission-gated views of the policy stores.
//!
//! Each service wraps the administrative layer of one store view and
//! checks the acting user's permissions before delegating. A denied call
//! changes nothing and raises no event.

mod graph;
mod obligations;
mod prohibitions;

pub use graph::GraphService;
pub use obligations::ObligationsService;
pub use prohibitions::ProhibitionsService;

use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::model::{OperationSet, UserContext};
use ngac_core::traits::{Graph, Obligations, PolicyStore, Prohibitions, TxFn};
use ngac_core::SuperPolicyConfig;

use crate::events::Dispatch;
use crate::guard::Guard;

/// The three services over one store view, acting as one user.
///
/// Built over a transactional view, its `run_tx` runs inline.
pub struct ServiceView {
    graph: Arc<GraphService>,
    prohibitions: Arc<ProhibitionsService>,
    obligations: Arc<ObligationsService>,
}

impl ServiceView {
    pub(crate) fn new(
        store: &dyn PolicyStore,
        user: UserContext,
        resource_ops: OperationSet,
        super_policy: &SuperPolicyConfig,
        dispatch: Dispatch,
    ) -> Self {
        let graph = store.graph();
        let prohibitions = store.prohibitions();
        let guard = Arc::new(Guard::new(
            user,
            graph.clone(),
            prohibitions.clone(),
            resource_ops,
            super_policy,
        ));

        Self {
            graph: Arc::new(GraphService::new(graph, guard.clone(), dispatch)),
            prohibitions: Arc::new(ProhibitionsService::new(prohibitions, guard.clone())),
            obligations: Arc::new(ObligationsService::new(store.obligations(), guard)),
        }
    }
}

impl PolicyStore for ServiceView {
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
