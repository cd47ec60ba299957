//! Policy administration point.

use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::log_event;
use ngac_core::traits::{Graph, Obligations, PolicyStore, Prohibitions, TxFn};
use ngac_core::utils::LogLevel;
use ngac_core::SuperPolicyConfig;

use crate::graph::GraphAdmin;
use crate::obligations::ObligationsAdmin;
use crate::prohibitions::ProhibitionsAdmin;
use crate::super_policy::SuperPolicy;

/// The administrative layers over one view of a policy store.
///
/// Built over a transactional view, its `run_tx` runs inline.
pub struct AdminView {
    graph: Arc<GraphAdmin>,
    prohibitions: Arc<ProhibitionsAdmin>,
    obligations: Arc<ObligationsAdmin>,
}

impl AdminView {
    pub fn new(store: &dyn PolicyStore, super_policy: SuperPolicy) -> Self {
        let graph = store.graph();
        Self {
            graph: Arc::new(GraphAdmin::new(graph.clone(), super_policy)),
            prohibitions: Arc::new(ProhibitionsAdmin::new(store.prohibitions(), graph.clone())),
            obligations: Arc::new(ObligationsAdmin::new(store.obligations(), graph)),
        }
    }
}

impl PolicyStore for AdminView {
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

/// A policy store with the administrative rules enforced and the super
/// policy in place.
pub struct Pap {
    store: Arc<dyn PolicyStore>,
    super_policy: SuperPolicy,
    admin: AdminView,
}

impl Pap {
    /// Wrap `store` and configure the super policy in it.
    ///
    /// # Errors
    ///
    /// `Error::Config` for an invalid super policy configuration, or the
    /// store error that stopped the bootstrap. The bootstrap runs in one
    /// transaction, so a failure leaves the store untouched.
    pub fn new(store: Arc<dyn PolicyStore>, config: SuperPolicyConfig) -> Result<Self> {
        config.validate()?;
        let super_policy = SuperPolicy::new(config);

        store.run_tx(&mut |tx| super_policy.configure(tx.graph().as_ref()))?;
        log_event!(LogLevel::Info, "policy administration point ready",
            super_user => super_policy.config().super_user,
        );

        let admin = AdminView::new(store.as_ref(), super_policy.clone());
        Ok(Self {
            store,
            super_policy,
            admin,
        })
    }

    pub fn super_policy(&self) -> &SuperPolicy {
        &self.super_policy
    }

    /// The store the administrative layers wrap.
    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }
}

impl PolicyStore for Pap {
    fn graph(&self) -> Arc<dyn Graph> {
        self.admin.graph()
    }

    fn prohibitions(&self) -> Arc<dyn Prohibitions> {
        self.admin.prohibitions()
    }

    fn obligations(&self) -> Arc<dyn Obligations> {
        self.admin.obligations()
    }

    fn run_tx(&self, f: &mut TxFn<'_>) -> Result<()> {
        let super_policy = &self.super_policy;
        self.store.run_tx(&mut |tx| {
            let view = AdminView::new(tx, super_policy.clone());
            f(&view)
        })
    }
}
