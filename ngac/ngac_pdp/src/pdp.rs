//! Policy decision point.

use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::log_event;
use ngac_core::model::{Event, EventContext, OperationSet, UserContext};
use ngac_core::traits::{Graph, Obligations, PolicyStore, Prohibitions, TxFn};
use ngac_core::utils::LogLevel;
use ngac_core::NgacConfig;
use ngac_decider::{PReviewAuditor, PReviewDecider};
use ngac_pap::Pap;

use crate::epp::{EppOptions, EventProcessor};
use crate::events::{Dispatch, EventQueue};
use crate::guard::Guard;
use crate::services::ServiceView;

struct PdpInner {
    pap: Pap,
    resource_ops: OperationSet,
    epp: EventProcessor,
}

/// Entry point for permission-checked access to a policy.
///
/// Cloning is cheap; clones share the same stores and event processor.
#[derive(Clone)]
pub struct Pdp {
    inner: Arc<PdpInner>,
}

impl Pdp {
    /// Create a decision point over `pap`.
    ///
    /// # Arguments
    ///
    /// * `pap` - The administered policy store.
    /// * `resource_ops` - The operations `*r` expands to.
    /// * `options` - Event processing configuration and extra functions.
    pub fn new(pap: Pap, resource_ops: OperationSet, options: EppOptions) -> Self {
        Self {
            inner: Arc::new(PdpInner {
                pap,
                resource_ops,
                epp: EventProcessor::new(options),
            }),
        }
    }

    /// Bootstrap the administration point over `store` and build a decision
    /// point from `config`.
    pub fn from_config(store: Arc<dyn PolicyStore>, config: &NgacConfig) -> Result<Self> {
        config.validate()?;
        let pap = Pap::new(store, config.super_policy.clone())?;
        let options = EppOptions::new(config.epp.clone());
        Ok(Self::new(pap, config.resource_ops(), options))
    }

    pub fn pap(&self) -> &Pap {
        &self.inner.pap
    }

    /// The operations `*r` expands to.
    pub fn resource_ops(&self) -> &OperationSet {
        &self.inner.resource_ops
    }

    pub fn epp(&self) -> &EventProcessor {
        &self.inner.epp
    }

    /// A decider over the committed policy.
    pub fn decider(&self) -> PReviewDecider {
        PReviewDecider::new(
            self.pap().graph(),
            self.pap().prohibitions(),
            self.resource_ops().clone(),
        )
    }

    /// An auditor over the committed policy.
    pub fn auditor(&self) -> PReviewAuditor {
        PReviewAuditor::new(
            self.pap().graph(),
            self.pap().prohibitions(),
            self.resource_ops().clone(),
        )
    }

    /// A view of the policy acting as `user`.
    pub fn with_user(&self, user: UserContext) -> UserPdp {
        self.at_depth(user, 0)
    }

    pub(crate) fn at_depth(&self, user: UserContext, depth: usize) -> UserPdp {
        UserPdp {
            pdp: self.clone(),
            user,
            depth,
        }
    }

    pub(crate) fn process_event(&self, event: &EventContext, depth: usize) -> Result<()> {
        self.inner.epp.process_event(self, event, depth)
    }
}

/// The policy as seen by one user.
///
/// Every call is checked against the user's permissions. Mutations made
/// outside a transaction raise their events immediately; mutations made
/// in [`run_tx`](PolicyStore::run_tx) raise theirs only once the
/// transaction commits.
#[derive(Clone)]
pub struct UserPdp {
    pdp: Pdp,
    user: UserContext,
    depth: usize,
}

impl UserPdp {
    pub fn user(&self) -> &UserContext {
        &self.user
    }

    fn view(&self, store: &dyn PolicyStore, dispatch: Dispatch) -> ServiceView {
        ServiceView::new(
            store,
            self.user.clone(),
            self.pdp.resource_ops().clone(),
            self.pdp.pap().super_policy().config(),
            dispatch,
        )
    }

    fn immediate(&self) -> ServiceView {
        self.view(
            self.pdp.pap(),
            Dispatch::Immediate {
                pdp: self.pdp.clone(),
                depth: self.depth,
            },
        )
    }

    /// Access `target` with the resource operation `operation`.
    ///
    /// Fails with `AuthorizationError::Denied` unless the user holds the
    /// operation; on success raises an object access event.
    pub fn access(&self, target: &str, operation: &str) -> Result<()> {
        let pap = self.pdp.pap();
        let graph = pap.graph();
        let node = graph.node(target)?;

        let guard = Guard::new(
            self.user.clone(),
            graph,
            pap.prohibitions(),
            self.pdp.resource_ops().clone(),
            pap.super_policy().config(),
        );
        guard.check(target, &[operation])?;

        log_event!(LogLevel::Debug, "object accessed",
            user => self.user,
            target => target,
            operation => operation,
        );
        let event = EventContext::new(
            self.user.clone(),
            node,
            Event::ObjectAccess {
                operation: operation.to_string(),
            },
        );
        self.pdp.process_event(&event, self.depth)
    }
}

impl PolicyStore for UserPdp {
    fn graph(&self) -> Arc<dyn Graph> {
        self.immediate().graph()
    }

    fn prohibitions(&self) -> Arc<dyn Prohibitions> {
        self.immediate().prohibitions()
    }

    fn obligations(&self) -> Arc<dyn Obligations> {
        self.immediate().obligations()
    }

    fn run_tx(&self, f: &mut TxFn<'_>) -> Result<()> {
        let queue = EventQueue::default();
        self.pdp.pap().run_tx(&mut |tx| {
            let view = self.view(tx, Dispatch::Deferred(queue.clone()));
            f(&view)
        })?;

        for event in queue.drain() {
            self.pdp.process_event(&event, self.depth)?;
        }
        Ok(())
    }
}
