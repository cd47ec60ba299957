//! Permission-gated obligation access.

use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::model::operations::{
    ADD_OBLIGATION, DELETE_OBLIGATION, ENABLE_OBLIGATION, GET_OBLIGATION, UPDATE_OBLIGATION,
};
use ngac_core::model::Obligation;
use ngac_core::traits::Obligations;

use crate::guard::Guard;

/// Obligations, checked against the acting user's operations on the super
/// policy class rep.
///
/// An obligation added or updated through the service is defined by the
/// acting user, whatever `user` it carries.
pub struct ObligationsService {
    obligations: Arc<dyn Obligations>,
    guard: Arc<Guard>,
}

impl ObligationsService {
    pub(crate) fn new(obligations: Arc<dyn Obligations>, guard: Arc<Guard>) -> Self {
        Self { obligations, guard }
    }

    fn check(&self, op: &str) -> Result<()> {
        self.guard.check(self.guard.super_pc_rep(), &[op])
    }

    fn owned(&self, mut obligation: Obligation) -> Obligation {
        obligation.user = self.guard.user().user.clone();
        obligation
    }
}

impl Obligations for ObligationsService {
    fn add(&self, obligation: Obligation, enable: bool) -> Result<()> {
        self.check(ADD_OBLIGATION)?;
        self.obligations.add(self.owned(obligation), enable)
    }

    fn get(&self, label: &str) -> Result<Obligation> {
        self.check(GET_OBLIGATION)?;
        self.obligations.get(label)
    }

    fn update(&self, label: &str, obligation: Obligation) -> Result<()> {
        self.check(UPDATE_OBLIGATION)?;
        self.obligations.update(label, self.owned(obligation))
    }

    fn remove(&self, label: &str) -> Result<()> {
        self.check(DELETE_OBLIGATION)?;
        self.obligations.remove(label)
    }

    fn get_all(&self) -> Result<Vec<Obligation>> {
        self.check(GET_OBLIGATION)?;
        self.obligations.get_all()
    }

    fn set_enable(&self, label: &str, enabled: bool) -> Result<()> {
        self.check(ENABLE_OBLIGATION)?;
        self.obligations.set_enable(label, enabled)
    }
}
