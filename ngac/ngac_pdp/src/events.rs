//! Routing of raised events to the event processor.

use parking_lot::Mutex;
use std::sync::Arc;

use ngac_core::error::Result;
use ngac_core::model::EventContext;

use crate::pdp::Pdp;

/// Events raised inside a transaction, waiting for its commit.
#[derive(Clone, Default)]
pub(crate) struct EventQueue(Arc<Mutex<Vec<EventContext>>>);

impl EventQueue {
    pub(crate) fn push(&self, event: EventContext) {
        self.0.lock().push(event);
    }

    pub(crate) fn drain(&self) -> Vec<EventContext> {
        std::mem::take(&mut *self.0.lock())
    }
}

/// Where the services send the events their mutations raise.
#[derive(Clone)]
pub(crate) enum Dispatch {
    /// Process each event as soon as the mutation succeeds.
    Immediate { pdp: Pdp, depth: usize },

    /// Hold events until the enclosing transaction commits.
    Deferred(EventQueue),
}

impl Dispatch {
    pub(crate) fn emit(&self, event: EventContext) -> Result<()> {
        log::trace!("{} raised {} on {}", event.user, event.name(), event.target.name);
        match self {
            Self::Immediate { pdp, depth } => pdp.process_event(&event, *depth),
            Self::Deferred(queue) => {
                queue.push(event);
                Ok(())
            }
        }
    }
}
