//! Policy events.
//!
//! Successful mutations raise an [`EventContext`] describing who did what
//! to which node. The event processor matches these against obligation
//! rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::EventId;
use crate::model::{operations, Node, OperationSet, UserContext};

/// The closed set of events the engine raises.
///
/// Every event is raised on a target node; the variants carry the other
/// end of the edge where there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// The target (child) was assigned to `parent`.
    Assign { parent: Node },

    /// `child` was assigned to the target (parent).
    AssignTo { child: Node },

    /// The target (child) was deassigned from `parent`.
    Deassign { parent: Node },

    /// `child` was deassigned from the target (parent).
    DeassignFrom { child: Node },

    /// The target was created in `parents`.
    CreateNode { parents: Vec<String> },

    /// The target was deleted.
    DeleteNode,

    /// `source` was granted `operations` on the target.
    Associate {
        source: Node,
        operations: OperationSet,
    },

    /// The association from `source` to the target was removed.
    Dissociate { source: Node },

    /// The target was accessed with a resource operation.
    ObjectAccess { operation: String },
}

impl Event {
    /// The event name obligation patterns match against.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Assign { .. } => operations::ASSIGN,
            Self::AssignTo { .. } => operations::ASSIGN_TO,
            Self::Deassign { .. } => operations::DEASSIGN,
            Self::DeassignFrom { .. } => operations::DEASSIGN_FROM,
            Self::CreateNode { .. } => operations::CREATE_NODE,
            Self::DeleteNode => operations::DELETE_NODE,
            Self::Associate { .. } => operations::ASSOCIATE,
            Self::Dissociate { .. } => operations::DISSOCIATE,
            Self::ObjectAccess { .. } => operations::OBJECT_ACCESS,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event together with who raised it, where, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub id: EventId,
    pub user: UserContext,
    pub target: Node,
    pub event: Event,
    pub timestamp: DateTime<Utc>,
}

impl EventContext {
    /// Stamp a new event raised now.
    pub fn new(user: UserContext, target: Node, event: Event) -> Self {
        Self {
            id: EventId::new(),
            user,
            target,
            event,
            timestamp: Utc::now(),
        }
    }

    /// The event name.
    pub fn name(&self) -> &'static str {
        self.event.name()
    }
}
