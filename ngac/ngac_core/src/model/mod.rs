//! Data model of the policy graph.

pub mod context;
pub mod event;
pub mod node;
pub mod obligation;
pub mod operations;
pub mod prohibition;

pub use context::UserContext;
pub use event::{Event, EventContext};
pub use node::{props, Node, NodeType, Properties};
pub use obligation::{
    Action, ActionKind, Arg, AssignAction, AssignmentSpec, AssociationSpec, Condition,
    CreateAction, CreateNodeSpec, DeleteAction, DenyAction, DenyContainer, DenySubject,
    EventPattern, Function, GrantAction, NewNode, NodePattern, NodeSpec, Obligation,
    PolicyClassPattern, ResponsePattern, Rule, SubjectPattern, TargetPattern,
};
pub use operations::OperationSet;
pub use prohibition::{Prohibition, ProhibitionBuilder, ProhibitionSubject};
