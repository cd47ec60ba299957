//! Obligation model.
//!
//! An obligation is a labelled bundle of rules owned by a defining user.
//! Each rule pairs an [`EventPattern`] with a [`ResponsePattern`]; when an
//! event matches, the response's actions run with the defining user's
//! permissions.
//!
//! Responses reference nodes and values through a small function-call
//! language: a [`Function`] names an executor registered with the event
//! processor and passes it [`Arg`]s, which are literals or nested calls.

use serde::{Deserialize, Serialize};

use crate::model::{Node, NodeType, OperationSet, Properties};

/// A labelled bundle of event-reaction rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    /// Unique label of the obligation.
    pub label: String,

    /// The user whose permissions the responses run with.
    pub user: String,

    /// Whether the obligation reacts to events.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_enabled() -> bool {
    true
}

impl Obligation {
    pub fn new(label: impl Into<String>, user: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            label: label.into(),
            user: user.into(),
            enabled: true,
            rules,
        }
    }

    /// Look up a rule by label.
    pub fn rule(&self, label: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.label == label)
    }
}

/// A single event → response rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Label of the rule, unique within its obligation.
    pub label: String,

    /// Which events trigger the rule.
    #[serde(default)]
    pub event: EventPattern,

    /// What to do when it triggers.
    #[serde(default)]
    pub response: ResponsePattern,
}

/// Matcher over events.
///
/// Every component must be satisfied for an event to match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPattern {
    /// Who performed the operation.
    #[serde(default)]
    pub subject: SubjectPattern,

    /// Policy classes the target must be contained in.
    #[serde(default)]
    pub policy_class: PolicyClassPattern,

    /// Event names (or accessed operations) that trigger the rule. Empty
    /// matches every event.
    #[serde(default)]
    pub operations: Vec<String>,

    /// Which nodes the event must target.
    #[serde(default)]
    pub target: TargetPattern,
}

/// Subject component of an event pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectPattern {
    /// Any acting user.
    #[default]
    Any,

    /// Exactly this user.
    User(String),

    /// Any listed user, or any user contained in a listed user attribute.
    /// An empty list matches every user.
    AnyUser(Vec<String>),

    /// Exactly this process.
    Process(String),
}

/// Policy class component of an event pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyClassPattern {
    /// Targets in any policy class.
    #[default]
    Any,

    /// Targets contained in at least one of the policy classes.
    AnyOf(Vec<String>),

    /// Targets contained in every one of the policy classes.
    EachOf(Vec<String>),
}

/// Target component of an event pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPattern {
    /// Any target.
    #[default]
    Any,

    /// The target itself matches one of the patterns.
    PolicyElements(Vec<NodePattern>),

    /// The target is one of, or is contained in one of, the nodes the
    /// patterns identify.
    Containers(Vec<NodePattern>),
}

/// Name, type and property-subset matcher for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePattern {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type")]
    pub node_type: Option<NodeType>,

    #[serde(default)]
    pub properties: Properties,
}

impl NodePattern {
    /// A pattern matching exactly one node name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Whether `node` satisfies every component of the pattern.
    pub fn matches(&self, node: &Node) -> bool {
        self.name.as_ref().map_or(true, |n| *n == node.name)
            && node.matches(self.node_type, &self.properties)
    }
}

/// What a rule does when triggered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePattern {
    /// Guard evaluated before any action runs.
    #[serde(default)]
    pub condition: Condition,

    /// Actions in execution order.
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A conjunction of function calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Calls that must all evaluate truthy.
    #[serde(default)]
    pub all: Vec<Function>,

    /// Calls that must all evaluate falsy.
    #[serde(default)]
    pub none: Vec<Function>,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.none.is_empty()
    }
}

/// A conditional action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Guard evaluated before this action runs.
    #[serde(default)]
    pub condition: Condition,

    /// What the action does.
    pub kind: ActionKind,
}

impl Action {
    /// An unconditional action.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            condition: Condition::default(),
            kind,
        }
    }
}

/// The closed set of response actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Create assignment edges.
    Assign(AssignAction),

    /// Create nodes and/or append rules to the defining obligation.
    Create(CreateAction),

    /// Remove nodes, edges, prohibitions or rules.
    Delete(DeleteAction),

    /// Add a prohibition.
    Deny(DenyAction),

    /// Create an association.
    Grant(GrantAction),

    /// Evaluate a function for its side effects.
    Function(Function),
}

impl ActionKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Assign(_) => "assign",
            Self::Create(_) => "create",
            Self::Delete(_) => "delete",
            Self::Deny(_) => "deny",
            Self::Grant(_) => "grant",
            Self::Function(_) => "function",
        }
    }
}

/// A child/parent pair of node references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSpec {
    /// The child.
    pub what: NodeSpec,

    /// The parent.
    #[serde(rename = "where")]
    pub to: NodeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignAction {
    #[serde(default)]
    pub assignments: Vec<AssignmentSpec>,
}

/// A node to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    /// Name of the node, literal or computed.
    pub name: Arg,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default)]
    pub properties: Properties,
}

/// A node to create and the parent to create it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNodeSpec {
    pub what: NewNode,

    #[serde(rename = "where")]
    pub to: NodeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateAction {
    #[serde(default)]
    pub nodes: Vec<CreateNodeSpec>,

    /// Rules appended to the obligation that defines this action.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A source/target pair of node references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationSpec {
    pub source: NodeSpec,
    pub target: NodeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteAction {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,

    #[serde(default)]
    pub assignments: Vec<AssignmentSpec>,

    #[serde(default)]
    pub associations: Vec<AssociationSpec>,

    /// Prohibition names.
    #[serde(default)]
    pub prohibitions: Vec<String>,

    /// Rule labels within the defining obligation.
    #[serde(default)]
    pub rules: Vec<String>,
}

/// Subject of a prohibition created by a deny action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenySubject {
    /// A user or user attribute.
    Node(NodeSpec),

    /// A process id, literal or computed.
    Process(Arg),
}

/// A container of a prohibition created by a deny action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenyContainer {
    pub node: NodeSpec,

    #[serde(default)]
    pub complement: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenyAction {
    /// Name of the prohibition to create.
    pub label: String,

    pub subject: DenySubject,

    pub operations: OperationSet,

    #[serde(default)]
    pub intersection: bool,

    #[serde(default)]
    pub containers: Vec<DenyContainer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantAction {
    /// The user attribute receiving the grant.
    pub subject: NodeSpec,

    pub operations: OperationSet,

    /// The attribute the grant applies to.
    pub target: NodeSpec,
}

/// A reference to an existing node.
///
/// Resolution follows a nested function call, looks a node up by exact
/// name, or takes the first node matching a type and property subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    /// Exact node name.
    Name(String),

    /// The node a function call evaluates to.
    Function { function: Function },

    /// First node matching the type and property subset.
    Details {
        #[serde(default, rename = "type")]
        node_type: Option<NodeType>,

        #[serde(default)]
        properties: Properties,
    },
}

impl NodeSpec {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn function(function: Function) -> Self {
        Self::Function { function }
    }
}

/// A call into the function registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    #[serde(default)]
    pub args: Vec<Arg>,
}

impl Function {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// A call without arguments.
    pub fn call(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

/// A function argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    /// A literal string.
    Value(String),

    /// A nested call evaluated before the enclosing function runs.
    Function(Function),
}

impl Arg {
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }
}

impl From<Function> for Arg {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}
