//! Built-in functions.

use std::sync::Arc;

use ngac_core::error::{EppError, Result};
use ngac_core::model::{Arg, Event, Node, NodeType, Properties};
use ngac_core::search::is_contained_in;

use super::{FunctionContext, FunctionExecutor, Value};

/// Every built-in executor.
pub fn builtins() -> Vec<Arc<dyn FunctionExecutor>> {
    vec![
        Arc::new(ChildOfAssign),
        Arc::new(ParentOfAssign),
        Arc::new(CurrentUser),
        Arc::new(CurrentProcess),
        Arc::new(CurrentTarget),
        Arc::new(CurrentEvent),
        Arc::new(GetNode),
        Arc::new(GetNodeFromDetails),
        Arc::new(GetNodeName),
        Arc::new(GetChildren),
        Arc::new(IsNodeContainedIn),
        Arc::new(ToProps),
        Arc::new(Concat),
    ]
}

fn unexpected(function: &str, ctx: &FunctionContext<'_>) -> ngac_core::Error {
    EppError::UnexpectedEvent {
        function: function.to_string(),
        event: ctx.event.name().to_string(),
    }
    .into()
}

/// Argument `index` of a call, or `WrongArgCount` when it was not passed.
fn arg<'a>(executor: &dyn FunctionExecutor, args: &'a [Arg], index: usize) -> Result<&'a Arg> {
    args.get(index).ok_or_else(|| {
        EppError::WrongArgCount {
            name: executor.name().to_string(),
            expected: executor.num_params(),
            actual: args.len(),
        }
        .into()
    })
}

/// The child of an assign or deassign event.
struct ChildOfAssign;

impl FunctionExecutor for ChildOfAssign {
    fn name(&self) -> &str {
        "child_of_assign"
    }

    fn num_params(&self) -> usize {
        0
    }

    fn exec(&self, ctx: &FunctionContext<'_>, _args: &[Arg]) -> Result<Value> {
        let child: &Node = match &ctx.event.event {
            Event::Assign { .. } | Event::Deassign { .. } => &ctx.event.target,
            Event::AssignTo { child } | Event::DeassignFrom { child } => child,
            _ => return Err(unexpected(self.name(), ctx)),
        };
        Ok(Value::Node(child.clone()))
    }
}

/// The parent of an assign or deassign event.
struct ParentOfAssign;

impl FunctionExecutor for ParentOfAssign {
    fn name(&self) -> &str {
        "parent_of_assign"
    }

    fn num_params(&self) -> usize {
        0
    }

    fn exec(&self, ctx: &FunctionContext<'_>, _args: &[Arg]) -> Result<Value> {
        let parent: &Node = match &ctx.event.event {
            Event::Assign { parent } | Event::Deassign { parent } => parent,
            Event::AssignTo { .. } | Event::DeassignFrom { .. } => &ctx.event.target,
            _ => return Err(unexpected(self.name(), ctx)),
        };
        Ok(Value::Node(parent.clone()))
    }
}

/// Name of the user that raised the event.
struct CurrentUser;

impl FunctionExecutor for CurrentUser {
    fn name(&self) -> &str {
        "current_user"
    }

    fn num_params(&self) -> usize {
        0
    }

    fn exec(&self, ctx: &FunctionContext<'_>, _args: &[Arg]) -> Result<Value> {
        Ok(Value::String(ctx.event.user.user.clone()))
    }
}

/// Process the event was raised through, or null.
struct CurrentProcess;

impl FunctionExecutor for CurrentProcess {
    fn name(&self) -> &str {
        "current_process"
    }

    fn num_params(&self) -> usize {
        0
    }

    fn exec(&self, ctx: &FunctionContext<'_>, _args: &[Arg]) -> Result<Value> {
        Ok(ctx
            .event
            .user
            .process
            .clone()
            .map_or(Value::Null, Value::String))
    }
}

struct CurrentTarget;

impl FunctionExecutor for CurrentTarget {
    fn name(&self) -> &str {
        "current_target"
    }

    fn num_params(&self) -> usize {
        0
    }

    fn exec(&self, ctx: &FunctionContext<'_>, _args: &[Arg]) -> Result<Value> {
        Ok(Value::Node(ctx.event.target.clone()))
    }
}

struct CurrentEvent;

impl FunctionExecutor for CurrentEvent {
    fn name(&self) -> &str {
        "current_event"
    }

    fn num_params(&self) -> usize {
        0
    }

    fn exec(&self, ctx: &FunctionContext<'_>, _args: &[Arg]) -> Result<Value> {
        Ok(Value::from(ctx.event.name()))
    }
}

/// `get_node(name)`: the node with the given name.
struct GetNode;

impl FunctionExecutor for GetNode {
    fn name(&self) -> &str {
        "get_node"
    }

    fn num_params(&self) -> usize {
        1
    }

    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value> {
        Ok(Value::Node(ctx.eval_node(self.name(), arg(self, args, 0)?)?))
    }
}

/// `get_node_from_details(type, properties)`: the first node, by name, of
/// the given type carrying every property. A null type matches any type.
struct GetNodeFromDetails;

impl GetNodeFromDetails {
    fn invalid(&self, reason: String) -> ngac_core::Error {
        EppError::InvalidArgument {
            function: self.name().to_string(),
            reason,
        }
        .into()
    }
}

impl FunctionExecutor for GetNodeFromDetails {
    fn name(&self) -> &str {
        "get_node_from_details"
    }

    fn num_params(&self) -> usize {
        2
    }

    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value> {
        let node_type = match ctx.eval(arg(self, args, 0)?)? {
            Value::Null => None,
            Value::String(s) => Some(s.parse::<NodeType>().map_err(|e| self.invalid(e))?),
            other => {
                return Err(self.invalid(format!("expected a node type, got a {}", other.kind())))
            }
        };
        let properties = match ctx.eval(arg(self, args, 1)?)? {
            Value::Null => Properties::new(),
            Value::Map(properties) => properties,
            other => {
                return Err(self.invalid(format!("expected a map, got a {}", other.kind())))
            }
        };
        let node = ctx.store.graph().node_from_details(node_type, &properties)?;
        Ok(Value::Node(node))
    }
}

/// `get_node_name(node)`.
struct GetNodeName;

impl FunctionExecutor for GetNodeName {
    fn name(&self) -> &str {
        "get_node_name"
    }

    fn num_params(&self) -> usize {
        1
    }

    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value> {
        Ok(Value::String(ctx.eval_string(self.name(), arg(self, args, 0)?)?))
    }
}

/// `get_children(node)`: names of the nodes assigned to a node, sorted.
struct GetChildren;

impl FunctionExecutor for GetChildren {
    fn name(&self) -> &str {
        "get_children"
    }

    fn num_params(&self) -> usize {
        1
    }

    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value> {
        let name = ctx.eval_string(self.name(), arg(self, args, 0)?)?;
        let mut children: Vec<String> = ctx.store.graph().children(&name)?.into_iter().collect();
        children.sort();
        Ok(Value::List(children.into_iter().map(Value::String).collect()))
    }
}

/// `is_node_contained_in(node, container)`.
struct IsNodeContainedIn;

impl FunctionExecutor for IsNodeContainedIn {
    fn name(&self) -> &str {
        "is_node_contained_in"
    }

    fn num_params(&self) -> usize {
        2
    }

    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value> {
        let node = ctx.eval_string(self.name(), arg(self, args, 0)?)?;
        let container = ctx.eval_string(self.name(), arg(self, args, 1)?)?;
        let graph = ctx.store.graph();
        if !graph.exists(&node)? || !graph.exists(&container)? {
            return Ok(Value::Bool(false));
        }
        Ok(Value::Bool(is_contained_in(graph.as_ref(), &node, &container)?))
    }
}

/// `to_props("k1=v1", ...)`: a property map.
struct ToProps;

impl FunctionExecutor for ToProps {
    fn name(&self) -> &str {
        "to_props"
    }

    fn num_params(&self) -> usize {
        0
    }

    fn variadic(&self) -> bool {
        true
    }

    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value> {
        let mut properties = Properties::new();
        for arg in args {
            let entry = ctx.eval_string(self.name(), arg)?;
            let (key, value) = entry.split_once('=').ok_or_else(|| EppError::InvalidArgument {
                function: self.name().to_string(),
                reason: format!("{} is not a key=value pair", entry),
            })?;
            properties.insert(key.to_string(), value.to_string());
        }
        Ok(Value::Map(properties))
    }
}

/// `concat(a, b, ...)`: the arguments' string forms joined.
struct Concat;

impl FunctionExecutor for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn num_params(&self) -> usize {
        1
    }

    fn variadic(&self) -> bool {
        true
    }

    fn exec(&self, ctx: &FunctionContext<'_>, args: &[Arg]) -> Result<Value> {
        let mut joined = String::new();
        for arg in args {
            joined.push_str(&ctx.eval(arg)?.to_string());
        }
        Ok(Value::String(joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngac_core::error::Error;
    use ngac_core::model::{props, EventContext, Function, UserContext};
    use ngac_core::traits::{Graph, Obligations, PolicyStore, Prohibitions, TxFn};

    use ngac_pip::MemPolicyStore;

    use crate::epp::functions::FunctionEvaluator;

    /// A store with nothing in it; the functions under test never read it.
    struct NoStore;

    impl PolicyStore for NoStore {
        fn graph(&self) -> Arc<dyn Graph> {
            unreachable!()
        }

        fn prohibitions(&self) -> Arc<dyn Prohibitions> {
            unreachable!()
        }

        fn obligations(&self) -> Arc<dyn Obligations> {
            unreachable!()
        }

        fn run_tx(&self, _f: &mut TxFn<'_>) -> Result<()> {
            unreachable!()
        }
    }

    fn node(name: &str, node_type: NodeType) -> Node {
        Node::new(name, node_type, Properties::new())
    }

    fn assign_to() -> EventContext {
        EventContext::new(
            UserContext::new("u1").with_process("42"),
            node("oa1", NodeType::OA),
            Event::AssignTo {
                child: node("o1", NodeType::O),
            },
        )
    }

    fn eval(event: &EventContext, function: Function) -> Result<Value> {
        eval_in(&NoStore, event, function)
    }

    fn eval_in(store: &dyn PolicyStore, event: &EventContext, function: Function) -> Result<Value> {
        let evaluator = FunctionEvaluator::new();
        let ctx = FunctionContext::new(store, event, &evaluator);
        evaluator.eval(&ctx, &function)
    }

    #[test]
    fn test_assign_functions() {
        let event = assign_to();
        assert_eq!(
            eval(&event, Function::call("child_of_assign")).unwrap(),
            Value::Node(node("o1", NodeType::O))
        );
        assert_eq!(
            eval(&event, Function::call("parent_of_assign")).unwrap(),
            Value::Node(node("oa1", NodeType::OA))
        );

        let delete = EventContext::new(
            UserContext::new("u1"),
            node("o1", NodeType::O),
            Event::DeleteNode,
        );
        let err = eval(&delete, Function::call("child_of_assign")).unwrap_err();
        assert!(matches!(err, Error::Epp(EppError::UnexpectedEvent { .. })));
    }

    #[test]
    fn test_context_functions() {
        let event = assign_to();
        assert_eq!(eval(&event, Function::call("current_user")).unwrap(), Value::from("u1"));
        assert_eq!(eval(&event, Function::call("current_process")).unwrap(), Value::from("42"));
        assert_eq!(
            eval(&event, Function::call("current_event")).unwrap(),
            Value::from("assign to")
        );
        assert_eq!(
            eval(&event, Function::call("current_target")).unwrap(),
            Value::Node(node("oa1", NodeType::OA))
        );
    }

    #[test]
    fn test_concat_and_props() {
        let event = assign_to();
        let name = Function::new(
            "concat",
            vec![
                Function::new("get_node_name", vec![Function::call("child_of_assign").into()]).into(),
                Arg::value("_home"),
            ],
        );
        assert_eq!(eval(&event, name).unwrap(), Value::from("o1_home"));

        let props = Function::new(
            "to_props",
            vec![Arg::value("owner=u1"), Arg::value("kind=home")],
        );
        let Value::Map(map) = eval(&event, props).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.get("owner").map(String::as_str), Some("u1"));
        assert_eq!(map.len(), 2);

        let bad = Function::new("to_props", vec![Arg::value("owner")]);
        assert!(matches!(
            eval(&event, bad).unwrap_err(),
            Error::Epp(EppError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_call_errors() {
        let event = assign_to();
        assert!(matches!(
            eval(&event, Function::call("no_such_function")).unwrap_err(),
            Error::Epp(EppError::UnknownFunction(_))
        ));
        assert!(matches!(
            eval(&event, Function::new("current_user", vec![Arg::value("x")])).unwrap_err(),
            Error::Epp(EppError::WrongArgCount {
                expected: 0,
                actual: 1,
                ..
            })
        ));
        assert!(matches!(
            eval(&event, Function::call("concat")).unwrap_err(),
            Error::Epp(EppError::WrongArgCount { .. })
        ));
    }

    #[test]
    fn test_get_node_from_details() {
        let store = MemPolicyStore::new();
        let graph = store.graph();
        graph.create_policy_class("pc1", Properties::new()).unwrap();
        let home = props([("owner", "u1")]);
        graph
            .create_node("home_u1", NodeType::OA, home.clone(), "pc1", &[])
            .unwrap();
        graph
            .create_node("doc_u1", NodeType::O, home, "home_u1", &[])
            .unwrap();

        let event = assign_to();
        let lookup = |node_type: &str| {
            Function::new(
                "get_node_from_details",
                vec![
                    Arg::value(node_type),
                    Function::new("to_props", vec![Arg::value("owner=u1")]).into(),
                ],
            )
        };
        assert_eq!(
            eval_in(&store, &event, lookup("OA")).unwrap(),
            Value::Node(graph.node("home_u1").unwrap())
        );
        assert_eq!(
            eval_in(&store, &event, lookup("O")).unwrap(),
            Value::Node(graph.node("doc_u1").unwrap())
        );
        assert!(matches!(
            eval_in(&store, &event, lookup("UA")).unwrap_err(),
            Error::Graph(_)
        ));
        assert!(matches!(
            eval_in(&store, &event, lookup("folder")).unwrap_err(),
            Error::Epp(EppError::InvalidArgument { .. })
        ));

        let by_name = Function::new("get_node", vec![Arg::value("home_u1")]);
        assert_eq!(
            eval_in(&store, &event, by_name).unwrap(),
            Value::Node(graph.node("home_u1").unwrap())
        );
    }

    #[test]
    fn test_direct_exec_with_missing_arguments() {
        let event = assign_to();
        let evaluator = FunctionEvaluator::new();
        let ctx = FunctionContext::new(&NoStore, &event, &evaluator);

        let one: [&dyn FunctionExecutor; 4] =
            [&GetNode, &GetNodeName, &GetChildren, &GetNodeFromDetails];
        for executor in one {
            assert!(matches!(
                executor.exec(&ctx, &[]).unwrap_err(),
                Error::Epp(EppError::WrongArgCount { actual: 0, .. })
            ));
        }
        assert!(matches!(
            IsNodeContainedIn.exec(&ctx, &[Arg::value("o1")]).unwrap_err(),
            Error::Epp(EppError::WrongArgCount {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }
}
