//! Running obligation responses.

use ngac_core::error::{EppError, Result};
use ngac_core::log_event;
use ngac_core::model::{
    Action, ActionKind, AssignAction, CreateAction, DeleteAction, DenyAction, DenySubject,
    EventContext, GrantAction, Node, NodeSpec, NodeType, Prohibition, ProhibitionSubject,
    ResponsePattern, UserContext,
};
use ngac_core::traits::PolicyStore;
use ngac_core::utils::LogLevel;
use ngac_core::EppConfig;

use crate::epp::functions::{FunctionContext, FunctionEvaluator, Value};
use crate::epp::matcher::PatternMatcher;
use crate::epp::EppOptions;
use crate::pdp::Pdp;

/// Matches events against enabled obligations and runs the responses of
/// the rules that match.
pub struct EventProcessor {
    functions: FunctionEvaluator,
    config: EppConfig,
}

impl EventProcessor {
    pub fn new(options: EppOptions) -> Self {
        let functions = FunctionEvaluator::new();
        for executor in options.executors {
            functions.register(executor);
        }
        Self {
            functions,
            config: options.config,
        }
    }

    pub fn functions(&self) -> &FunctionEvaluator {
        &self.functions
    }

    pub fn config(&self) -> &EppConfig {
        &self.config
    }

    /// Run every enabled rule `event` matches.
    ///
    /// Each response runs in its own transaction, acting as the
    /// obligation's defining user. Events the response raises are
    /// processed one level deeper once that transaction commits.
    ///
    /// # Errors
    ///
    /// `EppError::DepthExceeded` when a rule matches once `depth` has
    /// reached the configured limit, otherwise the first response failure.
    /// Responses that ran before the failure stay applied.
    pub fn process_event(&self, pdp: &Pdp, event: &EventContext, depth: usize) -> Result<()> {
        let obligations = pdp.pap().obligations().get_enabled()?;
        if obligations.is_empty() {
            return Ok(());
        }

        let graph = pdp.pap().graph();
        let matcher = PatternMatcher::new(graph.as_ref());
        for obligation in &obligations {
            for rule in &obligation.rules {
                if !matcher.matches(&rule.event, event)? {
                    continue;
                }
                if depth >= self.config.max_event_depth {
                    log::warn!(
                        "dropping {} on {}: rule {} matched at event depth {}",
                        event.name(),
                        event.target.name,
                        rule.label,
                        depth
                    );
                    return Err(EppError::DepthExceeded(self.config.max_event_depth).into());
                }

                log_event!(LogLevel::Debug, "obligation rule matched",
                    obligation => obligation.label,
                    rule => rule.label,
                    event => event.name(),
                    target => event.target.name,
                );
                let user = pdp.at_depth(UserContext::new(obligation.user.as_str()), depth + 1);
                let result = user.run_tx(&mut |tx| {
                    self.apply_response(tx, &obligation.label, &rule.response, event)
                });
                if let Err(e) = result {
                    log::warn!(
                        "obligation {} rule {} failed on {}: {}",
                        obligation.label,
                        rule.label,
                        event.name(),
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Run a response against `store` if its condition holds.
    ///
    /// # Arguments
    ///
    /// * `store` - The stores, as seen by the obligation's defining user.
    /// * `obligation` - Label of the obligation the response belongs to.
    /// * `response` - The response to run.
    /// * `event` - The event being responded to.
    pub fn apply_response(
        &self,
        store: &dyn PolicyStore,
        obligation: &str,
        response: &ResponsePattern,
        event: &EventContext,
    ) -> Result<()> {
        let ctx = FunctionContext::new(store, event, &self.functions);
        if !self.functions.eval_condition(&ctx, &response.condition)? {
            return Ok(());
        }

        for action in &response.actions {
            self.apply_action(&ctx, obligation, action)?;
        }
        Ok(())
    }

    fn apply_action(&self, ctx: &FunctionContext<'_>, obligation: &str, action: &Action) -> Result<()> {
        if !self.functions.eval_condition(ctx, &action.condition)? {
            return Ok(());
        }

        log::trace!("applying {} action of {}", action.kind.name(), obligation);
        match &action.kind {
            ActionKind::Assign(assign) => self.assign(ctx, assign),
            ActionKind::Create(create) => self.create(ctx, obligation, create),
            ActionKind::Delete(delete) => self.delete(ctx, obligation, delete),
            ActionKind::Deny(deny) => self.deny(ctx, deny),
            ActionKind::Grant(grant) => self.grant(ctx, grant),
            ActionKind::Function(function) => self.functions.eval(ctx, function).map(|_| ()),
        }
    }

    fn assign(&self, ctx: &FunctionContext<'_>, action: &AssignAction) -> Result<()> {
        let graph = ctx.store.graph();
        for assignment in &action.assignments {
            let child = self.resolve(ctx, &assignment.what)?;
            let parent = self.resolve(ctx, &assignment.to)?;
            graph.assign(&child.name, &parent.name)?;
        }
        Ok(())
    }

    fn create(&self, ctx: &FunctionContext<'_>, obligation: &str, action: &CreateAction) -> Result<()> {
        let graph = ctx.store.graph();
        for spec in &action.nodes {
            let name = ctx.eval_string("create", &spec.what.name)?;
            if spec.what.node_type == NodeType::PC {
                graph.create_policy_class(&name, spec.what.properties.clone())?;
                continue;
            }
            let parent = self.resolve(ctx, &spec.to)?;
            graph.create_node(
                &name,
                spec.what.node_type,
                spec.what.properties.clone(),
                &parent.name,
                &[],
            )?;
        }

        if !action.rules.is_empty() {
            let obligations = ctx.store.obligations();
            let mut updated = obligations.get(obligation)?;
            updated.rules.extend(action.rules.iter().cloned());
            obligations.update(obligation, updated)?;
        }
        Ok(())
    }

    fn delete(&self, ctx: &FunctionContext<'_>, obligation: &str, action: &DeleteAction) -> Result<()> {
        let graph = ctx.store.graph();
        for spec in &action.nodes {
            let node = self.resolve(ctx, spec)?;
            graph.remove_node(&node.name)?;
        }
        for assignment in &action.assignments {
            let child = self.resolve(ctx, &assignment.what)?;
            let parent = self.resolve(ctx, &assignment.to)?;
            graph.deassign(&child.name, &parent.name)?;
        }
        for association in &action.associations {
            let source = self.resolve(ctx, &association.source)?;
            let target = self.resolve(ctx, &association.target)?;
            graph.dissociate(&source.name, &target.name)?;
        }

        let prohibitions = ctx.store.prohibitions();
        for name in &action.prohibitions {
            prohibitions.remove(name)?;
        }

        if !action.rules.is_empty() {
            let obligations = ctx.store.obligations();
            let mut updated = obligations.get(obligation)?;
            updated.rules.retain(|r| !action.rules.contains(&r.label));
            obligations.update(obligation, updated)?;
        }
        Ok(())
    }

    fn deny(&self, ctx: &FunctionContext<'_>, action: &DenyAction) -> Result<()> {
        let subject = match &action.subject {
            DenySubject::Node(spec) => ProhibitionSubject::Node(self.resolve(ctx, spec)?.name),
            DenySubject::Process(arg) => ProhibitionSubject::Process(ctx.eval_string("deny", arg)?),
        };

        let mut builder = Prohibition::builder(action.label.clone(), subject)
            .operations(action.operations.clone())
            .intersection(action.intersection);
        for container in &action.containers {
            let node = self.resolve(ctx, &container.node)?;
            builder = builder.container(node.name, container.complement);
        }

        ctx.store.prohibitions().add(builder.build())
    }

    fn grant(&self, ctx: &FunctionContext<'_>, action: &GrantAction) -> Result<()> {
        let subject = self.resolve(ctx, &action.subject)?;
        let target = self.resolve(ctx, &action.target)?;
        ctx.store
            .graph()
            .associate(&subject.name, &target.name, action.operations.clone())
    }

    /// The node a spec refers to: the result of a function, a node by name,
    /// or the first node (by name) matching a type and properties.
    fn resolve(&self, ctx: &FunctionContext<'_>, spec: &NodeSpec) -> Result<Node> {
        let graph = ctx.store.graph();
        match spec {
            NodeSpec::Name(name) => graph.node(name),
            NodeSpec::Function { function } => match self.functions.eval(ctx, function)? {
                Value::Node(node) => Ok(node),
                Value::String(name) => graph.node(&name),
                other => Err(EppError::NodeResolution(format!(
                    "{} returned a {}",
                    function.name,
                    other.kind()
                ))
                .into()),
            },
            NodeSpec::Details {
                node_type,
                properties,
            } => {
                let mut found = graph.search(*node_type, properties)?;
                found.sort_by(|a, b| a.name.cmp(&b.name));
                found.into_iter().next().ok_or_else(|| {
                    EppError::NodeResolution(format!(
                        "no {} with properties {:?}",
                        node_type.map_or("node", |t| t.as_str()),
                        properties
                    ))
                    .into()
                })
            }
        }
    }
}
