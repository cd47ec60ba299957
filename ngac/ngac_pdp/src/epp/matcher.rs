//! Matching events against obligation event patterns.

use std::collections::HashSet;

use ngac_core::error::Result;
use ngac_core::model::{
    Event, EventContext, EventPattern, NodePattern, PolicyClassPattern, SubjectPattern,
    TargetPattern,
};
use ngac_core::search::{is_contained_in, policy_classes_of};
use ngac_core::traits::Graph;

/// Matches events against patterns using the committed graph.
pub struct PatternMatcher<'a> {
    graph: &'a dyn Graph,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(graph: &'a dyn Graph) -> Self {
        Self { graph }
    }

    /// Whether `event` satisfies every component of `pattern`.
    pub fn matches(&self, pattern: &EventPattern, event: &EventContext) -> Result<bool> {
        Ok(self.operation_matches(pattern, event)
            && self.subject_matches(&pattern.subject, event)?
            && self.policy_class_matches(&pattern.policy_class, event)?
            && self.target_matches(&pattern.target, event)?)
    }

    fn operation_matches(&self, pattern: &EventPattern, event: &EventContext) -> bool {
        if pattern.operations.is_empty() {
            return true;
        }
        pattern.operations.iter().any(|op| match &event.event {
            Event::ObjectAccess { operation } => op == operation || op == event.name(),
            other => op == other.name(),
        })
    }

    fn subject_matches(&self, pattern: &SubjectPattern, event: &EventContext) -> Result<bool> {
        let user = &event.user.user;
        match pattern {
            SubjectPattern::Any => Ok(true),
            SubjectPattern::User(name) => Ok(name == user),
            SubjectPattern::Process(id) => Ok(event.user.process.as_deref() == Some(id.as_str())),
            SubjectPattern::AnyUser(names) => {
                if names.is_empty() || names.contains(user) {
                    return Ok(true);
                }
                if !self.graph.exists(user)? {
                    return Ok(false);
                }
                for name in names {
                    if self.graph.exists(name)? && is_contained_in(self.graph, user, name)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn policy_class_matches(
        &self,
        pattern: &PolicyClassPattern,
        event: &EventContext,
    ) -> Result<bool> {
        let wanted = match pattern {
            PolicyClassPattern::Any => return Ok(true),
            PolicyClassPattern::AnyOf(pcs) | PolicyClassPattern::EachOf(pcs) if pcs.is_empty() => {
                return Ok(true)
            }
            PolicyClassPattern::AnyOf(pcs) | PolicyClassPattern::EachOf(pcs) => pcs,
        };

        let target = &event.target.name;
        let contained: HashSet<String> = if self.graph.exists(target)? {
            policy_classes_of(self.graph, target)?
        } else {
            HashSet::new()
        };

        Ok(match pattern {
            PolicyClassPattern::EachOf(_) => wanted.iter().all(|pc| contained.contains(pc)),
            _ => wanted.iter().any(|pc| contained.contains(pc)),
        })
    }

    fn target_matches(&self, pattern: &TargetPattern, event: &EventContext) -> Result<bool> {
        match pattern {
            TargetPattern::Any => Ok(true),
            TargetPattern::PolicyElements(patterns) => {
                Ok(patterns.iter().any(|p| p.matches(&event.target)))
            }
            TargetPattern::Containers(patterns) => {
                for pattern in patterns {
                    for container in self.containers(pattern)? {
                        if self.contains(&container, &event.target.name)? {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
        }
    }

    /// Names of the nodes a container pattern refers to: the named node if
    /// it matches, otherwise every node matching the type and properties.
    fn containers(&self, pattern: &NodePattern) -> Result<Vec<String>> {
        if let Some(name) = &pattern.name {
            if !self.graph.exists(name)? {
                return Ok(Vec::new());
            }
            let node = self.graph.node(name)?;
            return Ok(if pattern.matches(&node) {
                vec![node.name]
            } else {
                Vec::new()
            });
        }

        Ok(self
            .graph
            .search(pattern.node_type, &pattern.properties)?
            .into_iter()
            .map(|n| n.name)
            .collect())
    }

    fn contains(&self, container: &str, target: &str) -> Result<bool> {
        if container == target {
            return Ok(true);
        }
        if !self.graph.exists(target)? {
            return Ok(false);
        }
        is_contained_in(self.graph, target, container)
    }
}
