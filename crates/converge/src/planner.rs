//! Execution planner - orders resource actions for a run

use crate::resource::{BoxedResource, Resource};
use crate::types::Action;

/// One resource action to converge
#[derive(Debug)]
pub struct PlanEntry {
    pub resource: BoxedResource,
    pub action: Action,
}

/// An ordered list of resource actions
///
/// Entries converge strictly in insertion order. The same resource may appear
/// more than once, with the same or different actions.
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    entries: Vec<PlanEntry>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource action to the plan
    pub fn add(&mut self, resource: BoxedResource, action: Action) {
        self.entries.push(PlanEntry { resource, action });
    }

    /// Add a resource with its default action
    pub fn add_default(&mut self, resource: BoxedResource) {
        let action = resource.default_action();
        self.add(resource, action);
    }

    /// Entries in execution order
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            entries: self
                .entries
                .into_iter()
                .filter(|e| predicate(e.resource.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// Total number of resource actions in the plan
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a target string like "type.name" into (type, name)
///
/// Only the first dot separates type from name, so paths with dots survive.
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((resource_type, name)) if !resource_type.contains('/') => {
            (Some(resource_type.to_string()), Some(name.to_string()))
        }
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(
    resource: &dyn Resource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type
        && resource.resource_type() != rt
    {
        return false;
    }

    if let Some(n) = name
        && !resource.name().contains(n)
    {
        return false;
    }

    true
}
