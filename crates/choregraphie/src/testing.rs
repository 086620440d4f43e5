//! Test doubles shared by the unit tests

use converge::{Action, ApplyContext, ApplyResult, Resource, ResourceState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Resource that never changes anything and counts capability queries
#[derive(Debug)]
pub struct Probe {
    resource_type: &'static str,
    name: String,
    dry_run: bool,
    queries: AtomicUsize,
}

impl Probe {
    pub fn new(resource_type: &'static str, name: &str) -> Self {
        Self {
            resource_type,
            name: name.to_string(),
            dry_run: true,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn without_dry_run(mut self) -> Self {
        self.dry_run = false;
        self
    }

    pub fn capability_queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Resource for Probe {
    fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn supports_dry_run(&self, _action: &Action) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.dry_run
    }

    fn current_state(&self) -> anyhow::Result<ResourceState> {
        Ok(ResourceState::Unknown)
    }

    fn desired_state(&self, _action: &Action) -> ResourceState {
        ResourceState::Unknown
    }

    fn apply(&self, _action: &Action, _ctx: &mut ApplyContext<'_>) -> anyhow::Result<ApplyResult> {
        Ok(ApplyResult::NoChange)
    }
}

/// In-memory resource that can be switched on, with a shared flag
#[derive(Debug)]
pub struct Switch {
    name: String,
    on: Arc<AtomicBool>,
    simulates: bool,
}

impl Switch {
    pub fn new(name: &str, on: bool) -> Self {
        Self {
            name: name.to_string(),
            on: Arc::new(AtomicBool::new(on)),
            simulates: true,
        }
    }

    pub fn without_dry_run(mut self) -> Self {
        self.simulates = false;
        self
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.on)
    }
}

impl Resource for Switch {
    fn resource_type(&self) -> &'static str {
        "switch"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn supports_dry_run(&self, _action: &Action) -> bool {
        self.simulates
    }

    fn current_state(&self) -> anyhow::Result<ResourceState> {
        if self.on.load(Ordering::SeqCst) {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self, _action: &Action) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _action: &Action, ctx: &mut ApplyContext<'_>) -> anyhow::Result<ApplyResult> {
        if self.on.load(Ordering::SeqCst) {
            return Ok(ApplyResult::NoChange);
        }
        let on = Arc::clone(&self.on);
        ctx.converge_by(format!("switch on {}", self.name), move || {
            on.store(true, Ordering::SeqCst);
            Ok(())
        })?;
        Ok(ApplyResult::Created)
    }
}
