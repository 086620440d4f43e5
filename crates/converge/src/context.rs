//! Apply context and progress reporting
//!
//! The [`ApplyContext`] is the only way a resource talks back to the engine
//! while it converges: every real side effect goes through
//! [`ApplyContext::converge_by`], which announces the change to lifecycle
//! observers first.

use crate::events::{EventDispatcher, LifecycleEvent};
use crate::resource::Resource;
use crate::types::{Action, ApplyResult};
use anyhow::Result;

/// Progress callback for convergence runs
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called when starting to converge a resource action
    fn on_resource_start(&mut self, id: &str, action: &Action);

    /// Called when a resource action completes
    fn on_resource_complete(&mut self, id: &str, action: &Action, result: &ApplyResult);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_resource_start(&mut self, _id: &str, _action: &Action) {}
    fn on_resource_complete(&mut self, _id: &str, _action: &Action, _result: &ApplyResult) {}
}

/// Context passed to [`Resource::apply`]
pub struct ApplyContext<'a> {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
    resource: &'a dyn Resource,
    action: &'a Action,
    events: &'a mut EventDispatcher,
    updated: bool,
    would_update: bool,
    handler_error: Option<anyhow::Error>,
}

impl<'a> ApplyContext<'a> {
    /// Create a context for applying `action` to `resource`
    pub fn new(
        dry_run: bool,
        verbose: bool,
        resource: &'a dyn Resource,
        action: &'a Action,
        events: &'a mut EventDispatcher,
    ) -> Self {
        Self {
            dry_run,
            verbose,
            resource,
            action,
            events,
            updated: false,
            would_update: false,
            handler_error: None,
        }
    }

    /// Apply a change described by `description`
    ///
    /// On a real run this emits `PreConverge`, then runs `change` and marks
    /// the resource as updated. On a dry run it emits `WouldUpdate` and never
    /// calls `change`.
    ///
    /// If a lifecycle handler rejects the event, `change` is not run and an
    /// error is returned; the engine reports the handler's own error to its
    /// caller.
    pub fn converge_by<F>(&mut self, description: impl Into<String>, change: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let description = description.into();

        if self.dry_run {
            log::debug!("Would {} for {}", description, self.resource.id());
            self.notify(&LifecycleEvent::WouldUpdate {
                resource: self.resource,
                action: self.action,
                description: &description,
            })?;
            self.would_update = true;
            return Ok(());
        }

        self.notify(&LifecycleEvent::PreConverge {
            resource: self.resource,
            action: self.action,
            description: &description,
        })?;

        if self.verbose {
            log::info!("{}: {}", self.resource.id(), description);
        }
        change()?;
        self.updated = true;
        Ok(())
    }

    /// Whether any change was applied through [`converge_by`](Self::converge_by)
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Whether a change would have been applied on a real run
    pub fn would_update(&self) -> bool {
        self.would_update
    }

    /// Take the error raised by a lifecycle handler, if any
    pub(crate) fn take_handler_error(&mut self) -> Option<anyhow::Error> {
        self.handler_error.take()
    }

    fn notify(&mut self, event: &LifecycleEvent<'_>) -> Result<()> {
        if let Err(e) = self.events.dispatch(event) {
            let id = self.resource.id();
            self.handler_error = Some(e);
            anyhow::bail!("lifecycle handler aborted converge of {id}");
        }
        Ok(())
    }
}
