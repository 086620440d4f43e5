//! Lifecycle classifier for a bound choreography
//!
//! A [`Binding`] watches the event stream for one resource identifier and
//! decides when the before and after sequences run.
//!
//! The convergence engine loads the state of every resource before deciding
//! whether it must change. For actions that can be simulated, loading state
//! says nothing about whether the change will happen: the before sequence is
//! held back until `PreConverge` confirms the change is being applied for
//! real. For actions that cannot be simulated, loading state is already part
//! of the real pass and is the only signal available, so the before sequence
//! runs right away.
//!
//! ```text
//!                       dry-run capable              not dry-run capable
//! StateLoaded           defer                        run before (once)
//! PreConverge           run before (once)            -
//! Updated               run after                    run after
//! UpToDate/Skipped/     drop deferral                -
//! Failed
//! ```
//!
//! The before sequence runs at most once per occurrence of an action. An
//! occurrence ends at `Updated`, `UpToDate`, `Skipped` or `Failed`.

use crate::sequence::CallbackSequence;
use converge::{Action, EventHandler, LifecycleEvent, Resource};
use std::collections::{HashMap, HashSet};

/// A choreography attached to one resource identifier
///
/// Matching is by identifier value: distinct resources that share an
/// identifier are treated as one.
pub struct Binding {
    choreography: String,
    target: String,
    before: CallbackSequence,
    after: CallbackSequence,
    /// Dry-run capability per action, resolved at the first state load
    dry_run_capable: HashMap<Action, bool>,
    /// Actions whose before sequence waits for `PreConverge`
    before_delayed: HashSet<Action>,
    /// Actions whose before sequence already ran in the current occurrence
    before_fired: HashSet<Action>,
}

impl Binding {
    pub(crate) fn new(
        choreography: String,
        target: String,
        before: CallbackSequence,
        after: CallbackSequence,
    ) -> Self {
        Self {
            choreography,
            target,
            before,
            after,
            dry_run_capable: HashMap::new(),
            before_delayed: HashSet::new(),
            before_fired: HashSet::new(),
        }
    }

    /// Resource identifier this binding watches
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Name under which the binding subscribes to the event dispatcher
    pub fn subscription_name(&self) -> String {
        format!("{}@{}", self.choreography, self.target)
    }

    /// Whether the before sequence for `action` is waiting for `PreConverge`
    pub fn is_deferred(&self, action: &Action) -> bool {
        self.before_delayed.contains(action)
    }

    fn matches(&self, resource: &dyn Resource) -> bool {
        resource.id() == self.target
    }

    fn supports_dry_run(&mut self, resource: &dyn Resource, action: &Action) -> bool {
        *self
            .dry_run_capable
            .entry(action.clone())
            .or_insert_with(|| resource.supports_dry_run(action))
    }

    fn run_before(&mut self, resource: &dyn Resource, action: &Action) -> anyhow::Result<()> {
        if self.before_fired.contains(action) {
            log::debug!(
                "Before block of {} already ran for {} :{}",
                self.choreography,
                self.target,
                action
            );
            return Ok(());
        }
        self.before.run(resource)?;
        self.before_fired.insert(action.clone());
        Ok(())
    }

    fn end_occurrence(&mut self, action: &Action) -> bool {
        self.before_fired.remove(action);
        self.before_delayed.remove(action)
    }

    fn on_state_loaded(&mut self, resource: &dyn Resource, action: &Action) -> anyhow::Result<()> {
        log::debug!("Receiving state_loaded for {}", self.target);
        if self.before_fired.contains(action) {
            return Ok(());
        }
        if self.supports_dry_run(resource, action) {
            log::debug!(
                "Delaying before block of {} to the actual change of {}",
                self.choreography,
                self.target
            );
            self.before_delayed.insert(action.clone());
            Ok(())
        } else {
            self.before_delayed.remove(action);
            self.run_before(resource, action)
        }
    }

    fn on_pre_converge(
        &mut self,
        resource: &dyn Resource,
        action: &Action,
        description: &str,
    ) -> anyhow::Result<()> {
        log::debug!("Receiving pre_converge for {}: {}", self.target, description);
        if self.before_delayed.remove(action) {
            self.run_before(resource, action)?;
        }
        Ok(())
    }

    fn on_updated(&mut self, resource: &dyn Resource, action: &Action) -> anyhow::Result<()> {
        log::debug!("Receiving updated for {}", self.target);
        self.end_occurrence(action);
        self.after.run(resource)
    }
}

impl EventHandler for Binding {
    fn on_event(&mut self, event: &LifecycleEvent<'_>) -> anyhow::Result<()> {
        match *event {
            LifecycleEvent::StateLoaded {
                resource, action, ..
            } if self.matches(resource) => self.on_state_loaded(resource, action),
            LifecycleEvent::PreConverge {
                resource,
                action,
                description,
            } if self.matches(resource) => self.on_pre_converge(resource, action, description),
            LifecycleEvent::Updated { resource, action } if self.matches(resource) => {
                self.on_updated(resource, action)
            }
            LifecycleEvent::UpToDate { resource, action }
            | LifecycleEvent::Skipped {
                resource, action, ..
            }
            | LifecycleEvent::Failed {
                resource, action, ..
            } if self.matches(resource) => {
                if self.end_occurrence(action) {
                    log::debug!(
                        "{} :{} did not change, dropping before block of {}",
                        self.target,
                        action,
                        self.choreography
                    );
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
