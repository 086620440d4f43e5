//! Lifecycle events emitted during a convergence run
//!
//! The engine reports every step of a run to an [`EventDispatcher`]. Handlers
//! subscribe once and then see every event, in emission order, on the thread
//! that drives the run.
//!
//! For a single resource action the events arrive as:
//!
//! ```text
//! StateLoaded ─┬─► UpToDate                      (nothing to do)
//!              ├─► PreConverge ─► Updated         (change applied)
//!              ├─► WouldUpdate ─► Skipped         (dry run)
//!              └─► ... ─► Failed                  (apply returned an error)
//! ```
//!
//! Actions that cannot be simulated skip `StateLoaded` altogether during a dry
//! run and are reported as `Skipped`.

use crate::resource::Resource;
use crate::types::{Action, ExecuteSummary, ResourceState};
use anyhow::Result;
use std::fmt;

/// A single notification from the convergence engine
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    /// The run is starting
    ConvergeStart {
        /// Number of resource actions in the plan
        resource_count: usize,
        /// Whether this is a dry run
        dry_run: bool,
    },

    /// The current state of a resource has been loaded, before deciding
    /// whether a change is needed
    StateLoaded {
        resource: &'a dyn Resource,
        action: &'a Action,
        current: &'a ResourceState,
    },

    /// A change is about to be applied for real
    PreConverge {
        resource: &'a dyn Resource,
        action: &'a Action,
        description: &'a str,
    },

    /// A change would have been applied, but this is a dry run
    WouldUpdate {
        resource: &'a dyn Resource,
        action: &'a Action,
        description: &'a str,
    },

    /// The change was applied
    Updated {
        resource: &'a dyn Resource,
        action: &'a Action,
    },

    /// The resource already matched its desired state
    UpToDate {
        resource: &'a dyn Resource,
        action: &'a Action,
    },

    /// The action was not applied
    Skipped {
        resource: &'a dyn Resource,
        action: &'a Action,
        reason: &'a str,
    },

    /// Loading state or applying the action failed
    Failed {
        resource: &'a dyn Resource,
        action: &'a Action,
        error: &'a str,
    },

    /// The run has finished
    ConvergeComplete { summary: &'a ExecuteSummary },
}

impl<'a> LifecycleEvent<'a> {
    /// Short name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConvergeStart { .. } => "converge_start",
            Self::StateLoaded { .. } => "state_loaded",
            Self::PreConverge { .. } => "pre_converge",
            Self::WouldUpdate { .. } => "would_update",
            Self::Updated { .. } => "updated",
            Self::UpToDate { .. } => "up_to_date",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
            Self::ConvergeComplete { .. } => "converge_complete",
        }
    }

    /// The resource this event is about, if any
    pub fn resource(&self) -> Option<&'a dyn Resource> {
        match *self {
            Self::ConvergeStart { .. } | Self::ConvergeComplete { .. } => None,
            Self::StateLoaded { resource, .. }
            | Self::PreConverge { resource, .. }
            | Self::WouldUpdate { resource, .. }
            | Self::Updated { resource, .. }
            | Self::UpToDate { resource, .. }
            | Self::Skipped { resource, .. }
            | Self::Failed { resource, .. } => Some(resource),
        }
    }

    /// The action this event is about, if any
    pub fn action(&self) -> Option<&'a Action> {
        match *self {
            Self::ConvergeStart { .. } | Self::ConvergeComplete { .. } => None,
            Self::StateLoaded { action, .. }
            | Self::PreConverge { action, .. }
            | Self::WouldUpdate { action, .. }
            | Self::Updated { action, .. }
            | Self::UpToDate { action, .. }
            | Self::Skipped { action, .. }
            | Self::Failed { action, .. } => Some(action),
        }
    }
}

impl fmt::Display for LifecycleEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConvergeStart {
                resource_count,
                dry_run,
            } => write!(
                f,
                "converge_start(resources: {}, dry_run: {})",
                resource_count, dry_run
            ),
            Self::PreConverge {
                resource,
                action,
                description,
            }
            | Self::WouldUpdate {
                resource,
                action,
                description,
            } => write!(
                f,
                "{}({} :{}, {})",
                self.kind(),
                resource.id(),
                action,
                description
            ),
            Self::Skipped {
                resource,
                action,
                reason: detail,
            }
            | Self::Failed {
                resource,
                action,
                error: detail,
            } => write!(f, "{}({} :{}, {})", self.kind(), resource.id(), action, detail),
            Self::StateLoaded {
                resource, action, ..
            }
            | Self::Updated { resource, action }
            | Self::UpToDate { resource, action } => {
                write!(f, "{}({} :{})", self.kind(), resource.id(), action)
            }
            Self::ConvergeComplete { summary } => write!(
                f,
                "converge_complete(changes: {}, failed: {})",
                summary.total_changes(),
                summary.failed
            ),
        }
    }
}

/// Receives lifecycle events
///
/// Returning an error aborts the run; the error reaches the caller of
/// [`crate::execute`] unchanged.
pub trait EventHandler {
    /// Handle one event
    fn on_event(&mut self, event: &LifecycleEvent<'_>) -> Result<()>;
}

impl<F> EventHandler for F
where
    F: FnMut(&LifecycleEvent<'_>) -> Result<()>,
{
    fn on_event(&mut self, event: &LifecycleEvent<'_>) -> Result<()> {
        self(event)
    }
}

/// Entry in the dispatcher, kept for logging and lookups
struct HandlerEntry {
    name: String,
    handler: Box<dyn EventHandler>,
}

/// Fans lifecycle events out to subscribed handlers
///
/// Handlers run in subscription order. Dispatch stops at the first handler
/// error, which is returned as-is.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<HandlerEntry>,
}

impl EventDispatcher {
    /// Create a dispatcher with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler under a name used for logging
    pub fn subscribe(
        &mut self,
        name: impl Into<String>,
        handler: impl EventHandler + 'static,
    ) -> &mut Self {
        self.subscribe_boxed(name, Box::new(handler))
    }

    /// Subscribe an already boxed handler
    pub fn subscribe_boxed(
        &mut self,
        name: impl Into<String>,
        handler: Box<dyn EventHandler>,
    ) -> &mut Self {
        let name = name.into();
        log::debug!("Subscribing lifecycle handler {}", name);
        self.handlers.push(HandlerEntry { name, handler });
        self
    }

    /// Deliver an event to every handler
    pub fn dispatch(&mut self, event: &LifecycleEvent<'_>) -> Result<()> {
        log::trace!("Dispatching {}", event);
        for entry in &mut self.handlers {
            if let Err(e) = entry.handler.on_event(event) {
                log::debug!("Handler {} failed on {}: {}", entry.name, event.kind(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Number of subscribed handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Check whether a handler with this name is subscribed
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.iter().any(|entry| entry.name == name)
    }

    /// Names of subscribed handlers, in dispatch order
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|entry| entry.name.as_str()).collect()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();

        for name in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            dispatcher.subscribe(name, move |_: &LifecycleEvent<'_>| -> anyhow::Result<()> {
                seen.borrow_mut().push(name);
                Ok(())
            });
        }

        dispatcher
            .dispatch(&LifecycleEvent::ConvergeStart {
                resource_count: 0,
                dry_run: false,
            })
            .unwrap();

        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
        assert_eq!(dispatcher.handler_count(), 3);
        assert!(dispatcher.contains("second"));
        assert!(!dispatcher.contains("fourth"));
    }

    #[test]
    fn test_dispatch_stops_at_first_error() {
        let reached = Rc::new(RefCell::new(false));
        let reached_clone = Rc::clone(&reached);
        let mut dispatcher = EventDispatcher::new();

        dispatcher
            .subscribe("failing", |_: &LifecycleEvent<'_>| -> anyhow::Result<()> {
                anyhow::bail!("nope")
            })
            .subscribe("after", move |_: &LifecycleEvent<'_>| -> anyhow::Result<()> {
                *reached_clone.borrow_mut() = true;
                Ok(())
            });

        let err = dispatcher
            .dispatch(&LifecycleEvent::ConvergeStart {
                resource_count: 1,
                dry_run: false,
            })
            .unwrap_err();

        assert_eq!(err.to_string(), "nope");
        assert!(!*reached.borrow());
    }

    #[test]
    fn test_run_level_events_have_no_resource() {
        let summary = ExecuteSummary::default();
        let event = LifecycleEvent::ConvergeComplete { summary: &summary };
        assert!(event.resource().is_none());
        assert!(event.action().is_none());
        assert_eq!(event.kind(), "converge_complete");
    }
}
