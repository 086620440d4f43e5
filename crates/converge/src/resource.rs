//! Resource trait for declarative state management
//!
//! A Resource represents something that can be in a certain state,
//! and can be changed to reach a desired state by one of its actions.

use crate::context::ApplyContext;
use crate::types::{Action, ApplyResult, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for convergent resources
///
/// Every resource in the system implements this trait, which provides:
/// - Identity (type, name and the `type[name]` identifier)
/// - State detection (current vs desired for an action)
/// - State convergence (apply)
/// - Whether an action can be simulated without side effects
///
/// # Example
///
/// ```ignore
/// use converge::{Action, ApplyContext, ApplyResult, Resource, ResourceState};
///
/// #[derive(Debug)]
/// struct Marker {
///     path: String,
/// }
///
/// impl Resource for Marker {
///     fn resource_type(&self) -> &'static str {
///         "marker"
///     }
///
///     fn name(&self) -> String {
///         self.path.clone()
///     }
///
///     fn current_state(&self) -> anyhow::Result<ResourceState> {
///         if std::path::Path::new(&self.path).exists() {
///             Ok(ResourceState::Present { details: None })
///         } else {
///             Ok(ResourceState::Absent)
///         }
///     }
///
///     fn desired_state(&self, _action: &Action) -> ResourceState {
///         ResourceState::Present { details: None }
///     }
///
///     fn apply(&self, _action: &Action, ctx: &mut ApplyContext<'_>) -> anyhow::Result<ApplyResult> {
///         ctx.converge_by(format!("create {}", self.path), || {
///             std::fs::write(&self.path, "")?;
///             Ok(())
///         })?;
///         Ok(ApplyResult::Created)
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Resource type category (e.g. "file", "directory", "command")
    fn resource_type(&self) -> &'static str;

    /// Name of this resource within its type (e.g. a path)
    fn name(&self) -> String;

    /// Identifier used to match lifecycle events, formatted `type[name]`
    ///
    /// Two resources with the same type and name share an identifier and
    /// cannot be told apart by observers.
    fn id(&self) -> String {
        format!("{}[{}]", self.resource_type(), self.name())
    }

    /// Human-readable description of what this resource does
    fn description(&self) -> String {
        self.id()
    }

    /// Action used when a plan entry does not name one
    fn default_action(&self) -> Action {
        Action::CREATE
    }

    /// Whether `action` can be evaluated without being applied
    ///
    /// Dry-run capable actions are only applied when their current state
    /// differs from the desired one, and they announce the real change through
    /// [`ApplyContext::converge_by`]. Actions that cannot be simulated are
    /// applied on every run and are skipped entirely during a dry run.
    fn supports_dry_run(&self, _action: &Action) -> bool {
        true
    }

    /// Detect the current state of this resource
    fn current_state(&self) -> Result<ResourceState>;

    /// The state `action` should leave the resource in
    fn desired_state(&self, action: &Action) -> ResourceState;

    /// Check if the resource needs changes to reach the desired state
    ///
    /// Default implementation compares current and desired states.
    fn needs_apply(&self, action: &Action, current: &ResourceState) -> bool {
        *current != self.desired_state(action)
    }

    /// Apply `action`
    ///
    /// Side effects must run inside [`ApplyContext::converge_by`] so that
    /// observers learn about the change right before it happens and so that
    /// dry runs stay inert.
    fn apply(&self, action: &Action, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;
