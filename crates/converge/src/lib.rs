//! # Converge
//!
//! A small resource convergence engine that narrates its work.
//!
//! This crate provides the core abstractions for declaring desired state,
//! detecting current state, and converging resources to match it, while
//! reporting every step of the run as a [`LifecycleEvent`].
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (files, directories, commands)
//! - **Action**: The change requested for a resource (`create`, `delete`, `run`, ...)
//! - **ExecutionPlan**: An ordered list of resource actions
//! - **EventDispatcher**: Delivers lifecycle events to subscribed handlers
//!
//! ## Dry runs
//!
//! Resources say per action whether they can be evaluated without being
//! applied ([`Resource::supports_dry_run`]). Such actions are applied only when
//! their state differs from the desired one, and the real change is announced
//! by a `PreConverge` event emitted from [`ApplyContext::converge_by`].
//! Actions that cannot be simulated are applied on every run, so loading
//! their state is already part of the real pass.
//!
//! ## Example
//!
//! ```ignore
//! use converge::{EventDispatcher, ExecuteOptions, ExecutionPlan, LifecycleEvent, execute_simple};
//!
//! let mut events = EventDispatcher::new();
//! events.subscribe("printer", |event: &LifecycleEvent<'_>| -> anyhow::Result<()> {
//!     println!("{event}");
//!     Ok(())
//! });
//!
//! let mut plan = ExecutionPlan::new();
//! plan.add_default(Box::new(my_resource));
//!
//! let summary = execute_simple(&plan, &ExecuteOptions::default(), &mut events)?;
//! ```

pub mod context;
pub mod events;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, NoProgress, ProgressCallback};
pub use events::{EventDispatcher, EventHandler, LifecycleEvent};
pub use executor::{execute, execute_simple};
pub use planner::{ExecutionPlan, PlanEntry};
pub use resource::{BoxedResource, Resource};
pub use types::{Action, ApplyResult, ExecuteOptions, ExecuteSummary, ResourceState};
