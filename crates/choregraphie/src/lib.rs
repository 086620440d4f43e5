//! # Choregraphie
//!
//! Run callbacks around the real convergence of a named resource, without
//! touching the resource's definition.
//!
//! A [`Choreography`] holds a *before* and an *after* callback sequence. Bound
//! to a resource identifier, it watches the lifecycle events of a
//! [`converge`] run:
//!
//! - *after* callbacks run once for every confirmed update of the resource;
//! - *before* callbacks run right before the resource actually changes. For
//!   actions that can be simulated this means waiting for the change to be
//!   confirmed: a resource that is inspected but already up to date never
//!   triggers them.
//!
//! ## Example
//!
//! ```ignore
//! use choregraphie::Choreography;
//! use converge::{EventDispatcher, ExecuteOptions, execute_simple};
//! use serde_json::json;
//!
//! let mut events = EventDispatcher::new();
//!
//! let choreography = Choreography::define("nginx", |c| {
//!     c.call("check_file", &[json!("/var/run/maintenance-window")])?;
//!     c.after(|resource| {
//!         log::info!("{} changed, reloading nginx", resource.id());
//!         Ok(())
//!     });
//!     Ok(())
//! })?;
//! choreography.bind_to("file[/etc/nginx/nginx.conf]", &mut events)?;
//!
//! let summary = execute_simple(&plan, &ExecuteOptions::default(), &mut events)?;
//! ```
//!
//! ## Primitives and scope
//!
//! [`Choreography::call`] resolves verbs first against the
//! [`PrimitiveRegistry`] and then against the [`Scope`] captured at creation,
//! so configuration-driven setups can use both reusable primitives and values
//! from the surrounding code.

pub mod binding;
pub mod choreography;
pub mod error;
pub mod primitives;
pub mod registry;
pub mod sequence;

#[cfg(test)]
mod testing;

pub use binding::Binding;
pub use choreography::{Choreography, EmptyScope, Scope, Target};
pub use error::{Error, Result};
pub use registry::{Primitive, PrimitiveFactory, PrimitiveKind, PrimitiveRegistry};
pub use sequence::{Callback, CallbackSequence};
