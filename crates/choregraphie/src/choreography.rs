//! Named before/after callback bundles
//!
//! A [`Choreography`] collects the callbacks to run before a resource
//! actually changes and after the change has been applied. Once defined, it is
//! attached to one or more resources with [`Choreography::bind_to`].
//!
//! # Example
//!
//! ```ignore
//! use choregraphie::Choreography;
//! use serde_json::json;
//!
//! let choreography = Choreography::define("drain", |c| {
//!     c.before(|resource| {
//!         log::info!("draining traffic before {}", resource.id());
//!         Ok(())
//!     });
//!     c.call("check_file", &[json!("/var/run/maintenance")])?;
//!     c.after(|resource| {
//!         log::info!("{} converged, restoring traffic", resource.id());
//!         Ok(())
//!     });
//!     Ok(())
//! })?;
//!
//! choreography.bind_to("file[/etc/nginx/nginx.conf]", &mut events)?;
//! ```

use crate::binding::Binding;
use crate::error::{Error, Result};
use crate::registry::PrimitiveRegistry;
use crate::sequence::CallbackSequence;
use converge::{EventDispatcher, Resource};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Targets
// ============================================================================

/// What a choreography can be bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A resource identifier such as `file[/tmp/a]`
    Resource(String),
    /// A run-level event such as `converge_start`; reserved, not supported yet
    Event(String),
}

impl Target {
    /// Short name of the target kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resource(_) => "resource",
            Self::Event(_) => "event",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(id) => write!(f, "resource {id}"),
            Self::Event(name) => write!(f, "event :{name}"),
        }
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self::Resource(id.to_string())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Self::Resource(id)
    }
}

// ============================================================================
// Authoring scope
// ============================================================================

/// Fallback for verbs that are not primitives
///
/// A scope is captured when the choreography is created and answers every
/// [`Choreography::call`] that no primitive claims, so helpers and values of
/// the code defining the choreography stay reachable by name.
pub trait Scope {
    /// Resolve `name` called with positional `args`
    fn resolve(&self, name: &str, args: &[Value]) -> Result<Value>;
}

impl<F> Scope for F
where
    F: Fn(&str, &[Value]) -> Result<Value>,
{
    fn resolve(&self, name: &str, args: &[Value]) -> Result<Value> {
        self(name, args)
    }
}

/// Scope that knows no names
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn resolve(&self, name: &str, _args: &[Value]) -> Result<Value> {
        Err(Error::UnresolvedIdentifier {
            name: name.to_string(),
        })
    }
}

// ============================================================================
// Choreography
// ============================================================================

/// A named pair of before/after callback sequences
pub struct Choreography {
    name: String,
    before: CallbackSequence,
    after: CallbackSequence,
    registry: Arc<PrimitiveRegistry>,
    scope: Box<dyn Scope>,
}

impl Choreography {
    /// Create an empty choreography with the built-in primitives and no
    /// authoring scope
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_registry(name, Arc::new(PrimitiveRegistry::builtin()), EmptyScope)
    }

    /// Create an empty choreography with explicit primitives and scope
    pub fn with_registry(
        name: impl Into<String>,
        registry: Arc<PrimitiveRegistry>,
        scope: impl Scope + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            before: CallbackSequence::new(),
            after: CallbackSequence::new(),
            registry,
            scope: Box::new(scope),
        }
    }

    /// Create a choreography and populate it with `setup`
    pub fn define<F>(name: impl Into<String>, setup: F) -> Result<Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut choreography = Self::new(name);
        setup(&mut choreography)?;
        Ok(choreography)
    }

    /// Like [`define`](Self::define), with explicit primitives and scope
    pub fn define_with<F>(
        name: impl Into<String>,
        registry: Arc<PrimitiveRegistry>,
        scope: impl Scope + 'static,
        setup: F,
    ) -> Result<Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut choreography = Self::with_registry(name, registry, scope);
        setup(&mut choreography)?;
        Ok(choreography)
    }

    /// Name of the choreography
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a callback to run right before the resource changes
    pub fn before<F>(&mut self, callback: F) -> &CallbackSequence
    where
        F: Fn(&dyn Resource) -> anyhow::Result<()> + 'static,
    {
        log::debug!("Registering a before block for {}", self.name);
        self.before.register(callback)
    }

    /// Register a callback to run once the change has been applied
    pub fn after<F>(&mut self, callback: F) -> &CallbackSequence
    where
        F: Fn(&dyn Resource) -> anyhow::Result<()> + 'static,
    {
        log::debug!("Registering an after block for {}", self.name);
        self.after.register(callback)
    }

    /// Callbacks run before the change
    pub fn before_sequence(&self) -> &CallbackSequence {
        &self.before
    }

    /// Callbacks run after the change
    pub fn after_sequence(&self) -> &CallbackSequence {
        &self.after
    }

    /// Primitives available to [`call`](Self::call)
    pub fn registry(&self) -> &PrimitiveRegistry {
        &self.registry
    }

    /// Invoke a verb by name
    ///
    /// Primitive verbs build the primitive from `args` and let it register
    /// itself on this choreography; they return `Value::Null`. Any other verb
    /// is handed to the authoring scope and its answer returned unchanged.
    pub fn call(&mut self, verb: &str, args: &[Value]) -> Result<Value> {
        let registry = Arc::clone(&self.registry);
        if let Some(factory) = registry.factory(verb) {
            log::debug!("Adding primitive {} to {}", verb, self.name);
            let primitive = factory(args)?;
            primitive.register_with(self)?;
            return Ok(Value::Null);
        }

        log::trace!("Forwarding {} from {} to its scope", verb, self.name);
        self.scope.resolve(verb, args)
    }

    /// Attach this choreography to a resource
    ///
    /// The binding subscribes to `events` and runs the callbacks registered so
    /// far; callbacks registered after this call only apply to later bindings.
    /// Only [`Target::Resource`] is supported. Any other target fails with
    /// [`Error::UnsupportedTargetKind`] and subscribes nothing.
    pub fn bind_to(&self, target: impl Into<Target>, events: &mut EventDispatcher) -> Result<()> {
        match target.into() {
            Target::Resource(id) => {
                log::info!("Registering on {} for {}", id, self.name);
                let binding = Binding::new(
                    self.name.clone(),
                    id,
                    self.before.clone(),
                    self.after.clone(),
                );
                events.subscribe(binding.subscription_name(), binding);
                Ok(())
            }
            target => Err(Error::UnsupportedTargetKind {
                choreography: self.name.clone(),
                target,
            }),
        }
    }
}

impl fmt::Debug for Choreography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Choreography")
            .field("name", &self.name)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Primitive;
    use crate::testing::Probe;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Mark(String);

    impl Primitive for Mark {
        fn register_with(self: Box<Self>, choreography: &mut Choreography) -> Result<()> {
            let label = self.0;
            choreography.before(move |_: &dyn Resource| {
                log::debug!("mark {label}");
                Ok(())
            });
            Ok(())
        }
    }

    fn mark_registry() -> Arc<PrimitiveRegistry> {
        let mut registry = PrimitiveRegistry::new();
        registry.register_fn("mark", "add a before marker", |args: &[Value]| {
            let label = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| Error::invalid_arguments("mark", "expected a label"))?;
            Ok(Box::new(Mark(label.to_string())))
        });
        Arc::new(registry)
    }

    #[test]
    fn test_define_registers_in_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2, o3) = (Rc::clone(&order), Rc::clone(&order), Rc::clone(&order));

        let choreography = Choreography::define("ordered", |c| {
            c.before(move |_: &dyn Resource| {
                o1.borrow_mut().push("b1");
                Ok(())
            });
            c.after(move |_: &dyn Resource| {
                o2.borrow_mut().push("a1");
                Ok(())
            });
            c.before(move |_: &dyn Resource| {
                o3.borrow_mut().push("b2");
                Ok(())
            });
            Ok(())
        })
        .unwrap();

        let probe = Probe::new("file", "/tmp/a");
        choreography.before_sequence().run(&probe).unwrap();
        choreography.after_sequence().run(&probe).unwrap();

        assert_eq!(choreography.name(), "ordered");
        assert_eq!(*order.borrow(), vec!["b1", "b2", "a1"]);
    }

    #[test]
    fn test_call_primitive_registers_itself() {
        let choreography = Choreography::define_with("marked", mark_registry(), EmptyScope, |c| {
            let value = c.call("mark", &[json!("one")])?;
            assert_eq!(value, Value::Null);
            Ok(())
        })
        .unwrap();

        assert_eq!(choreography.before_sequence().len(), 1);
        assert!(choreography.after_sequence().is_empty());
    }

    #[test]
    fn test_primitive_argument_errors_surface() {
        let err = Choreography::define_with("marked", mark_registry(), EmptyScope, |c| {
            c.call("mark", &[])?;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, Error::InvalidArguments { ref verb, .. } if verb == "mark"));
    }

    #[test]
    fn test_unknown_verb_is_forwarded_to_scope() {
        let scope = |name: &str, args: &[Value]| -> Result<Value> {
            match name {
                "lock_dir" => Ok(json!("/var/lock")),
                "join" => Ok(json!(
                    args.iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join("/")
                )),
                _ => Err(Error::UnresolvedIdentifier {
                    name: name.to_string(),
                }),
            }
        };

        Choreography::define_with("scoped", mark_registry(), scope, |c| {
            let dir = c.call("lock_dir", &[])?;
            assert_eq!(dir, json!("/var/lock"));
            let path = c.call("join", &[dir, json!("app.lock")])?;
            assert_eq!(path, json!("/var/lock/app.lock"));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_unresolved_verb_fails_plainly() {
        let err = Choreography::define("empty", |c| {
            c.call("no_such_helper", &[json!(1)])?;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, Error::UnresolvedIdentifier { ref name } if name == "no_such_helper"));
        assert_eq!(err.to_string(), "undefined name `no_such_helper`");
    }

    #[test]
    fn test_builtin_primitives_are_available_by_default() {
        let choreography = Choreography::new("defaults");
        assert!(choreography.registry().contains("check_file"));
        assert!(choreography.registry().contains("announce"));
    }

    #[test]
    fn test_bind_to_resource_subscribes() {
        let choreography = Choreography::new("watcher");
        let mut events = EventDispatcher::new();

        choreography.bind_to("file[/tmp/a]", &mut events).unwrap();
        choreography
            .bind_to(String::from("file[/tmp/b]"), &mut events)
            .unwrap();

        assert_eq!(events.handler_count(), 2);
        assert!(events.contains("watcher@file[/tmp/a]"));
    }

    #[test]
    fn test_bind_to_event_target_is_rejected() {
        let choreography = Choreography::new("watcher");
        let mut events = EventDispatcher::new();

        let err = choreography
            .bind_to(Target::Event("some_symbol".into()), &mut events)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::UnsupportedTargetKind { ref target, .. } if target.kind() == "event"
        ));
        assert_eq!(events.handler_count(), 0);
    }
}
