//! Primitive registry
//!
//! Primitives are reusable building blocks (check a file, announce a change,
//! ...) that add callbacks to a choreography. Each one is known to the
//! registry under a verb; [`Choreography::call`] looks the verb up, builds the
//! primitive from positional arguments and lets it register itself.

use crate::choreography::Choreography;
use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A configured primitive, ready to register itself
pub trait Primitive: fmt::Debug {
    /// Add this primitive's callbacks to `choreography`
    fn register_with(self: Box<Self>, choreography: &mut Choreography) -> Result<()>;
}

/// A primitive type that can be registered by verb
pub trait PrimitiveKind: Primitive + Sized + 'static {
    /// Verb under which the primitive is exposed
    const VERB: &'static str;

    /// One-line description shown in listings
    const SUMMARY: &'static str;

    /// Build the primitive from positional arguments
    fn from_args(args: &[Value]) -> Result<Self>;
}

/// Builds a primitive from positional arguments
pub type PrimitiveFactory = Box<dyn Fn(&[Value]) -> Result<Box<dyn Primitive>>>;

struct Entry {
    summary: String,
    factory: PrimitiveFactory,
}

/// Verb → primitive factory map
///
/// The registry does not look at arguments; each primitive validates its own.
#[derive(Default)]
pub struct PrimitiveRegistry {
    entries: BTreeMap<String, Entry>,
}

impl PrimitiveRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every primitive shipped with this crate
    pub fn builtin() -> Self {
        use crate::primitives::{Announce, CheckFile, TouchFile};

        let mut registry = Self::new();
        registry
            .register::<CheckFile>()
            .register::<Announce>()
            .register::<TouchFile>();
        registry
    }

    /// Register a primitive type under its verb
    ///
    /// A later registration for the same verb replaces the earlier one.
    pub fn register<P: PrimitiveKind>(&mut self) -> &mut Self {
        self.register_fn(P::VERB, P::SUMMARY, |args: &[Value]| {
            Ok(Box::new(P::from_args(args)?))
        })
    }

    /// Register a factory function under `verb`
    pub fn register_fn<F>(
        &mut self,
        verb: impl Into<String>,
        summary: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Box<dyn Primitive>> + 'static,
    {
        let verb = verb.into();
        log::debug!("Registering primitive {}", verb);
        self.entries.insert(
            verb,
            Entry {
                summary: summary.into(),
                factory: Box::new(factory),
            },
        );
        self
    }

    /// Factory for `verb`, if registered
    pub fn factory(&self, verb: &str) -> Option<&PrimitiveFactory> {
        self.entries.get(verb).map(|entry| &entry.factory)
    }

    /// Check whether `verb` is registered
    pub fn contains(&self, verb: &str) -> bool {
        self.entries.contains_key(verb)
    }

    /// Registered verbs with their summaries, sorted by verb
    pub fn verbs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(verb, entry)| (verb.as_str(), entry.summary.as_str()))
    }

    /// Number of registered primitives
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no primitive is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for PrimitiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

// ============================================================================
// Argument helpers for primitive implementations
// ============================================================================

/// Check that exactly `expected` arguments were given
pub fn expect_arity(verb: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(crate::Error::invalid_arguments(
            verb,
            format!("expected {} argument(s), got {}", expected, args.len()),
        ))
    }
}

/// Read argument `index` as a string
pub fn string_arg(verb: &str, args: &[Value], index: usize) -> Result<String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(crate::Error::invalid_arguments(
            verb,
            format!("argument {} must be a string, got {}", index + 1, other),
        )),
        None => Err(crate::Error::invalid_arguments(
            verb,
            format!("missing argument {}", index + 1),
        )),
    }
}
