//! Error types for choreography setup and binding

use crate::choreography::Target;
use thiserror::Error;

/// Errors raised while defining or binding a choreography
///
/// Failures inside callbacks are not represented here: they are plain
/// [`anyhow::Error`] values that travel unchanged through the event
/// dispatcher to whoever drives the convergence run.
#[derive(Debug, Error)]
pub enum Error {
    /// `bind_to` was given a target that is not a resource identifier
    #[error("choreography {choreography} cannot be bound to {target}: only resources are supported")]
    UnsupportedTargetKind {
        /// Name of the choreography being bound
        choreography: String,
        /// The rejected target
        target: Target,
    },

    /// A verb was found neither among primitives nor in the authoring scope
    #[error("undefined name `{name}`")]
    UnresolvedIdentifier {
        /// The name that could not be resolved
        name: String,
    },

    /// A primitive rejected its arguments
    #[error("{verb}: {message}")]
    InvalidArguments {
        /// Verb of the primitive
        verb: String,
        /// What was wrong with the arguments
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidArguments`]
    pub fn invalid_arguments(verb: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            verb: verb.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for choreography operations
pub type Result<T> = std::result::Result<T, Error>;
