//! Error taxonomy for document loading, navigation, and reference resolution
//!
//! A single `ResolveError` enum covers every failure the engine can surface.
//! All errors propagate immediately to the caller; nothing is retried or
//! degraded internally. Messages always carry the full failing location
//! (document location + pointer) so failures are diagnosable without tracing.

use thiserror::Error;

use crate::reference::Reference;
use crate::tree::Expect;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ResolveError>;

/// All failures surfaced by the loader, navigation, and resolver layers
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The opener could not locate or open the resource
    #[error("resource not found: {location}")]
    ResourceNotFound {
        location: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A locator string is not a valid absolute or relative URL
    #[error("invalid resource location '{location}': {source}")]
    InvalidLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// The document text could not be parsed; the parser's message is
    /// preserved verbatim in the source
    #[error("failed to parse document {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Malformed pointer or fragment syntax (bad escape, missing leading
    /// slash, non-numeric token applied to an array)
    #[error("invalid pointer syntax: {message}")]
    PointerSyntax { message: String },

    /// A navigation miss: absent key, index out of range, descent into a
    /// scalar, or ascent past the root
    #[error("{message}")]
    NotFound { message: String },

    /// A navigated node's variant does not match the expected type
    #[error("{role} at {reference}: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Which navigation produced the node ("Child" or "Parent")
        role: &'static str,
        expected: Expect,
        /// The offending node value
        actual: serde_json::Value,
        /// Untyped reference to the offending path
        reference: Reference,
    },

    /// A pointer lookup failed while resolving a relative reference string
    #[error("failed to resolve reference: {message}")]
    ReferenceResolution {
        /// Message of the underlying lookup failure
        message: String,
        /// Deepest resource/pointer combination successfully reached
        partial: Option<Reference>,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    /// The partial reference reached before a resolution failure, if any
    pub fn partial_reference(&self) -> Option<&Reference> {
        match self {
            ResolveError::ReferenceResolution { partial, .. } => partial.as_ref(),
            _ => None,
        }
    }
}
