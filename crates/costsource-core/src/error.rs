//! Error taxonomy shared across the workspace.
//!
//! [`CostSourceError`] mirrors the transport status-code vocabulary in
//! spec.md §7 one-to-one, so an RPC-serving crate can map each variant
//! to its wire status without a second table. [`ValidationError`] is
//! the non-RPC, library-internal error produced by the builder and
//! serializer (spec.md §7, "Validation error").

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CostSourceError>;

/// Errors surfaced by plugin RPC handlers, the server runtime, and the
/// client. Each variant names the spec.md §7 transport status it maps
/// to.
#[derive(Debug, Error)]
pub enum CostSourceError {
    /// Malformed resource-type, missing required attributes, a
    /// non-SemVer spec version, an invalid enum value, or a NaN/∞ cost.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unsupported resource type or unknown recommendation id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Legacy plugin without `GetPluginInfo` or an optional capability.
    #[error("unimplemented: {0}")]
    Unimplemented(String),

    /// Upstream pricing source down, or a failed health check. Never
    /// retried inside this SDK.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Request body exceeded the 1 MiB payload limit.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Panic recovery or unexpected serializer failure. The message
    /// returned to a remote caller must stay generic; detail goes to
    /// `tracing` server-side.
    #[error("internal error: {0}")]
    Internal(String),

    /// Propagated from a cancellation handle or a request deadline.
    #[error("deadline exceeded or cancelled: {0}")]
    Cancelled(String),

    /// A builder or serializer failure that never reaches the wire as
    /// an RPC error.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CostSourceError {
    /// A short machine-stable name for the error kind, used by the
    /// server runtime to pick a transport status code and by tests
    /// asserting on error taxonomy without matching on message text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Unimplemented(_) => "unimplemented",
            Self::Unavailable(_) => "unavailable",
            Self::ResourceExhausted(_) => "resource_exhausted",
            Self::Internal(_) => "internal",
            Self::Cancelled(_) => "cancelled",
            Self::Validation(_) => "invalid_argument",
        }
    }
}

/// Non-RPC, library-internal validation failure: `{Field, Message,
/// Suggestion}` per spec.md §4.4/§4.2/§7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validation failed for field `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}
