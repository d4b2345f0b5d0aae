//! Error taxonomy shared by every provider adapter.
//!
//! Each adapter surfaces its failures as exactly one [`MailerError`] variant.
//! Callers branch on [`MailerError::kind`]; the attached [`BackendSignal`] is
//! for diagnostics only.

use crate::translate::BackendSignal;
use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Result type for mailer operations.
pub type MailerResult<T> = Result<T, MailerError>;

/// Normalized error kinds, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Adapter misconfigured (missing credential or sender).
    Configuration,
    /// Backend rejected the credential.
    Authentication,
    /// Backend (or pre-flight) rejected the request payload.
    Validation,
    /// Backend signalled request-rate exhaustion.
    RateLimit,
    /// Backend-side application failure.
    Provider,
    /// Catch-all send failure.
    Send,
}

impl ErrorKind {
    /// Whether this kind describes a failure on the backend side rather than
    /// in the caller's input or credentials.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, ErrorKind::Provider | ErrorKind::Send)
    }
}

/// Errors returned by providers and the [`crate::Mailer`] facade.
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    /// Raised at construction only, never mid-send.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        signal: Option<BackendSignal>,
    },

    #[error("Invalid request: {message}")]
    Validation {
        message: String,
        signal: Option<BackendSignal>,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        signal: Option<BackendSignal>,
    },

    #[error("Provider error: {message}")]
    Provider {
        message: String,
        signal: Option<BackendSignal>,
    },

    #[error("Send failed: {message}")]
    Send {
        message: String,
        signal: Option<BackendSignal>,
    },
}

impl MailerError {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>, signal: Option<BackendSignal>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Configuration => Self::Configuration(message),
            ErrorKind::Authentication => Self::Authentication { message, signal },
            ErrorKind::Validation => Self::Validation { message, signal },
            ErrorKind::RateLimit => Self::RateLimit { message, signal },
            ErrorKind::Provider => Self::Provider { message, signal },
            ErrorKind::Send => Self::Send { message, signal },
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Pre-flight payload rejection, raised before any network call.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message, None)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Send { .. } => ErrorKind::Send,
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration(message)
            | Self::Authentication { message, .. }
            | Self::Validation { message, .. }
            | Self::RateLimit { message, .. }
            | Self::Provider { message, .. }
            | Self::Send { message, .. } => message,
        }
    }

    /// The backend signal this error was translated from, if any.
    pub fn signal(&self) -> Option<&BackendSignal> {
        match self {
            Self::Configuration(_) => None,
            Self::Authentication { signal, .. }
            | Self::Validation { signal, .. }
            | Self::RateLimit { signal, .. }
            | Self::Provider { signal, .. }
            | Self::Send { signal, .. } => signal.as_ref(),
        }
    }
}

impl From<TransportError> for MailerError {
    fn from(err: TransportError) -> Self {
        MailerError::new(ErrorKind::Send, err.to_string(), None)
    }
}

impl From<serde_json::Error> for MailerError {
    fn from(err: serde_json::Error) -> Self {
        MailerError::new(
            ErrorKind::Send,
            format!("JSON serialization error: {}", err),
            None,
        )
    }
}
