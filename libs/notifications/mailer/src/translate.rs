//! Error translators: pure mappings from a backend-native failure signal to
//! an [`ErrorKind`].
//!
//! Rules are applied in a fixed order and the first match wins:
//! authentication, validation, rate limit, provider, then the `Send` fallback.

use crate::error::{ErrorKind, MailerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A backend failure signal, independent of how the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendSignal {
    /// Plain HTTP status code.
    Status { code: u16 },
    /// Structured error category, optionally with the status it came with.
    Category {
        status: Option<u16>,
        category: String,
    },
}

impl BackendSignal {
    /// Build a signal from a status and an optional error category.
    pub fn from_parts(status: u16, category: Option<String>) -> Self {
        match category {
            Some(category) if !category.is_empty() => Self::Category {
                status: Some(status),
                category,
            },
            _ => Self::Status { code: status },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code } => Some(*code),
            Self::Category { status, .. } => *status,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Status { .. } => None,
            Self::Category { category, .. } => Some(category),
        }
    }
}

impl fmt::Display for BackendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { code } => write!(f, "status {}", code),
            Self::Category {
                status: Some(code),
                category,
            } => write!(f, "{} (status {})", category, code),
            Self::Category {
                status: None,
                category,
            } => write!(f, "{}", category),
        }
    }
}

/// Maps backend signals onto the error taxonomy.
///
/// `classify` must be total and stable: every signal yields exactly one kind,
/// and equal signals always yield the same kind.
pub trait ErrorTranslator: Send + Sync {
    fn classify(&self, signal: &BackendSignal) -> ErrorKind;

    /// Build the normalized error, keeping the signal for diagnostics.
    fn translate(&self, signal: BackendSignal, message: impl Into<String>) -> MailerError
    where
        Self: Sized,
    {
        let kind = self.classify(&signal);
        MailerError::new(kind, message, Some(signal))
    }
}

/// Translator for REST backends whose error vocabulary is the HTTP status
/// code (Brevo, SendGrid).
///
/// 401 is always an authentication failure. What 403 means differs per
/// backend, so it is set per adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusTranslator {
    forbidden: ErrorKind,
}

impl HttpStatusTranslator {
    /// 403 treated as a rejected credential
    pub const fn new() -> Self {
        Self::with_forbidden(ErrorKind::Authentication)
    }

    /// 403 classified as `forbidden`
    pub const fn with_forbidden(forbidden: ErrorKind) -> Self {
        Self { forbidden }
    }
}

impl Default for HttpStatusTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorTranslator for HttpStatusTranslator {
    fn classify(&self, signal: &BackendSignal) -> ErrorKind {
        match signal.status() {
            Some(401) => ErrorKind::Authentication,
            Some(403) => self.forbidden,
            Some(400 | 413 | 422) => ErrorKind::Validation,
            Some(429) => ErrorKind::RateLimit,
            Some(500..=599) => ErrorKind::Provider,
            _ => ErrorKind::Send,
        }
    }
}

const RESEND_AUTH_CATEGORIES: &[&str] =
    &["missing_api_key", "invalid_api_key", "restricted_api_key"];

const RESEND_VALIDATION_CATEGORIES: &[&str] = &[
    "validation_error",
    "missing_required_field",
    "missing_required_fields",
    "invalid_parameter",
    "invalid_attachment",
    "invalid_from_address",
];

const RESEND_RATE_LIMIT_CATEGORIES: &[&str] = &[
    "rate_limit_exceeded",
    "daily_quota_exceeded",
    "monthly_quota_exceeded",
];

const RESEND_PROVIDER_CATEGORIES: &[&str] = &["application_error", "internal_server_error"];

/// Translator for Resend's structured `{statusCode, name}` errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResendTranslator;

impl ErrorTranslator for ResendTranslator {
    fn classify(&self, signal: &BackendSignal) -> ErrorKind {
        let status = signal.status();
        let category = signal.category().unwrap_or_default();
        let in_set = |set: &[&str]| set.contains(&category);

        if status == Some(401) || in_set(RESEND_AUTH_CATEGORIES) {
            ErrorKind::Authentication
        } else if in_set(RESEND_VALIDATION_CATEGORIES) {
            ErrorKind::Validation
        } else if status == Some(429) || in_set(RESEND_RATE_LIMIT_CATEGORIES) {
            ErrorKind::RateLimit
        } else if in_set(RESEND_PROVIDER_CATEGORIES) {
            ErrorKind::Provider
        } else {
            ErrorKind::Send
        }
    }
}
