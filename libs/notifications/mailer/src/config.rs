//! Provider configuration.
//!
//! Values arrive from the caller already loaded; nothing here reads the
//! environment. Adapters validate the config once, at construction.

use crate::error::{MailerError, MailerResult};
use std::time::Duration;

/// Default per-call network timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable settings for one adapter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider API key.
    pub api_key: String,
    /// Fixed sender address, required by Brevo and SendGrid.
    pub sender_email: Option<String>,
    /// Sender display name.
    pub sender_name: Option<String>,
    /// Timeout applied to each network call.
    pub timeout: Duration,
    /// Base URL override (defaults to the provider's production endpoint).
    pub api_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            sender_email: None,
            sender_name: None,
            timeout: DEFAULT_TIMEOUT,
            api_url: None,
        }
    }

    /// Builder method to set the sender address.
    pub fn with_sender(mut self, email: impl Into<String>) -> Self {
        self.sender_email = Some(email.into());
        self
    }

    /// Builder method to set the sender display name.
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Fail with a configuration error when the API key is blank.
    pub fn require_api_key(&self, provider: &str) -> MailerResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(MailerError::configuration(format!(
                "{} API key is required",
                provider
            )));
        }
        Ok(())
    }

    /// Fail with a configuration error when no sender address is set.
    pub fn require_sender(&self, provider: &str) -> MailerResult<&str> {
        match self.sender_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => Ok(email),
            _ => Err(MailerError::configuration(format!(
                "{} sender email is required",
                provider
            ))),
        }
    }

    /// Non-empty display name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.sender_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Sender rendered as `Name <email>`, or just `email` without a name.
    pub fn sender_mailbox(&self) -> Option<String> {
        let email = self.sender_email.as_deref().map(str::trim)?;
        if email.is_empty() {
            return None;
        }
        Some(match self.display_name() {
            Some(name) => format!("{} <{}>", name, email),
            None => email.to_string(),
        })
    }

    /// Base URL, falling back to `default`, without a trailing slash.
    pub fn base_url<'a>(&'a self, default: &'a str) -> &'a str {
        self.api_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
    }
}
