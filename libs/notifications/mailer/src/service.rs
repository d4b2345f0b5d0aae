//! Mailer service: the provider-agnostic entry point for application code.
//!
//! The backend is chosen once, when the `Mailer` is built. Every call after
//! that goes through the [`EmailProvider`] trait object.

use crate::config::ProviderConfig;
use crate::error::MailerResult;
use crate::models::{Attachment, BatchItemResult, BatchMessage, BatchStrategy, SentEmail};
use crate::provider::{BrevoProvider, EmailProvider, ResendProvider, SendGridProvider};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{debug, info};

/// Supported email backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    Brevo,
    SendGrid,
    Resend,
}

/// Provider-agnostic mailer.
///
/// Cheap to clone; clones share the same adapter.
#[derive(Clone)]
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
}

impl Mailer {
    /// Create a mailer over an already-built provider.
    pub fn new(provider: Arc<dyn EmailProvider>) -> Self {
        Self { provider }
    }

    /// Build the adapter for `kind`, failing with a configuration error
    /// before any network call if `config` is invalid for it.
    pub fn from_kind(kind: ProviderKind, config: ProviderConfig) -> MailerResult<Self> {
        let provider: Arc<dyn EmailProvider> = match kind {
            ProviderKind::Brevo => Arc::new(BrevoProvider::new(config)?),
            ProviderKind::SendGrid => Arc::new(SendGridProvider::new(config)?),
            ProviderKind::Resend => Arc::new(ResendProvider::new(config)?),
        };
        info!(provider = provider.name(), "Mailer initialized");
        Ok(Self::new(provider))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn batch_strategy(&self) -> BatchStrategy {
        self.provider.batch_strategy()
    }

    /// Send a single email.
    pub async fn send_email(
        &self,
        source: &str,
        to: &str,
        subject: &str,
        body: Option<&str>,
        html_body: Option<&str>,
        attachments: Vec<Attachment>,
    ) -> MailerResult<SentEmail> {
        debug!(provider = self.provider.name(), to = %to, "Dispatching email");
        self.provider
            .send_email(source, to, subject, body, html_body, attachments)
            .await
    }

    /// Send a batch; results come back in input order.
    pub async fn send_batch_emails(
        &self,
        source: &str,
        messages: &[BatchMessage],
    ) -> MailerResult<Vec<BatchItemResult>> {
        debug!(
            provider = self.provider.name(),
            count = messages.len(),
            strategy = ?self.provider.batch_strategy(),
            "Dispatching batch"
        );
        self.provider.send_batch(source, messages).await
    }
}
