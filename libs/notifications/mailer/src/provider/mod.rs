//! Email provider adapters
//!
//! Every backend implements [`EmailProvider`]; application code only ever
//! holds the trait object.

pub mod brevo;
pub mod resend;
pub mod sendgrid;

pub use brevo::BrevoProvider;
pub use resend::ResendProvider;
pub use sendgrid::SendGridProvider;

use crate::error::MailerResult;
use crate::models::{
    Attachment, BatchItemResult, BatchMessage, BatchStrategy, EmailMessage, SentEmail,
};
use async_trait::async_trait;

/// Uniform send contract implemented by every adapter.
///
/// No implementation retries internally: a failed call makes exactly one
/// backend request.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send one email with exactly one backend call
    async fn send_one(&self, message: &EmailMessage) -> MailerResult<SentEmail>;

    /// Send a batch; results are in input order, one per message.
    ///
    /// Individual failures become failed items. An `Err` means the batch as a
    /// whole could not be attempted.
    async fn send_batch(
        &self,
        source: &str,
        messages: &[BatchMessage],
    ) -> MailerResult<Vec<BatchItemResult>>;

    /// Get provider name
    fn name(&self) -> &'static str;

    /// Batch strategy this adapter uses
    fn batch_strategy(&self) -> BatchStrategy;

    /// Send one email from loose parts
    async fn send_email(
        &self,
        source: &str,
        to: &str,
        subject: &str,
        body: Option<&str>,
        html_body: Option<&str>,
        attachments: Vec<Attachment>,
    ) -> MailerResult<SentEmail> {
        let message = EmailMessage {
            from: source.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            text_body: body.map(str::to_string),
            html_body: html_body.map(str::to_string),
            attachments,
        };
        self.send_one(&message).await
    }
}

/// Message for a non-success backend response, falling back to the raw body.
pub(crate) fn failure_message(
    provider: &str,
    status: u16,
    detail: Option<String>,
    raw_body: &str,
) -> String {
    let detail = detail
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| raw_body.trim().to_string());
    if detail.is_empty() {
        format!("{} API error: {}", provider, status)
    } else {
        format!("{} API error: {} - {}", provider, status, detail)
    }
}
