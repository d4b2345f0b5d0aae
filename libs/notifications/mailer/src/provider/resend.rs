//! Resend email provider
//!
//! Sends emails via the Resend REST API and maps its structured
//! `{statusCode, name, message}` errors through [`ResendTranslator`].
//!
//! Batches use Resend's native `/emails/batch` endpoint: one request per
//! batch, results mapped back to input order. Messages that fail pre-flight
//! validation are reported in place and left out of the request.

use super::{failure_message, EmailProvider};
use crate::config::ProviderConfig;
use crate::error::{ErrorKind, MailerError, MailerResult};
use crate::models::{
    Attachment, BatchItemResult, BatchMessage, BatchStrategy, EmailMessage, SentEmail,
};
use crate::translate::{BackendSignal, ErrorTranslator, ResendTranslator};
use crate::transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Resend API base URL
const RESEND_API_URL: &str = "https://api.resend.com";

/// Maximum emails Resend accepts in one batch request
pub const RESEND_BATCH_LIMIT: usize = 100;

/// Resend email provider
pub struct ResendProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
    translator: ResendTranslator,
    permissive_batch: bool,
}

impl ResendProvider {
    /// Create a new ResendProvider on the default HTTP transport
    pub fn new(config: ProviderConfig) -> MailerResult<Self> {
        config.require_api_key("Resend")?;
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Create a new ResendProvider on a caller-supplied transport
    pub fn with_transport(
        config: ProviderConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> MailerResult<Self> {
        config.require_api_key("Resend")?;
        Ok(Self {
            config,
            transport,
            translator: ResendTranslator,
            permissive_batch: false,
        })
    }

    /// Let Resend accept the valid part of a batch and report the rest
    /// per item, instead of rejecting the whole request.
    pub fn with_permissive_batch(mut self, permissive: bool) -> Self {
        self.permissive_batch = permissive;
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(RESEND_API_URL), path)
    }

    fn request(&self, path: &str, body: serde_json::Value) -> TransportRequest {
        TransportRequest::new(self.url(path), body, self.config.timeout)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    /// Per-message sender, falling back to the configured one.
    fn sender_for(&self, from: &str) -> MailerResult<String> {
        let from = from.trim();
        if !from.is_empty() {
            return Ok(from.to_string());
        }
        self.config
            .sender_mailbox()
            .ok_or_else(|| MailerError::validation("Sender address is required"))
    }

    fn build_email(&self, email: &EmailMessage) -> MailerResult<ResendEmail> {
        email.validate()?;
        Ok(ResendEmail {
            from: self.sender_for(&email.from)?,
            to: vec![email.to.clone()],
            subject: email.subject.clone(),
            text: email.text().map(str::to_string),
            html: email.html().map(str::to_string),
            attachments: email.attachments.iter().map(ResendAttachment::from).collect(),
        })
    }

    fn translate_failure(&self, response: &TransportResponse) -> MailerError {
        let parsed = response.json::<ResendErrorBody>();
        let category = parsed.as_ref().and_then(|e| e.name.clone());
        let detail = parsed.and_then(|e| e.message);
        let message = failure_message("Resend", response.status, detail, &response.body);
        self.translator
            .translate(BackendSignal::from_parts(response.status, category), message)
    }

    async fn dispatch(&self, request: TransportRequest) -> MailerResult<TransportResponse> {
        self.transport.post_json(request).await.map_err(|e| {
            error!(error = %e, "Resend request failed");
            MailerError::from(e)
        })
    }

    /// Map a successful batch response onto the queued messages, in order.
    fn batch_results(
        &self,
        recipients: &[String],
        response: ResendBatchResponse,
    ) -> Vec<BatchItemResult> {
        let mut results: Vec<Option<BatchItemResult>> = vec![None; recipients.len()];

        for item in response.errors {
            match recipients.get(item.index) {
                Some(recipient) => {
                    let err = MailerError::validation(item.message);
                    results[item.index] = Some(BatchItemResult::failed(recipient, &err));
                }
                None => warn!(
                    index = item.index,
                    "Resend reported an error for an unknown batch index"
                ),
            }
        }

        // `data` lists accepted emails in request order, skipping rejected ones.
        let mut ids = response.data.into_iter();
        recipients
            .iter()
            .zip(results)
            .map(|(recipient, result)| {
                result.unwrap_or_else(|| match ids.next() {
                    Some(sent) => BatchItemResult::sent(recipient, sent.id),
                    None => BatchItemResult::failed(
                        recipient,
                        &MailerError::new(
                            ErrorKind::Send,
                            "Resend batch response did not acknowledge this email",
                            None,
                        ),
                    ),
                })
            })
            .collect()
    }
}

// Resend API request/response structures

#[derive(Debug, Serialize)]
struct ResendEmail {
    from: String,
    to: Vec<String>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment>,
}

#[derive(Debug, Serialize)]
struct ResendAttachment {
    filename: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    disposition: &'static str,
}

impl From<&Attachment> for ResendAttachment {
    fn from(att: &Attachment) -> Self {
        Self {
            filename: att.name.clone(),
            content: att.content.clone(),
            content_type: att.content_type.clone(),
            disposition: Attachment::DISPOSITION,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResendSent {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResendErrorBody {
    name: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResendBatchResponse {
    #[serde(default)]
    data: Vec<ResendSent>,
    #[serde(default)]
    errors: Vec<ResendBatchError>,
}

#[derive(Debug, Deserialize)]
struct ResendBatchError {
    index: usize,
    message: String,
}

/// Slot of one input message while a batch is being assembled.
enum Slot {
    /// Rejected before dispatch.
    Done(BatchItemResult),
    /// Position in the outgoing request.
    Queued(usize),
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send_one(&self, email: &EmailMessage) -> MailerResult<SentEmail> {
        let payload = self.build_email(email)?;

        debug!(
            to = %email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Sending email via Resend"
        );

        let response = self
            .dispatch(self.request("/emails", serde_json::to_value(&payload)?))
            .await?;

        if response.status != 200 {
            let err = self.translate_failure(&response);
            error!(
                to = %email.to,
                status = response.status,
                kind = %err.kind(),
                error = %err,
                "Failed to send email via Resend"
            );
            return Err(err);
        }

        let message_id = response.json::<ResendSent>().and_then(|r| r.id);
        info!(to = %email.to, message_id = ?message_id, "Email sent successfully via Resend");

        Ok(SentEmail { message_id })
    }

    async fn send_batch(
        &self,
        source: &str,
        messages: &[BatchMessage],
    ) -> MailerResult<Vec<BatchItemResult>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        if messages.len() > RESEND_BATCH_LIMIT {
            return Err(MailerError::validation(format!(
                "Resend accepts at most {} emails per batch, got {}",
                RESEND_BATCH_LIMIT,
                messages.len()
            )));
        }

        let mut slots = Vec::with_capacity(messages.len());
        let mut payload = Vec::new();
        let mut recipients = Vec::new();

        for (index, entry) in messages.iter().enumerate() {
            match self.build_email(&entry.to_message(source)) {
                Ok(email) => {
                    slots.push(Slot::Queued(payload.len()));
                    payload.push(email);
                    recipients.push(entry.to.clone());
                }
                Err(e) => {
                    warn!(index, to = %entry.to, error = %e, "Batch item rejected before dispatch");
                    slots.push(Slot::Done(BatchItemResult::failed(&entry.to, &e)));
                }
            }
        }

        let sent = if payload.is_empty() {
            Vec::new()
        } else {
            let validation = if self.permissive_batch { "permissive" } else { "strict" };
            let request = self
                .request("/emails/batch", serde_json::to_value(&payload)?)
                .header("x-batch-validation", validation);

            debug!(count = payload.len(), validation, "Sending batch via Resend");

            // One combined request: a failure here fails the whole batch.
            let response = self.dispatch(request).await?;
            if response.status != 200 {
                let err = self.translate_failure(&response);
                error!(
                    status = response.status,
                    kind = %err.kind(),
                    error = %err,
                    "Resend batch rejected"
                );
                return Err(err);
            }

            let body = response.json::<ResendBatchResponse>().ok_or_else(|| {
                MailerError::new(
                    ErrorKind::Send,
                    "Resend batch response could not be decoded",
                    Some(BackendSignal::Status {
                        code: response.status,
                    }),
                )
            })?;
            self.batch_results(&recipients, body)
        };

        let results: Vec<BatchItemResult> = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Done(result) => result,
                Slot::Queued(position) => sent[position].clone(),
            })
            .collect();

        info!(
            total = results.len(),
            sent = results.iter().filter(|r| r.is_sent()).count(),
            "Resend batch processed"
        );

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "resend"
    }

    fn batch_strategy(&self) -> BatchStrategy {
        BatchStrategy::Native
    }
}
