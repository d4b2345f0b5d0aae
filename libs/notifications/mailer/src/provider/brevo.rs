//! Brevo email provider
//!
//! Sends emails via the Brevo transactional email REST API.
//!
//! - Fixed sender identity from [`ProviderConfig`]; the per-message `from` is not used.
//! - Single body form per request: HTML when present, otherwise plain text.
//! - Success is exactly `201 Created`.
//! - Batches are emulated with one request per message.

use super::{failure_message, EmailProvider};
use crate::batch::send_sequentially;
use crate::config::ProviderConfig;
use crate::error::{MailerError, MailerResult};
use crate::models::{
    Attachment, BatchItemResult, BatchMessage, BatchStrategy, EmailMessage, SentEmail,
};
use crate::translate::{BackendSignal, ErrorTranslator, HttpStatusTranslator};
use crate::transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Brevo API base URL
const BREVO_API_URL: &str = "https://api.brevo.com/v3";

/// Status Brevo answers an accepted email with
const BREVO_SUCCESS_STATUS: u16 = 201;

/// Brevo email provider
pub struct BrevoProvider {
    config: ProviderConfig,
    sender_email: String,
    transport: Arc<dyn HttpTransport>,
    translator: HttpStatusTranslator,
}

impl BrevoProvider {
    /// Create a new BrevoProvider on the default HTTP transport
    pub fn new(config: ProviderConfig) -> MailerResult<Self> {
        Self::validate(&config)?;
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Create a new BrevoProvider on a caller-supplied transport
    pub fn with_transport(
        config: ProviderConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> MailerResult<Self> {
        let sender_email = Self::validate(&config)?;
        Ok(Self {
            config,
            sender_email,
            transport,
            translator: HttpStatusTranslator::new(),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn validate(config: &ProviderConfig) -> MailerResult<String> {
        config.require_api_key("Brevo")?;
        Ok(config.require_sender("Brevo")?.to_string())
    }

    fn endpoint(&self) -> String {
        format!("{}/smtp/email", self.config.base_url(BREVO_API_URL))
    }

    fn build_request(&self, email: &EmailMessage) -> BrevoRequest {
        // Brevo gets one body form; HTML wins over plain text.
        let (html_content, text_content) = match (email.html(), email.text()) {
            (Some(html), _) => (Some(html.to_string()), None),
            (None, text) => (None, text.map(str::to_string)),
        };

        BrevoRequest {
            sender: Sender {
                email: self.sender_email.clone(),
                name: self.config.display_name().map(str::to_string),
            },
            to: vec![Recipient {
                email: email.to.clone(),
            }],
            subject: email.subject.clone(),
            html_content,
            text_content,
            attachment: email.attachments.iter().map(BrevoAttachment::from).collect(),
        }
    }

    fn translate_failure(&self, response: &TransportResponse) -> MailerError {
        let parsed = response.json::<BrevoError>();
        let category = parsed.as_ref().and_then(|e| e.code.clone());
        let detail = parsed.and_then(|e| e.message);
        let message = failure_message("Brevo", response.status, detail, &response.body);
        self.translator
            .translate(BackendSignal::from_parts(response.status, category), message)
    }
}

// Brevo API request/response structures

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoRequest {
    sender: Sender,
    to: Vec<Recipient>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachment: Vec<BrevoAttachment>,
}

#[derive(Debug, Serialize)]
struct Sender {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Recipient {
    email: String,
}

#[derive(Debug, Serialize)]
struct BrevoAttachment {
    name: String,
    content: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    disposition: &'static str,
}

impl From<&Attachment> for BrevoAttachment {
    fn from(att: &Attachment) -> Self {
        Self {
            name: att.name.clone(),
            content: att.content.clone(),
            content_type: att.content_type.clone(),
            disposition: Attachment::DISPOSITION,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoResponse {
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrevoError {
    code: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl EmailProvider for BrevoProvider {
    async fn send_one(&self, email: &EmailMessage) -> MailerResult<SentEmail> {
        email.validate()?;

        let body = serde_json::to_value(self.build_request(email))?;
        let request = TransportRequest::new(self.endpoint(), body, self.config.timeout)
            .header("accept", "application/json")
            .header("api-key", self.config.api_key.as_str());

        debug!(
            to = %email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Sending email via Brevo"
        );

        let response = self.transport.post_json(request).await.map_err(|e| {
            error!(to = %email.to, error = %e, "Brevo request failed");
            MailerError::from(e)
        })?;

        if response.status != BREVO_SUCCESS_STATUS {
            let err = self.translate_failure(&response);
            error!(
                to = %email.to,
                status = response.status,
                kind = %err.kind(),
                error = %err,
                "Failed to send email via Brevo"
            );
            return Err(err);
        }

        let message_id = response.json::<BrevoResponse>().and_then(|r| r.message_id);
        info!(to = %email.to, message_id = ?message_id, "Email sent successfully via Brevo");

        Ok(SentEmail { message_id })
    }

    async fn send_batch(
        &self,
        source: &str,
        messages: &[BatchMessage],
    ) -> MailerResult<Vec<BatchItemResult>> {
        Ok(send_sequentially(self, source, messages).await)
    }

    fn name(&self) -> &'static str {
        "brevo"
    }

    fn batch_strategy(&self) -> BatchStrategy {
        BatchStrategy::Emulated
    }
}
