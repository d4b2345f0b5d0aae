//! SendGrid email provider
//!
//! Sends emails via SendGrid HTTP API.
//!
//! - Fixed sender identity from [`ProviderConfig`].
//! - Multipart content: `text/plain` first, then `text/html` (SendGrid rejects the reverse order).
//! - Success is `200` or `202`.
//! - Batches are emulated with one request per message.

use super::{failure_message, EmailProvider};
use crate::batch::send_sequentially;
use crate::config::ProviderConfig;
use crate::error::{ErrorKind, MailerError, MailerResult};
use crate::models::{
    Attachment, BatchItemResult, BatchMessage, BatchStrategy, EmailMessage, SentEmail,
};
use crate::translate::{BackendSignal, ErrorTranslator, HttpStatusTranslator};
use crate::transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// SendGrid API base URL
const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3";

/// SendGrid email provider
pub struct SendGridProvider {
    config: ProviderConfig,
    sender_email: String,
    transport: Arc<dyn HttpTransport>,
    translator: HttpStatusTranslator,
}

impl SendGridProvider {
    /// Create a new SendGridProvider on the default HTTP transport
    pub fn new(config: ProviderConfig) -> MailerResult<Self> {
        Self::validate(&config)?;
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Create a new SendGridProvider on a caller-supplied transport
    pub fn with_transport(
        config: ProviderConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> MailerResult<Self> {
        let sender_email = Self::validate(&config)?;
        Ok(Self {
            config,
            sender_email,
            transport,
            translator: HttpStatusTranslator::with_forbidden(ErrorKind::Validation),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn validate(config: &ProviderConfig) -> MailerResult<String> {
        config.require_api_key("SendGrid")?;
        Ok(config.require_sender("SendGrid")?.to_string())
    }

    fn build_request(&self, email: &EmailMessage) -> SendGridRequest {
        let mut content = Vec::new();

        if let Some(text) = email.text() {
            content.push(Content {
                content_type: "text/plain".to_string(),
                value: text.to_string(),
            });
        }

        if let Some(html) = email.html() {
            content.push(Content {
                content_type: "text/html".to_string(),
                value: html.to_string(),
            });
        }

        SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: email.to.clone(),
                    name: None,
                }],
            }],
            from: EmailAddress {
                email: self.sender_email.clone(),
                name: self.config.display_name().map(str::to_string),
            },
            subject: email.subject.clone(),
            content,
            attachments: email.attachments.iter().map(SendGridAttachment::from).collect(),
        }
    }

    fn translate_failure(&self, response: &TransportResponse) -> MailerError {
        // SendGrid error bodies carry messages but no stable category.
        let detail = response.json::<SendGridError>().map(|sg_error| {
            sg_error
                .errors
                .into_iter()
                .map(|e| match e.field {
                    Some(field) => format!("{} ({})", e.message, field),
                    None => e.message,
                })
                .collect::<Vec<_>>()
                .join(", ")
        });
        let message = failure_message("SendGrid", response.status, detail, &response.body);
        self.translator
            .translate(BackendSignal::Status { code: response.status }, message)
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    content: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<SendGridAttachment>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct SendGridAttachment {
    content: String,
    filename: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    disposition: &'static str,
}

impl From<&Attachment> for SendGridAttachment {
    fn from(att: &Attachment) -> Self {
        Self {
            content: att.content.clone(),
            filename: att.name.clone(),
            content_type: att.content_type.clone(),
            disposition: Attachment::DISPOSITION,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
    field: Option<String>,
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send_one(&self, email: &EmailMessage) -> MailerResult<SentEmail> {
        email.validate()?;

        let body = serde_json::to_value(self.build_request(email))?;
        let request = TransportRequest::new(
            format!("{}/mail/send", self.config.base_url(SENDGRID_API_URL)),
            body,
            self.config.timeout,
        )
        .header("Authorization", format!("Bearer {}", self.config.api_key));

        debug!(
            to = %email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Sending email via SendGrid"
        );

        let response = self.transport.post_json(request).await.map_err(|e| {
            error!(to = %email.to, error = %e, "SendGrid request failed");
            MailerError::from(e)
        })?;

        if !matches!(response.status, 200 | 202) {
            let err = self.translate_failure(&response);
            error!(
                to = %email.to,
                status = response.status,
                kind = %err.kind(),
                error = %err,
                "SendGrid API error"
            );
            return Err(err);
        }

        // SendGrid returns message ID in X-Message-Id header
        let message_id = response.header_value("X-Message-Id").map(str::to_string);
        info!(to = %email.to, message_id = ?message_id, "Email sent successfully via SendGrid");

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
        "sendgrid"
    }

    fn batch_strategy(&self) -> BatchStrategy {
        BatchStrategy::Emulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchOutcome;
    use crate::transport::{MockHttpTransport, RecordingTransport, TransportError};

    fn config() -> ProviderConfig {
        ProviderConfig::new("SG.test_key").with_sender("test@example.com")
    }

    fn provider(transport: &RecordingTransport) -> SendGridProvider {
        SendGridProvider::with_transport(config(), Arc::new(transport.clone())).unwrap()
    }

    fn email() -> EmailMessage {
        EmailMessage::new("", "user@example.com", "Subject")
    }

    #[test]
    fn test_email_address_serialization() {
        let addr = EmailAddress {
            email: "test@example.com".to_string(),
            name: Some("Test User".to_string()),
        };

        let json = serde_json::to_string(&addr).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("Test User"));

        let addr = EmailAddress {
            email: "test@example.com".to_string(),
            name: None,
        };
        assert!(!serde_json::to_string(&addr).unwrap().contains("name"));
    }

    #[test]
    fn test_configuration_errors() {
        let err = SendGridProvider::with_transport(
            ProviderConfig::new("").with_sender("test@example.com"),
            Arc::new(MockHttpTransport::new()),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = SendGridProvider::new(ProviderConfig::new("SG.test_key")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains("sender"));
    }

    #[tokio::test]
    async fn test_send_success_on_202() {
        let transport = RecordingTransport::new();
        transport
            .push(TransportResponse::new(202, "").with_header("X-Message-Id", "sg-123"))
            .await;

        let sent = provider(&transport)
            .send_one(&email().with_text("Hello"))
            .await
            .unwrap();
        assert_eq!(sent.message_id.as_deref(), Some("sg-123"));

        let request = &transport.requests().await[0];
        assert_eq!(request.url, "https://api.sendgrid.com/v3/mail/send");
        assert_eq!(request.header_value("Authorization"), Some("Bearer SG.test_key"));
        assert_eq!(request.body["from"]["email"], "test@example.com");
        assert_eq!(request.body["personalizations"][0]["to"][0]["email"], "user@example.com");
    }

    #[tokio::test]
    async fn test_both_bodies_are_sent_text_first() {
        let transport = RecordingTransport::with_fallback(TransportResponse::new(202, ""));
        provider(&transport)
            .send_one(&email().with_html("<p>Hi</p>").with_text("Hi"))
            .await
            .unwrap();

        let content = &transport.requests().await[0].body["content"];
        assert_eq!(content[0]["type"], "text/plain");
        assert_eq!(content[0]["value"], "Hi");
        assert_eq!(content[1]["type"], "text/html");
        assert_eq!(content[1]["value"], "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_attachments_pass_through() {
        let transport = RecordingTransport::with_fallback(TransportResponse::new(202, ""));
        provider(&transport)
            .send_one(
                &email()
                    .with_text("see attached")
                    .with_attachment(
                        Attachment::new("invoice.pdf", "JVBERi0=")
                            .with_content_type("application/pdf"),
                    ),
            )
            .await
            .unwrap();

        let attachment = &transport.requests().await[0].body["attachments"][0];
        assert_eq!(attachment["content"], "JVBERi0=");
        assert_eq!(attachment["filename"], "invoice.pdf");
        assert_eq!(attachment["type"], "application/pdf");
        assert_eq!(attachment["disposition"], "attachment");
    }

    #[tokio::test]
    async fn test_missing_body_is_validation_error() {
        let mut transport = MockHttpTransport::new();
        transport.expect_post_json().never();
        let provider = SendGridProvider::with_transport(config(), Arc::new(transport)).unwrap();

        let err = provider.send_one(&email()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_generic_send_error() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(|_| {
                Ok(TransportResponse::new(
                    429,
                    r#"{"errors":[{"message":"too many requests","field":null}]}"#,
                ))
            });
        let provider = SendGridProvider::with_transport(config(), Arc::new(transport)).unwrap();

        let err = provider.send_one(&email().with_text("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.message(), "SendGrid API error: 429 - too many requests");
    }

    const UNVERIFIED_SENDER: &str = concat!(
        r#"{"errors":[{"message":"The from address does not match a verified Sender Identity","#,
        r#""field":"from"}]}"#
    );

    #[tokio::test]
    async fn test_error_detail_includes_field() {
        let transport = RecordingTransport::new();
        transport.push_response(400, UNVERIFIED_SENDER).await;
        let err = provider(&transport)
            .send_one(&email().with_text("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("(from)"));
    }

    #[tokio::test]
    async fn test_forbidden_sender_is_validation_not_authentication() {
        let transport = RecordingTransport::new();
        transport.push_response(403, UNVERIFIED_SENDER).await;
        transport
            .push_response(401, r#"{"errors":[{"message":"Permission denied","field":null}]}"#)
            .await;
        let provider = provider(&transport);

        let err = provider.send_one(&email().with_text("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("verified Sender Identity"));

        let err = provider.send_one(&email().with_text("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_unexpected_success_status_is_not_success() {
        // RecordingTransport::new answers 201, which SendGrid never uses.
        let transport = RecordingTransport::new();
        let err = provider(&transport)
            .send_one(&email().with_text("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Send);
    }

    #[tokio::test]
    async fn test_batch_with_missing_recipient() {
        let transport = RecordingTransport::with_fallback(TransportResponse::new(202, ""));
        let messages = vec![
            BatchMessage::new("a@example.com", "1").with_text("one"),
            BatchMessage::new("", "2").with_text("two"),
            BatchMessage::new("c@example.com", "3").with_text("three"),
        ];

        let results = provider(&transport)
            .send_batch("test@example.com", &messages)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].outcome, BatchOutcome::Sent);
        assert_eq!(results[1].outcome, BatchOutcome::Failed);
        assert_eq!(results[1].kind, Some(ErrorKind::Validation));
        assert_eq!(results[2].outcome, BatchOutcome::Sent);

        let recipients: Vec<_> = transport
            .requests()
            .await
            .iter()
            .map(|r| r.body["personalizations"][0]["to"][0]["email"].clone())
            .collect();
        assert_eq!(recipients, vec!["a@example.com", "c@example.com"]);
    }

    #[tokio::test]
    async fn test_transport_error_in_batch_is_isolated() {
        let transport = RecordingTransport::with_fallback(TransportResponse::new(202, ""));
        transport.push_error(TransportError::new("connection reset")).await;

        let messages = vec![
            BatchMessage::new("a@example.com", "1").with_text("one"),
            BatchMessage::new("b@example.com", "2").with_text("two"),
        ];
        let results = provider(&transport)
            .send_batch("test@example.com", &messages)
            .await
            .unwrap();

        assert_eq!(results[0].kind, Some(ErrorKind::Send));
        assert!(results[1].is_sent());
    }
}
