use crate::error::{ErrorKind, MailerError, MailerResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// File attached to an outbound email.
///
/// `content` is already base64-encoded; adapters pass it through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient
    pub name: String,
    /// Base64-encoded file content
    pub content: String,
    /// Media type, e.g. `application/pdf`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    /// Disposition sent with every attachment
    pub const DISPOSITION: &'static str = "attachment";

    /// Create an attachment from base64 content
    pub fn new(name: impl Into<String>, content_base64: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content_base64.into(),
            content_type: None,
        }
    }

    /// Create an attachment from raw bytes
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(name, STANDARD.encode(bytes))
    }

    /// Set media type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Email message handed to [`crate::EmailProvider::send_one`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Email subject
    pub subject: String,
    /// Plain text body
    #[serde(default)]
    pub text_body: Option<String>,
    /// HTML body
    #[serde(default)]
    pub html_body: Option<String>,
    /// Attachments
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    /// Create a new email with required fields
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    /// Set plain text body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_body = Some(text.into());
        self
    }

    /// Set HTML body
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    /// Plain text body, treating an empty string as absent
    pub fn text(&self) -> Option<&str> {
        non_empty(self.text_body.as_deref())
    }

    /// HTML body, treating an empty string as absent
    pub fn html(&self) -> Option<&str> {
        non_empty(self.html_body.as_deref())
    }

    /// Pre-flight check applied by every adapter before dispatch.
    pub fn validate(&self) -> MailerResult<()> {
        if self.to.trim().is_empty() {
            return Err(MailerError::validation("Recipient address is required"));
        }
        if self.text().is_none() && self.html().is_none() {
            return Err(MailerError::validation(
                "Either body or html_body must be provided",
            ));
        }
        Ok(())
    }
}

/// One entry of a batch send; the sender is supplied once per batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMessage {
    pub to: String,
    pub subject: String,
    #[serde(default, alias = "body")]
    pub text_body: Option<String>,
    #[serde(default)]
    pub html_body: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl BatchMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_body = Some(text.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Expand into a full message sent from `source`
    pub fn to_message(&self, source: &str) -> EmailMessage {
        EmailMessage {
            from: source.to_string(),
            to: self.to.clone(),
            subject: self.subject.clone(),
            text_body: self.text_body.clone(),
            html_body: self.html_body.clone(),
            attachments: self.attachments.clone(),
        }
    }
}

/// Successful single send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentEmail {
    /// Provider-specific message ID, when the backend returns one
    pub message_id: Option<String>,
}

/// Outcome of one message within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutcome {
    Sent,
    Failed,
}

/// Per-message batch result, at the same index as its input message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub recipient: String,
    pub outcome: BatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl BatchItemResult {
    pub fn sent(recipient: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            recipient: recipient.into(),
            outcome: BatchOutcome::Sent,
            message_id,
            error: None,
            kind: None,
        }
    }

    pub fn failed(recipient: impl Into<String>, error: &MailerError) -> Self {
        Self {
            recipient: recipient.into(),
            outcome: BatchOutcome::Failed,
            message_id: None,
            error: Some(error.to_string()),
            kind: Some(error.kind()),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.outcome == BatchOutcome::Sent
    }
}

/// How an adapter implements batch sending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStrategy {
    /// One combined backend request per batch
    Native,
    /// One single-send call per message, failures isolated
    Emulated,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
