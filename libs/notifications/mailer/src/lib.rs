//! Provider-agnostic transactional email sending
//!
//! Application code sends through one interface ([`Mailer`] or the
//! [`EmailProvider`] trait); the backend is picked when the mailer is built.
//!
//! ## Components
//!
//! - **Error taxonomy**: [`ErrorKind`] and [`MailerError`], the only error type
//!   crossing the adapter boundary
//! - **Translators**: [`HttpStatusTranslator`] and [`ResendTranslator`] map
//!   backend signals onto the taxonomy
//! - **Providers**: [`BrevoProvider`], [`SendGridProvider`] (emulated batches)
//!   and [`ResendProvider`] (native batches)
//! - **Transport**: [`HttpTransport`] seam with a `reqwest` implementation and a
//!   [`RecordingTransport`] for tests
//!
//! ## Usage
//!
//! ```ignore
//! use mailer::{BatchMessage, Mailer, ProviderConfig, ProviderKind};
//!
//! let config = ProviderConfig::new(api_key).with_sender("noreply@example.com");
//! let mailer = Mailer::from_kind(ProviderKind::Brevo, config)?;
//!
//! mailer
//!     .send_email("noreply@example.com", "user@example.com", "Welcome", Some("Hi!"), None, vec![])
//!     .await?;
//!
//! let results = mailer
//!     .send_batch_emails(
//!         "noreply@example.com",
//!         &[BatchMessage::new("a@example.com", "Hi").with_text("Hi")],
//!     )
//!     .await?;
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod service;
pub mod translate;
pub mod transport;

pub use config::{ProviderConfig, DEFAULT_TIMEOUT};
pub use error::{ErrorKind, MailerError, MailerResult};
pub use models::{
    Attachment, BatchItemResult, BatchMessage, BatchOutcome, BatchStrategy, EmailMessage, SentEmail,
};
pub use provider::{BrevoProvider, EmailProvider, ResendProvider, SendGridProvider};
pub use service::{Mailer, ProviderKind};
pub use translate::{BackendSignal, ErrorTranslator, HttpStatusTranslator, ResendTranslator};
pub use transport::{
    HttpTransport, RecordingTransport, ReqwestTransport, TransportError, TransportRequest,
    TransportResponse,
};
