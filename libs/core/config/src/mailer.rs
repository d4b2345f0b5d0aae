use crate::{env_optional, env_parse, env_required, ConfigError, FromEnv};

/// Email provider settings as read from the environment.
///
/// Kept as plain strings; the binary turns them into a `mailer::ProviderConfig`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailerEnvConfig {
    /// `MAILER_PROVIDER`: brevo, sendgrid or resend
    pub provider: String,
    /// `MAILER_API_KEY`
    pub api_key: String,
    /// `MAILER_SENDER_EMAIL`
    pub sender_email: Option<String>,
    /// `MAILER_SENDER_NAME`
    pub sender_name: Option<String>,
    /// `MAILER_TIMEOUT_SECS`, defaults to 10
    pub timeout_secs: u64,
    /// `MAILER_API_URL`, overrides the provider endpoint
    pub api_url: Option<String>,
}

impl FromEnv for MailerEnvConfig {
    /// Requires MAILER_PROVIDER and MAILER_API_KEY
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            provider: env_required("MAILER_PROVIDER")?,
            api_key: env_required("MAILER_API_KEY")?,
            sender_email: env_optional("MAILER_SENDER_EMAIL"),
            sender_name: env_optional("MAILER_SENDER_NAME"),
            timeout_secs: env_parse("MAILER_TIMEOUT_SECS", 10)?,
            api_url: env_optional("MAILER_API_URL"),
        })
    }
}
