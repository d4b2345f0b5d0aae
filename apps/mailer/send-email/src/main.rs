//! send-email
//!
//! Sends a single email, or a batch described by a JSON file, through the
//! provider selected with `MAILER_PROVIDER`.

use clap::{Parser, Subcommand};
use core_config::mailer::MailerEnvConfig;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use eyre::{eyre, Result, WrapErr};
use mailer::{Attachment, BatchMessage, Mailer, ProviderConfig, ProviderKind};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "send-email")]
#[command(about = "Send email through Brevo, SendGrid or Resend")]
struct Cli {
    /// Sender address. Defaults to MAILER_SENDER_EMAIL.
    #[arg(short, long, global = true)]
    from: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a single email
    Send {
        /// Recipient address
        to: String,

        /// Subject line
        subject: String,

        /// Plain-text body
        #[arg(short, long)]
        text: Option<String>,

        /// HTML body
        #[arg(long)]
        html: Option<String>,

        /// Files to attach
        #[arg(short, long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Send every message in a JSON array file
    Batch {
        /// Path to a JSON array of {to, subject, text_body, html_body, attachments}
        file: PathBuf,
    },
}

/// Map environment settings onto the library's provider config.
fn provider_config(env: &MailerEnvConfig) -> ProviderConfig {
    let mut config =
        ProviderConfig::new(&env.api_key).with_timeout(Duration::from_secs(env.timeout_secs));
    if let Some(email) = &env.sender_email {
        config = config.with_sender(email);
    }
    if let Some(name) = &env.sender_name {
        config = config.with_sender_name(name);
    }
    if let Some(url) = &env.api_url {
        config = config.with_api_url(url);
    }
    config
}

async fn read_attachment(path: &Path) -> Result<Attachment> {
    let bytes = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("Failed to read attachment {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| eyre!("Attachment path has no file name: {}", path.display()))?;
    Ok(Attachment::from_bytes(name, &bytes))
}

fn parse_batch(raw: &str) -> Result<Vec<BatchMessage>> {
    serde_json::from_str(raw).wrap_err("Batch file must be a JSON array of messages")
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let env = MailerEnvConfig::from_env()?;
    let kind = ProviderKind::from_str(&env.provider).map_err(|_| {
        eyre!(
            "Unknown MAILER_PROVIDER '{}': expected brevo, sendgrid or resend",
            env.provider
        )
    })?;

    let source = cli
        .from
        .clone()
        .or_else(|| env.sender_email.clone())
        .ok_or_else(|| eyre!("No sender: pass --from or set MAILER_SENDER_EMAIL"))?;

    let mailer = Mailer::from_kind(kind, provider_config(&env))?;

    match cli.command {
        Commands::Send {
            to,
            subject,
            text,
            html,
            attachments,
        } => {
            let mut files = Vec::with_capacity(attachments.len());
            for path in &attachments {
                files.push(read_attachment(path).await?);
            }

            let sent = mailer
                .send_email(&source, &to, &subject, text.as_deref(), html.as_deref(), files)
                .await?;

            info!(provider = mailer.provider_name(), to = %to, "Email sent");
            let output = json!({
                "provider": mailer.provider_name(),
                "recipient": to,
                "message_id": sent.message_id,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Batch { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .wrap_err_with(|| format!("Failed to read batch file {}", file.display()))?;
            let messages = parse_batch(&raw)?;

            let results = mailer.send_batch_emails(&source, &messages).await?;
            let failed = results.iter().filter(|r| !r.is_sent()).count();
            if failed > 0 {
                warn!(failed, total = results.len(), "Some batch messages failed");
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
