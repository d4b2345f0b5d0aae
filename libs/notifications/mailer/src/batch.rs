//! Emulated batch sending for backends without a batch endpoint.

use crate::models::{BatchItemResult, BatchMessage};
use crate::provider::EmailProvider;
use tracing::{info, warn};

/// Send each message in input order through `send_one`, turning every
/// outcome into one [`BatchItemResult`] at the same index.
///
/// A failed message never stops the remaining ones from being attempted.
pub async fn send_sequentially<P>(
    provider: &P,
    source: &str,
    messages: &[BatchMessage],
) -> Vec<BatchItemResult>
where
    P: EmailProvider + ?Sized,
{
    let mut results = Vec::with_capacity(messages.len());

    for (index, entry) in messages.iter().enumerate() {
        let message = entry.to_message(source);
        match provider.send_one(&message).await {
            Ok(sent) => results.push(BatchItemResult::sent(&entry.to, sent.message_id)),
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    index,
                    to = %entry.to,
                    kind = %e.kind(),
                    error = %e,
                    "Batch item failed"
                );
                results.push(BatchItemResult::failed(&entry.to, &e));
            }
        }
    }

    let sent = results.iter().filter(|r| r.is_sent()).count();
    info!(
        provider = provider.name(),
        total = results.len(),
        sent,
        failed = results.len() - sent,
        "Batch processed"
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, MailerError, MailerResult};
    use crate::models::{BatchOutcome, BatchStrategy, EmailMessage, SentEmail};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Fails for recipients containing "bad", records every attempt.
    struct FlakyProvider {
        attempts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EmailProvider for FlakyProvider {
        async fn send_one(&self, message: &EmailMessage) -> MailerResult<SentEmail> {
            self.attempts.lock().await.push(message.to.clone());
            if message.to.contains("bad") {
                return Err(MailerError::new(ErrorKind::RateLimit, "throttled", None));
            }
            Ok(SentEmail {
                message_id: Some(format!("id-{}", message.to)),
            })
        }

        async fn send_batch(
        &self,
        source: &str,
        messages: &[BatchMessage],
    ) -> MailerResult<Vec<BatchItemResult>> {
            Ok(send_sequentially(self, source, messages).await)
        }

        fn name(&self) -> &'static str {
            "flaky"
        }

        fn batch_strategy(&self) -> BatchStrategy {
            BatchStrategy::Emulated
        }
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_ordered() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let provider = FlakyProvider {
            attempts: Arc::clone(&attempts),
        };
        let messages = vec![
            BatchMessage::new("a@example.com", "1").with_text("x"),
            BatchMessage::new("bad@example.com", "2").with_text("x"),
            BatchMessage::new("c@example.com", "3").with_text("x"),
        ];

        let results = provider.send_batch("noreply@example.com", &messages).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].outcome, BatchOutcome::Sent);
        assert_eq!(results[0].message_id.as_deref(), Some("id-a@example.com"));
        assert_eq!(results[1].outcome, BatchOutcome::Failed);
        assert_eq!(results[1].kind, Some(ErrorKind::RateLimit));
        assert!(results[1].error.as_deref().is_some_and(|e| !e.is_empty()));
        assert_eq!(results[2].recipient, "c@example.com");
        assert!(results[2].is_sent());
        assert_eq!(attempts.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let provider = FlakyProvider {
            attempts: Arc::new(Mutex::new(Vec::new())),
        };
        let results = send_sequentially(&provider, "noreply@example.com", &[]).await;
        assert!(results.is_empty());
    }
}
