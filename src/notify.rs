//! Notification transport trait and implementations.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AlertError, Result};

// ---

/// Delivers rendered alert text to an external channel.
///
/// Retries and backoff are the implementation's concern; the pipeline
/// treats any error as "not sent" and leaves the alert eligible for the
/// next cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text`. `high_priority` selects the emergency channel when the
    /// implementation has one.
    async fn send(&self, text: &str, high_priority: bool) -> Result<()>;
}

/// LINE Notify style transport: form-encoded `message` with a bearer token.
///
/// High-priority alerts use the emergency token when configured and fall
/// back to the regular token otherwise.
#[derive(Debug, Clone)]
pub struct LineNotifier {
    client: Client,
    url: String,
    token: String,
    emergency_token: Option<String>,
}

impl LineNotifier {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        token: impl Into<String>,
        emergency_token: Option<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            token: token.into(),
            emergency_token,
        }
    }

    fn token_for(&self, high_priority: bool) -> &str {
        match (&self.emergency_token, high_priority) {
            (Some(token), true) => token,
            _ => &self.token,
        }
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn send(&self, text: &str, high_priority: bool) -> Result<()> {
        // ---
        let transport = |e: reqwest::Error| AlertError::Transport(e.to_string());

        self.client
            .post(&self.url)
            .bearer_auth(self.token_for(high_priority))
            .form(&[("message", text)])
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;

        tracing::info!("Sent notification successfully (high priority: {})", high_priority);
        Ok(())
    }
}

/// Transport that only logs. Used when no token is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, text: &str, high_priority: bool) -> Result<()> {
        tracing::info!("[dry-run] notification (high priority: {}):\n{}", high_priority, text);
        Ok(())
    }
}
