//! Outbound delivery of exchanged messages to pillar webhooks

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::domain::{CrossPillarMessage, Pillar};

/// Receives messages that passed the delivery guard
///
/// Delivery is fire-and-forget: implementations must not block the caller
/// and never report failures back.
pub trait MessageSink: Send + Sync {
    fn deliver(&self, target: &Pillar, message: &CrossPillarMessage);
}

/// POSTs each message to the target pillar's webhook path, if it has one
pub struct WebhookSink {
    http: Client,
}

impl WebhookSink {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        debug!(?timeout, "WebhookSink::new: called");
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl MessageSink for WebhookSink {
    fn deliver(&self, target: &Pillar, message: &CrossPillarMessage) {
        let Some(url) = target.webhook_url() else {
            return;
        };
        let body = message.webhook_body();
        let http = self.http.clone();
        let message_id = message.id.clone();
        let pillar = target.name.clone();

        tokio::spawn(async move {
            debug!(%pillar, %message_id, %url, "WebhookSink: posting message");
            match http.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%pillar, %message_id, "WebhookSink: delivered");
                }
                Ok(response) => {
                    warn!(%pillar, %message_id, status = response.status().as_u16(), "Webhook rejected message");
                }
                Err(e) => {
                    warn!(%pillar, %message_id, error = %e, "Webhook delivery failed");
                }
            }
        });
    }
}
