use super::{Notification, Notifier};
use crate::providers::policy::preview;
use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

/// Posts each notification as JSON to a fixed URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) {
        let resp = self
            .client
            .post(self.url.clone())
            .json(&notification)
            .send()
            .await;

        match resp {
            Ok(resp) if resp.status().is_success() => {
                debug!(kind = ?notification.kind, user_id = notification.user_id, "Webhook delivered");
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(%status, body = %preview(&body), "Webhook rejected notification");
            }
            Err(e) => warn!(error = %e, "Webhook delivery failed"),
        }
    }
}
