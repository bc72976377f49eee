use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{Message, Notifier};
use crate::error::{NotifyError, Result};

/// Posts messages as a single embed to a chat webhook (Discord-compatible
/// payload).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

/// Webhook body for one message.
pub fn payload(message: &Message) -> Value {
    let fields: Vec<Value> = message
        .fields
        .iter()
        .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
        .collect();

    let mut embed = json!({
        "title": message.title,
        "color": message.sentiment.color(),
        "fields": fields,
        "footer": { "text": message.footer },
        "timestamp": message.timestamp.to_rfc3339(),
    });
    if let Some(description) = &message.description {
        embed["description"] = json!(description);
    }

    json!({ "embeds": [embed] })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, message: Message) -> std::result::Result<(), NotifyError> {
        let resp = self.client.post(&self.url).json(&payload(&message)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        debug!(title = %message.title, "webhook delivered");
        Ok(())
    }
}
