//! Fire-and-forget key event notifications.
//!
//! The sink receives every key event (issue, reuse, validate, admin
//! mutations) as an audit trail. Dispatch never blocks the request:
//! webhook posts run on a spawned task and failures are logged, not
//! retried.

use keymint_engine::KeyEvent;
use keymint_types::LicenseRecord;
use serde_json::json;
use tracing::warn;

/// Destination for key event audit messages.
pub trait NotificationSink: Send + Sync {
    /// Reports an event. Must not block and must not fail the caller.
    fn notify(&self, event: KeyEvent, record: Option<&LicenseRecord>, hwid: Option<&str>);
}

/// Sink that drops every event. Used when no webhook is configured.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: KeyEvent, _record: Option<&LicenseRecord>, _hwid: Option<&str>) {}
}

/// Posts Discord-style embeds to a webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    /// Creates a sink posting to the given webhook URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

fn event_title(event: KeyEvent) -> &'static str {
    match event {
        KeyEvent::Issued => "New Key Generated",
        KeyEvent::Reused => "Key Used (Existing)",
        KeyEvent::Validated => "Key Validated",
        KeyEvent::PermanentIssued => "Permanent Key Generated",
        KeyEvent::Extended => "Key Extended",
        KeyEvent::BindingReset => "Key HWID Reset",
        KeyEvent::Revoked => "Key Revoked",
    }
}

fn event_color(event: KeyEvent) -> u32 {
    match event {
        KeyEvent::Issued | KeyEvent::PermanentIssued => 0x00FF_FF00,
        KeyEvent::Reused | KeyEvent::Validated => 0x0000_FF00,
        KeyEvent::Revoked => 0x00FF_0000,
        KeyEvent::Extended | KeyEvent::BindingReset => 0x0058_65F2,
    }
}

fn describe(record: Option<&LicenseRecord>, hwid: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(hwid) = hwid {
        lines.push(format!("**HWID:** `{hwid}`"));
    }
    if let Some(record) = record {
        lines.push(format!("**Key:** `{}`", record.key));
        match record.expires_at {
            Some(expires_at) => lines.push(format!("**Expires:** <t:{}:R>", expires_at / 1000)),
            None => lines.push("**Expires:** never".to_string()),
        }
    }
    lines.join("\n")
}

impl NotificationSink for WebhookSink {
    fn notify(&self, event: KeyEvent, record: Option<&LicenseRecord>, hwid: Option<&str>) {
        let payload = json!({
            "embeds": [{
                "title": event_title(event),
                "description": describe(record, hwid),
                "color": event_color(event),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "footer": { "text": "keymint key service" },
            }]
        });

        let client = self.client.clone();
        let url = self.url.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post(&url).json(&payload).send().await {
                warn!("webhook notification failed: {e}");
            }
        });
    }
}
