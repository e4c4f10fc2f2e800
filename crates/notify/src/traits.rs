//! Notifier trait definition and shared error types.

use std::collections::BTreeMap;

use vigil_core::Severity;

use crate::payload::OutboundAlertPayload;

/// Errors raised by the alert engine and its delivery channels.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unknown alert kind: {0}")]
    UnknownAlertKind(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport unavailable: {0}")]
    Transport(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Trait for delivery channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert payload through this channel.
    async fn send(&self, payload: &OutboundAlertPayload) -> Result<(), NotifyError>;

    /// Test connectivity with a sample payload.
    async fn test(&self) -> Result<(), NotifyError> {
        let payload = OutboundAlertPayload::new(
            "channel_test",
            Severity::Info,
            None,
            "[TEST] vigil channel test".to_string(),
            "This is a test notification from the vigil alert engine.".to_string(),
            BTreeMap::new(),
        );
        self.send(&payload).await
    }

    /// Human-readable name for this channel (e.g., "webhook", "telegram").
    fn channel_name(&self) -> &str;
}

/// Result of delivering one payload to a single channel.
#[derive(Debug)]
pub struct DeliveryResult {
    pub channel: String,
    pub event_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
