//! Outbound alert payload handed to the delivery transport.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::Severity;

/// Flat placeholder context supplied by callers.
pub type AlertContext = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub short: String,
    pub long: String,
}

/// One dispatched alert. Built fresh per non-suppressed dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundAlertPayload {
    /// Process-unique id, `evt-<uuid>`.
    pub event_id: String,
    /// Serialized as ISO-8601 (RFC 3339, UTC).
    pub timestamp: DateTime<Utc>,
    /// Alert kind key.
    pub event_type: String,
    pub severity: Severity,
    /// Subject id, or `null` when the alert is not tied to a subject.
    pub trace_id: Option<String>,
    pub message: AlertMessage,
    /// The caller's context, unmodified.
    pub context: AlertContext,
}

impl OutboundAlertPayload {
    pub fn new(
        event_type: &str,
        severity: Severity,
        trace_id: Option<String>,
        short: String,
        long: String,
        context: AlertContext,
    ) -> Self {
        Self::at(Utc::now(), event_type, severity, trace_id, short, long, context)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        event_type: &str,
        severity: Severity,
        trace_id: Option<String>,
        short: String,
        long: String,
        context: AlertContext,
    ) -> Self {
        Self {
            event_id: new_event_id(),
            timestamp,
            event_type: event_type.to_string(),
            severity,
            trace_id,
            message: AlertMessage { short, long },
            context,
        }
    }
}

fn new_event_id() -> String {
    format!("evt-{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_field_exact() {
        let ctx = AlertContext::from([("location".to_string(), "Gate".to_string())]);
        let payload = OutboundAlertPayload::new(
            "zone_breach",
            Severity::High,
            None,
            "short".to_string(),
            "long".to_string(),
            ctx,
        );
        let value = serde_json::to_value(&payload).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["context", "event_id", "event_type", "message", "severity", "timestamp", "trace_id"]
        );
        assert_eq!(value["severity"], "HIGH");
        assert!(value["trace_id"].is_null());
        assert_eq!(value["message"]["short"], "short");
        assert_eq!(value["context"]["location"], "Gate");
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn event_ids_are_unique() {
        let a = OutboundAlertPayload::new("k", Severity::Info, None, String::new(), String::new(), AlertContext::new());
        let b = OutboundAlertPayload::new("k", Severity::Info, None, String::new(), String::new(), AlertContext::new());
        assert!(a.event_id.starts_with("evt-"));
        assert_ne!(a.event_id, b.event_id);
    }
}
