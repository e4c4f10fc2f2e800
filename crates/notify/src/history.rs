//! Per-subject alert history backing cooldown suppression.
//!
//! One entry per subject id, holding the last non-suppressed alert kind and
//! when it was dispatched. Entries are only removed by [`AlertHistory::reset`].
//! Uses `std::sync::Mutex` so concurrent dispatches for the same subject are
//! serialized; the lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use vigil_core::Severity;

/// Minimum gap between two non-critical alerts of the same kind for the same subject.
pub const COOLDOWN_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertHistoryEntry {
    pub subject_id: String,
    pub last_alert_kind: String,
    pub last_dispatch: DateTime<Utc>,
}

/// Owned alert history, injected into the dispatcher.
#[derive(Debug, Default)]
pub struct AlertHistory {
    entries: Mutex<HashMap<String, AlertHistoryEntry>>,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether an alert passes the cooldown policy and, if it does,
    /// record it as the subject's latest dispatch.
    ///
    /// Suppressed only when the subject's previous alert was the same kind,
    /// the severity is not CRITICAL, and less than [`COOLDOWN_WINDOW`] has
    /// elapsed since it was dispatched. Times are wall-clock; if `now` is
    /// earlier than the recorded dispatch the window counts as expired.
    pub fn admit(&self, subject_id: &str, kind: &str, severity: Severity, now: DateTime<Utc>) -> bool {
        let mut guard = self.entries.lock().expect("alert history lock poisoned");

        if let Some(prior) = guard.get(subject_id) {
            let elapsed = now.signed_duration_since(prior.last_dispatch);
            let window = chrono::Duration::from_std(COOLDOWN_WINDOW).unwrap_or(chrono::Duration::zero());
            if elapsed < chrono::Duration::zero() {
                debug!(subject_id, kind, "clock moved backwards, cooldown treated as expired");
            } else if prior.last_alert_kind == kind && !severity.is_critical() && elapsed < window {
                debug!(
                    subject_id,
                    kind,
                    "alert still in cooldown ({:.0}s remaining)",
                    (window - elapsed).num_milliseconds() as f64 / 1000.0,
                );
                return false;
            }
        }

        guard.insert(
            subject_id.to_string(),
            AlertHistoryEntry {
                subject_id: subject_id.to_string(),
                last_alert_kind: kind.to_string(),
                last_dispatch: now,
            },
        );
        true
    }

    pub fn get(&self, subject_id: &str) -> Option<AlertHistoryEntry> {
        let guard = self.entries.lock().expect("alert history lock poisoned");
        guard.get(subject_id).cloned()
    }

    /// Forget every subject.
    pub fn reset(&self) {
        let mut guard = self.entries.lock().expect("alert history lock poisoned");
        guard.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("alert history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
