//! Alert dispatcher: cooldown, rendering, escalation, hand-off.
//!
//! The dispatcher resolves an alert kind against the [`TemplateCatalog`],
//! applies the per-subject cooldown held in its [`AlertHistory`], renders
//! the messages and hands the resulting payload to the [`AlertTransport`].
//! CRITICAL alerts are never suppressed and are additionally sent on the
//! escalation route. Transport failures are logged and otherwise ignored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::catalog::TemplateCatalog;
use crate::history::{AlertHistory, AlertHistoryEntry};
use crate::payload::{AlertContext, OutboundAlertPayload};
use crate::templating::{missing_keys, render};
use crate::traits::NotifyError;
use crate::transport::{AlertTransport, Route};

/// What happened to a dispatch request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A payload was built and handed to the transport.
    Sent(OutboundAlertPayload),
    /// Same kind for the same subject inside the cooldown window.
    Suppressed,
}

impl DispatchOutcome {
    pub fn payload(&self) -> Option<&OutboundAlertPayload> {
        match self {
            DispatchOutcome::Sent(payload) => Some(payload),
            DispatchOutcome::Suppressed => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, DispatchOutcome::Suppressed)
    }
}

pub struct Dispatcher {
    catalog: Arc<TemplateCatalog>,
    history: AlertHistory,
    transport: Arc<dyn AlertTransport>,
}

impl Dispatcher {
    /// Create a dispatcher with an empty history.
    pub fn new(catalog: Arc<TemplateCatalog>, transport: Arc<dyn AlertTransport>) -> Self {
        Self::with_history(catalog, AlertHistory::new(), transport)
    }

    /// Create a dispatcher around an existing history store.
    pub fn with_history(
        catalog: Arc<TemplateCatalog>,
        history: AlertHistory,
        transport: Arc<dyn AlertTransport>,
    ) -> Self {
        Self {
            catalog,
            history,
            transport,
        }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Dispatch an alert at the current time.
    pub fn dispatch(
        &self,
        kind: &str,
        context: AlertContext,
        subject_id: Option<&str>,
    ) -> Result<DispatchOutcome, NotifyError> {
        self.dispatch_at(kind, context, subject_id, Utc::now())
    }

    /// Dispatch an alert as if it were `now`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::UnknownAlertKind`] when `kind` is not in the
    /// catalog. Suppression is not an error; transport failures are logged
    /// and the payload is still returned.
    pub fn dispatch_at(
        &self,
        kind: &str,
        context: AlertContext,
        subject_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, NotifyError> {
        let Some(template) = self.catalog.lookup(kind) else {
            error!(kind, subject_id, "alert kind not in catalog, dispatch skipped");
            return Err(NotifyError::UnknownAlertKind(kind.to_string()));
        };

        if let Some(subject) = subject_id {
            if !self.history.admit(subject, kind, template.severity, now) {
                debug!(kind, subject_id = subject, "alert suppressed by cooldown");
                return Ok(DispatchOutcome::Suppressed);
            }
        }

        let missing = missing_keys(&template.long_message, &context);
        if !missing.is_empty() {
            debug!(kind, ?missing, "context lacks placeholders, leaving them literal");
        }

        let short = render(&template.short_message, &context);
        let long = render(&template.long_message, &context);
        let payload = OutboundAlertPayload::at(
            now,
            kind,
            template.severity,
            subject_id.map(str::to_string),
            short,
            long,
            context,
        );

        if template.severity.is_critical() {
            self.hand_off(Route::Escalation, &payload);
        }
        self.hand_off(Route::Primary, &payload);

        info!(
            kind,
            event_id = %payload.event_id,
            severity = %payload.severity,
            subject_id,
            "alert dispatched"
        );
        Ok(DispatchOutcome::Sent(payload))
    }

    /// Forget all cooldown state.
    pub fn reset_history(&self) {
        self.history.reset();
        info!("alert history reset");
    }

    pub fn history_entry(&self, subject_id: &str) -> Option<AlertHistoryEntry> {
        self.history.get(subject_id)
    }

    fn hand_off(&self, route: Route, payload: &OutboundAlertPayload) {
        if let Err(e) = self.transport.deliver(route, payload) {
            warn!(
                %route,
                event_id = %payload.event_id,
                error = %e,
                "transport rejected alert; not retried"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::kinds;
    use crate::transport::MemoryTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t0() -> DateTime<Utc> {
        "2026-03-01T10:00:00Z".parse().unwrap()
    }

    fn mins(n: i64) -> chrono::Duration {
        chrono::Duration::minutes(n)
    }

    fn ctx(pairs: &[(&str, &str)]) -> AlertContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn setup() -> (Dispatcher, Arc<MemoryTransport>) {
        let transport = Arc::new(MemoryTransport::new());
        let catalog = Arc::new(TemplateCatalog::builtin().unwrap());
        (Dispatcher::new(catalog, transport.clone()), transport)
    }

    struct FailingTransport {
        calls: AtomicUsize,
    }

    impl AlertTransport for FailingTransport {
        fn deliver(&self, _route: Route, _payload: &OutboundAlertPayload) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Transport("down".to_string()))
        }
    }

    #[test]
    fn renders_and_builds_payload() {
        let (dispatcher, transport) = setup();
        let outcome = dispatcher
            .dispatch_at(
                kinds::LOITERING,
                ctx(&[("location", "ATM Lobby"), ("duration", "9 min")]),
                Some("s1"),
                t0(),
            )
            .unwrap();

        let payload = outcome.payload().unwrap();
        assert_eq!(payload.event_type, kinds::LOITERING);
        assert_eq!(payload.trace_id.as_deref(), Some("s1"));
        assert_eq!(payload.timestamp, t0());
        assert_eq!(payload.message.short, "Loitering at ATM Lobby for 9 min");
        // `{time}` was not supplied and stays literal.
        assert_eq!(payload.message.long, "Subject has remained at ATM Lobby for 9 min (since {time}).");
        assert_eq!(payload.context["location"], "ATM Lobby");

        assert_eq!(transport.on_route(Route::Primary), vec![payload.clone()]);
        assert!(transport.on_route(Route::Escalation).is_empty());
    }

    #[test]
    fn cooldown_suppresses_then_expires() {
        let (dispatcher, transport) = setup();
        let first = dispatcher
            .dispatch_at(kinds::LOITERING, ctx(&[]), Some("s1"), t0())
            .unwrap();
        let second = dispatcher
            .dispatch_at(kinds::LOITERING, ctx(&[]), Some("s1"), t0() + mins(4))
            .unwrap();
        let third = dispatcher
            .dispatch_at(kinds::LOITERING, ctx(&[]), Some("s1"), t0() + mins(5))
            .unwrap();

        assert!(matches!(first, DispatchOutcome::Sent(_)));
        assert!(second.is_suppressed());
        assert!(matches!(third, DispatchOutcome::Sent(_)));
        assert_eq!(transport.deliveries().len(), 2);
    }

    #[test]
    fn critical_bypasses_cooldown_and_escalates() {
        let (dispatcher, transport) = setup();
        for offset in [0, 1] {
            let outcome = dispatcher
                .dispatch_at(kinds::ZONE_BREACH, ctx(&[]), Some("s1"), t0() + mins(offset))
                .unwrap();
            assert!(!outcome.is_suppressed());
        }

        let escalated = transport.on_route(Route::Escalation);
        let primary = transport.on_route(Route::Primary);
        assert_eq!(escalated.len(), 2);
        assert_eq!(primary.len(), 2);
        assert_eq!(escalated[0].event_id, primary[0].event_id);
    }

    #[test]
    fn escalation_is_handed_off_before_primary() {
        let (dispatcher, transport) = setup();
        dispatcher
            .dispatch_at(kinds::ZONE_BREACH, ctx(&[]), None, t0())
            .unwrap();
        let routes: Vec<_> = transport.deliveries().iter().map(|d| d.route).collect();
        assert_eq!(routes, vec![Route::Escalation, Route::Primary]);
    }

    #[test]
    fn no_subject_means_no_suppression() {
        let (dispatcher, transport) = setup();
        for _ in 0..3 {
            let outcome = dispatcher
                .dispatch_at(kinds::LOITERING, ctx(&[]), None, t0())
                .unwrap();
            assert!(outcome.payload().unwrap().trace_id.is_none());
        }
        assert_eq!(transport.deliveries().len(), 3);
    }

    #[test]
    fn different_subjects_do_not_interact() {
        let (dispatcher, _transport) = setup();
        let a = dispatcher.dispatch_at(kinds::LOITERING, ctx(&[]), Some("a"), t0()).unwrap();
        let b = dispatcher.dispatch_at(kinds::LOITERING, ctx(&[]), Some("b"), t0()).unwrap();
        assert!(!a.is_suppressed());
        assert!(!b.is_suppressed());
    }

    #[test]
    fn unknown_kind_is_config_error_without_side_effects() {
        let (dispatcher, transport) = setup();
        let result = dispatcher.dispatch_at("meteor_strike", ctx(&[]), Some("s1"), t0());
        assert!(matches!(result, Err(NotifyError::UnknownAlertKind(k)) if k == "meteor_strike"));
        assert!(transport.deliveries().is_empty());
        assert!(dispatcher.history_entry("s1").is_none());
    }

    #[test]
    fn reset_history_allows_immediate_repeat() {
        let (dispatcher, _transport) = setup();
        dispatcher.dispatch_at(kinds::LOITERING, ctx(&[]), Some("s1"), t0()).unwrap();
        dispatcher.reset_history();
        assert!(dispatcher.history_entry("s1").is_none());
        let again = dispatcher
            .dispatch_at(kinds::LOITERING, ctx(&[]), Some("s1"), t0() + mins(1))
            .unwrap();
        assert!(!again.is_suppressed());
    }

    #[test]
    fn transport_failure_still_returns_payload_and_records_history() {
        let transport = Arc::new(FailingTransport {
            calls: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::new(Arc::new(TemplateCatalog::builtin().unwrap()), transport.clone());

        let outcome = dispatcher
            .dispatch_at(kinds::ZONE_BREACH, ctx(&[]), Some("s1"), t0())
            .unwrap();
        assert!(outcome.payload().is_some());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.history_entry("s1").unwrap().last_alert_kind, kinds::ZONE_BREACH);
    }

    #[test]
    fn injected_history_is_used() {
        let history = AlertHistory::new();
        history.admit("s1", kinds::LOITERING, vigil_core::Severity::Medium, t0());
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = Dispatcher::with_history(
            Arc::new(TemplateCatalog::builtin().unwrap()),
            history,
            transport,
        );
        let outcome = dispatcher
            .dispatch_at(kinds::LOITERING, ctx(&[]), Some("s1"), t0() + mins(1))
            .unwrap();
        assert!(outcome.is_suppressed());
    }
}
