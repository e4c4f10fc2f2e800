//! End-to-end pursuit over a three-camera corridor with a recording transport.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use vigil_core::{Camera, SubjectAttributes, TargetType};
use vigil_notify::{kinds, Dispatcher, MemoryTransport, Route, TemplateCatalog};
use vigil_pursuit::{
    AlertDisposition, PursuitAction, PursuitController, PursuitSettings, TickOutcome, TokenStatus,
};
use vigil_topology::{Topology, TopologyFile};

const CORRIDOR: &str = r#"
cameras:
  - { id: A, name: North Entrance }
  - { id: B, name: Atrium }
  - { id: C, name: Loading Dock }
"#;

const BRANCHING: &str = r#"
entry: A
cameras:
  - { id: A, name: North Entrance }
  - { id: B, name: Atrium }
  - { id: C, name: Loading Dock }
  - { id: D, name: Stairwell }
edges:
  - { from: A, to: B, weight: 0.7 }
  - { from: A, to: D, weight: 0.3 }
  - { from: B, to: C }
"#;

fn t0() -> DateTime<Utc> {
    "2026-05-12T09:00:00Z".parse().unwrap()
}

fn setup(yaml: &str, width: usize) -> (PursuitController, Arc<MemoryTransport>) {
    let topology: Arc<dyn Topology> =
        Arc::from(TopologyFile::from_yaml_str(yaml).unwrap().build().unwrap());
    let transport = Arc::new(MemoryTransport::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(TemplateCatalog::builtin().unwrap()),
        transport.clone(),
    ));
    let settings = PursuitSettings {
        snapshot_base_url: "https://cdn.example/snaps/".to_string(),
        prediction_width: width,
        ..PursuitSettings::default()
    };
    let controller =
        PursuitController::with_rng(topology, dispatcher, settings, StdRng::seed_from_u64(42));
    (controller, transport)
}

fn advanced(outcome: TickOutcome) -> (vigil_pursuit::SuspectToken, AlertDisposition) {
    match outcome {
        TickOutcome::Advanced { token, alert } => (token, alert),
        other => panic!("expected advance, got {other:?}"),
    }
}

#[test]
fn corridor_pursuit_from_entry_to_lost() {
    let (mut ctl, transport) = setup(CORRIDOR, 1);
    let attrs = SubjectAttributes::new(TargetType::Person).with_colors(["grey", "white"]);

    let (token, alert) = ctl.start_at(attrs, t0()).unwrap();
    let id = token.token_id.clone();
    assert!(id.starts_with("SUS-"));
    assert_eq!(token.last_camera_id, "A");
    assert_eq!(token.predicted_next_cameras, vec!["B".to_string()]);
    assert!(matches!(alert, AlertDisposition::Sent(_)));

    // Ticks six minutes apart so every handoff clears the cooldown.
    let (token, alert) = advanced(ctl.tick_at(&id, t0() + Duration::minutes(6)));
    assert_eq!(token.last_camera_id, "B");
    assert_eq!(token.predicted_next_cameras, vec!["C".to_string()]);
    assert_eq!(token.timeline.len(), 2);
    assert!(matches!(alert, AlertDisposition::Sent(_)));

    let (token, alert) = advanced(ctl.tick_at(&id, t0() + Duration::minutes(12)));
    assert_eq!(token.last_camera_id, "C");
    assert!(token.predicted_next_cameras.is_empty());
    assert_eq!(token.timeline.len(), 3);
    assert_eq!(token.handoff_count(), 2);
    assert!(matches!(alert, AlertDisposition::Sent(_)));

    let newest = token.latest().unwrap();
    assert_eq!(newest.action, PursuitAction::Acquired);
    assert_eq!(newest.camera_id, token.last_camera_id);
    assert!((0.80..=0.99).contains(&newest.confidence));
    assert_eq!(
        newest.snapshot_url,
        format!("https://cdn.example/snaps/C/{}.jpg", newest.id)
    );
    let oldest = token.timeline.back().unwrap();
    assert_eq!(oldest.action, PursuitAction::Enter);
    assert_eq!(oldest.confidence, 1.0);

    match ctl.tick_at(&id, t0() + Duration::minutes(18)) {
        TickOutcome::Lost { token, alert } => {
            assert_eq!(token.status, TokenStatus::Lost);
            assert!(matches!(alert, AlertDisposition::Sent(_)));
        }
        other => panic!("expected lost, got {other:?}"),
    }
    assert_eq!(ctl.tick_at(&id, t0() + Duration::minutes(19)), TickOutcome::Inactive);
    assert_eq!(ctl.active_count(), 0);

    let sent = transport.on_route(Route::Primary);
    let kinds_sent: Vec<&str> = sent.iter().map(|p| p.event_type.as_str()).collect();
    assert_eq!(
        kinds_sent,
        vec![
            kinds::NEW_TARGET,
            kinds::HANDOFF_SUCCESS,
            kinds::HANDOFF_SUCCESS,
            kinds::TARGET_LOST
        ]
    );
    assert!(sent.iter().all(|p| p.trace_id.as_deref() == Some(id.as_str())));
    assert_eq!(sent[2].context["from_location"], "Atrium");
    assert_eq!(sent[2].context["next_location"], "none (edge of coverage)");
    assert_eq!(sent[3].context["location"], "Loading Dock");
    assert_eq!(sent[3].message.short, format!("Lost {id} after Loading Dock"));
    assert!(transport.on_route(Route::Escalation).is_empty());
}

#[test]
fn branching_topology_prefers_heaviest_edge() {
    let (mut ctl, _transport) = setup(BRANCHING, 2);
    let (token, _) = ctl
        .start_at(SubjectAttributes::new(TargetType::Vehicle), t0())
        .unwrap();
    assert_eq!(
        token.predicted_next_cameras,
        vec!["B".to_string(), "D".to_string()]
    );

    let (token, _) = advanced(ctl.tick_at(&token.token_id, t0() + Duration::seconds(3)));
    assert_eq!(token.last_camera_id, "B");
    assert_eq!(token.predicted_next_cameras, vec!["C".to_string()]);
}

#[test]
fn zone_breach_escalates_alongside_pursuit() {
    let (mut ctl, transport) = setup(CORRIDOR, 1);
    let (token, _) = ctl
        .start_at(SubjectAttributes::new(TargetType::Person), t0())
        .unwrap();

    let dispatcher = Dispatcher::new(Arc::new(TemplateCatalog::builtin().unwrap()), transport.clone());
    let mut ctx = vigil_notify::AlertContext::new();
    ctx.insert("location".to_string(), "Loading Dock".to_string());
    for _ in 0..2 {
        let outcome = dispatcher
            .dispatch_at(kinds::ZONE_BREACH, ctx.clone(), Some(&token.token_id), t0())
            .unwrap();
        assert!(!outcome.is_suppressed());
    }

    assert_eq!(transport.on_route(Route::Escalation).len(), 2);
    assert_eq!(transport.on_route(Route::Primary).len(), 3);
}
