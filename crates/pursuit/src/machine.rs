//! Pursuit state machine.
//!
//! Pure functions over [`SuspectToken`]: [`begin`] creates a token at the
//! topology entry, [`step`] advances it one hop. Neither dispatches alerts;
//! that is the controller's job. A live token only moves forward; once
//! [`step`] reports [`StepOutcome::EndOfPath`] the pursuit is over.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rand::Rng;
use vigil_core::{Camera, SubjectAttributes};
use vigil_topology::Topology;

use crate::error::PursuitError;
use crate::token::{PursuitAction, PursuitUpdate, SuspectToken, TokenStatus};

/// Plausible re-identification confidence for a handoff.
pub const HANDOFF_CONFIDENCE: (f64, f64) = (0.80, 0.99);

#[derive(Debug, Clone)]
pub struct PursuitSettings {
    /// Snapshot URLs are `{snapshot_base_url}/{camera_id}/{update_id}.jpg`.
    pub snapshot_base_url: String,
    /// How many candidate next cameras to keep in `predicted_next_cameras`.
    pub prediction_width: usize,
    /// Steps after which the pursuit is over even if the topology continues.
    /// Bounds pursuits over cyclic graphs.
    pub max_hops: usize,
}

impl Default for PursuitSettings {
    fn default() -> Self {
        Self {
            snapshot_base_url: "/snapshots".to_string(),
            prediction_width: 1,
            max_hops: 64,
        }
    }
}

impl PursuitSettings {
    fn snapshot_url(&self, camera_id: &str, update_id: &str) -> String {
        format!(
            "{}/{}/{}.jpg",
            self.snapshot_base_url.trim_end_matches('/'),
            camera_id,
            update_id
        )
    }
}

/// Camera change produced by a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Handoff {
    pub from: Camera,
    pub to: Camera,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The token moved one hop. `handoff` is set when the camera changed.
    Advanced {
        token: SuspectToken,
        handoff: Option<Handoff>,
    },
    /// Current camera is unknown or terminal; the input token is untouched.
    EndOfPath,
}

/// Start a pursuit at the topology entry.
pub fn begin(
    topology: &dyn Topology,
    attributes: SubjectAttributes,
    settings: &PursuitSettings,
    now: DateTime<Utc>,
) -> Result<SuspectToken, PursuitError> {
    let entry = topology.entry().ok_or(PursuitError::EmptyTopology)?;
    let token_id = format!("SUS-{}", uuid::Uuid::new_v4().simple());
    let update_id = format!("{token_id}-0");

    let first = PursuitUpdate {
        snapshot_url: settings.snapshot_url(&entry.id, &update_id),
        id: update_id,
        timestamp: now,
        camera_id: entry.id.clone(),
        camera_name: entry.name.clone(),
        action: PursuitAction::Enter,
        confidence: 1.0,
    };

    Ok(SuspectToken {
        token_id,
        status: TokenStatus::Active,
        start_time: now,
        last_seen_time: now,
        last_camera_id: entry.id.clone(),
        predicted_next_cameras: topology.predict(&entry.id, settings.prediction_width),
        attributes,
        timeline: VecDeque::from([first]),
    })
}

/// Advance a token to the next camera in the topology.
pub fn step<R: Rng>(
    token: &SuspectToken,
    topology: &dyn Topology,
    settings: &PursuitSettings,
    now: DateTime<Utc>,
    rng: &mut R,
) -> StepOutcome {
    if !token.status.is_live() {
        return StepOutcome::EndOfPath;
    }
    let steps_taken = token.timeline.len().saturating_sub(1);
    if steps_taken >= settings.max_hops {
        tracing::debug!(token_id = %token.token_id, steps_taken, "pursuit hop limit reached");
        return StepOutcome::EndOfPath;
    }
    let Some(next) = topology.next_hop(&token.last_camera_id) else {
        return StepOutcome::EndOfPath;
    };

    let mut advanced = token.clone();
    let update_id = format!("{}-{}", token.token_id, token.timeline.len());
    let (lo, hi) = HANDOFF_CONFIDENCE;

    advanced.timeline.push_front(PursuitUpdate {
        snapshot_url: settings.snapshot_url(&next.id, &update_id),
        id: update_id,
        timestamp: now,
        camera_id: next.id.clone(),
        camera_name: next.name.clone(),
        action: PursuitAction::Acquired,
        confidence: rng.gen_range(lo..=hi),
    });
    advanced.last_seen_time = now;
    advanced.last_camera_id = next.id.clone();
    advanced.predicted_next_cameras = topology.predict(&next.id, settings.prediction_width);

    let handoff = if next.id != token.last_camera_id {
        let from = topology
            .camera(&token.last_camera_id)
            .cloned()
            .unwrap_or_else(|| Camera::new(token.last_camera_id.clone(), token.last_camera_name()));
        Some(Handoff {
            from,
            to: next.clone(),
        })
    } else {
        None
    };

    StepOutcome::Advanced {
        token: advanced,
        handoff,
    }
}
