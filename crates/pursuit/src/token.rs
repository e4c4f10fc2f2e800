//! Pursuit state: the suspect token and its timeline.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::{CameraId, SubjectAttributes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenStatus {
    Active,
    Lost,
    Acquired,
    Finished,
}

impl TokenStatus {
    /// Whether the pursuit can still advance.
    pub fn is_live(&self) -> bool {
        matches!(self, TokenStatus::Active | TokenStatus::Acquired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PursuitAction {
    Enter,
    Exit,
    Passing,
    Lost,
    Acquired,
}

/// One sighting along a pursuit. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PursuitUpdate {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub camera_id: CameraId,
    pub camera_name: String,
    pub action: PursuitAction,
    /// 0.0 ..= 1.0
    pub confidence: f64,
    pub snapshot_url: String,
}

/// A subject under pursuit.
///
/// `timeline` is newest first and never empty while the token is live;
/// `last_camera_id` always equals `timeline[0].camera_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspectToken {
    pub token_id: String,
    pub status: TokenStatus,
    pub start_time: DateTime<Utc>,
    pub last_seen_time: DateTime<Utc>,
    pub last_camera_id: CameraId,
    pub predicted_next_cameras: Vec<CameraId>,
    pub attributes: SubjectAttributes,
    pub timeline: VecDeque<PursuitUpdate>,
}

impl SuspectToken {
    pub fn latest(&self) -> Option<&PursuitUpdate> {
        self.timeline.front()
    }

    /// Name of the camera the subject was last seen at.
    pub fn last_camera_name(&self) -> &str {
        self.latest()
            .map(|u| u.camera_name.as_str())
            .unwrap_or(self.last_camera_id.as_str())
    }

    /// Number of camera changes so far.
    pub fn handoff_count(&self) -> usize {
        self.timeline
            .iter()
            .zip(self.timeline.iter().skip(1))
            .filter(|(newer, older)| newer.camera_id != older.camera_id)
            .count()
    }
}
