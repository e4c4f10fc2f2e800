//! Recorded re-identification trajectories.
//!
//! Reference data for the trajectory viewer: each [`ReIdTarget`] carries a
//! pre-recorded chain of sightings. Operators review the chain and toggle
//! `is_confirmed` on individual points; nothing here feeds back into pursuit.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vigil_core::{Camera, CameraId, SubjectAttributes, TargetType};

use crate::error::{Result, TopologyError};

/// One sighting of a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub id: String,
    pub camera_id: CameraId,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    #[serde(default)]
    pub is_confirmed: bool,
    #[serde(default)]
    pub snapshot_url: Option<String>,
}

/// A target with a stable global identity across cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReIdTarget {
    pub global_id: String,
    pub attributes: SubjectAttributes,
    #[serde(default)]
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Optional search criteria; both apply with AND semantics when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetFilter {
    #[serde(default, rename = "type")]
    pub target_type: Option<TargetType>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TargetFilter {
    pub fn by_type(target_type: TargetType) -> Self {
        Self {
            target_type: Some(target_type),
            color: None,
        }
    }

    pub fn by_color(color: impl Into<String>) -> Self {
        Self {
            target_type: None,
            color: Some(color.into()),
        }
    }

    pub fn matches(&self, target: &ReIdTarget) -> bool {
        if let Some(t) = self.target_type {
            if target.attributes.target_type != t {
                return false;
            }
        }
        match self.color.as_deref() {
            Some(needle) if !needle.is_empty() => target.attributes.has_color(needle),
            _ => true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TrajectoryFile {
    #[serde(default)]
    cameras: Vec<Camera>,
    #[serde(default)]
    targets: Vec<ReIdTarget>,
}

/// In-memory camera directory plus recorded target trajectories.
#[derive(Debug, Default)]
pub struct TrajectoryStore {
    cameras: HashMap<CameraId, Camera>,
    targets: Vec<ReIdTarget>,
    index: HashMap<String, usize>,
}

impl TrajectoryStore {
    pub fn new(cameras: Vec<Camera>, targets: Vec<ReIdTarget>) -> Result<Self> {
        let mut store = Self {
            cameras: cameras.into_iter().map(|c| (c.id.clone(), c)).collect(),
            ..Self::default()
        };
        for target in targets {
            store.insert_target(target)?;
        }
        Ok(store)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: TrajectoryFile = serde_yaml::from_str(yaml)?;
        Self::new(file.cameras, file.targets)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let store = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            cameras = store.cameras.len(),
            targets = store.targets.len(),
            "loaded trajectory store"
        );
        Ok(store)
    }

    /// Add a target; its trajectory is kept in chronological order.
    pub fn insert_target(&mut self, mut target: ReIdTarget) -> Result<()> {
        if self.index.contains_key(&target.global_id) {
            return Err(TopologyError::Validation(format!(
                "duplicate target '{}'",
                target.global_id
            )));
        }
        target.trajectory.sort_by_key(|p| p.timestamp);
        self.index.insert(target.global_id.clone(), self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    pub fn camera_by_id(&self, id: &str) -> Option<&Camera> {
        self.cameras.get(id)
    }

    pub fn target(&self, global_id: &str) -> Option<&ReIdTarget> {
        self.index.get(global_id).map(|&i| &self.targets[i])
    }

    /// Recorded sightings of a target, oldest first.
    pub fn trajectory_for(&self, global_id: &str) -> Option<&[TrajectoryPoint]> {
        self.target(global_id).map(|t| t.trajectory.as_slice())
    }

    /// Only the operator-confirmed sightings, oldest first.
    pub fn confirmed_path(&self, global_id: &str) -> Option<Vec<&TrajectoryPoint>> {
        self.trajectory_for(global_id)
            .map(|points| points.iter().filter(|p| p.is_confirmed).collect())
    }

    /// Toggle the operator confirmation of one sighting.
    pub fn set_confirmed(&mut self, global_id: &str, point_id: &str, confirmed: bool) -> Result<()> {
        let idx = *self
            .index
            .get(global_id)
            .ok_or_else(|| TopologyError::NotFound(format!("target '{global_id}'")))?;
        let point = self.targets[idx]
            .trajectory
            .iter_mut()
            .find(|p| p.id == point_id)
            .ok_or_else(|| {
                TopologyError::NotFound(format!("point '{point_id}' of target '{global_id}'"))
            })?;
        point.is_confirmed = confirmed;
        debug!(global_id, point_id, confirmed, "trajectory point confirmation changed");
        Ok(())
    }

    /// Targets matching `filter`, in insertion order.
    pub fn search_targets(&self, filter: &TargetFilter) -> Vec<&ReIdTarget> {
        self.targets.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn targets(&self) -> &[ReIdTarget] {
        &self.targets
    }
}
