//! Camera topology and re-identification trajectory lookup.
//!
//! This crate provides:
//! - `Topology` trait describing camera adjacency for pursuit handoff
//! - `LinearTopology` (fixed chain) and `GraphTopology` (weighted digraph)
//! - YAML topology files via `TopologyFile`
//! - `TrajectoryStore` for recorded re-id trajectories and target search

pub mod error;
pub mod graph;
pub mod linear;
pub mod loader;
pub mod trajectory;

pub use error::{Result, TopologyError};
pub use graph::GraphTopology;
pub use linear::LinearTopology;
pub use loader::TopologyFile;
pub use trajectory::{ReIdTarget, TargetFilter, TrajectoryPoint, TrajectoryStore};

use vigil_core::{Camera, CameraId};

/// Read-only camera adjacency used to advance and predict a pursuit.
///
/// Implementations are populated externally and never mutated by the
/// pursuit subsystem.
pub trait Topology: Send + Sync {
    /// Metadata for a camera, if the topology knows it.
    fn camera(&self, id: &str) -> Option<&Camera>;

    /// Where a new pursuit begins.
    fn entry(&self) -> Option<&Camera>;

    /// Successors of `id`, most likely first.
    ///
    /// `None` when `id` is unknown; an empty list when `id` is a terminal node.
    fn successors(&self, id: &str) -> Option<Vec<&Camera>>;

    /// The camera a subject seen at `id` is handed off to next.
    fn next_hop(&self, id: &str) -> Option<&Camera> {
        self.successors(id)
            .and_then(|next| next.into_iter().next())
    }

    /// Up to `k` candidate next cameras for a subject seen at `id`.
    fn predict(&self, id: &str, k: usize) -> Vec<CameraId> {
        self.successors(id)
            .unwrap_or_default()
            .into_iter()
            .take(k)
            .map(|c| c.id.clone())
            .collect()
    }
}
