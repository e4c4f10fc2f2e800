//! Weighted directed camera graph.
//!
//! Edge weights express how likely (or how quickly) a subject moves from one
//! camera to another. Successors are ranked by descending weight, ties broken
//! by the order edges were added, so `predict(id, k)` yields the top-k.

use std::collections::HashMap;

use vigil_core::{Camera, CameraId};

use crate::error::{Result, TopologyError};
use crate::Topology;

#[derive(Debug, Clone, PartialEq)]
struct Edge {
    to: usize,
    weight: f64,
}

/// Directed graph of cameras with weighted handoff edges.
///
/// Cycles (including self-loops) are allowed. A pursuit walking a cycle never
/// reaches a terminal camera on its own; the pursuit hop limit ends it.
#[derive(Debug, Clone)]
pub struct GraphTopology {
    cameras: Vec<Camera>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<Edge>>,
    entry: Option<usize>,
}

impl GraphTopology {
    /// Create a graph over `cameras` with no edges. The entry defaults to the
    /// first camera.
    pub fn new(cameras: Vec<Camera>) -> Result<Self> {
        let mut index = HashMap::with_capacity(cameras.len());
        for (pos, cam) in cameras.iter().enumerate() {
            if index.insert(cam.id.clone(), pos).is_some() {
                return Err(TopologyError::Validation(format!(
                    "duplicate camera id '{}'",
                    cam.id
                )));
            }
        }
        let edges = vec![Vec::new(); cameras.len()];
        let entry = if cameras.is_empty() { None } else { Some(0) };
        Ok(Self {
            cameras,
            index,
            edges,
            entry,
        })
    }

    /// Override the entry camera.
    pub fn set_entry(&mut self, id: &str) -> Result<()> {
        let pos = self.lookup(id)?;
        self.entry = Some(pos);
        Ok(())
    }

    /// Add a directed edge. Weights must be finite and positive; adding an
    /// edge that already exists replaces its weight.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(TopologyError::Validation(format!(
                "edge {from} -> {to} has invalid weight {weight}"
            )));
        }
        let from_pos = self.lookup(from)?;
        let to_pos = self.lookup(to)?;

        let out = &mut self.edges[from_pos];
        match out.iter_mut().find(|e| e.to == to_pos) {
            Some(existing) => existing.weight = weight,
            None => out.push(Edge { to: to_pos, weight }),
        }
        // Stable sort keeps insertion order among equal weights.
        out.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        Ok(())
    }

    /// Outgoing edges of `id` as `(camera id, weight)`, highest weight first.
    pub fn weighted_successors(&self, id: &str) -> Option<Vec<(CameraId, f64)>> {
        let pos = *self.index.get(id)?;
        Some(
            self.edges[pos]
                .iter()
                .map(|e| (self.cameras[e.to].id.clone(), e.weight))
                .collect(),
        )
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    fn lookup(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TopologyError::NotFound(format!("camera '{id}'")))
    }
}

impl Topology for GraphTopology {
    fn camera(&self, id: &str) -> Option<&Camera> {
        self.index.get(id).map(|&pos| &self.cameras[pos])
    }

    fn entry(&self) -> Option<&Camera> {
        self.entry.map(|pos| &self.cameras[pos])
    }

    fn successors(&self, id: &str) -> Option<Vec<&Camera>> {
        let pos = *self.index.get(id)?;
        Some(self.edges[pos].iter().map(|e| &self.cameras[e.to]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junction() -> GraphTopology {
        let mut g = GraphTopology::new(vec![
            Camera::new("gate", "Gate"),
            Camera::new("hall", "Hall"),
            Camera::new("stairs", "Stairs"),
            Camera::new("exit", "Exit"),
        ])
        .unwrap();
        g.add_edge("gate", "stairs", 0.3).unwrap();
        g.add_edge("gate", "hall", 0.6).unwrap();
        g.add_edge("gate", "exit", 0.1).unwrap();
        g.add_edge("hall", "exit", 1.0).unwrap();
        g
    }

    #[test]
    fn successors_ranked_by_weight() {
        let g = junction();
        let ids: Vec<_> = g
            .successors("gate")
            .unwrap()
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["hall", "stairs", "exit"]);
        assert_eq!(g.next_hop("gate").map(|c| c.id.as_str()), Some("hall"));
    }

    #[test]
    fn predict_takes_top_k() {
        let g = junction();
        assert_eq!(g.predict("gate", 2), vec!["hall".to_string(), "stairs".to_string()]);
        assert!(g.predict("exit", 2).is_empty());
    }

    #[test]
    fn equal_weights_keep_insertion_order() {
        let mut g = GraphTopology::new(vec![
            Camera::new("a", "A"),
            Camera::new("b", "B"),
            Camera::new("c", "C"),
        ])
        .unwrap();
        g.add_edge("a", "c", 0.5).unwrap();
        g.add_edge("a", "b", 0.5).unwrap();
        assert_eq!(g.predict("a", 2), vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn re_adding_edge_replaces_weight() {
        let mut g = junction();
        g.add_edge("gate", "exit", 0.9).unwrap();
        let weighted = g.weighted_successors("gate").unwrap();
        assert_eq!(weighted[0], ("exit".to_string(), 0.9));
        assert_eq!(weighted.len(), 3);
    }

    #[test]
    fn rejects_bad_edges() {
        let mut g = junction();
        assert!(matches!(
            g.add_edge("gate", "nowhere", 0.5),
            Err(TopologyError::NotFound(_))
        ));
        assert!(matches!(
            g.add_edge("gate", "hall", 0.0),
            Err(TopologyError::Validation(_))
        ));
        assert!(matches!(
            g.add_edge("gate", "hall", f64::NAN),
            Err(TopologyError::Validation(_))
        ));
    }

    #[test]
    fn entry_can_be_overridden() {
        let mut g = junction();
        g.set_entry("hall").unwrap();
        assert_eq!(g.entry().map(|c| c.id.as_str()), Some("hall"));
        assert!(g.set_entry("nowhere").is_err());
    }
}
