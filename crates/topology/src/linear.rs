//! Fixed linear camera chain.

use std::collections::HashMap;

use vigil_core::Camera;

use crate::error::{Result, TopologyError};
use crate::Topology;

/// Cameras in a fixed order; each camera hands off to the next one.
///
/// This is the k = 1, weight = 1 special case of [`GraphTopology`](crate::GraphTopology).
#[derive(Debug, Clone)]
pub struct LinearTopology {
    cameras: Vec<Camera>,
    index: HashMap<String, usize>,
}

impl LinearTopology {
    /// Build a chain from cameras in path order. Duplicate ids are rejected.
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
        Ok(Self { cameras, index })
    }

    /// Position of a camera along the chain.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

impl Topology for LinearTopology {
    fn camera(&self, id: &str) -> Option<&Camera> {
        self.position(id).map(|pos| &self.cameras[pos])
    }

    fn entry(&self) -> Option<&Camera> {
        self.cameras.first()
    }

    fn successors(&self, id: &str) -> Option<Vec<&Camera>> {
        let pos = self.position(id)?;
        Some(self.cameras.get(pos + 1).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> LinearTopology {
        LinearTopology::new(vec![
            Camera::new("A", "Gate"),
            Camera::new("B", "Lobby"),
            Camera::new("C", "Parking"),
        ])
        .unwrap()
    }

    #[test]
    fn entry_is_first_camera() {
        assert_eq!(chain().entry().map(|c| c.id.as_str()), Some("A"));
    }

    #[test]
    fn successor_of_middle_node() {
        let topo = chain();
        assert_eq!(topo.next_hop("B").map(|c| c.id.as_str()), Some("C"));
        assert_eq!(topo.predict("A", 3), vec!["B".to_string()]);
    }

    #[test]
    fn last_node_has_no_successors() {
        let topo = chain();
        assert_eq!(topo.successors("C").map(|s| s.len()), Some(0));
        assert!(topo.next_hop("C").is_none());
        assert!(topo.predict("C", 1).is_empty());
    }

    #[test]
    fn unknown_camera_is_none() {
        let topo = chain();
        assert!(topo.successors("Z").is_none());
        assert!(topo.camera("Z").is_none());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let result = LinearTopology::new(vec![Camera::new("A", "x"), Camera::new("A", "y")]);
        assert!(matches!(result, Err(TopologyError::Validation(_))));
    }

    #[test]
    fn empty_chain_has_no_entry() {
        let topo = LinearTopology::new(Vec::new()).unwrap();
        assert!(topo.is_empty());
        assert!(topo.entry().is_none());
    }
}
