//! YAML topology files.
//!
//! ```yaml
//! entry: cam-gate          # optional, defaults to the first camera
//! cameras:
//!   - id: cam-gate
//!     name: Main Gate
//!   - id: cam-lobby
//!     name: Lobby
//! edges:                   # optional; omitted means a linear chain
//!   - { from: cam-gate, to: cam-lobby, weight: 0.8 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use vigil_core::Camera;

use crate::error::{Result, TopologyError};
use crate::{GraphTopology, LinearTopology, Topology};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// On-disk topology description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub entry: Option<String>,
    pub cameras: Vec<Camera>,
    #[serde(default)]
    pub edges: Option<Vec<EdgeSpec>>,
}

impl TopologyFile {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let file = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            cameras = file.cameras.len(),
            "loaded topology file"
        );
        Ok(file)
    }

    /// Build the topology the file describes: a [`GraphTopology`] when edges
    /// are present, otherwise a [`LinearTopology`] in camera order.
    pub fn build(self) -> Result<Box<dyn Topology>> {
        if self.cameras.is_empty() {
            return Err(TopologyError::Validation(
                "topology has no cameras".to_string(),
            ));
        }

        match self.edges {
            Some(edges) => {
                let mut graph = GraphTopology::new(self.cameras)?;
                for edge in &edges {
                    graph.add_edge(&edge.from, &edge.to, edge.weight)?;
                }
                if let Some(entry) = self.entry.as_deref() {
                    graph.set_entry(entry)?;
                }
                Ok(Box::new(graph))
            }
            None => {
                if let Some(entry) = self.entry.as_deref() {
                    if self.cameras.first().map(|c| c.id.as_str()) != Some(entry) {
                        return Err(TopologyError::Validation(format!(
                            "linear topology entry '{entry}' must be the first camera"
                        )));
                    }
                }
                Ok(Box::new(LinearTopology::new(self.cameras)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR_YAML: &str = r#"
cameras:
  - id: A
    name: Gate
  - id: B
    name: Lobby
    zone: north
  - id: C
    name: Parking
    position: [12.5, 40.0]
"#;

    const GRAPH_YAML: &str = r#"
entry: B
cameras:
  - { id: A, name: Gate }
  - { id: B, name: Lobby }
  - { id: C, name: Parking }
edges:
  - { from: B, to: A, weight: 0.2 }
  - { from: B, to: C, weight: 0.7 }
  - { from: C, to: A }
"#;

    #[test]
    fn linear_file_builds_chain() {
        let topo = TopologyFile::from_yaml_str(LINEAR_YAML).unwrap().build().unwrap();
        assert_eq!(topo.entry().map(|c| c.id.as_str()), Some("A"));
        assert_eq!(topo.predict("A", 1), vec!["B".to_string()]);
        assert_eq!(topo.camera("C").and_then(|c| c.position), Some((12.5, 40.0)));
        assert_eq!(topo.camera("B").and_then(|c| c.zone.clone()).as_deref(), Some("north"));
    }

    #[test]
    fn graph_file_builds_weighted_graph() {
        let topo = TopologyFile::from_yaml_str(GRAPH_YAML).unwrap().build().unwrap();
        assert_eq!(topo.entry().map(|c| c.id.as_str()), Some("B"));
        assert_eq!(topo.predict("B", 2), vec!["C".to_string(), "A".to_string()]);
        assert_eq!(topo.next_hop("C").map(|c| c.id.as_str()), Some("A"));
    }

    #[test]
    fn empty_topology_rejected() {
        let file = TopologyFile::from_yaml_str("cameras: []").unwrap();
        assert!(matches!(file.build(), Err(TopologyError::Validation(_))));
    }

    #[test]
    fn linear_entry_must_be_first() {
        let yaml = format!("entry: B\n{LINEAR_YAML}");
        let file = TopologyFile::from_yaml_str(&yaml).unwrap();
        assert!(file.build().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().expect("create tempdir");
        let path = dir.path().join("topology.yml");
        std::fs::write(&path, GRAPH_YAML).unwrap();
        let file = TopologyFile::from_file(&path).unwrap();
        assert_eq!(file.cameras.len(), 3);
        assert_eq!(file.edges.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let result = TopologyFile::from_yaml_str("cameras: [ {id: A");
        assert!(matches!(result, Err(TopologyError::Parse(_))));
    }
}
