use serde::{Deserialize, Serialize};

/// Camera identifier as issued by the topology provider.
pub type CameraId = String;

/// Static camera metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: CameraId,
    pub name: String,
    /// Map position in the provider's coordinate space (not geolocated).
    #[serde(default)]
    pub position: Option<(f64, f64)>,
    #[serde(default)]
    pub zone: Option<String>,
}

impl Camera {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: None,
            zone: None,
        }
    }
}
