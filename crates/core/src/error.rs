use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VigilError {
    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Unknown target type: {0}")]
    UnknownTargetType(String),
}
