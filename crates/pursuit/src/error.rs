//! Pursuit error types.

#[derive(Debug, thiserror::Error)]
pub enum PursuitError {
    /// The topology has no entry camera to start from.
    #[error("topology has no entry camera")]
    EmptyTopology,

    #[error("unknown pursuit token: {0}")]
    UnknownToken(String),
}
