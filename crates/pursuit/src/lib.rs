//! Cross-camera pursuit of a tracked subject.
//!
//! This crate provides:
//! - `SuspectToken` / `PursuitUpdate` pursuit state with a newest-first timeline
//! - Pure state machine functions (`machine::begin`, `machine::step`)
//! - `PursuitController` wiring state changes to the alert dispatcher
//! - `PursuitRunner` driving pursuits on tokio timers with cancellation

pub mod controller;
pub mod error;
pub mod machine;
pub mod runner;
pub mod token;

pub use controller::{AlertDisposition, PursuitController, TickOutcome};
pub use error::PursuitError;
pub use machine::{PursuitSettings, StepOutcome};
pub use runner::PursuitRunner;
pub use token::{PursuitAction, PursuitUpdate, SuspectToken, TokenStatus};
