//! Timer-driven pursuits.
//!
//! Each launched pursuit gets its own tokio task that ticks the shared
//! [`PursuitController`] on a fixed interval until the token is lost or
//! stopped. Cancelling aborts the timer before the token is discarded, so a
//! cancelled pursuit never ticks again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vigil_core::SubjectAttributes;

use crate::controller::{PursuitController, TickOutcome};
use crate::error::PursuitError;
use crate::token::SuspectToken;

pub struct PursuitRunner {
    controller: Arc<Mutex<PursuitController>>,
    timers: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    interval: Duration,
}

/// Shortest accepted tick interval; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

impl PursuitRunner {
    pub fn new(controller: PursuitController, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "pursuit tick interval below 1ms, clamping"
            );
        }
        Self {
            controller: Arc::new(Mutex::new(controller)),
            timers: Arc::new(Mutex::new(HashMap::new())),
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn controller(&self) -> Arc<Mutex<PursuitController>> {
        Arc::clone(&self.controller)
    }

    /// Start a pursuit and schedule its ticks. Must be called inside a
    /// tokio runtime.
    pub fn launch(&self, attributes: SubjectAttributes) -> Result<SuspectToken, PursuitError> {
        let token = self
            .controller
            .lock()
            .expect("pursuit controller lock poisoned")
            .start(attributes)?;

        let token_id = token.token_id.clone();
        let controller = Arc::clone(&self.controller);
        let timers = Arc::clone(&self.timers);
        let interval = self.interval;

        // Held across spawn so the task cannot deregister before it is registered.
        let mut guard = self.timers.lock().expect("pursuit timers lock poisoned");
        let task_id = token_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip immediate tick

            loop {
                ticker.tick().await;
                let outcome = controller
                    .lock()
                    .expect("pursuit controller lock poisoned")
                    .tick(&task_id);
                match outcome {
                    TickOutcome::Advanced { .. } => continue,
                    TickOutcome::Lost { .. } | TickOutcome::Inactive => break,
                }
            }

            timers.lock().expect("pursuit timers lock poisoned").remove(&task_id);
            debug!(token_id = %task_id, "pursuit timer finished");
        });
        guard.insert(token_id.clone(), handle);

        info!(
            token_id = %token_id,
            interval_ms = interval.as_millis() as u64,
            "pursuit timer scheduled"
        );
        Ok(token)
    }

    /// Stop a pursuit: the timer is aborted first, then the token is
    /// discarded. No alert is raised.
    pub fn cancel(&self, token_id: &str) -> Result<SuspectToken, PursuitError> {
        if let Some(handle) = self
            .timers
            .lock()
            .expect("pursuit timers lock poisoned")
            .remove(token_id)
        {
            handle.abort();
        }
        self.controller
            .lock()
            .expect("pursuit controller lock poisoned")
            .stop(token_id)
    }

    /// Cancel every running pursuit.
    pub fn shutdown(&self) {
        let handles: Vec<(String, JoinHandle<()>)> = self
            .timers
            .lock()
            .expect("pursuit timers lock poisoned")
            .drain()
            .collect();
        let mut controller = self.controller.lock().expect("pursuit controller lock poisoned");
        for (token_id, handle) in handles {
            handle.abort();
            if let Err(e) = controller.stop(&token_id) {
                debug!(token_id = %token_id, error = %e, "pursuit already gone at shutdown");
            }
        }
    }

    /// Current state of a live pursuit.
    pub fn snapshot(&self, token_id: &str) -> Option<SuspectToken> {
        self.controller
            .lock()
            .expect("pursuit controller lock poisoned")
            .token(token_id)
            .cloned()
    }

    pub fn is_running(&self, token_id: &str) -> bool {
        self.timers
            .lock()
            .expect("pursuit timers lock poisoned")
            .contains_key(token_id)
    }

    pub fn running_count(&self) -> usize {
        self.timers.lock().expect("pursuit timers lock poisoned").len()
    }
}
