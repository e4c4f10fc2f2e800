//! Pursuit controller: owns live tokens and raises pursuit alerts.
//!
//! Every state change is reported to the [`Dispatcher`] keyed by the token
//! id: `new_target` on start, `handoff_success` when the camera changes,
//! `target_lost` at end of path. Alert failures are logged and never stop a
//! pursuit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use vigil_core::SubjectAttributes;
use vigil_notify::{kinds, AlertContext, DispatchOutcome, Dispatcher};
use vigil_topology::Topology;

use crate::error::PursuitError;
use crate::machine::{self, Handoff, PursuitSettings, StepOutcome};
use crate::token::{SuspectToken, TokenStatus};

/// What became of the alert raised for a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertDisposition {
    /// Handed to the transport under this event id.
    Sent(String),
    /// Held back by the per-subject cooldown.
    Suppressed,
    /// Not dispatched (unknown alert kind); already logged.
    Failed,
    /// The state change raises no alert.
    NotRaised,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The token moved one hop.
    Advanced {
        token: SuspectToken,
        alert: AlertDisposition,
    },
    /// End of path: the token was marked LOST and discarded.
    Lost {
        token: SuspectToken,
        alert: AlertDisposition,
    },
    /// No live pursuit with that id (never started, stopped, or lost).
    Inactive,
}

pub struct PursuitController {
    topology: Arc<dyn Topology>,
    dispatcher: Arc<Dispatcher>,
    settings: PursuitSettings,
    rng: StdRng,
    tokens: HashMap<String, SuspectToken>,
}

impl PursuitController {
    pub fn new(topology: Arc<dyn Topology>, dispatcher: Arc<Dispatcher>, settings: PursuitSettings) -> Self {
        Self::with_rng(topology, dispatcher, settings, StdRng::from_entropy())
    }

    /// Controller with a caller-supplied RNG (seeded for reproducible runs).
    pub fn with_rng(
        topology: Arc<dyn Topology>,
        dispatcher: Arc<Dispatcher>,
        settings: PursuitSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            topology,
            dispatcher,
            settings,
            rng,
            tokens: HashMap::new(),
        }
    }

    pub fn start(&mut self, attributes: SubjectAttributes) -> Result<SuspectToken, PursuitError> {
        self.start_at(attributes, Utc::now()).map(|(token, _)| token)
    }

    /// Start a pursuit at the topology entry and raise `new_target`.
    pub fn start_at(
        &mut self,
        attributes: SubjectAttributes,
        now: DateTime<Utc>,
    ) -> Result<(SuspectToken, AlertDisposition), PursuitError> {
        let token = machine::begin(self.topology.as_ref(), attributes, &self.settings, now)?;
        info!(
            token_id = %token.token_id,
            camera = %token.last_camera_id,
            "pursuit started"
        );

        let mut ctx = self.base_context(&token, now);
        ctx.insert("attributes".to_string(), token.attributes.summary());
        let alert = self.raise(kinds::NEW_TARGET, ctx, &token.token_id, now);

        self.tokens.insert(token.token_id.clone(), token.clone());
        Ok((token, alert))
    }

    pub fn tick(&mut self, token_id: &str) -> TickOutcome {
        self.tick_at(token_id, Utc::now())
    }

    /// Advance one pursuit by one step.
    pub fn tick_at(&mut self, token_id: &str, now: DateTime<Utc>) -> TickOutcome {
        let Some(current) = self.tokens.get(token_id) else {
            debug!(token_id, "tick for inactive pursuit ignored");
            return TickOutcome::Inactive;
        };

        match machine::step(current, self.topology.as_ref(), &self.settings, now, &mut self.rng) {
            StepOutcome::Advanced { token, handoff } => {
                let alert = match handoff {
                    Some(handoff) => self.raise_handoff(&token, &handoff, now),
                    None => AlertDisposition::NotRaised,
                };
                debug!(token_id, camera = %token.last_camera_id, "pursuit advanced");
                self.tokens.insert(token.token_id.clone(), token.clone());
                TickOutcome::Advanced { token, alert }
            }
            StepOutcome::EndOfPath => {
                let Some(mut token) = self.tokens.remove(token_id) else {
                    return TickOutcome::Inactive;
                };
                token.status = TokenStatus::Lost;
                info!(token_id, camera = %token.last_camera_id, "pursuit reached end of path");

                let mut ctx = self.base_context(&token, now);
                ctx.insert(
                    "last_seen".to_string(),
                    token.last_seen_time.format("%H:%M:%S").to_string(),
                );
                let alert = self.raise(kinds::TARGET_LOST, ctx, token_id, now);
                TickOutcome::Lost { token, alert }
            }
        }
    }

    /// Discard a pursuit without raising an alert.
    pub fn stop(&mut self, token_id: &str) -> Result<SuspectToken, PursuitError> {
        let mut token = self
            .tokens
            .remove(token_id)
            .ok_or_else(|| PursuitError::UnknownToken(token_id.to_string()))?;
        token.status = TokenStatus::Finished;
        info!(token_id, "pursuit stopped");
        Ok(token)
    }

    pub fn token(&self, token_id: &str) -> Option<&SuspectToken> {
        self.tokens.get(token_id)
    }

    pub fn active_tokens(&self) -> impl Iterator<Item = &SuspectToken> {
        self.tokens.values()
    }

    pub fn active_count(&self) -> usize {
        self.tokens.len()
    }

    fn raise_handoff(&self, token: &SuspectToken, handoff: &Handoff, now: DateTime<Utc>) -> AlertDisposition {
        let mut ctx = self.base_context(token, now);
        ctx.insert("from_location".to_string(), handoff.from.name.clone());
        if let Some(latest) = token.latest() {
            ctx.insert("confidence".to_string(), format!("{:.2}", latest.confidence));
            ctx.insert("snapshot_url".to_string(), latest.snapshot_url.clone());
        }
        self.raise(kinds::HANDOFF_SUCCESS, ctx, &token.token_id, now)
    }

    /// Context shared by every pursuit alert.
    fn base_context(&self, token: &SuspectToken, now: DateTime<Utc>) -> AlertContext {
        let mut ctx = AlertContext::new();
        ctx.insert("target_id".to_string(), token.token_id.clone());
        ctx.insert("camera_id".to_string(), token.last_camera_id.clone());
        ctx.insert("location".to_string(), token.last_camera_name().to_string());
        ctx.insert("time".to_string(), now.format("%H:%M:%S").to_string());
        ctx.insert("next_location".to_string(), self.predicted_names(token));
        ctx
    }

    fn predicted_names(&self, token: &SuspectToken) -> String {
        if token.predicted_next_cameras.is_empty() {
            return "none (edge of coverage)".to_string();
        }
        token
            .predicted_next_cameras
            .iter()
            .map(|id| {
                self.topology
                    .camera(id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| id.clone())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn raise(&self, kind: &str, ctx: AlertContext, token_id: &str, now: DateTime<Utc>) -> AlertDisposition {
        match self.dispatcher.dispatch_at(kind, ctx, Some(token_id), now) {
            Ok(DispatchOutcome::Sent(payload)) => AlertDisposition::Sent(payload.event_id),
            Ok(DispatchOutcome::Suppressed) => AlertDisposition::Suppressed,
            Err(e) => {
                warn!(token_id, kind, error = %e, "pursuit alert not dispatched; pursuit continues");
                AlertDisposition::Failed
            }
        }
    }
}
