//! Hand-off from the dispatcher to delivery channels.
//!
//! The dispatcher calls [`AlertTransport::deliver`] synchronously and never
//! waits for network I/O. [`QueuedTransport`] pushes each delivery onto an
//! unbounded channel that a [`DeliveryWorker`] drains, routing payloads to
//! the [`Notifier`] channels registered for their [`Route`]. Individual
//! channel failures are logged and don't block other channels. Nothing is
//! retried: delivery is at-most-once and best-effort.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::payload::OutboundAlertPayload;
use crate::traits::{DeliveryResult, Notifier, NotifyError};

/// Which channel group a payload is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Regular operator notifications.
    Primary,
    /// Secondary high-priority channel for CRITICAL alerts.
    Escalation,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Primary => write!(f, "primary"),
            Route::Escalation => write!(f, "escalation"),
        }
    }
}

/// The single dispatch interface between the alert engine and delivery.
pub trait AlertTransport: Send + Sync {
    /// Accept a payload for delivery. Must not block on I/O.
    fn deliver(&self, route: Route, payload: &OutboundAlertPayload) -> Result<(), NotifyError>;
}

/// A payload queued for a route.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub route: Route,
    pub payload: OutboundAlertPayload,
}

/// Non-blocking transport backed by a tokio unbounded channel.
#[derive(Debug, Clone)]
pub struct QueuedTransport {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl QueuedTransport {
    /// Create the transport and the receiving end for a [`DeliveryWorker`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertTransport for QueuedTransport {
    fn deliver(&self, route: Route, payload: &OutboundAlertPayload) -> Result<(), NotifyError> {
        self.tx
            .send(Delivery {
                route,
                payload: payload.clone(),
            })
            .map_err(|_| NotifyError::Transport("delivery worker has shut down".to_string()))
    }
}

/// In-process transport that keeps every delivery, for observers and tests.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    deliveries: Mutex<Vec<Delivery>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far, oldest first.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().expect("memory transport lock poisoned").clone()
    }

    /// Payloads delivered on one route, oldest first.
    pub fn on_route(&self, route: Route) -> Vec<OutboundAlertPayload> {
        self.deliveries
            .lock()
            .expect("memory transport lock poisoned")
            .iter()
            .filter(|d| d.route == route)
            .map(|d| d.payload.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.deliveries.lock().expect("memory transport lock poisoned").clear();
    }
}

impl AlertTransport for MemoryTransport {
    fn deliver(&self, route: Route, payload: &OutboundAlertPayload) -> Result<(), NotifyError> {
        self.deliveries
            .lock()
            .expect("memory transport lock poisoned")
            .push(Delivery {
                route,
                payload: payload.clone(),
            });
        Ok(())
    }
}

/// Drains a [`QueuedTransport`] and delivers to per-route channels.
pub struct DeliveryWorker {
    rx: mpsc::UnboundedReceiver<Delivery>,
    routes: HashMap<Route, Vec<Box<dyn Notifier>>>,
}

impl DeliveryWorker {
    pub fn new(rx: mpsc::UnboundedReceiver<Delivery>) -> Self {
        Self {
            rx,
            routes: HashMap::new(),
        }
    }

    /// Register channels for a route (appends to existing ones).
    pub fn with_channels(mut self, route: Route, channels: Vec<Box<dyn Notifier>>) -> Self {
        self.routes.entry(route).or_default().extend(channels);
        self
    }

    pub fn channel_count(&self, route: Route) -> usize {
        self.routes.get(&route).map_or(0, Vec::len)
    }

    /// Run until every [`QueuedTransport`] clone has been dropped.
    pub async fn run(mut self) {
        tracing::info!(
            primary = self.channel_count(Route::Primary),
            escalation = self.channel_count(Route::Escalation),
            "delivery worker started"
        );
        while let Some(delivery) = self.rx.recv().await {
            self.deliver(&delivery).await;
        }
        tracing::info!("delivery worker stopped");
    }

    /// Deliver one payload to every channel on its route.
    ///
    /// Returns results for each channel delivery. Individual failures
    /// don't block other channels.
    pub async fn deliver(&self, delivery: &Delivery) -> Vec<DeliveryResult> {
        let route = delivery.route;
        let payload = &delivery.payload;

        let channels = match self.routes.get(&route) {
            Some(channels) if !channels.is_empty() => channels,
            _ => {
                tracing::debug!(%route, event_id = %payload.event_id, "No delivery channels configured");
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(channels.len());

        for channel in channels {
            let start = std::time::Instant::now();
            let result = channel.send(payload).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        %route,
                        event_id = %payload.event_id,
                        channel = channel.channel_name(),
                        duration_ms,
                        "Alert delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        %route,
                        event_id = %payload.event_id,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "Alert delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DeliveryResult {
                channel: channel.channel_name().to_string(),
                event_id: payload.event_id.clone(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}
