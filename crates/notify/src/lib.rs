//! Alert dispatch engine for surveillance alerts.
//!
//! This crate provides:
//! - `TemplateCatalog` mapping alert kinds to message templates
//! - `{placeholder}` message rendering with lenient fill
//! - `Dispatcher` applying per-subject cooldown and CRITICAL escalation
//! - `AlertTransport` hand-off plus a queued delivery worker
//! - `Notifier` channels (webhook, Telegram)

pub mod catalog;
pub mod dispatcher;
pub mod history;
pub mod payload;
pub mod telegram;
pub mod templating;
pub mod traits;
pub mod transport;
pub mod webhook;

pub use catalog::{kinds, AlertTemplate, TemplateCatalog, TemplateExample};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use history::{AlertHistory, AlertHistoryEntry, COOLDOWN_WINDOW};
pub use payload::{AlertContext, AlertMessage, OutboundAlertPayload};
pub use traits::{Notifier, NotifyError};
pub use transport::{AlertTransport, DeliveryWorker, MemoryTransport, QueuedTransport, Route};
