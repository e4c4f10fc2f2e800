use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub alerts: AlertsConfig,
    pub pursuit: PursuitConfig,
    pub delivery: DeliveryConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VIGIL_PROFILE` env var. When set (e.g. `SITE_B`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("VIGIL_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            alerts: AlertsConfig::from_env_profiled(p),
            pursuit: PursuitConfig::from_env_profiled(p),
            delivery: DeliveryConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  alerts:    catalog={}",
            self.alerts
                .catalog_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(builtin)".to_string())
        );
        tracing::info!(
            "  pursuit:   topology={}, tick={}ms, predict_k={}, max_hops={}",
            self.pursuit
                .topology_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string()),
            self.pursuit.tick_interval_ms,
            self.pursuit.prediction_width,
            self.pursuit.max_hops
        );
        tracing::info!(
            "  delivery:  webhook={}, escalation={}, telegram={}",
            self.delivery.webhook_url.is_some(),
            self.delivery.escalation_webhook_url.is_some(),
            self.delivery.telegram_configured()
        );
    }

    /// Structured view of the effective config with secrets reduced to
    /// presence flags. Logged at debug level by the worker binary.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "alerts": { "catalog_path": self.alerts.catalog_path },
            "pursuit": {
                "topology_path": self.pursuit.topology_path,
                "tick_interval_ms": self.pursuit.tick_interval_ms,
                "max_hops": self.pursuit.max_hops,
                "snapshot_base_url": self.pursuit.snapshot_base_url,
                "prediction_width": self.pursuit.prediction_width,
            },
            "delivery": {
                "webhook": self.delivery.webhook_url.is_some(),
                "escalation_webhook": self.delivery.escalation_webhook_url.is_some(),
                "telegram": self.delivery.telegram_configured(),
            },
        })
    }
}

// ── Alerts ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Operator-authored template catalog (YAML). `None` uses the builtin catalog.
    pub catalog_path: Option<PathBuf>,
}

impl AlertsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            catalog_path: profiled_env_opt(p, "ALERT_CATALOG_PATH").map(PathBuf::from),
        }
    }
}

// ── Pursuit ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PursuitConfig {
    pub topology_path: Option<PathBuf>,
    /// Never zero.
    pub tick_interval_ms: u64,
    /// Steps after which a pursuit is treated as lost (guards cyclic topologies).
    pub max_hops: usize,
    pub snapshot_base_url: String,
    /// How many candidate next cameras to predict.
    pub prediction_width: usize,
}

impl PursuitConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            topology_path: profiled_env_opt(p, "TOPOLOGY_PATH").map(PathBuf::from),
            tick_interval_ms: profiled_env_u64(p, "PURSUIT_TICK_MS", 3_000).max(1),
            max_hops: profiled_env_usize(p, "PURSUIT_MAX_HOPS", 64).max(1),
            snapshot_base_url: profiled_env_or(p, "SNAPSHOT_BASE_URL", "/snapshots"),
            prediction_width: profiled_env_usize(p, "PURSUIT_PREDICTION_WIDTH", 1).max(1),
        }
    }
}

// ── Delivery ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub webhook_url: Option<String>,
    /// Secondary high-priority channel used for CRITICAL escalation.
    pub escalation_webhook_url: Option<String>,
    pub webhook_body_template: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl DeliveryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            webhook_url: profiled_env_opt(p, "ALERT_WEBHOOK_URL"),
            escalation_webhook_url: profiled_env_opt(p, "ESCALATION_WEBHOOK_URL"),
            webhook_body_template: profiled_env_opt(p, "ALERT_WEBHOOK_BODY_TEMPLATE"),
            telegram_bot_token: profiled_env_opt(p, "TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: profiled_env_opt(p, "TELEGRAM_CHAT_ID"),
        }
    }

    pub fn telegram_configured(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}
