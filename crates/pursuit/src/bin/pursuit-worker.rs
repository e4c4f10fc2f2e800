//! pursuit-worker: runs a camera-to-camera pursuit and delivers its alerts.
//!
//! Loads the alert catalog and camera topology, wires the dispatcher to the
//! configured delivery channels (webhook, escalation webhook, Telegram) and
//! drives one pursuit until it is lost or interrupted with Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use vigil_core::{Camera, Config, SubjectAttributes, TargetType};
use vigil_notify::telegram::TelegramNotifier;
use vigil_notify::templating::BodyRenderer;
use vigil_notify::transport::Delivery;
use vigil_notify::webhook::{WebhookNotifier, WebhookSettings};
use vigil_notify::{DeliveryWorker, Dispatcher, Notifier, QueuedTransport, Route, TemplateCatalog};
use vigil_pursuit::{PursuitController, PursuitRunner, PursuitSettings};
use vigil_topology::{LinearTopology, Topology, TopologyFile};

// ── CLI ─────────────────────────────────────────────────────────────

/// Pursuit worker: follows a subject across cameras and raises alerts.
#[derive(Parser, Debug)]
#[command(name = "pursuit-worker", version, about)]
struct Cli {
    /// Camera topology YAML. Uses a built-in demo chain when unset.
    #[arg(long, env = "TOPOLOGY_PATH")]
    topology: Option<PathBuf>,

    /// Alert template catalog YAML. Uses the built-in catalog when unset.
    #[arg(long, env = "ALERT_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// Tick interval in milliseconds (overrides PURSUIT_TICK_MS).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: Option<u64>,

    /// PERSON or VEHICLE.
    #[arg(long, default_value = "PERSON")]
    target_type: TargetType,

    /// Comma-separated colors of the subject.
    #[arg(long, value_delimiter = ',')]
    colors: Vec<String>,
}

// ── Wiring ──────────────────────────────────────────────────────────

fn demo_topology() -> anyhow::Result<Arc<dyn Topology>> {
    let chain = LinearTopology::new(vec![
        Camera::new("CAM-01", "Main Gate"),
        Camera::new("CAM-02", "Lobby"),
        Camera::new("CAM-03", "East Corridor"),
        Camera::new("CAM-04", "Parking B1"),
    ])?;
    Ok(Arc::new(chain))
}

fn load_topology(path: Option<&PathBuf>) -> anyhow::Result<Arc<dyn Topology>> {
    match path {
        Some(path) => {
            let file = TopologyFile::from_file(path)
                .with_context(|| format!("loading topology from {}", path.display()))?;
            let topology = file.build().context("building camera topology")?;
            info!(path = %path.display(), "loaded camera topology");
            Ok(Arc::from(topology))
        }
        None => {
            info!("no topology configured, using built-in demo chain");
            demo_topology()
        }
    }
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<TemplateCatalog> {
    let catalog = match path {
        Some(path) => TemplateCatalog::from_file(path)
            .with_context(|| format!("loading alert catalog from {}", path.display()))?,
        None => TemplateCatalog::builtin().context("parsing built-in alert catalog")?,
    };
    info!(templates = catalog.len(), "alert catalog ready");
    Ok(catalog)
}

/// Build delivery channels from config. Channels that fail to build are
/// skipped with a warning.
fn build_worker(config: &Config, rx: mpsc::UnboundedReceiver<Delivery>) -> DeliveryWorker {
    let delivery = &config.delivery;
    let renderer = Arc::new(BodyRenderer::new());
    let mut primary: Vec<Box<dyn Notifier>> = Vec::new();
    let mut escalation: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(url) = &delivery.webhook_url {
        let mut settings = WebhookSettings::new(url.clone());
        settings.body_template = delivery.webhook_body_template.clone();
        match WebhookNotifier::from_settings(settings, Arc::clone(&renderer)) {
            Ok(n) => primary.push(Box::new(n)),
            Err(e) => warn!(error = %e, "webhook channel disabled"),
        }
    }

    if let (Some(token), Some(chat)) = (&delivery.telegram_bot_token, &delivery.telegram_chat_id) {
        match TelegramNotifier::from_config(token.clone(), chat.clone(), None) {
            Ok(n) => primary.push(Box::new(n)),
            Err(e) => warn!(error = %e, "telegram channel disabled"),
        }
    }

    if let Some(url) = &delivery.escalation_webhook_url {
        let mut settings = WebhookSettings::new(url.clone());
        settings.label = Some("escalation-webhook".to_string());
        match WebhookNotifier::from_settings(settings, renderer) {
            Ok(n) => escalation.push(Box::new(n)),
            Err(e) => warn!(error = %e, "escalation channel disabled"),
        }
    }

    if primary.is_empty() {
        warn!("no primary delivery channel configured; alerts are logged only");
    }

    DeliveryWorker::new(rx)
        .with_channels(Route::Primary, primary)
        .with_channels(Route::Escalation, escalation)
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    vigil_core::config::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();
    tracing::debug!(config = %config.redacted_summary(), "effective configuration");

    let catalog = load_catalog(cli.catalog.as_ref().or(config.alerts.catalog_path.as_ref()))?;
    let topology = load_topology(cli.topology.as_ref().or(config.pursuit.topology_path.as_ref()))?;

    let (transport, rx) = QueuedTransport::channel();
    let worker = build_worker(&config, rx);
    let worker_handle = tokio::spawn(worker.run());

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(catalog), Arc::new(transport)));
    let settings = PursuitSettings {
        snapshot_base_url: config.pursuit.snapshot_base_url.clone(),
        prediction_width: config.pursuit.prediction_width,
        max_hops: config.pursuit.max_hops,
    };
    let controller = PursuitController::new(topology, dispatcher, settings);
    let interval = Duration::from_millis(cli.tick_ms.unwrap_or(config.pursuit.tick_interval_ms));
    let runner = PursuitRunner::new(controller, interval);

    let attributes = SubjectAttributes::new(cli.target_type).with_colors(cli.colors);
    let token = runner.launch(attributes).context("starting pursuit")?;
    info!(token_id = %token.token_id, camera = %token.last_camera_id, "pursuit-worker running");

    let mut poll = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping pursuit");
                runner.shutdown();
                break;
            }
            _ = poll.tick() => {
                if !runner.is_running(&token.token_id) {
                    info!(token_id = %token.token_id, "pursuit finished");
                    break;
                }
            }
        }
    }

    // Let queued alerts drain before exiting.
    drop(runner);
    if tokio::time::timeout(Duration::from_secs(5), worker_handle).await.is_err() {
        warn!("delivery worker did not drain within 5s");
    }
    info!("pursuit-worker exited cleanly");
    Ok(())
}
