//! HTTP webhook delivery channel.
//!
//! Posts each alert payload to an operator endpoint (SOC dashboards, chat
//! bridges, SMS gateways). The body is the payload JSON unless a minijinja
//! body template is configured, in which case the template is rendered with
//! the payload as context.

use std::collections::HashMap;
use std::sync::Arc;

use crate::payload::OutboundAlertPayload;
use crate::templating::BodyRenderer;
use crate::traits::{Notifier, NotifyError};

/// Settings for a [`WebhookNotifier`], usually built from env config.
///
/// `${VAR_NAME}` references in `url` and header values are resolved when
/// the notifier is built.
#[derive(Debug, Clone, Default)]
pub struct WebhookSettings {
    pub url: String,
    /// HTTP method name; `POST` when unset.
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub body_template: Option<String>,
    /// Name reported in delivery logs; `webhook` when unset.
    pub label: Option<String>,
}

impl WebhookSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Delivers alert payloads over HTTP to a configured endpoint.
#[derive(Debug)]
pub struct WebhookNotifier {
    url: String,
    method: reqwest::Method,
    headers: HashMap<String, String>,
    body_template: Option<String>,
    label: String,
    renderer: Arc<BodyRenderer>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Build a notifier, resolving env references and validating the body
    /// template up front.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Config`] for an invalid method, a missing env var, or
    /// a body template with syntax errors.
    pub fn from_settings(settings: WebhookSettings, renderer: Arc<BodyRenderer>) -> Result<Self, NotifyError> {
        let method = match settings.method.as_deref() {
            Some(m) => m
                .to_uppercase()
                .parse::<reqwest::Method>()
                .map_err(|_| NotifyError::Config(format!("invalid HTTP method: {m}")))?,
            None => reqwest::Method::POST,
        };

        let headers = settings
            .headers
            .iter()
            .map(|(k, v)| Ok((k.clone(), resolve_env_vars(v)?)))
            .collect::<Result<HashMap<_, _>, NotifyError>>()?;

        if let Some(tmpl) = settings.body_template.as_deref() {
            renderer
                .validate(tmpl)
                .map_err(|e| NotifyError::Config(format!("invalid body template: {e}")))?;
        }

        Ok(Self {
            url: resolve_env_vars(&settings.url)?,
            method,
            headers,
            body_template: settings.body_template,
            label: settings.label.unwrap_or_else(|| "webhook".to_string()),
            renderer,
            client: reqwest::Client::new(),
        })
    }

    fn body_for(&self, payload: &OutboundAlertPayload) -> Result<String, NotifyError> {
        match self.body_template.as_deref() {
            Some(tmpl) => self.renderer.render(tmpl, payload),
            None => serde_json::to_string(payload)
                .map_err(|e| NotifyError::Config(format!("failed to serialize payload: {e}"))),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, payload: &OutboundAlertPayload) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .request(self.method.clone(), &self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(self.body_for(payload)?);

        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                channel = %self.label,
                %status,
                body = %body_text,
                "webhook returned non-2xx status"
            );
            return Err(NotifyError::Transport(format!(
                "webhook returned {status}: {body_text}"
            )));
        }

        tracing::debug!(
            channel = %self.label,
            method = %self.method,
            %status,
            event_id = %payload.event_id,
            "webhook alert delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        &self.label
    }
}

/// Replace `${VAR_NAME}` references with environment values.
fn resolve_env_vars(input: &str) -> Result<String, NotifyError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            NotifyError::Config(format!("unclosed env var reference in: {input}"))
        })?;
        let name = &after[..end];
        let value = std::env::var(name)
            .map_err(|_| NotifyError::Config(format!("env var not found: {name}")))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
