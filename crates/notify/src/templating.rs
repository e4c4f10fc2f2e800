//! Message rendering.
//!
//! Alert messages use `{identifier}` placeholders filled from a flat
//! [`AlertContext`]. Filling is lenient: a placeholder whose key is absent
//! stays in the output as literal text, because upstream callers may omit
//! optional fields.
//!
//! Webhook request bodies are a separate concern and use minijinja through
//! [`BodyRenderer`], with the whole payload as template context.

use crate::payload::AlertContext;
use crate::traits::NotifyError;

/// Fill every `{key}` token in `text` from `context`.
///
/// The scan is single-pass and left to right: each occurrence of a token is
/// replaced independently, substituted values are never rescanned, and any
/// brace sequence that is not a well-formed token is copied verbatim.
pub fn render(text: &str, context: &AlertContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match token_at(after) {
            Some(key) => {
                match context.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Distinct placeholder names in `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match token_at(after) {
            Some(key) => {
                if !names.contains(&key) {
                    names.push(key);
                }
                rest = &after[key.len() + 1..];
            }
            None => rest = after,
        }
    }
    names
}

/// Placeholders in `text` that `context` does not provide.
pub fn missing_keys<'a>(text: &'a str, context: &AlertContext) -> Vec<&'a str> {
    placeholders(text)
        .into_iter()
        .filter(|key| !context.contains_key(*key))
        .collect()
}

/// If `s` starts with `identifier}`, return the identifier.
fn token_at(s: &str) -> Option<&str> {
    let end = s.find('}')?;
    let key = &s[..end];
    let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(key)
}

/// Renders webhook body templates using minijinja.
///
/// A fresh [`minijinja::Environment`] is created per render call since
/// body templates are configuration strings, not pre-registered files.
#[derive(Debug)]
pub struct BodyRenderer {
    _private: (),
}

impl BodyRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("lower", lower_filter);
        env.add_filter("upper", upper_filter);
        env.add_function("env", env_function);
        env
    }

    /// Render a body template against any serializable context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render<S: serde::Serialize>(&self, template_str: &str, ctx: &S) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check template syntax without evaluating it.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for BodyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn lower_filter(value: String) -> String {
    value.to_lowercase()
}

fn upper_filter(value: String) -> String {
    value.to_uppercase()
}

/// Global function: read an environment variable by name, empty if unset.
fn env_function(name: String) -> String {
    match std::env::var(&name) {
        Ok(val) => val,
        Err(_) => {
            tracing::warn!(var = %name, "Environment variable not found, returning empty string");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::OutboundAlertPayload;
    use vigil_core::Severity;

    fn ctx(pairs: &[(&str, &str)]) -> AlertContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_token_replaced_everywhere() {
        assert_eq!(render("A {x} B {x} C", &ctx(&[("x", "Z")])), "A Z B Z C");
    }

    #[test]
    fn missing_key_left_literal() {
        assert_eq!(render("{a}-{b}", &ctx(&[("a", "1")])), "1-{b}");
    }

    #[test]
    fn render_is_deterministic() {
        let c = ctx(&[("location", "Lobby"), ("time", "10:02")]);
        let tpl = "Target at {location} ({time}), last {location}";
        assert_eq!(render(tpl, &c), render(tpl, &c));
    }

    #[test]
    fn second_pass_with_empty_context_is_noop() {
        let once = render("{a} and {b}", &ctx(&[("a", "1")]));
        assert_eq!(render(&once, &AlertContext::new()), once);
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let c = ctx(&[("a", "{b}"), ("b", "boom")]);
        assert_eq!(render("{a}", &c), "{b}");
    }

    #[test]
    fn malformed_braces_copied_verbatim() {
        let c = ctx(&[("x", "1")]);
        assert_eq!(render("{ x } {} {x", &c), "{ x } {} {x");
        assert_eq!(render("{{x}}", &c), "{1}");
        assert_eq!(render("{not-a-key} {x}", &c), "{not-a-key} 1");
    }

    #[test]
    fn non_ascii_text_survives() {
        let c = ctx(&[("loc", "入口")]);
        assert_eq!(render("目標 → {loc} ✓", &c), "目標 → 入口 ✓");
    }

    #[test]
    fn placeholders_in_first_appearance_order() {
        assert_eq!(placeholders("{b} {a} {b} {c_1}"), vec!["b", "a", "c_1"]);
        assert!(placeholders("no tokens").is_empty());
    }

    #[test]
    fn missing_keys_reports_absent_only() {
        let c = ctx(&[("a", "1")]);
        assert_eq!(missing_keys("{a} {b} {c} {b}", &c), vec!["b", "c"]);
    }

    #[test]
    fn body_renderer_sees_payload_fields() {
        let payload = OutboundAlertPayload::new(
            "target_lost",
            Severity::High,
            Some("tok-1".to_string()),
            "Lost".to_string(),
            "Lost at C".to_string(),
            ctx(&[("location", "C")]),
        );
        let renderer = BodyRenderer::new();
        let out = renderer
            .render(
                "{{ severity | lower }}:{{ event_type }}:{{ trace_id }}:{{ context.location }}",
                &payload,
            )
            .unwrap();
        assert_eq!(out, "high:target_lost:tok-1:C");
    }

    #[test]
    fn body_renderer_rejects_invalid_syntax() {
        let renderer = BodyRenderer::new();
        assert!(matches!(renderer.validate("{{ unclosed"), Err(NotifyError::Template(_))));
        assert!(renderer.validate("{{ message.short }}").is_ok());
    }

    #[test]
    fn body_renderer_env_missing_returns_empty() {
        let renderer = BodyRenderer::new();
        let out = renderer
            .render("[{{ env('DEFINITELY_NOT_SET_VIGIL_XYZ') }}]", &ctx(&[]))
            .unwrap();
        assert_eq!(out, "[]");
    }
}
