//! # Gurukul Chat Template Rendering
//!
//! File: cli/src/core/templating.rs
//!
//! ## Overview
//!
//! Greetings and scripted classifier responses are small Tera templates so
//! they can be customised from the configuration file without code changes.
//! This module wraps one-off Tera rendering with the crate's error type.
//!
//! Templates see a flat string context. The keys supplied by the chat core are:
//! - `first_name`: the visitor's first name, or `friend`
//! - `assistant`: the configured assistant name
//! - `brand`: the configured brand name
//!
//! Autoescaping is off: the output is raw message text that later passes
//! through the render pipeline, which does its own escaping per back-end.
//!
use crate::core::error::{ChatError, Result};
use anyhow::{anyhow, Context};
use std::collections::HashMap;
use tera::Tera;
use tracing::trace;

/// Renders a single template string against a flat string context.
///
/// `label` names the template in error messages (e.g. `"welcome_template"`).
pub fn render_str(label: &str, template: &str, context_map: &HashMap<String, String>) -> Result<String> {
    let tera_context = tera::Context::from_serialize(context_map).map_err(|e| {
        anyhow!(ChatError::Template { source: e }).context("Failed to create Tera context from map")
    })?;
    let rendered = Tera::one_off(template, &tera_context, false)
        .map_err(|e| anyhow!(ChatError::Template { source: e }))
        .with_context(|| format!("Failed to render template '{}'", label))?;
    trace!("Rendered template '{}': {}", label, rendered);
    Ok(rendered)
}

/// Escapes text for inclusion in HTML content or attribute values.
pub fn escape_html(input: &str) -> String {
    tera::escape_html(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_variables() {
        let out = render_str(
            "greeting",
            "Namaste {{ first_name }}! I'm {{ assistant }}.",
            &ctx(&[("first_name", "Priya"), ("assistant", "eYogi AI")]),
        )
        .unwrap();
        assert_eq!(out, "Namaste Priya! I'm eYogi AI.");
    }

    #[test]
    fn test_render_does_not_autoescape() {
        let out = render_str("raw", "{{ v }}", &ctx(&[("v", "<b>&</b>")])).unwrap();
        assert_eq!(out, "<b>&</b>");
    }

    #[test]
    fn test_render_reports_broken_template() {
        let err = render_str("broken", "{{ unclosed", &ctx(&[])).unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(err.chain().any(|c| c.downcast_ref::<ChatError>().is_some()));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;&#x2F;a&gt;"
        );
    }
}
