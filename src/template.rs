//! Instruction templates with `{key}` placeholders.
//!
//! A placeholder is an identifier in single braces. `{key}` is required and
//! rendering fails when the key is missing; `{key?}` is optional and renders
//! as an empty string. Brace text that is not an identifier (JSON snippets,
//! `{{custom}}` variables that were never substituted) is left untouched.

use crate::context::Context;
use crate::error::{Result, VidmetaError};
use regex::Regex;
use std::sync::OnceLock;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    // Greedy on the braces so `{{var}}` is seen as one token and skipped.
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{+[^{}]*\}+").expect("valid placeholder regex"))
}

/// A context reference found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub key: String,
    pub optional: bool,
}

/// Must start with a letter or underscore, followed by letters, digits, or underscores.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Interpret a raw brace match, returning `None` for literal text.
fn parse_match(raw: &str) -> Option<Placeholder> {
    // Only single-brace tokens are placeholders.
    let inner = raw.strip_prefix('{')?.strip_suffix('}')?;
    if inner.starts_with('{') || inner.ends_with('}') {
        return None;
    }
    let inner = inner.trim();
    let (key, optional) = match inner.strip_suffix('?') {
        Some(key) => (key, true),
        None => (inner, false),
    };
    is_identifier(key).then(|| Placeholder {
        key: key.to_string(),
        optional,
    })
}

/// List the placeholders referenced by `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<Placeholder> {
    placeholder_regex()
        .find_iter(template)
        .filter_map(|m| parse_match(m.as_str()))
        .collect()
}

/// Keys a template cannot render without.
pub fn required_keys(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for placeholder in placeholders(template) {
        if !placeholder.optional && !keys.contains(&placeholder.key) {
            keys.push(placeholder.key);
        }
    }
    keys
}

/// Substitute context values into `template`.
///
/// `agent` is only used to name the culprit when a required key is missing.
pub fn render(template: &str, ctx: &Context, agent: &str) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for m in placeholder_regex().find_iter(template) {
        result.push_str(&template[last_end..m.start()]);

        match parse_match(m.as_str()) {
            Some(placeholder) => match ctx.get(&placeholder.key) {
                Some(value) => result.push_str(value),
                None if placeholder.optional => {}
                None => {
                    return Err(VidmetaError::MissingContextKey {
                        agent: agent.to_string(),
                        key: placeholder.key,
                    })
                }
            },
            None => result.push_str(m.as_str()),
        }

        last_end = m.end();
    }

    result.push_str(&template[last_end..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_by_name() {
        let ctx = ctx(&[("best_title", "Rust in 60s"), ("generated_description", "Body")]);
        let out = render("{best_title}\n{generated_description}", &ctx, "agg").unwrap();
        assert_eq!(out, "Rust in 60s\nBody");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let ctx = ctx(&[("description_research", "facts")]);
        let out = render("use {description_research}, only {description_research}", &ctx, "a").unwrap();
        assert_eq!(out, "use facts, only facts");
    }

    #[test]
    fn test_missing_required_key_names_agent() {
        let err = render("Context: {title_research}", &Context::new(), "TitleGeneratorAgent")
            .unwrap_err();
        match err {
            VidmetaError::MissingContextKey { agent, key } => {
                assert_eq!(agent, "TitleGeneratorAgent");
                assert_eq!(key, "title_research");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optional_placeholder_renders_empty() {
        let out = render("notes:{notes?}.", &Context::new(), "a").unwrap();
        assert_eq!(out, "notes:.");
    }

    #[test]
    fn test_non_identifiers_stay_literal() {
        let template = r#"Return {"title": "x"} and {{channel}} and { } and {1abc}"#;
        let out = render(template, &Context::new(), "a").unwrap();
        assert_eq!(out, template);
        assert!(placeholders(template).is_empty());
    }

    #[test]
    fn test_required_keys_dedupes_and_skips_optional() {
        let keys = required_keys("{a} {b?} {a} { c }");
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    }
}
