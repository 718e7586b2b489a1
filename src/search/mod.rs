//! Web search backends used by the research agents.
//!
//! Provides a trait-based interface so the agents do not depend on a
//! particular search API.

mod duckduckgo;

pub use duckduckgo::DuckDuckGoSearch;

use crate::config::SearchSettings;
use crate::error::{Result, VidmetaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Trait for web search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run a query and return at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}

/// Build the provider named in the settings.
pub fn create_provider(settings: &SearchSettings) -> Result<Arc<dyn SearchProvider>> {
    match settings.provider.to_lowercase().as_str() {
        "duckduckgo" | "ddg" => Ok(Arc::new(DuckDuckGoSearch::from_settings(settings)?)),
        other => Err(VidmetaError::Config(format!(
            "Unknown search provider: {}",
            other
        ))),
    }
}

/// Render hits as numbered text for the model.
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!(
            "No results found for \"{}\". Try a broader or differently worded query.",
            query
        );
    }

    let formatted = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   {}\n   URL: {}", i + 1, r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Search results for \"{}\":\n\n{}", query, formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results_numbered() {
        let results = vec![
            SearchResult {
                title: "Rust".to_string(),
                snippet: "A language empowering everyone".to_string(),
                url: "https://www.rust-lang.org".to_string(),
            },
            SearchResult {
                title: "Tokio".to_string(),
                snippet: "Async runtime".to_string(),
                url: "https://tokio.rs".to_string(),
            },
        ];
        let text = format_results("rust async", &results);
        assert!(text.starts_with("Search results for \"rust async\":"));
        assert!(text.contains("1. Rust\n"));
        assert!(text.contains("2. Tokio\n"));
        assert!(text.contains("URL: https://tokio.rs"));
    }

    #[test]
    fn test_format_no_results() {
        assert!(format_results("zzz", &[]).starts_with("No results found"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let settings = SearchSettings {
            provider: "altavista".to_string(),
            ..SearchSettings::default()
        };
        assert!(create_provider(&settings).is_err());
    }
}
