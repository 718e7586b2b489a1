//! DuckDuckGo instant-answer search.

use super::{SearchProvider, SearchResult};
use crate::config::SearchSettings;
use crate::error::{Result, VidmetaError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Search backed by the DuckDuckGo instant-answer API (no API key required).
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: Url,
}

impl DuckDuckGoSearch {
    /// Create a provider for the configured endpoint.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let endpoint = Url::parse(&settings.endpoint).map_err(|e| {
            VidmetaError::Config(format!("Invalid search endpoint '{}': {}", settings.endpoint, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("vidmeta/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    fn query_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("no_html", "1")
            .append_pair("skip_disambig", "1");
        url
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    abstract_source: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    related_topics: Vec<RelatedTopic>,
    results: Vec<RelatedTopic>,
}

/// Either a topic or a named group of topics.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct RelatedTopic {
    text: String,
    #[serde(rename = "FirstURL")]
    first_url: String,
    topics: Vec<RelatedTopic>,
}

impl InstantAnswer {
    fn into_results(self, max_results: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();

        if !self.abstract_text.is_empty() {
            let title = if self.heading.is_empty() {
                self.abstract_source.clone()
            } else {
                format!("{} ({})", self.heading, self.abstract_source)
            };
            results.push(SearchResult {
                title,
                snippet: self.abstract_text,
                url: self.abstract_url,
            });
        }

        let topics = self
            .results
            .into_iter()
            .chain(self.related_topics)
            .flat_map(|topic| {
                if topic.topics.is_empty() {
                    vec![topic]
                } else {
                    topic.topics
                }
            });

        for topic in topics {
            if results.len() >= max_results {
                break;
            }
            if topic.text.is_empty() {
                continue;
            }
            // Topic text reads "Title - snippet"; split it when possible.
            let (title, snippet) = match topic.text.split_once(" - ") {
                Some((title, snippet)) => (title.to_string(), snippet.to_string()),
                None => (topic.text.clone(), topic.text.clone()),
            };
            results.push(SearchResult {
                title,
                snippet,
                url: topic.first_url,
            });
        }

        results.truncate(max_results);
        results
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(self.query_url(query))
            .send()
            .await?
            .error_for_status()?;

        let answer: InstantAnswer = response.json().await?;
        let results = answer.into_results(max_results);

        debug!("Search returned {} result(s)", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Heading": "Rust (programming language)",
        "AbstractText": "Rust is a general-purpose programming language.",
        "AbstractSource": "Wikipedia",
        "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
        "Results": [],
        "RelatedTopics": [
            {"Text": "Cargo - The Rust package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
            {"Name": "Tools", "Topics": [
                {"Text": "Clippy - A collection of lints", "FirstURL": "https://duckduckgo.com/Clippy"},
                {"Text": "Rustfmt", "FirstURL": "https://duckduckgo.com/Rustfmt"}
            ]}
        ]
    }"#;

    #[test]
    fn test_parse_instant_answer() {
        let answer: InstantAnswer = serde_json::from_str(SAMPLE).unwrap();
        let results = answer.into_results(10);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].title, "Rust (programming language) (Wikipedia)");
        assert_eq!(results[1].title, "Cargo");
        assert_eq!(results[1].snippet, "The Rust package manager");
        assert_eq!(results[2].url, "https://duckduckgo.com/Clippy");
        assert_eq!(results[3].title, "Rustfmt");
    }

    #[test]
    fn test_results_capped() {
        let answer: InstantAnswer = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(answer.into_results(2).len(), 2);
    }

    #[test]
    fn test_query_url_encodes_query() {
        let search = DuckDuckGoSearch::from_settings(&SearchSettings::default()).unwrap();
        let url = search.query_url("rust & tokio");
        assert!(url.as_str().starts_with("https://api.duckduckgo.com/?q=rust+%26+tokio"));
        assert!(url.as_str().contains("format=json"));
    }
}
