//! Tool definitions and implementations for the agent system.

use crate::error::{Result, VidmetaError};
use crate::model::ToolDefinition;
use crate::search::{format_results, SearchProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on results a model may ask for in one search.
const MAX_SEARCH_RESULTS: usize = 10;

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the web.
    WebSearch {
        query: String,
        max_results: Option<usize>,
    },
}

/// Tool execution context with access to the search provider.
#[derive(Clone)]
pub struct ToolContext {
    pub search: Arc<dyn SearchProvider>,
    /// Results returned when the model does not ask for a count.
    pub default_max_results: usize,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(search: Arc<dyn SearchProvider>, default_max_results: usize) -> Self {
        Self {
            search,
            default_max_results,
        }
    }

    /// Get the function definitions offered to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::WebSearch { query, max_results } => {
                let limit = max_results
                    .unwrap_or(self.default_max_results)
                    .clamp(1, MAX_SEARCH_RESULTS);
                self.execute_web_search(query, limit).await
            }
        }
    }

    async fn execute_web_search(&self, query: &str, limit: usize) -> Result<String> {
        if query.trim().is_empty() {
            return Err(VidmetaError::Tool {
                name: "web_search".to_string(),
                message: "query must not be empty".to_string(),
            });
        }

        let results = self
            .search
            .search(query, limit)
            .await
            .map_err(|e| VidmetaError::Tool {
                name: "web_search".to_string(),
                message: e.to_string(),
            })?;

        Ok(format_results(query, &results))
    }
}

/// Get function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "web_search".to_string(),
        description: "Search the web for up-to-date information. Returns titles, snippets, \
            and URLs. Use this to research keywords, trends, competitor titles, and facts \
            about the topic."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 5, max: 10)"
                }
            },
            "required": ["query"]
        }),
    }]
}

/// Parse a tool call from the model's function-call format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| VidmetaError::Agent(format!("Invalid tool arguments: {}", e)))?;

    match name {
        "web_search" => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| VidmetaError::Agent("Missing 'query' argument".to_string()))?
                .to_string();
            let max_results = args["max_results"].as_u64().map(|n| n as usize);
            Ok(ToolCall::WebSearch { query, max_results })
        }
        _ => Err(VidmetaError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingSearch {
        limits: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl SearchProvider for RecordingSearch {
        fn name(&self) -> &str {
            "recording"
        }

        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
            self.limits.lock().unwrap().push(max_results);
            Ok(vec![SearchResult {
                title: format!("About {}", query),
                snippet: "snippet".to_string(),
                url: "https://example.com".to_string(),
            }])
        }
    }

    #[test]
    fn test_parse_web_search_tool() {
        let tool = parse_tool_call("web_search", r#"{"query": "rust tutorials", "max_results": 3}"#)
            .unwrap();
        assert_eq!(
            tool,
            ToolCall::WebSearch {
                query: "rust tutorials".to_string(),
                max_results: Some(3)
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(parse_tool_call("google_search", r#"{"query": "x"}"#).is_err());
        assert!(parse_tool_call("web_search", r#"{"max_results": 2}"#).is_err());
        assert!(parse_tool_call("web_search", "not json").is_err());
    }

    #[tokio::test]
    async fn test_execute_clamps_result_count() {
        let search = Arc::new(RecordingSearch {
            limits: Mutex::new(Vec::new()),
        });
        let tools = ToolContext::new(search.clone(), 5);

        let output = tools
            .execute(&ToolCall::WebSearch {
                query: "rust".to_string(),
                max_results: Some(50),
            })
            .await
            .unwrap();
        tools
            .execute(&ToolCall::WebSearch {
                query: "rust".to_string(),
                max_results: None,
            })
            .await
            .unwrap();

        assert!(output.contains("About rust"));
        assert_eq!(*search.limits.lock().unwrap(), vec![10, 5]);
    }

    #[test]
    fn test_definitions_name_web_search() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "web_search");
        assert_eq!(defs[0].parameters["required"][0], "query");
    }
}
