//! Agent runner with tool calling loop.

use super::tools::{parse_tool_call, ToolContext};
use super::{Agent, Invocation};
use crate::context::Context;
use crate::error::{Result, VidmetaError};
use crate::model::{
    execute_with_retry, LanguageModel, Message, ModelRequest, ModelResponse, RetryPolicy,
    ToolCallRequest,
};
use crate::template::render;
use crate::workflow::PipelineEvent;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Default cap on model calls per agent run.
const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Agent that renders its instruction, talks to a model, and may use tools.
pub struct LlmAgent {
    name: String,
    instruction: String,
    output_key: String,
    model: Arc<dyn LanguageModel>,
    tools: Option<ToolContext>,
    retry: RetryPolicy,
    max_iterations: usize,
}

impl LlmAgent {
    /// Create a new agent with no tools and the default retry policy.
    pub fn new(
        name: &str,
        model: Arc<dyn LanguageModel>,
        instruction: &str,
        output_key: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            instruction: instruction.to_string(),
            output_key: output_key.to_string(),
            model,
            tools: None,
            retry: RetryPolicy::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Give the agent access to tools.
    pub fn with_tools(mut self, tools: ToolContext) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the retry policy for model calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Whether the agent can call tools.
    pub fn has_tools(&self) -> bool {
        self.tools.is_some()
    }

    /// Call the model once, retrying transient failures.
    async fn call_model(&self, request: &ModelRequest, invocation: &Invocation) -> Result<ModelResponse> {
        execute_with_retry(
            &self.retry,
            |attempt, delay| {
                invocation.events.emit(PipelineEvent::Retrying {
                    agent: self.name.clone(),
                    attempt,
                    delay,
                })
            },
            || self.model.generate(request.clone()),
        )
        .await
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, call: &ToolCallRequest, invocation: &Invocation) -> ToolCallRecord {
        info!("{} calling tool: {} with args: {}", self.name, call.name, call.arguments);
        invocation.events.emit(PipelineEvent::ToolCalled {
            agent: self.name.clone(),
            tool: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        // Failures go back to the model as text so it can adjust.
        let result = match &self.tools {
            None => format!("Tool error: no tools are available to {}", self.name),
            Some(tools) => match parse_tool_call(&call.name, &call.arguments) {
                Ok(tool) => match tools.execute(&tool).await {
                    Ok(output) => output,
                    Err(e) => format!("Tool error: {}", e),
                },
                Err(e) => format!("Failed to parse tool call: {}", e),
            },
        };

        ToolCallRecord {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result,
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn instruction(&self) -> &str {
        &self.instruction
    }

    fn output_key(&self) -> &str {
        &self.output_key
    }

    #[instrument(skip_all, fields(agent = %self.name, model = %self.model.name()))]
    async fn run(&self, invocation: &Invocation, ctx: &Context) -> Result<AgentRun> {
        let started = Instant::now();
        let system_prompt = render(&self.instruction, ctx, &self.name)?;

        let mut messages = vec![
            Message::System(system_prompt),
            Message::User(invocation.topic.clone()),
        ];
        let tool_definitions = self
            .tools
            .as_ref()
            .map(ToolContext::definitions)
            .unwrap_or_default();

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(VidmetaError::Agent(format!(
                    "{} exceeded maximum iterations ({})",
                    self.name, self.max_iterations
                )));
            }

            debug!("{} iteration {}", self.name, iterations);

            let request = ModelRequest {
                messages: messages.clone(),
                tools: tool_definitions.clone(),
            };
            let response = self.call_model(&request, invocation).await?;

            if response.tool_calls.is_empty() {
                let output = response.content.unwrap_or_default().trim().to_string();
                if output.is_empty() {
                    return Err(VidmetaError::Agent(format!(
                        "{} returned an empty response",
                        self.name
                    )));
                }

                return Ok(AgentRun {
                    agent: self.name.clone(),
                    output_key: self.output_key.clone(),
                    output,
                    iterations,
                    tool_calls: tool_calls_made,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }

            messages.push(Message::Assistant {
                content: response.content.clone(),
                tool_calls: response.tool_calls.clone(),
            });

            for call in &response.tool_calls {
                let record = self.execute_tool_call(call, invocation).await;
                messages.push(Message::Tool {
                    call_id: call.id.clone(),
                    content: record.result.clone(),
                });
                tool_calls_made.push(record);
            }
        }
    }
}

/// Agent that publishes its rendered template without calling a model.
pub struct TemplateAgent {
    name: String,
    template: String,
    output_key: String,
}

impl TemplateAgent {
    pub fn new(name: &str, template: &str, output_key: &str) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            output_key: output_key.to_string(),
        }
    }
}

#[async_trait]
impl Agent for TemplateAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn instruction(&self) -> &str {
        &self.template
    }

    fn output_key(&self) -> &str {
        &self.output_key
    }

    async fn run(&self, _invocation: &Invocation, ctx: &Context) -> Result<AgentRun> {
        let started = Instant::now();
        let output = render(&self.template, ctx, &self.name)?;

        Ok(AgentRun {
            agent: self.name.clone(),
            output_key: self.output_key.clone(),
            output,
            iterations: 0,
            tool_calls: Vec::new(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Record of one agent run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    /// Name of the agent.
    pub agent: String,
    /// Context key the output was published under.
    pub output_key: String,
    /// The published text.
    #[serde(skip)]
    pub output: String,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    pub elapsed_ms: u64,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    #[serde(skip)]
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchProvider, SearchResult};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses and remembers every request.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ModelResponse>>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ModelResponse>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: ModelRequest) -> Result<ModelResponse> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(VidmetaError::model("script exhausted")))
        }
    }

    struct StaticSearch;

    #[async_trait]
    impl SearchProvider for StaticSearch {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
            Ok(vec![SearchResult {
                title: "Trend report".to_string(),
                snippet: format!("{} is trending", query),
                url: "https://example.com/trends".to_string(),
            }])
        }
    }

    fn search_call(id: &str, query: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_string(),
            name: "web_search".to_string(),
            arguments: serde_json::json!({ "query": query }).to_string(),
        }
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "web_search".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "Found results".to_string(),
        };
        assert_eq!(format!("{}", record), r#"web_search({"query": "test"})"#);
    }

    #[tokio::test]
    async fn test_renders_instruction_and_sends_topic() {
        let model = ScriptedModel::new(vec![Ok(ModelResponse::text("  Best Title  \n"))]);
        let agent = LlmAgent::new(
            "BestTitleSelectorAgent",
            model.clone(),
            "Options: {generated_title}",
            "best_title",
        );
        let mut ctx = Context::new();
        ctx.insert("generated_title", "1. A\n2. B");

        let run = agent.run(&Invocation::new("rust async"), &ctx).await.unwrap();
        assert_eq!(run.output, "Best Title");
        assert_eq!(run.output_key, "best_title");
        assert_eq!(run.iterations, 1);

        let requests = model.requests.lock().unwrap();
        assert_eq!(
            requests[0].messages,
            vec![
                Message::System("Options: 1. A\n2. B".to_string()),
                Message::User("rust async".to_string()),
            ]
        );
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse {
                content: None,
                tool_calls: vec![search_call("call_1", "rust async")],
            }),
            Ok(ModelResponse::text("Summary with keywords")),
        ]);
        let tools = ToolContext::new(Arc::new(StaticSearch), 5);
        let agent = LlmAgent::new("TitleResearchAgent", model.clone(), "Research.", "title_research")
            .with_tools(tools);
        assert!(agent.has_tools());

        let run = agent.run(&Invocation::new("rust async"), &Context::new()).await.unwrap();
        assert_eq!(run.output, "Summary with keywords");
        assert_eq!(run.iterations, 2);
        assert_eq!(run.tool_calls.len(), 1);
        assert!(run.tool_calls[0].result.contains("rust async is trending"));

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].tools.len(), 1);
        match requests[1].messages.last().unwrap() {
            Message::Tool { call_id, content } => {
                assert_eq!(call_id, "call_1");
                assert!(content.contains("Trend report"));
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_tool_call_reported_to_model() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse {
                content: None,
                tool_calls: vec![ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "google_search".to_string(),
                    arguments: "{}".to_string(),
                }],
            }),
            Ok(ModelResponse::text("done anyway")),
        ]);
        let agent = LlmAgent::new("A", model, "x", "out")
            .with_tools(ToolContext::new(Arc::new(StaticSearch), 5));

        let run = agent.run(&Invocation::new("t"), &Context::new()).await.unwrap();
        assert!(run.tool_calls[0].result.starts_with("Failed to parse tool call"));
        assert_eq!(run.output, "done anyway");
    }

    #[tokio::test]
    async fn test_max_iterations_enforced() {
        let replies = (0..3)
            .map(|i| {
                Ok(ModelResponse {
                    content: None,
                    tool_calls: vec![search_call(&format!("call_{}", i), "again")],
                })
            })
            .collect();
        let agent = LlmAgent::new("Looper", ScriptedModel::new(replies), "x", "out")
            .with_tools(ToolContext::new(Arc::new(StaticSearch), 5))
            .with_max_iterations(2);

        let err = agent.run(&Invocation::new("t"), &Context::new()).await.unwrap_err();
        assert!(err.to_string().contains("exceeded maximum iterations (2)"));
    }

    #[tokio::test]
    async fn test_transient_model_error_retried() {
        let model = ScriptedModel::new(vec![
            Err(VidmetaError::Model {
                status: Some(503),
                message: "unavailable".to_string(),
            }),
            Ok(ModelResponse::text("recovered")),
        ]);
        let retry = RetryPolicy::default()
            .with_initial_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO);
        let agent = LlmAgent::new("A", model.clone(), "x", "out").with_retry(retry);

        let (invocation, mut events) = Invocation::with_events("t");
        let run = agent.run(&invocation, &Context::new()).await.unwrap();

        assert_eq!(run.output, "recovered");
        assert_eq!(model.requests.lock().unwrap().len(), 2);
        assert!(matches!(
            events.try_recv(),
            Ok(PipelineEvent::Retrying { attempt: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_context_key_fails_before_model_call() {
        let model = ScriptedModel::new(vec![Ok(ModelResponse::text("unused"))]);
        let agent = LlmAgent::new("TitleGeneratorAgent", model.clone(), "Context: {title_research}", "generated_title");

        let err = agent.run(&Invocation::new("t"), &Context::new()).await.unwrap_err();
        assert!(matches!(err, VidmetaError::MissingContextKey { .. }));
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let agent = LlmAgent::new("A", ScriptedModel::new(vec![Ok(ModelResponse::text("   "))]), "x", "out");
        assert!(agent.run(&Invocation::new("t"), &Context::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_template_agent_joins_values() {
        let agent = TemplateAgent::new("AggregatorAgent", "{best_title}\n{generated_description}", "executive_summary");
        let mut ctx = Context::new();
        ctx.insert("best_title", "Title");
        ctx.insert("generated_description", "Body");

        let run = agent.run(&Invocation::new("t"), &ctx).await.unwrap();
        assert_eq!(run.output, "Title\nBody");
        assert_eq!(run.iterations, 0);
    }
}
