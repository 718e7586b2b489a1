//! Agent system for the title and description pipeline.
//!
//! An agent reads the shared [`Context`], produces one text result, and
//! publishes it under its output key. [`LlmAgent`] asks a model (optionally
//! with the web search tool); [`TemplateAgent`] only renders a template.

mod runner;
mod tools;

pub use runner::{AgentRun, LlmAgent, TemplateAgent, ToolCallRecord};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};

use crate::context::Context;
use crate::error::Result;
use crate::workflow::{EventSink, PipelineEvent};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// A unit of work that publishes one context value.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique name within a pipeline.
    fn name(&self) -> &str;

    /// Instruction template; its placeholders are the agent's inputs.
    fn instruction(&self) -> &str;

    /// Context key the result is published under.
    fn output_key(&self) -> &str;

    /// Produce the result for the given context snapshot.
    async fn run(&self, invocation: &Invocation, ctx: &Context) -> Result<AgentRun>;
}

/// Per-run data shared by every agent in a pipeline.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub id: Uuid,
    /// The user's topic, sent as the user message to every model agent.
    pub topic: String,
    pub events: EventSink,
    pub agent_timeout: Option<Duration>,
}

impl Invocation {
    /// Create an invocation that discards events.
    pub fn new(topic: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            events: EventSink::default(),
            agent_timeout: None,
        }
    }

    /// Create an invocation and a receiver for its progress events.
    pub fn with_events(topic: &str) -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (events, rx) = EventSink::channel();
        let invocation = Self {
            events,
            ..Self::new(topic)
        };
        (invocation, rx)
    }

    /// Limit how long any single agent may run.
    pub fn with_agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent_timeout = timeout;
        self
    }
}
