//! Sequential and parallel composition of agents.
//!
//! A pipeline is a tree of [`Node`]s. Leaves are agents; `Sequential` nodes
//! run their children in order, each child seeing every earlier write;
//! `Parallel` nodes run their children concurrently from the same snapshot
//! and merge the writes in declaration order once all have finished.

mod events;
mod validate;

pub use events::{EventSink, PipelineEvent};
pub use validate::validate;

use crate::agent::{Agent, AgentRun, Invocation};
use crate::context::Context;
use crate::error::{Result, VidmetaError};
use chrono::{DateTime, Utc};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// A node in a pipeline tree.
#[derive(Clone)]
pub enum Node {
    Agent(Arc<dyn Agent>),
    Sequential { name: String, children: Vec<Node> },
    Parallel { name: String, children: Vec<Node> },
}

impl Node {
    pub fn agent(agent: impl Agent + 'static) -> Self {
        Node::Agent(Arc::new(agent))
    }

    pub fn sequential(name: &str, children: Vec<Node>) -> Self {
        Node::Sequential {
            name: name.to_string(),
            children,
        }
    }

    pub fn parallel(name: &str, children: Vec<Node>) -> Self {
        Node::Parallel {
            name: name.to_string(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Agent(agent) => agent.name(),
            Node::Sequential { name, .. } | Node::Parallel { name, .. } => name,
        }
    }

    /// Every key published somewhere in this subtree.
    pub fn output_keys(&self) -> Vec<String> {
        match self {
            Node::Agent(agent) => vec![agent.output_key().to_string()],
            Node::Sequential { children, .. } | Node::Parallel { children, .. } => {
                let mut keys = Vec::new();
                for key in children.iter().flat_map(Node::output_keys) {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                keys
            }
        }
    }

    /// Run this subtree against `ctx`, returning its writes without applying them.
    pub fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<NodeOutcome>> {
        async move {
            match self {
                Node::Agent(agent) => run_agent(agent.as_ref(), invocation, ctx).await,
                Node::Sequential { children, .. } => {
                    let mut local = ctx.clone();
                    let mut outcome = NodeOutcome::default();
                    for child in children {
                        let child_outcome = child.run(invocation, &local).await?;
                        local.apply(child_outcome.writes.iter().cloned());
                        outcome.extend(child_outcome);
                    }
                    Ok(outcome)
                }
                Node::Parallel { children, .. } => {
                    // Results come back in declaration order, whatever the finish order.
                    let outcomes = try_join_all(children.iter().map(|c| c.run(invocation, ctx))).await?;
                    let mut outcome = NodeOutcome::default();
                    for child_outcome in outcomes {
                        outcome.extend(child_outcome);
                    }
                    Ok(outcome)
                }
            }
        }
        .boxed()
    }

    /// Render the tree as an indented outline.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(0, &mut out);
        out
    }

    fn write_outline(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self {
            Node::Agent(agent) => {
                out.push_str(&format!("{}{} -> {}\n", indent, agent.name(), agent.output_key()));
            }
            Node::Sequential { name, children } => {
                out.push_str(&format!("{}{} (sequential)\n", indent, name));
                children.iter().for_each(|c| c.write_outline(depth + 1, out));
            }
            Node::Parallel { name, children } => {
                out.push_str(&format!("{}{} (parallel)\n", indent, name));
                children.iter().for_each(|c| c.write_outline(depth + 1, out));
            }
        }
    }
}

async fn run_agent(agent: &dyn Agent, invocation: &Invocation, ctx: &Context) -> Result<NodeOutcome> {
    info!("Starting agent {}", agent.name());
    invocation.events.emit(PipelineEvent::AgentStarted {
        agent: agent.name().to_string(),
    });

    let run = match invocation.agent_timeout {
        Some(limit) => tokio::time::timeout(limit, agent.run(invocation, ctx))
            .await
            .map_err(|_| VidmetaError::Timeout(agent.name().to_string(), limit.as_secs()))??,
        None => agent.run(invocation, ctx).await?,
    };

    info!(
        "Agent {} published '{}' ({} chars, {} ms)",
        run.agent,
        run.output_key,
        run.output.chars().count(),
        run.elapsed_ms
    );
    invocation.events.emit(PipelineEvent::AgentFinished {
        agent: run.agent.clone(),
        output_key: run.output_key.clone(),
        elapsed_ms: run.elapsed_ms,
    });

    Ok(NodeOutcome {
        writes: vec![(run.output_key.clone(), run.output.clone())],
        runs: vec![run],
    })
}

/// Writes and run records produced by a subtree, in a deterministic order.
#[derive(Debug, Clone, Default)]
pub struct NodeOutcome {
    pub writes: Vec<(String, String)>,
    pub runs: Vec<AgentRun>,
}

impl NodeOutcome {
    fn extend(&mut self, other: NodeOutcome) {
        self.writes.extend(other.writes);
        self.runs.extend(other.runs);
    }
}

/// Runs a pipeline tree for one topic.
pub struct Runner {
    app_name: String,
    root: Node,
    agent_timeout: Option<Duration>,
}

impl Runner {
    pub fn new(app_name: &str, root: Node) -> Self {
        Self {
            app_name: app_name.to_string(),
            root,
            agent_timeout: None,
        }
    }

    pub fn with_agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Run the pipeline, discarding progress events.
    pub async fn run(&self, topic: &str, initial: Context) -> Result<RunReport> {
        self.run_with_events(topic, initial, EventSink::default()).await
    }

    /// Validate the wiring, then run the pipeline with `initial` seeded into the context.
    #[instrument(skip(self, initial, events), fields(app = %self.app_name))]
    pub async fn run_with_events(&self, topic: &str, initial: Context, events: EventSink) -> Result<RunReport> {
        if topic.trim().is_empty() {
            return Err(VidmetaError::InvalidInput("topic must not be empty".to_string()));
        }
        validate(&self.root, initial.keys())?;

        let invocation = Invocation {
            id: Uuid::new_v4(),
            topic: topic.trim().to_string(),
            events,
            agent_timeout: self.agent_timeout,
        };
        let started_at = Utc::now();
        info!("Running {} for topic: {}", self.root.name(), invocation.topic);

        let outcome = self.root.run(&invocation, &initial).await?;

        let mut context = initial;
        context.apply(outcome.writes);

        Ok(RunReport {
            invocation_id: invocation.id,
            app_name: self.app_name.clone(),
            topic: invocation.topic,
            started_at,
            finished_at: Utc::now(),
            context,
            agents: outcome.runs,
        })
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub invocation_id: Uuid,
    pub app_name: String,
    pub topic: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub context: Context,
    pub agents: Vec<AgentRun>,
}

impl RunReport {
    /// Value published under `key`.
    pub fn output(&self, key: &str) -> Option<&str> {
        self.context.get(key)
    }

    /// Total number of tool calls across all agents.
    pub fn tool_call_count(&self) -> usize {
        self.agents.iter().map(|a| a.tool_calls.len()).sum()
    }
}
