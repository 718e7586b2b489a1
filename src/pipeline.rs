//! The YouTube title and description pipeline.
//!
//! ```text
//! ResearchSystem (sequential)
//!   ResearchTeam (parallel)
//!     TitlePipeline (sequential)
//!       TitleResearchAgent        -> title_research       (web search)
//!       TitleGeneratorAgent       -> generated_title
//!       BestTitleSelectorAgent    -> best_title
//!     DescriptionPipeline (sequential)
//!       DescriptionResearchAgent  -> description_research (web search)
//!       DescriptionGeneratorAgent -> generated_description
//!   AggregatorAgent               -> executive_summary
//! ```

use crate::agent::{LlmAgent, TemplateAgent, ToolContext};
use crate::config::{Prompts, Settings};
use crate::context::Context;
use crate::error::{Result, VidmetaError};
use crate::model::{LanguageModel, RetryPolicy};
use crate::search::create_provider;
use crate::workflow::{Node, Runner};
use serde::Serialize;
use std::sync::Arc;

pub const TITLE_RESEARCH: &str = "title_research";
pub const GENERATED_TITLE: &str = "generated_title";
pub const BEST_TITLE: &str = "best_title";
pub const DESCRIPTION_RESEARCH: &str = "description_research";
pub const GENERATED_DESCRIPTION: &str = "generated_description";
pub const FINAL_OUTPUT: &str = "executive_summary";

/// Template used when aggregation runs without a model.
pub const LOCAL_AGGREGATION_TEMPLATE: &str = "{best_title}\n{generated_description}";

/// Everything needed to assemble the pipeline.
#[derive(Clone)]
pub struct PipelineConfig {
    pub model: Arc<dyn LanguageModel>,
    pub tools: ToolContext,
    pub prompts: Prompts,
    pub retry: RetryPolicy,
    pub max_tool_iterations: usize,
    pub local_aggregation: bool,
}

impl PipelineConfig {
    /// Combine runtime components with the values from `settings`.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tools: ToolContext,
        prompts: Prompts,
        settings: &Settings,
    ) -> Self {
        Self {
            model,
            tools,
            prompts,
            retry: RetryPolicy::from(&settings.retry),
            max_tool_iterations: settings.pipeline.max_tool_iterations,
            local_aggregation: settings.pipeline.local_aggregation,
        }
    }

    /// Load instructions and the search provider from `settings` around `model`.
    pub fn load(settings: &Settings, model: Arc<dyn LanguageModel>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts_dir().as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let tools = ToolContext::new(
            create_provider(&settings.search)?,
            settings.search.max_results,
        );
        Ok(Self::new(model, tools, prompts, settings))
    }

    fn llm_agent(&self, name: &str, instruction: &str, output_key: &str) -> LlmAgent {
        LlmAgent::new(
            name,
            self.model.clone(),
            &self.prompts.instruction(instruction),
            output_key,
        )
        .with_retry(self.retry.clone())
        .with_max_iterations(self.max_tool_iterations)
    }
}

/// Build the pipeline tree.
pub fn youtube_pipeline(config: &PipelineConfig) -> Node {
    let prompts = &config.prompts;

    let title_pipeline = Node::sequential(
        "TitlePipeline",
        vec![
            Node::agent(
                config
                    .llm_agent("TitleResearchAgent", &prompts.title_research, TITLE_RESEARCH)
                    .with_tools(config.tools.clone()),
            ),
            Node::agent(config.llm_agent(
                "TitleGeneratorAgent",
                &prompts.title_generator,
                GENERATED_TITLE,
            )),
            Node::agent(config.llm_agent(
                "BestTitleSelectorAgent",
                &prompts.best_title,
                BEST_TITLE,
            )),
        ],
    );

    let description_pipeline = Node::sequential(
        "DescriptionPipeline",
        vec![
            Node::agent(
                config
                    .llm_agent(
                        "DescriptionResearchAgent",
                        &prompts.description_research,
                        DESCRIPTION_RESEARCH,
                    )
                    .with_tools(config.tools.clone()),
            ),
            Node::agent(config.llm_agent(
                "DescriptionGeneratorAgent",
                &prompts.description_generator,
                GENERATED_DESCRIPTION,
            )),
        ],
    );

    let aggregator = if config.local_aggregation {
        Node::agent(TemplateAgent::new(
            "AggregatorAgent",
            LOCAL_AGGREGATION_TEMPLATE,
            FINAL_OUTPUT,
        ))
    } else {
        Node::agent(config.llm_agent("AggregatorAgent", &prompts.aggregator, FINAL_OUTPUT))
    };

    Node::sequential(
        "ResearchSystem",
        vec![
            Node::parallel("ResearchTeam", vec![title_pipeline, description_pipeline]),
            aggregator,
        ],
    )
}

/// Build a runner for the pipeline using the app name and timeout from `settings`.
pub fn youtube_runner(config: &PipelineConfig, settings: &Settings) -> Runner {
    Runner::new(&settings.pipeline.app_name, youtube_pipeline(config))
        .with_agent_timeout(settings.pipeline.agent_timeout())
}

/// Final title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalOutput {
    pub title: String,
    pub description: String,
}

impl FinalOutput {
    /// Split text into the first non-empty line and everything after it.
    pub fn parse(text: &str) -> Result<Self> {
        let text = normalize(text);
        let text = text.trim_start();
        let (title, description) = text.split_once('\n').unwrap_or((text, ""));

        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(VidmetaError::InvalidInput("output has no title line".to_string()));
        }

        Ok(Self {
            title,
            description: description.trim().to_string(),
        })
    }
}

impl std::fmt::Display for FinalOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.title, self.description)
    }
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Check that the aggregated output is exactly the best title followed by the
/// generated description.
///
/// Surrounding whitespace and line-ending style are ignored; any other
/// difference is reported.
pub fn verify_aggregate(ctx: &Context) -> Result<FinalOutput> {
    let get = |key: &str| {
        ctx.get(key).ok_or_else(|| {
            VidmetaError::InvalidInput(format!("context has no '{}' value", key))
        })
    };

    let aggregate = normalize(get(FINAL_OUTPUT)?);
    let title = normalize(get(BEST_TITLE)?);
    let description = normalize(get(GENERATED_DESCRIPTION)?);

    let expected = format!("{}\n{}", title.trim(), description.trim());
    if aggregate.trim() != expected {
        let found = FinalOutput::parse(&aggregate)
            .map(|o| o.title)
            .unwrap_or_default();
        return Err(VidmetaError::Agent(format!(
            "aggregated output does not match '{}' followed by '{}' (first line was '{}')",
            BEST_TITLE, GENERATED_DESCRIPTION, found
        )));
    }

    FinalOutput::parse(&aggregate)
}

/// The final output, preferring verified text and falling back to a raw split.
pub fn final_output(ctx: &Context) -> Result<FinalOutput> {
    match verify_aggregate(ctx) {
        Ok(output) => Ok(output),
        Err(_) => {
            let text = ctx.get(FINAL_OUTPUT).ok_or_else(|| {
                VidmetaError::InvalidInput(format!("context has no '{}' value", FINAL_OUTPUT))
            })?;
            FinalOutput::parse(text)
        }
    }
}
