//! vidmeta - YouTube titles and descriptions from a topic
//!
//! A CLI tool and library that runs a small pipeline of LLM agents to write
//! an SEO-friendly video title and a structured description.
//!
//! # Overview
//!
//! For a topic, vidmeta:
//! - researches keywords and trends with a web search tool
//! - generates five candidate titles and picks the best one
//! - researches facts for the description and writes it
//! - merges title and description into one final output
//!
//! The title and description chains run concurrently; the merge runs once
//! both have finished.
//!
//! # Architecture
//!
//! - `config` - Settings and agent instructions
//! - `context` - Key/value store agents publish into
//! - `template` - `{key}` placeholder parsing and rendering
//! - `model` - Chat model abstraction, OpenAI-compatible client, retries
//! - `search` - Web search providers
//! - `agent` - Model-backed and template agents, tool calling
//! - `workflow` - Sequential/parallel composition, wiring checks, runner
//! - `pipeline` - The concrete title/description pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidmeta::agent::ToolContext;
//! use vidmeta::config::{Prompts, Settings};
//! use vidmeta::context::Context;
//! use vidmeta::model::OpenAIModel;
//! use vidmeta::pipeline::{final_output, youtube_runner, PipelineConfig};
//! use vidmeta::search::create_provider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let model = Arc::new(OpenAIModel::from_settings(&settings.model)?);
//!     let tools = ToolContext::new(create_provider(&settings.search)?, settings.search.max_results);
//!     let config = PipelineConfig::new(model, tools, Prompts::default(), &settings);
//!
//!     let report = youtube_runner(&config, &settings)
//!         .run("how async works in Rust", Context::new())
//!         .await?;
//!     println!("{}", final_output(&report.context)?);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod openai;
pub mod pipeline;
pub mod search;
pub mod template;
pub mod workflow;

pub use error::{Result, VidmetaError};
