//! Configuration module for vidmeta.
//!
//! Handles loading and managing application settings and agent instructions.

mod prompts;
mod settings;

pub use prompts::{Prompts, AGENTS_FILE};
pub use settings::{
    ModelSettings, PipelineSettings, PromptSettings, RetrySettings, SearchSettings, Settings,
};
