//! CLI module for vidmeta.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// vidmeta - YouTube titles and descriptions from a topic
///
/// Runs a pipeline of LLM agents that research keywords, write candidate
/// titles, pick the best one, research and write a description, and merge
/// them into one output.
#[derive(Parser, Debug)]
#[command(name = "vidmeta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDMETA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration and editable agent instructions
    Init,

    /// Check API keys, configuration, and pipeline wiring
    Doctor,

    /// Generate a title and description for a video topic
    Generate {
        /// What the video is about
        topic: String,

        /// Model to use for every agent (overrides config)
        #[arg(short, long)]
        model: Option<String>,

        /// Write the final title and description to a file
        #[arg(short, long)]
        output: Option<String>,

        /// Print the full run report as JSON instead of plain text
        #[arg(long)]
        json: bool,

        /// Join title and description locally instead of asking the model
        #[arg(long)]
        local_aggregation: bool,

        /// Fail if the aggregated output is not exactly title + description
        #[arg(long)]
        strict: bool,

        /// Seed a context value usable as {key} in instructions (key=value)
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,
    },

    /// Validate the pipeline wiring and print its structure
    Check,

    /// Inspect or export agent instructions
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// Show the instruction of one agent, or all of them
    Show {
        /// Agent instruction name (e.g. "best_title")
        name: Option<String>,
    },

    /// Write the current instructions to a directory for editing
    Export {
        /// Target directory (defaults to prompts.custom_dir)
        dir: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "model.name")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

/// Parse a `key=value` pair.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
