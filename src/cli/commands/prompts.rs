//! Prompts command implementation.

use crate::cli::{Output, PromptsAction};
use crate::config::{Prompts, Settings};
use anyhow::{bail, Result};
use console::style;

/// Run the prompts command.
pub fn run_prompts(action: &PromptsAction, settings: &Settings) -> Result<()> {
    let prompts = Prompts::load(
        settings.prompts_dir().as_deref(),
        Some(&settings.prompts.variables),
    )?;

    match action {
        PromptsAction::Show { name: Some(name) } => match prompts.get(name) {
            Some(text) => println!("{}", prompts.instruction(text)),
            None => bail!(
                "Unknown instruction '{}'. Available: {}",
                name,
                Prompts::NAMES.join(", ")
            ),
        },

        PromptsAction::Show { name: None } => {
            for name in Prompts::NAMES {
                if let Some(text) = prompts.get(name) {
                    println!("{}", style(format!("[{}]", name)).bold().cyan());
                    println!("{}\n", prompts.instruction(text));
                }
            }
        }

        PromptsAction::Export { dir } => {
            let dir = match (dir, settings.prompts_dir()) {
                (Some(dir), _) => Settings::expand_path(dir),
                (None, Some(dir)) => dir,
                (None, None) => bail!(
                    "No directory given and prompts.custom_dir is not set. \
                     Pass a directory or run 'vidmeta config set prompts.custom_dir <dir>'."
                ),
            };
            let path = prompts.export_to(&dir)?;
            Output::success(&format!("Exported instructions to {}", path.display()));
            if settings.prompts_dir().as_deref() != Some(dir.as_path()) {
                Output::info(&format!(
                    "Set prompts.custom_dir to {} to use them.",
                    dir.display()
                ));
            }
        }
    }

    Ok(())
}
