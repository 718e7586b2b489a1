//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("vidmeta setup");
    println!();
    println!("Let's make sure everything is configured correctly.\n");

    // Step 1: Check API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    let key_var = &settings.model.api_key_env;
    if settings.model.api_key().is_none() {
        Output::warning(&format!("{} environment variable is not set.", key_var));
        println!();
        println!("  vidmeta calls {} for every agent.", settings.model.name);
        println!("  Get a Gemini key from: {}", style("https://aistudio.google.com/apikey").underlined());
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style(format!("export {}='...'", key_var)).green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'vidmeta init' again.");
            return Ok(());
        }
    } else {
        Output::success(&format!("{} is configured!", key_var));
    }

    println!();

    // Step 2: Create config file
    println!("{}", style("Step 2: Configuration file").bold().cyan());
    println!();

    let mut settings = settings.clone();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        if settings.prompts.custom_dir.is_none() {
            settings.prompts.custom_dir = Some(default_prompts_dir(config_path));
        }
        settings.save_to(config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("vidmeta config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Step 3: Editable instructions
    println!("{}", style("Step 3: Agent instructions").bold().cyan());
    println!();

    match settings.prompts_dir() {
        Some(dir) if dir.join(crate::config::AGENTS_FILE).exists() => {
            Output::info(&format!("Instructions exist in {}", dir.display()));
        }
        Some(dir) => {
            if prompt_continue("Export the default instructions for editing?")? {
                let path = Prompts::default().export_to(&dir)?;
                Output::success(&format!("Wrote {}", path.display()));
            } else {
                Output::info("Skipped. The built-in instructions will be used.");
            }
        }
        None => Output::info("No prompts.custom_dir configured. The built-in instructions will be used."),
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check credentials and wiring", style("vidmeta doctor").cyan());
    println!("  {} Generate a title and description", style("vidmeta generate \"<topic>\"").cyan());
    println!();
    println!("For more help: {}", style("vidmeta --help").cyan());

    Ok(())
}

/// The prompts directory that sits next to the config file.
fn default_prompts_dir(config_path: &Path) -> String {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("prompts")
        .display()
        .to_string()
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
