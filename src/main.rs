//! vidmeta CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidmeta::cli::{commands, Cli, Commands};
use vidmeta::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidmeta={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;
    let config_file = config_path.clone().unwrap_or_else(Settings::default_config_path);

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings, &config_file)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_file)?;
        }

        Commands::Generate {
            topic,
            model,
            output,
            json,
            local_aggregation,
            strict,
            vars,
        } => {
            let options = commands::GenerateOptions {
                model: model.clone(),
                output: output.clone(),
                json: *json,
                local_aggregation: *local_aggregation,
                strict: *strict,
                vars: vars.clone(),
            };
            commands::run_generate(topic, options, settings).await?;
        }

        Commands::Check => {
            commands::run_check(&settings)?;
        }

        Commands::Prompts { action } => {
            commands::run_prompts(action, &settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_file)?;
        }
    }

    Ok(())
}
