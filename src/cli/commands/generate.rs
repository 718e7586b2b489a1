//! Generate command implementation.

use crate::cli::output::truncate;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::context::Context;
use crate::model::OpenAIModel;
use crate::pipeline::{final_output, verify_aggregate, youtube_runner, PipelineConfig};
use crate::workflow::{EventSink, RunReport};
use anyhow::{Context as _, Result};
use std::sync::Arc;

/// Options for the generate command.
#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub output: Option<String>,
    pub json: bool,
    pub local_aggregation: bool,
    pub strict: bool,
    pub vars: Vec<(String, String)>,
}

/// Run the generate command.
pub async fn run_generate(topic: &str, options: GenerateOptions, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidmeta doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if options.local_aggregation {
        settings.pipeline.local_aggregation = true;
    }

    let mut model = OpenAIModel::from_settings(&settings.model)?;
    if let Some(name) = &options.model {
        model = model.with_model(name);
    }
    let model = Arc::new(model);
    let config = PipelineConfig::load(&settings, model)?;
    let runner = youtube_runner(&config, &settings);

    let initial: Context = options.vars.iter().cloned().collect();

    let spinner = Output::spinner("Starting agents...");
    let (events, mut rx) = EventSink::channel();
    let progress = spinner.clone();
    let watcher = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            progress.set_message(Output::describe_event(&event));
        }
    });

    let result = runner.run_with_events(topic, initial, events).await;
    // The sink was dropped with the run, so the watcher ends on its own.
    let _ = watcher.await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Pipeline failed: {}", e));
            return Err(e.into());
        }
    };

    let output = match verify_aggregate(&report.context) {
        Ok(output) => output,
        Err(e) if options.strict => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
        Err(e) => {
            Output::warning(&format!("{}", e));
            final_output(&report.context)?
        }
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", output);
    }

    if let Some(path) = &options.output {
        let path = Settings::expand_path(path);
        std::fs::write(&path, format!("{}\n", output))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Output::success(&format!("Saved to {}", path.display()));
    }

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    Output::header(&format!("Agents ({})", report.agents.len()));
    for run in &report.agents {
        Output::agent_run(
            &run.agent,
            &run.output_key,
            run.iterations,
            run.tool_calls.len(),
            run.elapsed_ms,
        );
        for call in &run.tool_calls {
            Output::kv("    tool", &format!("{} {}", call.name, truncate(&call.arguments, 60)));
        }
    }

    let elapsed = report.finished_at - report.started_at;
    Output::info(&format!(
        "Completed in {:.1}s with {} tool call(s)",
        elapsed.num_milliseconds() as f64 / 1000.0,
        report.tool_call_count()
    ));
}
