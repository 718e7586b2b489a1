//! Check command - validate the pipeline wiring without calling a model.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::model::UnavailableModel;
use crate::pipeline::{youtube_pipeline, PipelineConfig};
use crate::workflow::validate;
use anyhow::Result;
use std::sync::Arc;

/// Run the check command.
pub fn run_check(settings: &Settings) -> Result<()> {
    preflight::check(Operation::Check, settings)?;

    let model = Arc::new(UnavailableModel::new(
        &settings.model.name,
        "the check command never calls the model",
    ));
    let config = PipelineConfig::load(settings, model)?;
    let root = youtube_pipeline(&config);

    Output::header("Pipeline");
    eprint!("{}", root.outline());

    match validate(&root, []) {
        Ok(()) => {
            Output::success("Wiring is valid.");
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}
