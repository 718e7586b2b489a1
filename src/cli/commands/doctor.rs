//! Doctor command - verify credentials, configuration, and pipeline wiring.

use crate::cli::Output;
use crate::config::{Prompts, Settings, AGENTS_FILE};
use crate::model::UnavailableModel;
use crate::pipeline::{youtube_pipeline, PipelineConfig};
use crate::search::create_provider;
use crate::workflow::validate;
use console::style;
use std::path::Path;
use std::sync::Arc;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("vidmeta doctor");
    println!();
    println!("Checking credentials, configuration, and pipeline wiring...\n");

    let mut checks = Vec::new();

    println!("{}", style("Model").bold());
    let model_checks = vec![
        check_api_key(&settings.model.api_key_env, std::env::var(&settings.model.api_key_env).ok()),
        CheckResult::ok("Model", &format!("{} at {}", settings.model.name, settings.model.api_base)),
    ];
    for check in &model_checks {
        check.print();
    }
    checks.extend(model_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_settings(settings), check_prompts(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    println!("{}", style("Pipeline").bold());
    let pipeline_checks = vec![check_search(settings), check_wiring(settings)];
    for check in &pipeline_checks {
        check.print();
    }
    checks.extend(pipeline_checks);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before generating.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! vidmeta is ready to use.");
    }

    Ok(())
}

/// Check the model API key held in `var`.
fn check_api_key(var: &str, value: Option<String>) -> CheckResult {
    let hint = format!("Set with: export {}='...'", var);
    match value {
        Some(key) if key.is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) if key.chars().count() > 12 => {
            CheckResult::ok(var, &format!("configured ({})", mask(&key)))
        }
        Some(_) => CheckResult::warning(var, "set but looks too short", "Double-check the key value"),
        None => CheckResult::error(var, "not set", &hint),
    }
}

/// Show only the ends of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vidmeta init (or vidmeta config edit)",
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Retry policy",
            &format!(
                "{} attempt(s), base {}, max delay {}s",
                settings.retry.attempts, settings.retry.exp_base, settings.retry.max_delay_secs
            ),
        ),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix with: vidmeta config edit"),
    }
}

/// Check that instruction overrides, if any, parse.
fn check_prompts(settings: &Settings) -> CheckResult {
    let Some(dir) = settings.prompts_dir() else {
        return CheckResult::ok("Instructions", "built-in defaults");
    };

    let path = dir.join(AGENTS_FILE);
    if !path.exists() {
        return CheckResult::warning(
            "Instructions",
            &format!("{} not found, using defaults", path.display()),
            "Create with: vidmeta prompts export",
        );
    }

    match Prompts::load(Some(&dir), None) {
        Ok(_) => CheckResult::ok("Instructions", &format!("{}", path.display())),
        Err(e) => CheckResult::error("Instructions", &e.to_string(), "Fix the TOML syntax in the file"),
    }
}

fn check_search(settings: &Settings) -> CheckResult {
    match create_provider(&settings.search) {
        Ok(provider) => CheckResult::ok(
            "Web search",
            &format!("{} ({})", provider.name(), settings.search.endpoint),
        ),
        Err(e) => CheckResult::error(
            "Web search",
            &e.to_string(),
            "Set search.provider to \"duckduckgo\"",
        ),
    }
}

/// Build the pipeline offline and validate its wiring.
fn check_wiring(settings: &Settings) -> CheckResult {
    let model = Arc::new(UnavailableModel::new(&settings.model.name, "doctor never calls the model"));
    let root = match PipelineConfig::load(settings, model) {
        Ok(config) => youtube_pipeline(&config),
        Err(e) => return CheckResult::error("Wiring", &e.to_string(), "Run: vidmeta check"),
    };

    match validate(&root, []) {
        Ok(()) => CheckResult::ok("Wiring", "every agent input is produced upstream"),
        Err(e) => CheckResult::error("Wiring", &e.to_string(), "Fix the instruction placeholders"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_api_key() {
        assert_eq!(check_api_key("KEY", None).status, CheckStatus::Error);
        assert_eq!(check_api_key("KEY", Some(String::new())).status, CheckStatus::Error);
        assert_eq!(check_api_key("KEY", Some("short".into())).status, CheckStatus::Warning);

        let result = check_api_key("KEY", Some("AIzaSyExampleKey1234".into()));
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "configured (AIza...1234)");
    }

    #[test]
    fn test_check_config_file_uses_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");

        let missing = check_config_file(&path);
        assert_eq!(missing.status, CheckStatus::Warning);
        assert_eq!(missing.message, "using defaults");

        std::fs::write(&path, "[model]\nname = \"gemini-2.5-pro\"\n").unwrap();
        let found = check_config_file(&path);
        assert_eq!(found.status, CheckStatus::Ok);
        assert_eq!(found.message, path.display().to_string());
    }

    #[test]
    fn test_default_wiring_is_valid() {
        let result = check_wiring(&Settings::default());
        assert_eq!(result.status, CheckStatus::Ok);
    }

    #[test]
    fn test_broken_override_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(AGENTS_FILE), "best_title = [not a string").unwrap();

        let mut settings = Settings::default();
        settings.prompts.custom_dir = Some(dir.path().display().to_string());

        assert_eq!(check_prompts(&settings).status, CheckStatus::Error);
        assert_eq!(check_wiring(&settings).status, CheckStatus::Error);
    }
}
