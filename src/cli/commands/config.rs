//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: PathBuf) -> Result<()> {

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {} in {}", key, value, config_path.display()));
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {}", config_path.display()));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => match Settings::load_from(Some(&config_path)) {
                    Ok(_) => Output::success("Config saved."),
                    Err(e) => Output::warning(&format!("Config saved but is invalid: {}", e)),
                },
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {}", config_path.display()));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `raw`.
///
/// The value is parsed as a TOML literal when possible (numbers, booleans,
/// arrays) and treated as a plain string otherwise.
fn set_value(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings)?;

    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some((last, parents)) if !last.is_empty() && !parents.is_empty() => (*last, parents),
        _ => bail!("Expected a dotted key like 'model.name', got '{}'", key),
    };

    let mut table = root
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("Configuration is not a table"))?;
    for part in parents {
        table = match table.get_mut(*part).and_then(toml::Value::as_table_mut) {
            Some(next) => next,
            None => bail!("Unknown configuration section '{}'", part),
        };
    }

    let value = parse_value(raw);
    if last == "variables" || parents.last() == Some(&"variables") || table.contains_key(last) || is_optional(key) {
        table.insert(last.to_string(), value);
    } else {
        bail!("Unknown configuration key '{}'", key);
    }

    let updated: Settings = root.try_into()?;
    updated.validate()?;
    Ok(updated)
}

/// Keys whose default is unset, so they are absent from the serialized table.
fn is_optional(key: &str) -> bool {
    matches!(
        key,
        "model.temperature" | "pipeline.agent_timeout_secs" | "prompts.custom_dir"
    )
}

fn parse_value(raw: &str) -> toml::Value {
    let parsed: std::result::Result<toml::Table, _> = toml::from_str(&format!("v = {}", raw));
    parsed
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_string_value() {
        let updated = set_value(&Settings::default(), "model.name", "gemini-2.5-pro").unwrap();
        assert_eq!(updated.model.name, "gemini-2.5-pro");
    }

    #[test]
    fn test_set_typed_values() {
        let settings = Settings::default();
        let updated = set_value(&settings, "retry.attempts", "3").unwrap();
        assert_eq!(updated.retry.attempts, 3);

        let updated = set_value(&updated, "pipeline.local_aggregation", "true").unwrap();
        assert!(updated.pipeline.local_aggregation);

        let updated = set_value(&updated, "retry.http_status_codes", "[429, 503]").unwrap();
        assert_eq!(updated.retry.http_status_codes, vec![429, 503]);
    }

    #[test]
    fn test_set_optional_value() {
        let updated = set_value(&Settings::default(), "pipeline.agent_timeout_secs", "120").unwrap();
        assert_eq!(updated.pipeline.agent_timeout_secs, Some(120));

        let updated = set_value(&updated, "prompts.custom_dir", "~/vidmeta-prompts").unwrap();
        assert_eq!(updated.prompts.custom_dir.as_deref(), Some("~/vidmeta-prompts"));
    }

    #[test]
    fn test_set_custom_variable() {
        let updated = set_value(&Settings::default(), "prompts.variables.channel", "RustCasts").unwrap();
        assert_eq!(
            updated.prompts.variables.get("channel").map(String::as_str),
            Some("RustCasts")
        );
    }

    #[test]
    fn test_set_rejects_bad_keys_and_values() {
        let settings = Settings::default();
        assert!(set_value(&settings, "model", "x").is_err());
        assert!(set_value(&settings, "model.nmae", "x").is_err());
        assert!(set_value(&settings, "nothing.here", "x").is_err());
        assert!(set_value(&settings, "retry.attempts", "0").is_err());
        assert!(set_value(&settings, "retry.attempts", "many").is_err());
    }
}
