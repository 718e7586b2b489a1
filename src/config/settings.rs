//! Configuration settings for vidmeta.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub model: ModelSettings,
    pub retry: RetrySettings,
    pub search: SearchSettings,
    pub pipeline: PipelineSettings,
    pub prompts: PromptSettings,
}

/// Hosted model settings.
///
/// Any OpenAI-compatible chat-completions endpoint works. The defaults point
/// at Gemini's compatibility layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model identifier sent with every request.
    pub name: String,
    /// Base URL of the chat-completions API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature. Provider default when unset.
    pub temperature: Option<f32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 300,
            temperature: None,
        }
    }
}

impl ModelSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Retry policy for transient model failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts including the first one.
    pub attempts: u32,
    /// Multiplier applied to the delay after each failed attempt.
    pub exp_base: f64,
    /// Delay before the first retry, in seconds.
    pub initial_delay_secs: f64,
    /// Upper bound on any single delay, in seconds.
    pub max_delay_secs: f64,
    /// HTTP statuses worth retrying.
    pub http_status_codes: Vec<u16>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 5,
            exp_base: 7.0,
            initial_delay_secs: 1.0,
            max_delay_secs: 60.0,
            http_status_codes: vec![429, 500, 503, 504],
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search backend (duckduckgo).
    pub provider: String,
    /// Endpoint of the search API.
    pub endpoint: String,
    /// Default number of results returned to the model.
    pub max_results: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: "duckduckgo".to_string(),
            endpoint: "https://api.duckduckgo.com/".to_string(),
            max_results: 5,
            timeout_secs: 15,
        }
    }
}

/// Pipeline execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Application name recorded in run reports.
    pub app_name: String,
    /// Maximum model calls per agent before giving up on the tool loop.
    pub max_tool_iterations: usize,
    /// Join title and description without a model call.
    pub local_aggregation: bool,
    /// Optional wall-clock limit for each agent, in seconds.
    pub agent_timeout_secs: Option<u64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            app_name: "agents".to_string(),
            max_tool_iterations: 10,
            local_aggregation: false,
            agent_timeout_secs: None,
        }
    }
}

impl PipelineSettings {
    pub fn agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout_secs.map(Duration::from_secs)
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory holding an `agents.toml` that overrides instructions.
    pub custom_dir: Option<String>,
    /// Custom variables available in all instructions as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::VidmetaError;

        if self.retry.attempts == 0 {
            return Err(VidmetaError::Config("retry.attempts must be at least 1".to_string()));
        }
        if self.retry.exp_base < 1.0 {
            return Err(VidmetaError::Config("retry.exp_base must be >= 1".to_string()));
        }
        if self.retry.initial_delay_secs < 0.0 || self.retry.max_delay_secs < 0.0 {
            return Err(VidmetaError::Config("retry delays must not be negative".to_string()));
        }
        if self.pipeline.max_tool_iterations == 0 {
            return Err(VidmetaError::Config(
                "pipeline.max_tool_iterations must be at least 1".to_string(),
            ));
        }
        if self.model.name.trim().is_empty() {
            return Err(VidmetaError::Config("model.name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidmetaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidmeta")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded custom prompts directory, if configured.
    pub fn prompts_dir(&self) -> Option<PathBuf> {
        self.prompts.custom_dir.as_deref().map(Self::expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hosted_setup() {
        let settings = Settings::default();
        assert_eq!(settings.model.name, "gemini-2.5-flash");
        assert_eq!(settings.retry.attempts, 5);
        assert_eq!(settings.retry.exp_base, 7.0);
        assert_eq!(settings.retry.http_status_codes, vec![429, 500, 503, 504]);
        assert_eq!(settings.pipeline.app_name, "agents");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.model.name = "gpt-4o-mini".to_string();
        settings.pipeline.local_aggregation = true;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.model.name, "gpt-4o-mini");
        assert!(loaded.pipeline.local_aggregation);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\nattempts = 2\n").unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.retry.attempts, 2);
        assert_eq!(loaded.retry.exp_base, 7.0);
        assert_eq!(loaded.search.max_results, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = PathBuf::from("/nonexistent/vidmeta/config.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.model.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\nattempts = 0\n").unwrap();
        assert!(Settings::load_from(Some(&path)).is_err());
    }
}
