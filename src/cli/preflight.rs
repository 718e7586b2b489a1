//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidmetaError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Generation calls the model and the search API.
    Generate,
    /// Wiring checks run offline.
    Check,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Generate => {
            check_api_key(settings)?;
            settings.validate()?;
        }
        Operation::Check => {
            settings.validate()?;
        }
    }
    Ok(())
}

/// Check that the model API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.model.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(VidmetaError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(VidmetaError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_has_no_credential_requirements() {
        let mut settings = Settings::default();
        settings.model.api_key_env = "VIDMETA_PREFLIGHT_KEY_NEVER_SET".to_string();
        assert!(check(Operation::Check, &settings).is_ok());
        assert!(check(Operation::Generate, &settings).is_err());
    }
}
