use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - A configured provider has a non-empty URL and API key
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Some(jackett) = &config.jackett {
        if jackett.url.trim().is_empty() {
            return Err(ConfigError::Missing("jackett.url".to_string()));
        }
        if jackett.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("jackett.api_key".to_string()));
        }
    }

    if let Some(alldebrid) = &config.alldebrid {
        if alldebrid.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("alldebrid.api_key".to_string()));
        }
        if alldebrid.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("alldebrid.base_url".to_string()));
        }
    }

    Ok(())
}
