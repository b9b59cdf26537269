use super::{types::Config, ConfigError};

/// Validate configuration
///
/// A missing cache clear secret is fatal: the clear endpoint would
/// otherwise have nothing to compare against.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cache.clear_secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.clear_secret must be set".to_string(),
        ));
    }

    if config.cache.persist_every == 0 {
        return Err(ConfigError::ValidationError(
            "cache.persist_every must be at least 1".to_string(),
        ));
    }

    if config.upstream.api_token.is_empty() {
        return Err(ConfigError::ValidationError(
            "upstream.api_token must be set".to_string(),
        ));
    }

    if config.upstream.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.upstream.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.timeout_secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}
