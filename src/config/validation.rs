use super::{AppConfig, ConfigError};

const ALLOWED_LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL", "DISABLED"];

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_upstream(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_upstream(config: &AppConfig) -> Result<(), ConfigError> {
    let upstream = &config.upstream;
    if upstream.api_key.trim().is_empty() {
        return Err(validation_err("upstream.api_key must not be empty"));
    }
    if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://") {
        return Err(validation_err(
            "upstream.base_url must start with http:// or https://",
        ));
    }
    if upstream.model.trim().is_empty() {
        return Err(validation_err("upstream.model must not be empty"));
    }
    if let Some(report_model) = &upstream.report_model {
        if report_model.trim().is_empty() {
            return Err(validation_err(
                "upstream.report_model must not be empty when set",
            ));
        }
    }
    if upstream.timeout == 0 {
        return Err(validation_err("upstream.timeout must be greater than 0"));
    }
    if upstream.connect_timeout == 0 {
        return Err(validation_err(
            "upstream.connect_timeout must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let level = config.features.log_level.to_uppercase();
    if !ALLOWED_LOG_LEVELS.contains(&level.as_str()) {
        return Err(validation_err(format!(
            "features.log_level must be one of {ALLOWED_LOG_LEVELS:?}, got '{level}'"
        )));
    }
    Ok(())
}
