use crate::config::types::{
    CrawlerConfig, HttpConfig, LimitsConfig, MirrorConfig, PolicyConfig, RendererConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &MirrorConfig) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_limits_config(&config.limits)?;
    validate_http_config(&config.http)?;
    validate_renderer_config(&config.renderer)?;
    validate_policy_config(&config.policy)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.max_file_size == 0 {
        return Err(ConfigError::Validation(
            "max_file_size must be greater than zero".to_string(),
        ));
    }

    if config.max_total_size == 0 {
        return Err(ConfigError::Validation(
            "max_total_size must be greater than zero".to_string(),
        ));
    }

    if config.max_file_size > config.max_total_size {
        return Err(ConfigError::Validation(format!(
            "max_file_size ({}) cannot exceed max_total_size ({})",
            config.max_file_size, config.max_total_size
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 0 and 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_secs == 0 || config.element_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "renderer timeouts must be >= 1 second".to_string(),
        ));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    Ok(())
}

fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    for pattern in config
        .blocked_domains
        .iter()
        .chain(config.allowed_domains.iter())
    {
        validate_domain_pattern(pattern)?;
    }
    Ok(())
}

/// Validates a substring domain pattern such as `facebook.com` or `cdn.`
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if pattern.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain pattern '{}' cannot contain whitespace or '/'",
            pattern
        )));
    }

    Ok(())
}
