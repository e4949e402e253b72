use crate::config::types::{CacheConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::url::{normalize_url, seed_kind};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on the politeness delay; anything longer is almost certainly a unit mistake
const MAX_MINIMUM_DELAY_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_cache_config(&config.cache)?;
    validate_output_config(&config.output)?;
    seed_urls(config)?;
    Ok(())
}

/// Parses, checks and normalizes the configured seed URLs
///
/// Every seed must be an HTTP(S) URL whose path is one of the site's known
/// shapes: the home page, `/states/{id}/locations`, `/counties/{fips}` or
/// `/metros/{code}`.
pub fn seed_urls(config: &Config) -> ConfigResult<Vec<Url>> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    config
        .seeds
        .iter()
        .map(|seed| {
            let url = normalize_url(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;

            if seed_kind(&url).is_none() {
                return Err(ConfigError::UnsupportedSeed(seed.clone()));
            }

            Ok(url)
        })
        .collect()
}

fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.minimum_delay > MAX_MINIMUM_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "minimum_delay must be <= {}ms, got {}ms",
            MAX_MINIMUM_DELAY_MS, config.minimum_delay
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> ConfigResult<()> {
    if config.enabled && config.path.is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty when the cache is enabled".to_string(),
        ));
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
