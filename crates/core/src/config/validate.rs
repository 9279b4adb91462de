use super::loader::API_KEY_ENV;
use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Content API base URL is set
/// - Timeouts and page size are not 0
/// - Region language codes are three lowercase letters
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.content_api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "content_api.base_url cannot be empty".to_string(),
        ));
    }
    if config.content_api.timeout_secs == 0 || config.content_api.download_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "content_api timeouts cannot be 0".to_string(),
        ));
    }
    if config.catalog_fetch.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "catalog_fetch.page_size cannot be 0".to_string(),
        ));
    }

    for (region, codes) in &config.regions {
        if let Some(bad) = codes.iter().find(|c| !is_language_code(c)) {
            return Err(ConfigError::ValidationError(format!(
                "region '{}' has invalid language code '{}'",
                region, bad
            )));
        }
    }

    Ok(())
}

/// Fail unless a content API key is configured.
pub fn require_credentials(config: &Config) -> Result<(), ConfigError> {
    if config.content_api.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "no content API key configured: set {} or content_api.api_key",
            API_KEY_ENV
        )));
    }
    Ok(())
}

fn is_language_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.content_api.download_timeout_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_base_url_fails() {
        let mut config = Config::default();
        config.content_api.base_url = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_bad_region_code() {
        let mut config = Config::default();
        config
            .regions
            .insert("Finland".to_string(), vec!["fin".to_string(), "Swedish".to_string()]);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Swedish"));
    }

    #[test]
    fn test_require_credentials() {
        let mut config = Config::default();
        let err = require_credentials(&config).unwrap_err();
        assert!(err.to_string().contains("BIBLE_API_KEY"));

        config.content_api.api_key = "key".to_string();
        assert!(require_credentials(&config).is_ok());
    }
}
