use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Legacy environment variable holding the content API key.
pub const API_KEY_ENV: &str = "BIBLE_API_KEY";

/// Load configuration: defaults, then the optional TOML file, then
/// `VERSEKIT_` environment overrides, then `BIBLE_API_KEY`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(Env::prefixed("VERSEKIT_").split("__"))
        .merge(
            Env::raw()
                .only(&[API_KEY_ENV])
                .map(|_| "content_api.api_key".into()),
        )
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
