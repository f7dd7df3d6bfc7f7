//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use covenant_verifier::TestFramework;

use crate::{ConfigError, CovenantConfig};

/// Prefix of environment overrides used by the Covenant tools.
pub const DEFAULT_ENV_PREFIX: &str = "COVENANT";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use covenant_config::ConfigLoader;
///
/// # fn main() -> Result<(), covenant_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("covenant.toml")?
///     .with_env_prefix("COVENANT")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: CovenantConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CovenantConfig::default(),
            env_prefix: None,
        }
    }

    /// Start from the strict preset instead of plain defaults.
    #[must_use]
    pub fn with_strict(mut self) -> Self {
        self.config = CovenantConfig::strict();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.config = Self::parse(&content, &format)?;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format
    /// (`"toml"` or `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use covenant_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [generator]
    ///     seed = 7
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.generator.seed, Some(7));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, for
    /// example `COVENANT__GENERATOR__SEED=42`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the working directory, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply overrides from `vars` using the configured prefix.
    ///
    /// [`load`](Self::load) calls this with the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParseError` for a value of the wrong type.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if let Some(prefix) = self.env_prefix.clone() {
            let scoped = format!("{prefix}__");
            for (key, value) in vars {
                let key = key.as_ref();
                if key.starts_with(&scoped) {
                    self.apply_env_var(key, value.as_ref(), &prefix)?;
                }
            }
        }
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(self) -> Result<CovenantConfig, ConfigError> {
        let mut loader = self.with_vars(env::vars())?;
        loader.env_prefix = None;
        loader.config.validate()?;
        Ok(loader.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> CovenantConfig {
        self.config
    }

    fn parse(content: &str, format: &str) -> Result<CovenantConfig, ConfigError> {
        match format {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["GENERATOR", "ITERATION_LIMIT"] => {
                self.config.generator.iteration_limit = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["GENERATOR", "SEED"] => {
                self.config.generator.seed =
                    if value.is_empty() || value.eq_ignore_ascii_case("none") {
                        None
                    } else {
                        Some(value.parse().map_err(|_| {
                            ConfigError::env_parse_error(key, "expected integer or 'none'")
                        })?)
                    };
            }

            ["VERIFIER", "ASSERT_JSON_SIZE"] => {
                self.config.verifier.assert_json_size = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["VERIFIER", "BRACKET_NOTATION"] => {
                self.config.verifier.bracket_notation = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["VERIFIER", "INCLUDE_EMPTY_CHECK"] => {
                self.config.verifier.include_empty_check = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["VERIFIER", "TEST_FRAMEWORK"] => {
                self.config.verifier.test_framework = match value.to_lowercase().as_str() {
                    "java" => TestFramework::Java,
                    "groovy" => TestFramework::Groovy,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'java' or 'groovy'",
                        ))
                    }
                };
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value.parse().map_err(|_| {
                    ConfigError::env_parse_error(key, "expected 'json', 'pretty' or 'compact'")
                })?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_telemetry::LogFormat;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.generator.iteration_limit, 200);
    }

    #[test]
    fn test_loader_with_strict() {
        let config = ConfigLoader::new().with_strict().load_unvalidated();
        assert!(config.verifier.assert_json_size);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [generator]
            iteration_limit = 50

            [verifier]
            test_framework = "groovy"
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.generator.iteration_limit, 50);
        assert_eq!(config.verifier.test_framework, TestFramework::Groovy);
        assert!(config.verifier.bracket_notation);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"logging": {"level": "info", "format": "json"}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
            [generator]
            iterations = 5
        "#;
        assert!(ConfigLoader::new().with_string(toml, "toml").is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigLoader::new().with_string("a: 1", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let toml = r#"
            [generator]
            iteration_limit = 0
        "#;
        let result = ConfigLoader::new().with_string(toml, "toml").unwrap().load();
        assert!(result.is_err());
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/covenant.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/covenant.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.generator.iteration_limit, 200);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_vars_override_file_values() {
        let config = ConfigLoader::new()
            .with_string("[generator]\nseed = 1", "toml")
            .unwrap()
            .with_env_prefix("test")
            .with_vars([
                ("TEST__GENERATOR__SEED", "99"),
                ("TEST__GENERATOR__ITERATION_LIMIT", "10"),
                ("TEST__VERIFIER__ASSERT_JSON_SIZE", "true"),
                ("TEST__VERIFIER__TEST_FRAMEWORK", "Groovy"),
                ("TEST__LOGGING__FORMAT", "pretty"),
                ("OTHER__GENERATOR__SEED", "5"),
                ("TESTING__GENERATOR__SEED", "6"),
            ])
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.generator.seed, Some(99));
        assert_eq!(config.generator.iteration_limit, 10);
        assert!(config.verifier.assert_json_size);
        assert_eq!(config.verifier.test_framework, TestFramework::Groovy);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_vars_without_prefix_are_ignored() {
        let config = ConfigLoader::new()
            .with_vars([("TEST__GENERATOR__SEED", "99")])
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.generator.seed, None);
    }

    #[test]
    fn test_apply_env_var_seed_none() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__GENERATOR__SEED", "3", "TEST").unwrap();
        assert_eq!(loader.config.generator.seed, Some(3));
        loader.apply_env_var("TEST__GENERATOR__SEED", "none", "TEST").unwrap();
        assert_eq!(loader.config.generator.seed, None);
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("TEST__GENERATOR__ITERATION_LIMIT", "lots", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__VERIFIER__BRACKET_NOTATION", "sometimes", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__VERIFIER__TEST_FRAMEWORK", "kotlin", "TEST")
            .is_err());
        assert!(loader.apply_env_var("TESTING", "x", "TEST").is_err());
    }
}
