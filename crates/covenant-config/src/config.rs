//! Configuration types.
//!
//! [`CovenantConfig`] groups the settings of every Covenant component. The
//! verifier section reuses [`VerifierConfig`] as-is so a config file can be
//! handed straight to a `ContractVerifier`.

use covenant_telemetry::{create_env_filter, is_known_level, LogConfig, LogFormat};
use covenant_verifier::VerifierConfig;
use covenant_xeger::DEFAULT_ITERATION_LIMIT;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete Covenant configuration.
///
/// # Example
///
/// ```
/// use covenant_config::CovenantConfig;
///
/// let config = CovenantConfig::default();
/// assert_eq!(config.generator.iteration_limit, 200);
/// assert!(!config.verifier.assert_json_size);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CovenantConfig {
    /// Sample string generation.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Body conversion and test generation.
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CovenantConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `generator.iteration_limit` is zero
    /// - `logging.level` is neither a level name nor a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.iteration_limit == 0 {
            return Err(ConfigError::invalid_value(
                "generator.iteration_limit",
                "must be greater than zero",
            ));
        }

        let level = &self.logging.level;
        let directive = level.contains('=') && create_env_filter(level).is_ok();
        if !is_known_level(level) && !directive {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown log level: {level}"),
            ));
        }

        Ok(())
    }

    /// Create a preset for ordered verification with verbose logging.
    ///
    /// ```
    /// use covenant_config::CovenantConfig;
    ///
    /// let config = CovenantConfig::strict();
    /// assert!(config.verifier.assert_json_size);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn strict() -> Self {
        Self {
            verifier: VerifierConfig::strict(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                ..LoggingConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Sample string generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Maximum characters emitted per generated string.
    pub iteration_limit: usize,

    /// Fixed RNG seed for reproducible output.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            iteration_limit: DEFAULT_ITERATION_LIMIT,
            seed: None,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Level or filter directive.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let defaults = LogConfig::default();
        Self {
            enabled: defaults.enabled,
            level: defaults.level,
            format: defaults.format,
        }
    }
}

impl LoggingConfig {
    /// The subscriber settings for this section.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ..LogConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CovenantConfig::default();
        config.validate().unwrap();
        assert_eq!(config.generator.seed, None);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_zero_iteration_limit_rejected() {
        let mut config = CovenantConfig::default();
        config.generator.iteration_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("generator.iteration_limit"));
    }

    #[test]
    fn test_log_levels() {
        let mut config = CovenantConfig::default();
        config.logging.level = "TRACE".to_string();
        config.validate().unwrap();
        config.logging.level = "covenant_verifier=debug".to_string();
        config.validate().unwrap();
        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_log_config() {
        let section = LoggingConfig {
            enabled: false,
            level: "info".to_string(),
            format: LogFormat::Json,
        };
        let log = section.to_log_config();
        assert!(!log.enabled);
        assert_eq!(log.level, "info");
        assert_eq!(log.format, LogFormat::Json);
    }

    #[test]
    fn test_strict_preset() {
        let config = CovenantConfig::strict();
        config.validate().unwrap();
        assert!(config.verifier.include_empty_check);
    }
}
