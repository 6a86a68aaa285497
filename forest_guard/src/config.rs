// Layered settings: built-in defaults, then an optional TOML file, then
// `FOREST_GUARD_*` environment variables (nested keys joined with `__`, e.g.
// `FOREST_GUARD_ESTIMATOR__THRESHOLD=40`).

use crate::error::ConfigError;
use crate::estimator::EstimatorConfig;
use crate::monitor::threat::ThreatPolicy;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::Deserialize;
use std::path::Path;

pub const ENV_PREFIX: &str = "FOREST_GUARD";
/// Looked up in the working directory when no explicit file is given.
pub const DEFAULT_FILE_STEM: &str = "forest_guard";

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub estimator: EstimatorConfig,
    pub threat: ThreatPolicy,
}

impl Settings {
    /// Loads settings from `path` (required to exist) or from an optional
    /// `forest_guard.toml`, with environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, Self::environment())
    }

    fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let builder = Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_FILE_STEM).required(false)),
        };
        Self::finish(builder.add_source(environment))
    }

    /// Parses settings from TOML text, without consulting the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::finish(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.estimator
            .target_size
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        let ThreatPolicy {
            intrusion_bonus,
            alert_threshold,
        } = self.threat;
        if !intrusion_bonus.is_finite() || intrusion_bonus < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "threat.intrusion_bonus must be a non-negative number, got {intrusion_bonus}"
            )));
        }
        if !alert_threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "threat.alert_threshold must be finite, got {alert_threshold}"
            )));
        }
        Ok(())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}
