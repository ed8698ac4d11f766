//! Configuration file loading for Polyrun
//!
//! Handles loading and parsing configuration files using the config crate.

use std::env;
use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use crate::config::{Config, ConfigError, ENV_PREFIX, EXAMPLE_CONFIG, Language};

/// Unprefixed variable read for the secret when nothing else sets it
pub const FALLBACK_SECRET_VAR: &str = "KEY";

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Layer the embedded defaults, an optional file and `POLYRUN_*`
    /// environment variables, later sources winning
    ///
    /// Environment values are kept as strings and only converted where the
    /// field is numeric, so a secret such as `0012` stays intact. When no
    /// source sets `secret_key`, a non-empty `KEY` variable is used instead.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .add_source(File::from_str(EXAMPLE_CONFIG, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        if config.secret_key.is_none() {
            config.secret_key = env::var(FALLBACK_SECRET_VAR)
                .ok()
                .filter(|key| !key.is_empty());
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("base_dir is empty".to_owned()));
        }
        if self.compile_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "compile_timeout_ms must be positive".to_owned(),
            ));
        }
        if self.exec_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "exec_timeout_ms must be positive".to_owned(),
            ));
        }
        if self.max_inputs == 0 {
            return Err(ConfigError::Invalid("max_inputs must be positive".to_owned()));
        }

        for lang in Language::ALL {
            let Some(recipe) = self.toolchains.get(lang) else {
                continue;
            };
            let id = lang.id();
            if let Some(ref compile) = recipe.compile
                && compile.is_empty()
            {
                return Err(ConfigError::Invalid(format!(
                    "toolchain '{id}' has empty compile command"
                )));
            }
            if let Some(ref run) = recipe.run
                && run.is_empty()
            {
                return Err(ConfigError::Invalid(format!(
                    "toolchain '{id}' has empty run command"
                )));
            }
        }

        Ok(())
    }
}
