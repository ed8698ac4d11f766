use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::language::{
    ARTIFACT_NAME, Language, MissingPublicClass, PYTHON_COMMAND, Placeholders, RecipeOverride,
    SourceName, Toolchain, ToolchainOverrides, ToolchainRegistry, UnsupportedLanguage,
    expand_command, java_public_class,
};

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../polyrun.example.toml");

/// Prefix for environment variable overrides (e.g. `POLYRUN_SECRET_KEY`)
pub const ENV_PREFIX: &str = "POLYRUN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Polyrun
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory under which each job gets its own subdirectory
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Wall-clock limit for one compiler invocation, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub compile_timeout_ms: u64,

    /// Wall-clock limit for one program run, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub exec_timeout_ms: u64,

    /// Largest accepted source text, in bytes
    #[serde(default = "default_max_code_size")]
    pub max_code_size: usize,

    /// Largest accepted number of input payloads per submission
    #[serde(default = "default_max_inputs")]
    pub max_inputs: usize,

    /// Shared secret expected in each submission.
    ///
    /// When unset, only submissions with an empty key are accepted.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Per-language recipe overrides
    #[serde(default)]
    pub toolchains: ToolchainOverrides,
}

impl Config {
    /// Create a new config from the embedded defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different base directory for job workspaces
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_timeout_ms)
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_millis(self.exec_timeout_ms)
    }

    /// Build the toolchain table for this configuration
    pub fn registry(&self) -> ToolchainRegistry {
        ToolchainRegistry::new(&self.toolchains)
    }

    /// The secret a submission's key is compared against
    pub fn expected_key(&self) -> &str {
        self.secret_key.as_deref().unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("jobs")
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_code_size() -> usize {
    10_000
}

fn default_max_inputs() -> usize {
    20
}
