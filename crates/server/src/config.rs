//! Server configuration

use anyhow::{Context, Result};
use attrition_lib::artifact::{default_candidates, Candidate};
use serde::Deserialize;
use std::path::PathBuf;

/// Base name of the optional configuration file in the working directory
pub const CONFIG_FILE: &str = "attrition";

/// Prefix of environment variable overrides, e.g. `ATTRITION_PORT`
pub const ENV_PREFIX: &str = "ATTRITION";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory searched for model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    #[serde(default = "default_page_title")]
    pub page_title: String,

    /// Artifact files in priority order
    #[serde(default = "default_candidates")]
    pub candidates: Vec<Candidate>,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_page_title() -> String {
    "Employee Attrition Prediction".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            model_dir: default_model_dir(),
            page_title: default_page_title(),
            candidates: default_candidates(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `attrition.toml` (if present) and `ATTRITION_*` variables
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(file: &str) -> Result<Self> {
        Self::load_with_env(file, config::Environment::with_prefix(ENV_PREFIX))
    }

    /// A value that fails to parse is an error; nothing falls back to defaults
    fn load_with_env(file: &str, env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(env.try_parsing(true))
            .build()?;

        config
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {} or {}_* variables", file, ENV_PREFIX))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
