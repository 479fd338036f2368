//! Layered settings: built-in defaults, then an optional TOML file, then
//! `TEAM_PRICING__<SECTION>__<KEY>` environment variables.

use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PricingError;
use crate::model::tariff::PricingParameters;
use crate::optimizer::{Strategy, DEFAULT_EXHAUSTIVE_LIMIT};

pub const ENV_PREFIX: &str = "TEAM_PRICING";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pricing: PricingParameters,
    pub search: SearchSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub strategy: Strategy,
    /// Candidate count up to which `auto` enumerates every assignment.
    pub exhaustive_limit: u64,
    pub workers: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            strategy: Strategy::Auto,
            exhaustive_limit: DEFAULT_EXHAUSTIVE_LIMIT,
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Loads settings from `path` (required when given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Settings, PricingError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = finish(builder)?;
        debug!(?path, "settings loaded");
        Ok(settings)
    }

    /// Parses settings from TOML text, with environment overrides on top.
    pub fn from_toml(text: &str) -> Result<Settings, PricingError> {
        finish(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Settings, PricingError> {
    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;
    Ok(settings)
}
