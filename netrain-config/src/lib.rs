//! # Netrain Configuration System
//!
//! Layered configuration for the capture pipeline and the stream engine.
//!
//! ## Features
//! - **Unified Configuration**: one tree for capture, queue, formatter, streams, scheduler
//! - **Validation**: range and format checks run after every load
//! - **Environment Awareness**: per-environment YAML overrides and `NETRAIN_*` variables

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod capture;
mod core;
mod error;
mod simulator;
mod streams;
mod telemetry;
mod validation;

pub use capture::CaptureConfig;
pub use core::{FormatterConfig, QueueConfig, SchedulerConfig};
pub use error::ConfigError;
pub use simulator::SimulatorConfig;
pub use streams::StreamsConfig;
pub use telemetry::TelemetryConfig;

const DEFAULT_CONFIG_FILE: &str = "config/netrain.yaml";
const ENV_PREFIX: &str = "NETRAIN_";

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct NetrainConfig {
    /// Tap, interface and throughput sampling parameters.
    #[validate(nested)]
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Event queue sizing.
    #[validate(nested)]
    #[serde(default)]
    pub queue: QueueConfig,

    /// Display event formatting.
    #[validate(nested)]
    #[serde(default)]
    pub formatter: FormatterConfig,

    /// Stream pool and animation parameters.
    #[validate(nested)]
    #[serde(default)]
    pub streams: StreamsConfig,

    /// Tick pacing.
    #[validate(nested)]
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Synthetic tap used by `simulate`.
    #[validate(nested)]
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl NetrainConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/netrain.yaml`, if present
    /// 3. `config/<NETRAIN_ENV>.yaml` (`NETRAIN_ENV` defaults to `production`)
    /// 4. `NETRAIN_*` environment variables, `__` separating nested keys
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(NetrainConfig::default()));

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            figment = figment.merge(Yaml::file(DEFAULT_CONFIG_FILE));
        }

        let env = std::env::var("NETRAIN_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file layered over the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment = Figment::from(Serialized::defaults(NetrainConfig::default()))
            .merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                config.check_cross_field()?;
                Ok(config)
            })
    }

    /// Constraints spanning more than one section.
    fn check_cross_field(&self) -> Result<(), ConfigError> {
        if self.streams.max_stream_length > self.formatter.max_text_len {
            return Err(ConfigError::Inconsistent(format!(
                "streams.max_stream_length ({}) exceeds formatter.max_text_len ({})",
                self.streams.max_stream_length, self.formatter.max_text_len
            )));
        }
        Ok(())
    }
}
