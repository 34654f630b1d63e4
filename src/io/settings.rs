use crate::defaults::*;
use crate::diis::{BackendKind, DiisError, ErrorMetric};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_verbose() -> i8 {
    0
}
fn default_max_history() -> usize {
    DIIS_LIMIT
}
fn default_error_metric() -> String {
    String::from(DIIS_ERROR_METRIC)
}
fn default_backend() -> String {
    String::from(DIIS_BACKEND)
}
fn default_domains() -> usize {
    DIIS_DOMAINS
}
fn default_start_iteration() -> usize {
    DIIS_START_ITERATION
}
fn default_max_iter() -> usize {
    MAX_ITER
}
fn default_convergence() -> f64 {
    CONVERGENCE
}
fn default_mixing() -> f64 {
    LINEAR_MIXING_COEFFICIENT
}
fn default_diis_config() -> DiisConfig {
    let diis_config: DiisConfig = toml::from_str("").unwrap();
    return diis_config;
}
fn default_loop_config() -> LoopConfig {
    let loop_config: LoopConfig = toml::from_str("").unwrap();
    return loop_config;
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Configuration {
    #[serde(default = "default_verbose")]
    pub verbose: i8,
    #[serde(default = "default_diis_config")]
    pub diis: DiisConfig,
    #[serde(default = "default_loop_config", rename = "loop")]
    pub scf_loop: LoopConfig,
}

impl Configuration {
    /// Reads the configuration file. If it does not exist the default settings are used
    /// and written to `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_string: String = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Unable to read config file {}", path.display()))?
        } else {
            String::from("")
        };
        let config: Self = Self::from_str(&config_string)?;
        if !path.exists() {
            let config_string: String = toml::to_string(&config)?;
            fs::write(path, config_string)
                .with_context(|| format!("Unable to write config file {}", path.display()))?;
        }
        Ok(config)
    }

    pub fn from_str(config_string: &str) -> Result<Self> {
        let config: Self = toml::from_str(config_string).context("Invalid configuration")?;
        // the names are only checked here, so that an invalid file fails early
        config.diis.metric()?;
        config.diis.backend()?;
        Ok(config)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        toml::from_str("").unwrap()
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct DiisConfig {
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_error_metric")]
    pub error_metric: String,
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_domains")]
    pub domains: usize,
    #[serde(default = "default_start_iteration")]
    pub start_iteration: usize,
}

impl DiisConfig {
    pub fn metric(&self) -> Result<ErrorMetric, DiisError> {
        self.error_metric.parse()
    }

    pub fn backend(&self) -> Result<BackendKind, DiisError> {
        self.backend.parse()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy)]
pub struct LoopConfig {
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_convergence")]
    pub convergence: f64,
    #[serde(default = "default_mixing")]
    pub mixing: f64,
}
