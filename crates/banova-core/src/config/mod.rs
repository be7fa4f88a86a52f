//! Run configuration loading and validation.
//!
//! This module handles:
//! - Loading `config.toml` files
//! - Config resolution order (explicit path > `BANOVA_CONFIG` > XDG > defaults)
//! - CLI flag overrides of individual fields
//! - Semantic validation of the chain settings
//! - A provenance snapshot (path + SHA-256) for reports

pub mod source;

pub use source::{DataSource, SourceInfo, SourceStatus};

use std::path::{Path, PathBuf};

use banova_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::logging::event_names;
use crate::model::PriorConstants;
use crate::sampler::{ModeSettings, SamplerSettings};
use crate::summary::SummaryOptions;

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "banova";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "BANOVA_CONFIG";

/// Every knob of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Total sampler iterations.
    pub chain_length: usize,
    /// Leading iterations discarded.
    pub burnin: usize,
    /// Retention stride after burn-in.
    pub thin: usize,
    /// RNG seed. Drawn from OS entropy and reported when absent.
    pub seed: Option<u64>,
    /// HyperScale floor.
    pub scale_floor: f64,
    /// Starting random-walk sd for every coordinate.
    pub initial_proposal_scale: f64,
    /// Iterations between proposal-scale updates.
    pub tune_interval: usize,
    /// Iterations with tuning active. Defaults to `burnin`.
    pub tune_steps: Option<usize>,
    /// Mode-search sweep budget.
    pub map_max_iterations: usize,
    /// Mode-search step tolerance.
    pub map_tolerance: f64,
    /// Consecutive non-finite proposals tolerated.
    pub max_invalid_streak: usize,
    /// Iterations between progress log lines.
    pub progress_interval: usize,
    /// Reference value for summary probabilities.
    pub comparison_value: f64,
    /// HDI mass for summaries.
    pub credible_mass: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            chain_length: 20_000,
            burnin: 2_000,
            thin: 50,
            seed: None,
            scale_floor: 0.1,
            initial_proposal_scale: 0.1,
            tune_interval: 100,
            tune_steps: None,
            map_max_iterations: 2_000,
            map_tolerance: 1e-6,
            max_invalid_streak: 100_000,
            progress_interval: 1_000,
            comparison_value: 0.0,
            credible_mass: 0.95,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::InvalidConfigValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn positive_finite(field: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive and finite, got {}", value)))
    }
}

impl RunConfig {
    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.chain_length == 0 {
            return Err(invalid("chain_length", "must be at least 1"));
        }
        if self.burnin >= self.chain_length {
            return Err(invalid(
                "burnin",
                format!(
                    "must be smaller than chain_length ({} >= {})",
                    self.burnin, self.chain_length
                ),
            ));
        }
        if self.thin == 0 {
            return Err(invalid("thin", "must be at least 1"));
        }
        if let Some(steps) = self.tune_steps {
            if steps > self.chain_length {
                return Err(invalid(
                    "tune_steps",
                    format!(
                        "must not exceed chain_length ({} > {})",
                        steps, self.chain_length
                    ),
                ));
            }
        }
        positive_finite("scale_floor", self.scale_floor)?;
        positive_finite("initial_proposal_scale", self.initial_proposal_scale)?;
        positive_finite("map_tolerance", self.map_tolerance)?;
        if self.max_invalid_streak == 0 {
            return Err(invalid("max_invalid_streak", "must be at least 1"));
        }
        if !(self.credible_mass > 0.0 && self.credible_mass <= 1.0) {
            return Err(invalid(
                "credible_mass",
                format!("must be in (0, 1], got {}", self.credible_mass),
            ));
        }
        if !self.comparison_value.is_finite() {
            return Err(invalid("comparison_value", "must be finite"));
        }
        Ok(())
    }

    /// Draws kept after burn-in and thinning.
    pub fn retained_draws(&self) -> usize {
        if self.thin == 0 || self.burnin >= self.chain_length {
            return 0;
        }
        (self.chain_length - self.burnin).div_ceil(self.thin)
    }

    pub fn effective_tune_steps(&self) -> usize {
        self.tune_steps.unwrap_or(self.burnin)
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            chain_length: self.chain_length,
            initial_proposal_scale: self.initial_proposal_scale,
            tune_interval: self.tune_interval,
            tune_steps: self.effective_tune_steps(),
            max_invalid_streak: self.max_invalid_streak,
            progress_interval: self.progress_interval,
            mode: ModeSettings {
                max_iterations: self.map_max_iterations,
                tolerance: self.map_tolerance,
                ..ModeSettings::default()
            },
        }
    }

    pub fn prior_constants(&self) -> PriorConstants {
        PriorConstants {
            scale_floor: self.scale_floor,
            ..PriorConstants::default()
        }
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            credible_mass: self.credible_mass,
            comparison_value: self.comparison_value,
        }
    }

    /// Apply CLI overrides field by field.
    pub fn apply(&mut self, overrides: &RunOverrides) {
        if let Some(v) = overrides.chain_length {
            self.chain_length = v;
        }
        if let Some(v) = overrides.burnin {
            self.burnin = v;
        }
        if let Some(v) = overrides.thin {
            self.thin = v;
        }
        if let Some(v) = overrides.seed {
            self.seed = Some(v);
        }
        if let Some(v) = overrides.scale_floor {
            self.scale_floor = v;
        }
    }
}

/// Field overrides from command-line flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub chain_length: Option<usize>,
    pub burnin: Option<usize>,
    pub thin: Option<usize>,
    pub seed: Option<u64>,
    pub scale_floor: Option<f64>,
}

/// Configuration resolution options.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
    /// Value of `BANOVA_CONFIG`, if set.
    pub env_path: Option<PathBuf>,
    /// Base config directory; `$XDG_CONFIG_HOME` (or `~/.config`) when unset.
    pub config_home: Option<PathBuf>,
    pub overrides: RunOverrides,
}

impl ConfigOptions {
    /// Options with `BANOVA_CONFIG` read from the process environment.
    pub fn from_env(config_path: Option<PathBuf>, overrides: RunOverrides) -> Self {
        Self {
            config_path,
            env_path: std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
            config_home: None,
            overrides,
        }
    }
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub config: RunConfig,
    /// File the config came from (None if using defaults).
    pub path: Option<PathBuf>,
    /// SHA-256 of the file content (None if using defaults).
    pub hash: Option<String>,
}

impl ResolvedConfig {
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            path: self.path.clone(),
            hash: self.hash.clone(),
            config: self.config.clone(),
        }
    }
}

/// Config provenance embedded in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    pub path: Option<PathBuf>,
    pub hash: Option<String>,
    pub config: RunConfig,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit `--config` path
/// 2. `BANOVA_CONFIG`
/// 3. `$XDG_CONFIG_HOME/banova/config.toml`, when it exists
/// 4. Built-in defaults
///
/// CLI overrides are applied last, then the result is validated.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig> {
    let (mut config, path, hash) = match resolve_config_path(options)? {
        Some(path) => {
            let (config, hash) = load_config_file(&path)?;
            tracing::info!(
                target: event_names::CONFIG_LOADED,
                path = %path.display(),
                hash = %hash,
                "configuration loaded"
            );
            (config, Some(path), Some(hash))
        }
        None => {
            tracing::debug!(
                target: event_names::CONFIG_DEFAULT_USED,
                "no config file found, using defaults"
            );
            (RunConfig::default(), None, None)
        }
    };

    config.apply(&options.overrides);
    config.validate()?;
    Ok(ResolvedConfig { config, path, hash })
}

fn resolve_config_path(options: &ConfigOptions) -> Result<Option<PathBuf>> {
    let explicit = options.config_path.as_ref().or(options.env_path.as_ref());
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.clone()));
    }

    let home = match &options.config_home {
        Some(dir) => dir.clone(),
        None => std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let default_path = home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

fn load_config_file(path: &Path) -> Result<(RunConfig, String)> {
    let content = std::fs::read_to_string(path)?;
    let hash = compute_hash(&content);
    let config: RunConfig = toml::from_str(&content).map_err(|e| {
        tracing::warn!(
            target: event_names::CONFIG_ERROR,
            path = %path.display(),
            "config file failed to parse"
        );
        Error::Config(format!("invalid config file {}: {}", path.display(), e))
    })?;
    Ok((config, hash))
}

/// SHA-256 of the config file content, hex encoded.
fn compute_hash(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
