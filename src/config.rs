//! Engine configuration
//!
//! Loaded from `~/.taskroute/config.toml`, creating a default file on
//! first run. Every section has documented defaults so a partial file is
//! valid.

use crate::budget::BudgetConfig;
use crate::decision::DecisionThresholds;
use crate::feedback::UpdateParams;
use crate::trust::TrustConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Feature extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Optional external NLU endpoint; heuristics only when unset
    pub nlu_endpoint: Option<String>,

    /// Deadline for the NLU call, in milliseconds
    pub nlu_timeout_ms: u64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            nlu_endpoint: None,
            nlu_timeout_ms: 200,
        }
    }
}

/// Feedback loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    /// Bounded update-rule parameters
    pub update: UpdateParams,

    /// Records accumulated before a weight-update cycle runs
    pub min_batch_size: usize,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            update: UpdateParams::default(),
            min_batch_size: 10,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub budget: BudgetConfig,
    pub thresholds: DecisionThresholds,
    pub trust: TrustConfig,
    pub extraction: ExtractionSettings,
    pub feedback: FeedbackSettings,
}

impl EngineConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = EngineConfig::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: EngineConfig = toml::from_str(&contents)
            .context("Failed to parse config file")?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".taskroute").join("config.toml"))
    }

    /// Validate cross-section invariants at startup
    pub fn validate(&self) -> Result<()> {
        self.thresholds
            .validate()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        if self.budget.daily_budget <= 0.0 {
            anyhow::bail!("budget.daily_budget must be positive");
        }
        if !(0.0..1.0).contains(&self.budget.escalation_fraction) {
            anyhow::bail!("budget.escalation_fraction must be in [0, 1)");
        }
        if self.extraction.nlu_timeout_ms == 0 {
            anyhow::bail!("extraction.nlu_timeout_ms must be positive");
        }
        Ok(())
    }
}
