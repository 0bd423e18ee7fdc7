// Governor Configuration - Voting, quorum and timelock parameters
// Principle: One TOML file fully describes a governor instance

use crate::contracts::quorum::QuorumConfig;
use crate::contracts::registry::VotingSettings;
use crate::contracts::timelock::TimelockConfig;
use crate::types::{AccountId, BlockNumber};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Default voting period: ~1 week of 12s blocks
pub const DEFAULT_VOTING_PERIOD: BlockNumber = 50_400;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete governor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Blocks between proposal creation and the weight snapshot
    pub voting_delay: BlockNumber,

    /// Blocks the vote stays open after the snapshot
    pub voting_period: BlockNumber,

    /// Minimum proposer weight at the previous block
    pub proposal_threshold: u64,

    /// May cancel proposals before queuing and cancel queued operations
    pub guardian: Option<AccountId>,

    /// Additional timelock cancellers
    pub cancellers: Vec<AccountId>,

    pub quorum: QuorumConfig,

    pub timelock: TimelockConfig,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            voting_delay: 1,
            voting_period: DEFAULT_VOTING_PERIOD,
            proposal_threshold: 0,
            guardian: None,
            cancellers: Vec::new(),
            quorum: QuorumConfig::default(),
            timelock: TimelockConfig::default(),
        }
    }
}

impl GovernorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        info!("📄 Loaded governor config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Reject parameters that would make every proposal fail or every
    /// quorum trivially met
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.voting_period == 0 {
            return Err(ConfigError::Invalid("voting_period must be at least 1 block".into()));
        }

        match self.quorum {
            QuorumConfig::SupplyFraction { numerator, denominator, .. } => {
                if denominator == 0 {
                    return Err(ConfigError::Invalid("quorum denominator must be non-zero".into()));
                }
                if numerator > denominator {
                    return Err(ConfigError::Invalid(format!(
                        "quorum fraction {}/{} exceeds total supply",
                        numerator, denominator
                    )));
                }
            }
            QuorumConfig::Fixed { .. } => {}
        }

        if self.timelock.min_delay < self.timelock.min_delay_floor {
            return Err(ConfigError::Invalid(format!(
                "timelock min_delay {} below floor {}",
                self.timelock.min_delay, self.timelock.min_delay_floor
            )));
        }

        Ok(())
    }

    pub fn voting_settings(&self) -> VotingSettings {
        VotingSettings {
            voting_delay: self.voting_delay,
            voting_period: self.voting_period,
            proposal_threshold: self.proposal_threshold.into(),
        }
    }

    /// Guardian plus configured cancellers
    pub fn timelock_cancellers(&self) -> Vec<AccountId> {
        let mut all = self.cancellers.clone();
        if let Some(guardian) = self.guardian {
            if !all.contains(&guardian) {
                all.push(guardian);
            }
        }
        all
    }
}
