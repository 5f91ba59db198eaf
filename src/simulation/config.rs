use crate::game::DEFAULT_DECK_SIZE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_HAND_SIZE: usize = 5;
pub const DEFAULT_TRIALS: u64 = 10_000;
pub const DEFAULT_MAX_BRANCHES: usize = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid simulation settings: {0}")]
    Invalid(String),
}

/// Settings shared by every trial of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Decks smaller than this are padded with filler
    pub deck_size: usize,
    pub hand_size: usize,
    pub trials: u64,
    /// Base seed; trial `i` uses `seed + i`
    pub seed: Option<u64>,
    /// Branches a single trial may explore before giving up
    pub max_branches: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            deck_size: DEFAULT_DECK_SIZE,
            hand_size: DEFAULT_HAND_SIZE,
            trials: DEFAULT_TRIALS,
            seed: None,
            max_branches: DEFAULT_MAX_BRANCHES,
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::Invalid("trials must be positive".to_string()));
        }
        if self.max_branches == 0 {
            return Err(ConfigError::Invalid("max_branches must be positive".to_string()));
        }
        if self.hand_size > self.deck_size {
            return Err(ConfigError::Invalid(format!(
                "hand size {} exceeds deck size {}",
                self.hand_size, self.deck_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.deck_size, 40);
        assert_eq!(config.hand_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "hand_size": 6, "seed": 7 }"#).expect("valid json");
        assert_eq!(config.hand_size, 6);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.trials, DEFAULT_TRIALS);
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let config = SimulationConfig {
            trials: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            hand_size: 41,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
