//! Configuration types.

use crate::error::{ConfigError, Result};
use crate::logic::interner::Signature;
use crate::logic::ordering::{KboConfig, KboSettings};
use serde::{Deserialize, Serialize};

/// Configuration for the clustered discrimination tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of top-level buckets, keyed by the hash of the top symbol
    pub hash_table_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            hash_table_size: 64,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hash_table_size == 0 {
            return Err(ConfigError::EmptyHashTable);
        }
        Ok(())
    }
}

/// Everything the indexing core reads from a configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub index: IndexConfig,
    pub kbo: KboSettings,
}

impl CoreConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.index.validate()?;
        if config.kbo.variable_weight == 0 {
            return Err(ConfigError::ZeroVariableWeight);
        }
        Ok(config)
    }

    /// Resolve the KBO settings against the problem's signature
    pub fn kbo_config(&self, signature: &Signature) -> Result<KboConfig> {
        KboConfig::from_settings(signature, &self.kbo)
    }
}
