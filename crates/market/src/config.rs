//! Market configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional; defaults match the canonical deployment.
//!
//! - `MARKET_CART_COLLECTION` - cart collection name (default: `cart`)
//! - `MARKET_ITEM_COLLECTION` - item collection name (default: `item`)

use std::env;

use thiserror::Error;

const DEFAULT_CART_COLLECTION: &str = "cart";
const DEFAULT_ITEM_COLLECTION: &str = "item";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Data-layer configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Collection holding one cart document per user.
    pub cart_collection: String,
    /// Collection holding catalog items.
    pub item_collection: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            cart_collection: DEFAULT_CART_COLLECTION.to_owned(),
            item_collection: DEFAULT_ITEM_COLLECTION.to_owned(),
        }
    }
}

impl MarketConfig {
    /// Load configuration, applying any environment overrides to the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if an override is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(name) = read_override("MARKET_CART_COLLECTION")? {
            config.cart_collection = name;
        }
        if let Some(name) = read_override("MARKET_ITEM_COLLECTION")? {
            config.item_collection = name;
        }
        Ok(config)
    }
}

fn read_override(var: &str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::InvalidEnvVar(
            var.to_owned(),
            "must not be empty".to_owned(),
        )),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvVar(
            var.to_owned(),
            "must be valid UTF-8".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_collections() {
        let config = MarketConfig::default();
        assert_eq!(config.cart_collection, "cart");
        assert_eq!(config.item_collection, "item");
    }
}
