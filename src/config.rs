//! Configuration management
//! Load indexer settings from a TOML file

use alloy::primitives::Address;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Top-level indexer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Factory address; id of the protocol aggregate
    pub factory_address: Address,
    /// Raw LP amount locked to the zero address on first mint
    #[serde(default = "default_minimum_liquidity")]
    pub minimum_liquidity: u64,
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Reference-price settings for the whitelist oracle
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Wrapped native asset (derived price 1)
    #[serde(default)]
    pub weth_address: Address,
    /// Stablecoin/WETH pairs averaged into the ETH/USD price
    #[serde(default)]
    pub stable_pairs: Vec<Address>,
    /// Tokens trusted as price references
    #[serde(default)]
    pub whitelist: Vec<Address>,
    /// Minimum pair ETH reserve before a pair is used as a price path
    #[serde(default = "default_minimum_liquidity_threshold_eth")]
    pub minimum_liquidity_threshold_eth: Decimal,
}

fn default_minimum_liquidity() -> u64 { 1000 }
fn default_minimum_liquidity_threshold_eth() -> Decimal { Decimal::TWO }

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            weth_address: Address::ZERO,
            stable_pairs: Vec::new(),
            whitelist: Vec::new(),
            minimum_liquidity_threshold_eth: default_minimum_liquidity_threshold_eth(),
        }
    }
}

impl IndexerConfig {
    /// Minimal config with default pricing (no whitelist)
    pub fn new(factory_address: Address) -> Self {
        Self {
            factory_address,
            minimum_liquidity: default_minimum_liquidity(),
            pricing: PricingConfig::default(),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<IndexerConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config: IndexerConfig = toml::from_str(&content)
        .with_context(|| "Failed to parse TOML configuration")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
factory_address = "0x1111111111111111111111111111111111111111"

[pricing]
weth_address = "0x2222222222222222222222222222222222222222"
stable_pairs = ["0x3333333333333333333333333333333333333333"]
whitelist = [
    "0x2222222222222222222222222222222222222222",
    "0x4444444444444444444444444444444444444444",
]
minimum_liquidity_threshold_eth = "0.5"
"#;

        let config: IndexerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.factory_address, Address::repeat_byte(0x11));
        assert_eq!(config.minimum_liquidity, 1000);
        assert_eq!(config.pricing.weth_address, Address::repeat_byte(0x22));
        assert_eq!(config.pricing.whitelist.len(), 2);
        assert_eq!(config.pricing.minimum_liquidity_threshold_eth, dec!(0.5));
    }

    #[test]
    fn test_defaults_without_pricing_section() {
        let config: IndexerConfig =
            toml::from_str(r#"factory_address = "0x1111111111111111111111111111111111111111""#).unwrap();
        assert!(config.pricing.whitelist.is_empty());
        assert_eq!(config.pricing.weth_address, Address::ZERO);
        assert_eq!(config.pricing.minimum_liquidity_threshold_eth, dec!(2));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "factory_address = \"0x1111111111111111111111111111111111111111\"\nminimum_liquidity = 500"
        )
        .unwrap();

        let config = load_config_from_file(file.path()).unwrap();
        assert_eq!(config.minimum_liquidity, 500);

        assert!(load_config_from_file("/nonexistent/indexer.toml").is_err());
    }
}
