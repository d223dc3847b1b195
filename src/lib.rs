//! Teleswap Pair Indexer Library
//!
//! Correlates liquidity-token transfers into logical mints and burns, and
//! aggregates reserves, prices, volume and liquidity at pair, token and
//! protocol scope, with day/hour rollups and LP position snapshots.
//!
//! Created: 2026-10-12

pub mod config;
pub mod contracts;
pub mod error;
pub mod events;
pub mod indexer;
pub mod math;
pub mod positions;
pub mod pricing;
pub mod rollups;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{load_config_from_file, IndexerConfig, PricingConfig};
pub use error::{IndexerError, Result};
pub use events::{EventMeta, PairEvent};
pub use indexer::Indexer;
pub use positions::{BalanceSource, TransferLedger};
pub use pricing::{PriceOracle, WhitelistOracle};
pub use store::{EntityStore, StoreSummary};
