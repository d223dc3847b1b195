//! Indexer Errors
//!
//! Library-level failures. Only conversion and input problems surface here:
//! missing entities, zero denominators and out-of-range products are not errors, they degrade to a
//! skipped update inside the handlers.
//!
//! Created: 2026-10-12

use alloy::primitives::U256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    /// Integer part of a raw amount is beyond the decimal range
    #[error("amount {amount} with {decimals} decimals exceeds decimal range")]
    AmountOutOfRange { amount: U256, decimals: u8 },

    /// Decimal exponent beyond the maximum decimal scale (28)
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),

    /// Event file line could not be parsed
    #[error("malformed event at line {line}: {source}")]
    MalformedEvent {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
