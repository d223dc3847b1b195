//! Decoded Pair Events
//!
//! Inputs to the indexer. Each event carries the log metadata the handlers
//! need; the host delivers them in canonical (block, tx, log index) order.
//!
//! Created: 2026-10-12
//! Modified: 2026-10-18 - RawLog input record

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Log and transaction context of one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Emitting contract (the pair, or the factory for `PairCreated`)
    pub address: Address,
    pub tx_hash: B256,
    /// Transaction origin
    pub tx_from: Address,
    pub block_number: u64,
    pub timestamp: u64,
    pub log_index: u64,
}

/// ERC20 metadata resolved by the host when a pair is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCreated {
    pub meta: EventMeta,
    pub pair: Address,
    pub token0: TokenInfo,
    pub token1: TokenInfo,
}

/// Liquidity-token transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub meta: EventMeta,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sync {
    pub meta: EventMeta,
    pub reserve0: U256,
    pub reserve1: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mint {
    pub meta: EventMeta,
    pub sender: Address,
    pub amount0: U256,
    pub amount1: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Burn {
    pub meta: EventMeta,
    pub sender: Address,
    pub amount0: U256,
    pub amount1: U256,
    pub to: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub meta: EventMeta,
    pub sender: Address,
    pub amount0_in: U256,
    pub amount1_in: U256,
    pub amount0_out: U256,
    pub amount1_out: U256,
    pub to: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairEvent {
    PairCreated(PairCreated),
    Transfer(Transfer),
    Sync(Sync),
    Mint(Mint),
    Burn(Burn),
    Swap(Swap),
}

/// Undecoded log, one per line in raw replay mode. A factory log names its
/// tokens only by address, so the exporter attaches their metadata in `tokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLog {
    pub meta: EventMeta,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub tokens: Vec<TokenInfo>,
}

impl PairEvent {
    pub fn meta(&self) -> &EventMeta {
        match self {
            PairEvent::PairCreated(e) => &e.meta,
            PairEvent::Transfer(e) => &e.meta,
            PairEvent::Sync(e) => &e.meta,
            PairEvent::Mint(e) => &e.meta,
            PairEvent::Burn(e) => &e.meta,
            PairEvent::Swap(e) => &e.meta,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PairEvent::PairCreated(_) => "PairCreated",
            PairEvent::Transfer(_) => "Transfer",
            PairEvent::Sync(_) => "Sync",
            PairEvent::Mint(_) => "Mint",
            PairEvent::Burn(_) => "Burn",
            PairEvent::Swap(_) => "Swap",
        }
    }
}
