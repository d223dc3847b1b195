//! Indexed Entities
//!
//! Derived state maintained by the indexer: pairs, tokens, the protocol-wide
//! aggregate, the ETH/USD bundle, per-transaction logical operations, LP
//! positions and the day/hour rollups.
//!
//! Token counters are optional: a token indexed before its metadata was known
//! carries `None`, and every update to such a field is skipped.
//!
//! Created: 2026-10-12

use alloy::primitives::{Address, B256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Add `delta` to an optional accumulator; absent fields stay absent
pub fn accumulate(field: &mut Option<Decimal>, delta: Decimal) {
    if let Some(value) = field.as_mut() {
        *value = value.saturating_add(delta);
    }
}

/// Subtract `delta` from an optional accumulator; absent fields stay absent
pub fn deduct(field: &mut Option<Decimal>, delta: Decimal) {
    if let Some(value) = field.as_mut() {
        *value = value.saturating_sub(delta);
    }
}

/// Increment an optional counter
pub fn bump(counter: &mut Option<u64>) {
    if let Some(value) = counter.as_mut() {
        *value += 1;
    }
}

/// A traded ERC20 asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: Option<u8>,
    /// Cumulative native volume
    pub trade_volume: Option<Decimal>,
    /// Cumulative whitelist-tracked USD volume
    pub trade_volume_usd: Option<Decimal>,
    pub untracked_volume_usd: Option<Decimal>,
    pub tx_count: Option<u64>,
    /// Sum of this token's reserves across all pairs
    pub total_liquidity: Option<Decimal>,
    /// Price in ETH via whitelist traversal
    pub derived_eth: Option<Decimal>,
}

impl Token {
    pub fn new(id: Address, symbol: String, name: String, decimals: Option<u8>) -> Self {
        Self {
            id,
            symbol,
            name,
            decimals,
            trade_volume: Some(Decimal::ZERO),
            trade_volume_usd: Some(Decimal::ZERO),
            untracked_volume_usd: Some(Decimal::ZERO),
            tx_count: Some(0),
            total_liquidity: Some(Decimal::ZERO),
            derived_eth: Some(Decimal::ZERO),
        }
    }
}

/// One AMM pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub id: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    /// Liquidity-token supply (18 decimals)
    pub total_supply: Decimal,
    pub reserve_eth: Decimal,
    pub reserve_usd: Decimal,
    /// ETH value counted only through whitelisted tokens
    pub tracked_reserve_eth: Decimal,
    /// reserve0 / reserve1
    pub token0_price: Decimal,
    /// reserve1 / reserve0
    pub token1_price: Decimal,
    pub volume_token0: Decimal,
    pub volume_token1: Decimal,
    pub volume_usd: Decimal,
    pub untracked_volume_usd: Decimal,
    pub tx_count: u64,
    pub liquidity_provider_count: u64,
    pub created_at_timestamp: u64,
    pub created_at_block_number: u64,
}

impl Pair {
    pub fn new(id: Address, token0: Address, token1: Address, timestamp: u64, block: u64) -> Self {
        Self {
            id,
            token0,
            token1,
            reserve0: Decimal::ZERO,
            reserve1: Decimal::ZERO,
            total_supply: Decimal::ZERO,
            reserve_eth: Decimal::ZERO,
            reserve_usd: Decimal::ZERO,
            tracked_reserve_eth: Decimal::ZERO,
            token0_price: Decimal::ZERO,
            token1_price: Decimal::ZERO,
            volume_token0: Decimal::ZERO,
            volume_token1: Decimal::ZERO,
            volume_usd: Decimal::ZERO,
            untracked_volume_usd: Decimal::ZERO,
            tx_count: 0,
            liquidity_provider_count: 0,
            created_at_timestamp: timestamp,
            created_at_block_number: block,
        }
    }
}

/// Protocol-wide totals, keyed by the factory address. Singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: Address,
    pub pair_count: u64,
    pub total_volume_usd: Decimal,
    pub total_volume_eth: Decimal,
    pub untracked_volume_usd: Decimal,
    pub total_liquidity_usd: Decimal,
    pub total_liquidity_eth: Decimal,
    pub tx_count: u64,
}

impl Protocol {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            pair_count: 0,
            total_volume_usd: Decimal::ZERO,
            total_volume_eth: Decimal::ZERO,
            untracked_volume_usd: Decimal::ZERO,
            total_liquidity_usd: Decimal::ZERO,
            total_liquidity_eth: Decimal::ZERO,
            tx_count: 0,
        }
    }
}

/// Current ETH price in USD. Singleton.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bundle {
    pub eth_price: Decimal,
}

/// Logical operations opened within one chain transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: B256,
    pub block_number: u64,
    pub timestamp: u64,
    pub mints: Vec<String>,
    pub burns: Vec<String>,
    pub swaps: Vec<String>,
}

impl Transaction {
    pub fn new(id: B256, block_number: u64, timestamp: u64) -> Self {
        Self {
            id,
            block_number,
            timestamp,
            mints: Vec::new(),
            burns: Vec::new(),
            swaps: Vec::new(),
        }
    }
}

/// `<txHash>-<index>` identifier of a logical operation
pub fn operation_id(tx_hash: &B256, index: usize) -> String {
    format!("{:?}-{}", tx_hash, index)
}

/// Add-liquidity operation. Complete once `sender` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintEvent {
    pub id: String,
    pub transaction: B256,
    pub timestamp: u64,
    pub pair: Address,
    pub to: Address,
    pub liquidity: Decimal,
    pub sender: Option<Address>,
    pub amount0: Option<Decimal>,
    pub amount1: Option<Decimal>,
    pub log_index: Option<u64>,
    pub amount_usd: Option<Decimal>,
}

impl MintEvent {
    pub fn is_complete(&self) -> bool {
        self.sender.is_some()
    }
}

/// Remove-liquidity operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnEvent {
    pub id: String,
    pub transaction: B256,
    pub timestamp: u64,
    pub pair: Address,
    pub liquidity: Decimal,
    pub sender: Option<Address>,
    pub to: Option<Address>,
    pub amount0: Option<Decimal>,
    pub amount1: Option<Decimal>,
    pub log_index: Option<u64>,
    pub amount_usd: Option<Decimal>,
    /// Opened by a direct LP transfer to the pair, awaiting the zero-address burn
    pub needs_complete: bool,
    /// Recipient of an absorbed protocol fee mint
    pub fee_to: Option<Address>,
    pub fee_liquidity: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub id: String,
    pub transaction: B256,
    pub timestamp: u64,
    pub pair: Address,
    pub sender: Address,
    /// Transaction origin
    pub from: Address,
    pub to: Address,
    pub amount0_in: Decimal,
    pub amount1_in: Decimal,
    pub amount0_out: Decimal,
    pub amount1_out: Decimal,
    pub log_index: u64,
    pub amount_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub id: String,
    pub pair: Address,
    pub user: Address,
    pub liquidity_token_balance: Decimal,
}

/// `<pair>-<user>` identifier of a position
pub fn position_id(pair: &Address, user: &Address) -> String {
    format!("{:?}-{:?}", pair, user)
}

/// Point-in-time copy of a position with the pair's market state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityPositionSnapshot {
    pub id: String,
    pub liquidity_position: String,
    pub timestamp: u64,
    pub block: u64,
    pub user: Address,
    pub pair: Address,
    pub token0_price_usd: Decimal,
    pub token1_price_usd: Decimal,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub reserve_usd: Decimal,
    pub liquidity_token_total_supply: Decimal,
    pub liquidity_token_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDayData {
    /// Day start, unix seconds
    pub date: u64,
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub total_supply: Decimal,
    pub reserve_usd: Decimal,
    pub daily_volume_token0: Decimal,
    pub daily_volume_token1: Decimal,
    pub daily_volume_usd: Decimal,
    pub daily_txns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairHourData {
    /// Hour start, unix seconds
    pub hour_start_unix: u64,
    pub pair: Address,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub total_supply: Decimal,
    pub reserve_usd: Decimal,
    pub hourly_volume_token0: Decimal,
    pub hourly_volume_token1: Decimal,
    pub hourly_volume_usd: Decimal,
    pub hourly_txns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDayData {
    pub date: u64,
    pub daily_volume_eth: Decimal,
    pub daily_volume_usd: Decimal,
    pub daily_volume_untracked: Decimal,
    pub total_volume_eth: Decimal,
    pub total_volume_usd: Decimal,
    pub total_liquidity_eth: Decimal,
    pub total_liquidity_usd: Decimal,
    pub tx_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDayData {
    pub date: u64,
    pub token: Address,
    pub daily_volume_token: Decimal,
    pub daily_volume_eth: Decimal,
    pub daily_volume_usd: Decimal,
    pub daily_txns: u64,
    pub total_liquidity_token: Decimal,
    pub total_liquidity_eth: Decimal,
    pub total_liquidity_usd: Decimal,
    pub price_usd: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_optional_accumulators_skip_absent_fields() {
        let mut present = Some(dec!(1.5));
        let mut absent: Option<Decimal> = None;

        accumulate(&mut present, dec!(2));
        accumulate(&mut absent, dec!(2));
        assert_eq!(present, Some(dec!(3.5)));
        assert_eq!(absent, None);

        deduct(&mut present, dec!(0.5));
        assert_eq!(present, Some(dec!(3)));

        let mut count = Some(7);
        let mut missing = None;
        bump(&mut count);
        bump(&mut missing);
        assert_eq!(count, Some(8));
        assert_eq!(missing, None);
    }

    #[test]
    fn test_operation_ids_are_transaction_local() {
        let hash = B256::repeat_byte(0xab);
        let first = operation_id(&hash, 0);
        let second = operation_id(&hash, 1);
        assert!(first.ends_with("-0"));
        assert!(second.ends_with("-1"));
        assert!(first.starts_with("0xabab"));
    }

    #[test]
    fn test_mint_completeness_follows_sender() {
        let mut mint = MintEvent {
            id: "m".to_string(),
            transaction: B256::ZERO,
            timestamp: 0,
            pair: Address::ZERO,
            to: Address::ZERO,
            liquidity: Decimal::ONE,
            sender: None,
            amount0: None,
            amount1: None,
            log_index: None,
            amount_usd: None,
        };
        assert!(!mint.is_complete());
        mint.sender = Some(Address::repeat_byte(1));
        assert!(mint.is_complete());
    }
}
