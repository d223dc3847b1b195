//! Users, Liquidity Positions and Snapshots
//!
//! Idempotent upserts for LP bookkeeping, plus the `BalanceSource` seam the
//! transfer handler reads authoritative liquidity-token balances from.
//!
//! Created: 2026-10-13

use crate::events::EventMeta;
use crate::math::safe_mul;
use crate::store::EntityStore;
use crate::types::{position_id, LiquidityPosition, LiquidityPositionSnapshot, Pair, User};
use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Upsert a user record
pub fn create_user(store: &mut EntityStore, address: Address) {
    if store.load_user(&address).is_none() {
        store.save_user(User { id: address });
    }
}

/// Load-or-create the (pair, user) position.
///
/// Creation bumps `pair.liquidity_provider_count`; the caller owns the pair
/// copy and is responsible for saving it.
pub fn create_liquidity_position(store: &mut EntityStore, pair: &mut Pair, user: Address) -> LiquidityPosition {
    let id = position_id(&pair.id, &user);
    if let Some(position) = store.load_position(&id) {
        return position;
    }

    pair.liquidity_provider_count += 1;
    debug!("New liquidity position {} ({} providers)", id, pair.liquidity_provider_count);

    let position = LiquidityPosition {
        id,
        pair: pair.id,
        user,
        liquidity_token_balance: Decimal::ZERO,
    };
    store.save_position(position.clone());
    position
}

/// Record the position's balance together with the pair's market state at `meta`
pub fn create_liquidity_snapshot(
    store: &mut EntityStore,
    position: &LiquidityPosition,
    pair: &Pair,
    meta: &EventMeta,
) {
    let eth_price = store.load_bundle().map(|b| b.eth_price).unwrap_or_default();
    let price_usd = |token: &Address| {
        let derived = store.load_token(token).and_then(|t| t.derived_eth).unwrap_or_default();
        safe_mul(derived, eth_price)
    };

    let snapshot = LiquidityPositionSnapshot {
        id: format!("{}-{}", position.id, meta.timestamp),
        liquidity_position: position.id.clone(),
        timestamp: meta.timestamp,
        block: meta.block_number,
        user: position.user,
        pair: pair.id,
        token0_price_usd: price_usd(&pair.token0),
        token1_price_usd: price_usd(&pair.token1),
        reserve0: pair.reserve0,
        reserve1: pair.reserve1,
        reserve_usd: pair.reserve_usd,
        liquidity_token_total_supply: pair.total_supply,
        liquidity_token_balance: position.liquidity_token_balance,
    };
    store.save_snapshot(snapshot);
}

/// Source of liquidity-token balances
pub trait BalanceSource {
    /// Raw balance of `owner` in the pair's liquidity token; None if unknown
    fn balance_of(&self, pair: &Address, owner: &Address) -> Option<U256>;

    /// Observe a liquidity-token transfer before balances are queried
    fn record_transfer(&mut self, _pair: &Address, _from: &Address, _to: &Address, _value: U256) {}
}

/// Balances reconstructed by replaying liquidity-token transfers in order.
/// The zero address is never tracked (mints and burns).
#[derive(Debug, Default)]
pub struct TransferLedger {
    balances: HashMap<(Address, Address), U256>,
}

impl TransferLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceSource for TransferLedger {
    fn balance_of(&self, pair: &Address, owner: &Address) -> Option<U256> {
        if owner.is_zero() {
            return None;
        }
        Some(self.balances.get(&(*pair, *owner)).copied().unwrap_or_default())
    }

    fn record_transfer(&mut self, pair: &Address, from: &Address, to: &Address, value: U256) {
        if !from.is_zero() {
            let balance = self.balances.entry((*pair, *from)).or_default();
            *balance = balance.saturating_sub(value);
        }
        if !to.is_zero() {
            let balance = self.balances.entry((*pair, *to)).or_default();
            *balance = balance.saturating_add(value);
        }
    }
}
