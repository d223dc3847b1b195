//! Price Oracle
//!
//! Reference-currency (ETH) and USD pricing used by the handlers:
//! - ETH/USD from a reserve-weighted average over stablecoin/WETH pairs
//! - per-token ETH price by walking pairs against whitelisted tokens
//! - "tracked" USD volume and liquidity that only count whitelisted legs
//!
//! Created: 2026-10-12
//! Modified: 2026-10-18 - Checked products in the oracle

use crate::config::PricingConfig;
use crate::math::{safe_div, safe_mul};
use crate::store::EntityStore;
use crate::types::{Pair, Token};
use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

/// Pricing collaborator consumed by the handlers.
/// All reads go through the store passed in; implementations hold no entities.
pub trait PriceOracle {
    /// Current ETH price in USD
    fn eth_price_in_usd(&self, store: &EntityStore) -> Decimal;

    /// Token price in ETH; zero when no price path exists
    fn find_eth_per_token(&self, store: &EntityStore, token: &Token) -> Decimal;

    /// USD volume counted only through whitelisted tokens; zero if neither is
    fn tracked_volume_usd(
        &self,
        store: &EntityStore,
        amount0: Decimal,
        token0: &Token,
        amount1: Decimal,
        token1: &Token,
        pair: &Pair,
    ) -> Decimal;

    /// USD liquidity counted only through whitelisted tokens; zero if neither is
    fn tracked_liquidity_usd(
        &self,
        store: &EntityStore,
        reserve0: Decimal,
        token0: &Token,
        reserve1: Decimal,
        token1: &Token,
    ) -> Decimal;
}

/// Whitelist-traversal oracle
pub struct WhitelistOracle {
    weth: Address,
    stable_pairs: Vec<Address>,
    /// Ordered: the first whitelist token with a qualifying pair wins
    whitelist: Vec<Address>,
    whitelist_set: HashSet<Address>,
    minimum_liquidity_threshold_eth: Decimal,
}

impl WhitelistOracle {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            weth: config.weth_address,
            stable_pairs: config.stable_pairs.clone(),
            whitelist: config.whitelist.clone(),
            whitelist_set: config.whitelist.iter().copied().collect(),
            minimum_liquidity_threshold_eth: config.minimum_liquidity_threshold_eth,
        }
    }

    pub fn is_whitelisted(&self, token: &Address) -> bool {
        self.whitelist_set.contains(token)
    }

    /// USD price of one unit of `token` at the stored bundle price
    fn token_price_usd(&self, store: &EntityStore, token: &Token) -> Decimal {
        let eth_price = store.load_bundle().map(|b| b.eth_price).unwrap_or_default();
        safe_mul(token.derived_eth.unwrap_or_default(), eth_price)
    }
}

impl PriceOracle for WhitelistOracle {
    fn eth_price_in_usd(&self, store: &EntityStore) -> Decimal {
        let mut weighted = Decimal::ZERO;
        let mut total_weight = Decimal::ZERO;

        for pair in self.stable_pairs.iter().filter_map(|a| store.load_pair(a)) {
            // token0Price = stable per WETH when WETH is token1, and vice versa
            let (price, weight) = if pair.token1 == self.weth {
                (pair.token0_price, pair.reserve1)
            } else if pair.token0 == self.weth {
                (pair.token1_price, pair.reserve0)
            } else {
                debug!("Stable pair {:?} has no WETH side, skipping", pair.id);
                continue;
            };
            let (Some(next_weighted), Some(next_weight)) = (
                price.checked_mul(weight).and_then(|product| weighted.checked_add(product)),
                total_weight.checked_add(weight),
            ) else {
                debug!("Stable pair {:?} out of decimal range, skipping", pair.id);
                continue;
            };
            weighted = next_weighted;
            total_weight = next_weight;
        }

        safe_div(weighted, total_weight)
    }

    fn find_eth_per_token(&self, store: &EntityStore, token: &Token) -> Decimal {
        if token.id == self.weth {
            return Decimal::ONE;
        }

        for reference in &self.whitelist {
            let pair = match store
                .pair_for_tokens(&token.id, reference)
                .and_then(|address| store.load_pair(&address))
            {
                Some(pair) => pair,
                None => continue,
            };

            if pair.reserve_eth <= self.minimum_liquidity_threshold_eth {
                continue;
            }

            if pair.token0 == token.id {
                if let Some(derived) = store.load_token(&pair.token1).and_then(|t| t.derived_eth) {
                    return safe_mul(pair.token1_price, derived);
                }
            }
            if pair.token1 == token.id {
                if let Some(derived) = store.load_token(&pair.token0).and_then(|t| t.derived_eth) {
                    return safe_mul(pair.token0_price, derived);
                }
            }
        }

        Decimal::ZERO
    }

    fn tracked_volume_usd(
        &self,
        store: &EntityStore,
        amount0: Decimal,
        token0: &Token,
        amount1: Decimal,
        token1: &Token,
        _pair: &Pair,
    ) -> Decimal {
        let leg0 = safe_mul(amount0, self.token_price_usd(store, token0));
        let leg1 = safe_mul(amount1, self.token_price_usd(store, token1));

        match (self.is_whitelisted(&token0.id), self.is_whitelisted(&token1.id)) {
            (true, true) => leg0.saturating_add(leg1) / Decimal::TWO,
            (true, false) => leg0,
            (false, true) => leg1,
            (false, false) => Decimal::ZERO,
        }
    }

    fn tracked_liquidity_usd(
        &self,
        store: &EntityStore,
        reserve0: Decimal,
        token0: &Token,
        reserve1: Decimal,
        token1: &Token,
    ) -> Decimal {
        let leg0 = safe_mul(reserve0, self.token_price_usd(store, token0));
        let leg1 = safe_mul(reserve1, self.token_price_usd(store, token1));

        match (self.is_whitelisted(&token0.id), self.is_whitelisted(&token1.id)) {
            (true, true) => leg0.saturating_add(leg1),
            (true, false) => leg0.saturating_mul(Decimal::TWO),
            (false, true) => leg1.saturating_mul(Decimal::TWO),
            (false, false) => Decimal::ZERO,
        }
    }
}
