//! Reserve/Price Updater
//!
//! On Sync the pair's stale contributions are removed from the token and
//! protocol totals, reserves and prices are recomputed, and the fresh
//! contributions are added back. The protocol's `total_liquidity_eth` thus
//! always equals the sum of every pair's latest `tracked_reserve_eth`.
//!
//! Created: 2026-10-13
//! Modified: 2026-10-18 - Out-of-range ratios degrade to zero

use super::Indexer;
use crate::error::Result;
use crate::events::Sync;
use crate::math::{convert_token_to_decimal, safe_div, safe_mul};
use crate::positions::BalanceSource;
use crate::pricing::PriceOracle;
use crate::types::{accumulate, deduct};
use rust_decimal::Decimal;
use tracing::debug;

impl<O: PriceOracle, B: BalanceSource> Indexer<O, B> {
    pub fn handle_sync(&mut self, event: &Sync) -> Result<()> {
        let meta = &event.meta;

        let Some(mut pair) = self.store.load_pair(&meta.address) else {
            debug!("Sync for untracked pair {:?}", meta.address);
            return Ok(());
        };
        let (Some(mut token0), Some(mut token1), Some(mut protocol)) = (
            self.store.load_token(&pair.token0),
            self.store.load_token(&pair.token1),
            self.store.load_protocol(),
        ) else {
            debug!("Sync skipped, pair {:?} not fully initialised", pair.id);
            return Ok(());
        };

        let reserve0 = token0
            .decimals
            .map(|d| convert_token_to_decimal(event.reserve0, d))
            .transpose()?;
        let reserve1 = token1
            .decimals
            .map(|d| convert_token_to_decimal(event.reserve1, d))
            .transpose()?;

        protocol.total_liquidity_eth = protocol
            .total_liquidity_eth
            .saturating_sub(pair.tracked_reserve_eth);
        deduct(&mut token0.total_liquidity, pair.reserve0);
        deduct(&mut token1.total_liquidity, pair.reserve1);

        if let Some(reserve0) = reserve0 {
            pair.reserve0 = reserve0;
        }
        if let Some(reserve1) = reserve1 {
            pair.reserve1 = reserve1;
        }
        pair.token0_price = safe_div(pair.reserve0, pair.reserve1);
        pair.token1_price = safe_div(pair.reserve1, pair.reserve0);

        // the oracle reads the new reserves from the store
        self.store.save_pair(pair.clone());

        if let Some(mut bundle) = self.store.load_bundle() {
            bundle.eth_price = self.oracle.eth_price_in_usd(&self.store);
            self.store.save_bundle(bundle.clone());

            let derived0 = self.oracle.find_eth_per_token(&self.store, &token0);
            let derived1 = self.oracle.find_eth_per_token(&self.store, &token1);
            token0.derived_eth = Some(derived0);
            token1.derived_eth = Some(derived1);

            let tracked_liquidity_eth = safe_div(
                self.oracle.tracked_liquidity_usd(
                    &self.store,
                    pair.reserve0,
                    &token0,
                    pair.reserve1,
                    &token1,
                ),
                bundle.eth_price,
            );

            pair.tracked_reserve_eth = tracked_liquidity_eth;
            pair.reserve_eth = safe_mul(pair.reserve0, derived0)
                .saturating_add(safe_mul(pair.reserve1, derived1));
            pair.reserve_usd = safe_mul(pair.reserve_eth, bundle.eth_price);

            protocol.total_liquidity_eth = protocol
                .total_liquidity_eth
                .saturating_add(tracked_liquidity_eth);
            protocol.total_liquidity_usd = safe_mul(protocol.total_liquidity_eth, bundle.eth_price);
        } else {
            // no price yet: restore the contribution removed above
            protocol.total_liquidity_eth = protocol
                .total_liquidity_eth
                .saturating_add(pair.tracked_reserve_eth);
        }

        accumulate(&mut token0.total_liquidity, pair.reserve0);
        accumulate(&mut token1.total_liquidity, pair.reserve1);

        debug!(
            "Sync {:?}: reserves {} / {}, tracked {} ETH",
            pair.id, pair.reserve0, pair.reserve1, pair.tracked_reserve_eth
        );

        self.store.save_pair(pair);
        self.store.save_protocol(protocol);
        self.store.save_token(token0);
        self.store.save_token(token1);
        Ok(())
    }
}
