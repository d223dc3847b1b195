//! Mint/Burn/Swap Finalizer
//!
//! Attaches token amounts and USD value to the logical operation opened by
//! the correlator (or, for swaps, creates it), bumps the pair/token/protocol
//! counters and feeds the day/hour rollups.
//!
//! Created: 2026-10-13
//! Modified: 2026-10-14 - Amounts finalized even when derived prices are missing
//! Modified: 2026-10-18 - Volume and value arithmetic saturates instead of panicking

use super::Indexer;
use crate::error::Result;
use crate::events::{Burn, EventMeta, Mint, Swap};
use crate::math::{convert_token_to_decimal, safe_div, safe_mul};
use crate::positions::{create_liquidity_position, create_liquidity_snapshot, BalanceSource};
use crate::pricing::PriceOracle;
use crate::rollups::{
    update_pair_day_data, update_pair_hour_data, update_protocol_day_data, update_token_day_data,
};
use crate::types::{accumulate, bump, operation_id, Pair, SwapEvent, Token, Transaction};
use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::debug;

impl<O: PriceOracle, B: BalanceSource> Indexer<O, B> {
    pub fn handle_mint(&mut self, event: &Mint) -> Result<()> {
        let meta = &event.meta;

        let Some(mut mint) = self
            .store
            .load_transaction(&meta.tx_hash)
            .and_then(|tx| tx.mints.last().cloned())
            .and_then(|id| self.store.load_mint(&id))
        else {
            debug!("Mint without an open logical mint in tx {:?}", meta.tx_hash);
            return Ok(());
        };
        let Some((mut pair, mut token0, mut token1)) = self.load_priced_pair(&meta.address) else {
            return Ok(());
        };
        let Some(mut protocol) = self.store.load_protocol() else {
            debug!("Mint skipped, protocol not initialised");
            return Ok(());
        };
        let (amount0, amount1) = self.convert_pair_amounts(&token0, event.amount0, &token1, event.amount1)?;

        bump(&mut token0.tx_count);
        bump(&mut token1.tx_count);
        pair.tx_count += 1;
        protocol.tx_count += 1;

        mint.sender = Some(event.sender);
        mint.amount0 = Some(amount0);
        mint.amount1 = Some(amount1);
        mint.log_index = Some(meta.log_index);
        mint.amount_usd = self.liquidity_value_usd(&token0, amount0, &token1, amount1);

        let provider = mint.to;
        self.store.save_token(token0.clone());
        self.store.save_token(token1.clone());
        self.store.save_protocol(protocol);
        self.store.save_mint(mint);

        self.refresh_position(&mut pair, provider, meta);
        self.store.save_pair(pair);
        self.update_rollups(&token0, &token1, meta);
        Ok(())
    }

    pub fn handle_burn(&mut self, event: &Burn) -> Result<()> {
        let meta = &event.meta;

        let Some(transaction) = self.store.load_transaction(&meta.tx_hash) else {
            debug!("Burn before any transfer in tx {:?}", meta.tx_hash);
            return Ok(());
        };
        let Some(mut burn) = transaction.burns.last().and_then(|id| self.store.load_burn(id)) else {
            return Ok(());
        };
        let Some((mut pair, mut token0, mut token1)) = self.load_priced_pair(&meta.address) else {
            return Ok(());
        };
        let Some(mut protocol) = self.store.load_protocol() else {
            debug!("Burn skipped, protocol not initialised");
            return Ok(());
        };
        let (amount0, amount1) = self.convert_pair_amounts(&token0, event.amount0, &token1, event.amount1)?;

        bump(&mut token0.tx_count);
        bump(&mut token1.tx_count);
        pair.tx_count += 1;
        protocol.tx_count += 1;

        // sender and recipient were recorded by the transfer correlator
        burn.amount0 = Some(amount0);
        burn.amount1 = Some(amount1);
        burn.log_index = Some(meta.log_index);
        burn.amount_usd = self.liquidity_value_usd(&token0, amount0, &token1, amount1);

        let provider = burn.sender;
        self.store.save_token(token0.clone());
        self.store.save_token(token1.clone());
        self.store.save_protocol(protocol);
        self.store.save_burn(burn);

        if let Some(provider) = provider {
            self.refresh_position(&mut pair, provider, meta);
        }
        self.store.save_pair(pair);
        self.update_rollups(&token0, &token1, meta);
        Ok(())
    }

    pub fn handle_swap(&mut self, event: &Swap) -> Result<()> {
        let meta = &event.meta;

        let Some((mut pair, mut token0, mut token1)) = self.load_priced_pair(&meta.address) else {
            return Ok(());
        };
        let Some(bundle) = self.store.load_bundle() else {
            debug!("Swap skipped, no price bundle");
            return Ok(());
        };
        let (amount0_in, amount1_in) =
            self.convert_pair_amounts(&token0, event.amount0_in, &token1, event.amount1_in)?;
        let (amount0_out, amount1_out) =
            self.convert_pair_amounts(&token0, event.amount0_out, &token1, event.amount1_out)?;

        let amount0_total = amount0_in.saturating_add(amount0_out);
        let amount1_total = amount1_in.saturating_add(amount1_out);

        let derived_amount_usd = match (token0.derived_eth, token1.derived_eth) {
            (Some(d0), Some(d1)) => {
                let value_eth = value_in_eth(d0, amount0_total, d1, amount1_total);
                Some(safe_mul(value_eth / Decimal::TWO, bundle.eth_price))
            }
            _ => None,
        };
        let tracked_amount_usd = self.oracle.tracked_volume_usd(
            &self.store,
            amount0_total,
            &token0,
            amount1_total,
            &token1,
            &pair,
        );
        let tracked_amount_eth = safe_div(tracked_amount_usd, bundle.eth_price);
        let untracked_usd = derived_amount_usd.unwrap_or_default();

        accumulate(&mut token0.trade_volume, amount0_total);
        accumulate(&mut token0.trade_volume_usd, tracked_amount_usd);
        accumulate(&mut token0.untracked_volume_usd, untracked_usd);
        bump(&mut token0.tx_count);

        accumulate(&mut token1.trade_volume, amount1_total);
        accumulate(&mut token1.trade_volume_usd, tracked_amount_usd);
        accumulate(&mut token1.untracked_volume_usd, untracked_usd);
        bump(&mut token1.tx_count);

        pair.volume_usd = pair.volume_usd.saturating_add(tracked_amount_usd);
        pair.volume_token0 = pair.volume_token0.saturating_add(amount0_total);
        pair.volume_token1 = pair.volume_token1.saturating_add(amount1_total);
        pair.untracked_volume_usd = pair.untracked_volume_usd.saturating_add(untracked_usd);
        pair.tx_count += 1;

        if let Some(mut protocol) = self.store.load_protocol() {
            protocol.total_volume_usd = protocol.total_volume_usd.saturating_add(tracked_amount_usd);
            protocol.total_volume_eth = protocol.total_volume_eth.saturating_add(tracked_amount_eth);
            protocol.untracked_volume_usd = protocol.untracked_volume_usd.saturating_add(untracked_usd);
            protocol.tx_count += 1;
            self.store.save_protocol(protocol);
        }

        self.store.save_pair(pair);
        self.store.save_token(token0.clone());
        self.store.save_token(token1.clone());

        let mut transaction = self
            .store
            .load_transaction(&meta.tx_hash)
            .unwrap_or_else(|| Transaction::new(meta.tx_hash, meta.block_number, meta.timestamp));

        let amount_usd = if !tracked_amount_usd.is_zero() {
            tracked_amount_usd
        } else {
            untracked_usd
        };
        let swap = SwapEvent {
            id: operation_id(&transaction.id, transaction.swaps.len()),
            transaction: transaction.id,
            timestamp: transaction.timestamp,
            pair: meta.address,
            sender: event.sender,
            from: meta.tx_from,
            to: event.to,
            amount0_in,
            amount1_in,
            amount0_out,
            amount1_out,
            log_index: meta.log_index,
            amount_usd,
        };
        debug!("Swap {} worth ${}", swap.id, swap.amount_usd);
        transaction.swaps.push(swap.id.clone());
        self.store.save_swap(swap);
        self.store.save_transaction(transaction);

        if let Some(mut day) = update_pair_day_data(&mut self.store, meta) {
            day.daily_volume_token0 = day.daily_volume_token0.saturating_add(amount0_total);
            day.daily_volume_token1 = day.daily_volume_token1.saturating_add(amount1_total);
            day.daily_volume_usd = day.daily_volume_usd.saturating_add(tracked_amount_usd);
            self.store.save_pair_day_data(day);
        }
        if let Some(mut hour) = update_pair_hour_data(&mut self.store, meta) {
            hour.hourly_volume_token0 = hour.hourly_volume_token0.saturating_add(amount0_total);
            hour.hourly_volume_token1 = hour.hourly_volume_token1.saturating_add(amount1_total);
            hour.hourly_volume_usd = hour.hourly_volume_usd.saturating_add(tracked_amount_usd);
            self.store.save_pair_hour_data(hour);
        }
        if let Some(mut day) = update_protocol_day_data(&mut self.store, meta) {
            day.daily_volume_usd = day.daily_volume_usd.saturating_add(tracked_amount_usd);
            day.daily_volume_eth = day.daily_volume_eth.saturating_add(tracked_amount_eth);
            day.daily_volume_untracked = day.daily_volume_untracked.saturating_add(untracked_usd);
            self.store.save_protocol_day_data(day);
        }
        for (token, amount_total) in [(&token0, amount0_total), (&token1, amount1_total)] {
            let mut day = update_token_day_data(&mut self.store, token, meta);
            let volume_eth = safe_mul(amount_total, token.derived_eth.unwrap_or_default());
            day.daily_volume_token = day.daily_volume_token.saturating_add(amount_total);
            day.daily_volume_eth = day.daily_volume_eth.saturating_add(volume_eth);
            day.daily_volume_usd = day
                .daily_volume_usd
                .saturating_add(safe_mul(volume_eth, bundle.eth_price));
            self.store.save_token_day_data(day);
        }

        Ok(())
    }

    /// Pair and both tokens, all with known decimals
    fn load_priced_pair(&self, address: &Address) -> Option<(Pair, Token, Token)> {
        let Some(pair) = self.store.load_pair(address) else {
            debug!("Event for untracked pair {:?}", address);
            return None;
        };
        let token0 = self.store.load_token(&pair.token0)?;
        let token1 = self.store.load_token(&pair.token1)?;
        if token0.decimals.is_none() || token1.decimals.is_none() {
            debug!("Pair {:?} has a token with unknown decimals", pair.id);
            return None;
        }
        Some((pair, token0, token1))
    }

    fn convert_pair_amounts(
        &self,
        token0: &Token,
        raw0: U256,
        token1: &Token,
        raw1: U256,
    ) -> Result<(Decimal, Decimal)> {
        let amount0 = convert_token_to_decimal(raw0, token0.decimals.unwrap_or_default())?;
        let amount1 = convert_token_to_decimal(raw1, token1.decimals.unwrap_or_default())?;
        Ok((amount0, amount1))
    }

    /// USD value of a liquidity change; None without derived prices or a bundle
    fn liquidity_value_usd(
        &self,
        token0: &Token,
        amount0: Decimal,
        token1: &Token,
        amount1: Decimal,
    ) -> Option<Decimal> {
        let bundle = self.store.load_bundle()?;
        let d0 = token0.derived_eth?;
        let d1 = token1.derived_eth?;
        Some(safe_mul(value_in_eth(d0, amount0, d1, amount1), bundle.eth_price))
    }

    fn refresh_position(&mut self, pair: &mut Pair, provider: Address, meta: &EventMeta) {
        let position = create_liquidity_position(&mut self.store, pair, provider);
        create_liquidity_snapshot(&mut self.store, &position, pair, meta);
    }

    fn update_rollups(&mut self, token0: &Token, token1: &Token, meta: &EventMeta) {
        update_pair_day_data(&mut self.store, meta);
        update_pair_hour_data(&mut self.store, meta);
        update_protocol_day_data(&mut self.store, meta);
        update_token_day_data(&mut self.store, token0, meta);
        update_token_day_data(&mut self.store, token1, meta);
    }
}

/// ETH value of a two-token amount at the given derived prices
fn value_in_eth(derived0: Decimal, amount0: Decimal, derived1: Decimal, amount1: Decimal) -> Decimal {
    safe_mul(derived1, amount1).saturating_add(safe_mul(derived0, amount0))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{create_test_indexer, create_test_meta, PAIR, TOKEN0, TOKEN1};
    use crate::events::{Burn, Mint, PairEvent, Swap, Transfer};
    use crate::rollups::day_start;
    use crate::types::position_id;
    use alloy::primitives::{Address, B256, U256};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const ALICE: Address = Address::repeat_byte(0x01);
    const ROUTER: Address = Address::repeat_byte(0x0e);

    fn transfer(tx: u8, log_index: u64, from: Address, to: Address, value: u64) -> PairEvent {
        PairEvent::Transfer(Transfer {
            meta: create_test_meta(tx, log_index),
            from,
            to,
            value: U256::from(value),
        })
    }

    fn mint(tx: u8, log_index: u64, amount0: u128, amount1: u128) -> PairEvent {
        PairEvent::Mint(Mint {
            meta: create_test_meta(tx, log_index),
            sender: ROUTER,
            amount0: U256::from(amount0),
            amount1: U256::from(amount1),
        })
    }

    #[test]
    fn test_mint_completes_open_mint() {
        let mut indexer = create_test_indexer();
        indexer.process(&transfer(1, 0, Address::ZERO, ALICE, 5_000));
        indexer.process(&mint(1, 1, 1_000_000_000_000_000_000, 2_000_000));

        let store = indexer.store();
        let transaction = store.load_transaction(&B256::repeat_byte(1)).unwrap();
        let record = store.load_mint(&transaction.mints[0]).unwrap();
        assert!(record.is_complete());
        assert_eq!(record.sender, Some(ROUTER));
        assert_eq!(record.amount0, Some(dec!(1)));
        assert_eq!(record.amount1, Some(dec!(2)));
        assert_eq!(record.log_index, Some(1));
        // bundle price is zero until a stable pair syncs
        assert_eq!(record.amount_usd, Some(Decimal::ZERO));

        assert_eq!(store.load_pair(&PAIR).unwrap().tx_count, 1);
        assert_eq!(store.load_protocol().unwrap().tx_count, 1);
        assert_eq!(store.load_token(&TOKEN0).unwrap().tx_count, Some(1));

        let date = day_start(1_700_000_000);
        assert_eq!(store.load_pair_day_data(&PAIR, date).unwrap().daily_txns, 1);
        assert_eq!(store.load_token_day_data(&TOKEN1, date).unwrap().daily_txns, 1);
        assert!(store.load_protocol_day_data(date).is_some());

        // transfer snapshot plus the mint snapshot share a timestamp
        let position = position_id(&PAIR, &ALICE);
        assert_eq!(store.snapshots_for(&position).len(), 1);
    }

    #[test]
    fn test_mint_without_transaction_is_noop() {
        let mut indexer = create_test_indexer();
        indexer.process(&mint(1, 0, 1, 1));

        assert_eq!(indexer.store().load_pair(&PAIR).unwrap().tx_count, 0);
        assert_eq!(indexer.store().load_protocol().unwrap().tx_count, 0);
    }

    #[test]
    fn test_mint_without_derived_price_leaves_usd_unset() {
        let mut indexer = create_test_indexer();
        let mut token0 = indexer.store.load_token(&TOKEN0).unwrap();
        token0.derived_eth = None;
        indexer.store.save_token(token0);

        indexer.process(&transfer(1, 0, Address::ZERO, ALICE, 5_000));
        indexer.process(&mint(1, 1, 10, 10));

        let store = indexer.store();
        let transaction = store.load_transaction(&B256::repeat_byte(1)).unwrap();
        let record = store.load_mint(&transaction.mints[0]).unwrap();
        assert!(record.is_complete());
        assert_eq!(record.amount_usd, None);
        assert_eq!(store.load_pair(&PAIR).unwrap().tx_count, 1);
    }

    #[test]
    fn test_burn_finalizes_tail_burn() {
        let mut indexer = create_test_indexer();
        indexer.process(&transfer(1, 0, Address::ZERO, ALICE, 5_000));
        indexer.process(&transfer(2, 0, ALICE, PAIR, 2_000));
        indexer.process(&transfer(2, 1, PAIR, Address::ZERO, 2_000));
        indexer.process(&PairEvent::Burn(Burn {
            meta: create_test_meta(2, 2),
            sender: ROUTER,
            amount0: U256::from(3_000_000_000_000_000_000u128),
            amount1: U256::from(4_000_000u64),
            to: ALICE,
        }));

        let store = indexer.store();
        let transaction = store.load_transaction(&B256::repeat_byte(2)).unwrap();
        let burn = store.load_burn(&transaction.burns[0]).unwrap();
        assert_eq!(burn.amount0, Some(dec!(3)));
        assert_eq!(burn.amount1, Some(dec!(4)));
        assert_eq!(burn.log_index, Some(2));
        // untouched by the Burn event
        assert_eq!(burn.sender, Some(ALICE));
        assert_eq!(burn.to, Some(PAIR));
        assert_eq!(store.load_pair(&PAIR).unwrap().tx_count, 1);
    }

    #[test]
    fn test_burn_without_transaction_is_noop() {
        let mut indexer = create_test_indexer();
        indexer.process(&PairEvent::Burn(Burn {
            meta: create_test_meta(9, 0),
            sender: ROUTER,
            amount0: U256::from(1u64),
            amount1: U256::from(1u64),
            to: ALICE,
        }));
        assert!(indexer.store().load_transaction(&B256::repeat_byte(9)).is_none());
        assert_eq!(indexer.store().load_pair(&PAIR).unwrap().tx_count, 0);
    }

    #[test]
    fn test_swap_accumulates_volume() {
        let mut indexer = create_test_indexer();
        indexer.process(&PairEvent::Swap(Swap {
            meta: create_test_meta(4, 0),
            sender: ROUTER,
            amount0_in: U256::from(1_000_000_000_000_000_000u128),
            amount1_in: U256::ZERO,
            amount0_out: U256::ZERO,
            amount1_out: U256::from(2_500_000u64),
            to: ALICE,
        }));

        let store = indexer.store();
        let pair = store.load_pair(&PAIR).unwrap();
        assert_eq!(pair.volume_token0, dec!(1));
        assert_eq!(pair.volume_token1, dec!(2.5));
        assert_eq!(pair.tx_count, 1);
        assert_eq!(store.load_token(&TOKEN1).unwrap().trade_volume, Some(dec!(2.5)));
        assert_eq!(store.load_protocol().unwrap().tx_count, 1);

        let transaction = store.load_transaction(&B256::repeat_byte(4)).unwrap();
        let swap = store.load_swap(&transaction.swaps[0]).unwrap();
        assert_eq!(swap.from, Address::repeat_byte(0x99));
        assert_eq!(swap.to, ALICE);
        assert_eq!(swap.amount1_out, dec!(2.5));

        let date = day_start(1_700_000_000);
        let day = store.load_pair_day_data(&PAIR, date).unwrap();
        assert_eq!(day.daily_volume_token0, dec!(1));
        assert_eq!(day.daily_txns, 1);
        let token_day = store.load_token_day_data(&TOKEN0, date).unwrap();
        assert_eq!(token_day.daily_volume_token, dec!(1));
    }

    #[test]
    fn test_swaps_in_one_transaction_get_sequential_ids() {
        let mut indexer = create_test_indexer();
        for log_index in 0..2 {
            indexer.process(&PairEvent::Swap(Swap {
                meta: create_test_meta(5, log_index),
                sender: ROUTER,
                amount0_in: U256::from(1u64),
                amount1_in: U256::ZERO,
                amount0_out: U256::ZERO,
                amount1_out: U256::from(1u64),
                to: ALICE,
            }));
        }

        let transaction = indexer.store().load_transaction(&B256::repeat_byte(5)).unwrap();
        assert_eq!(transaction.swaps.len(), 2);
        assert!(transaction.swaps[0].ends_with("-0"));
        assert!(transaction.swaps[1].ends_with("-1"));
    }
}
