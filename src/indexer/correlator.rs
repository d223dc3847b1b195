//! Transaction Correlator
//!
//! Reconstructs logical mints and burns from liquidity-token transfers.
//! Within one transaction the pair contract emits, in order:
//!
//! ```text
//! add liquidity:     Transfer(0 → to)                        → Mint
//! remove liquidity:  Transfer(owner → pair)
//!                    [Transfer(0 → feeTo)]   protocol fee mint
//!                    Transfer(pair → 0)                      → Burn
//! ```
//!
//! Only the tail of each per-transaction list is ever inspected.
//!
//! Created: 2026-10-13
//! Modified: 2026-10-18 - Balance lookups no longer fail after the ledger write

use super::Indexer;
use crate::error::Result;
use crate::events::Transfer;
use crate::math::{convert_token_to_decimal, LP_TOKEN_DECIMALS};
use crate::positions::{
    create_liquidity_position, create_liquidity_snapshot, create_user, BalanceSource,
};
use crate::pricing::PriceOracle;
use crate::types::{operation_id, BurnEvent, MintEvent, Transaction};
use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::{debug, warn};

impl<O: PriceOracle, B: BalanceSource> Indexer<O, B> {
    pub fn handle_transfer(&mut self, event: &Transfer) -> Result<()> {
        let meta = &event.meta;

        // pool initialisation locks the minimum liquidity at the zero address
        if event.to.is_zero() && event.value == U256::from(self.config.minimum_liquidity) {
            debug!("Ignoring minimum-liquidity lock in tx {:?}", meta.tx_hash);
            return Ok(());
        }

        let Some(mut pair) = self.store.load_pair(&meta.address) else {
            debug!("Transfer for untracked pair {:?}", meta.address);
            return Ok(());
        };

        let value = convert_token_to_decimal(event.value, LP_TOKEN_DECIMALS)?;

        // nothing below can fail, so the ledger and the store move together
        self.balances
            .record_transfer(&pair.id, &event.from, &event.to, event.value);
        let from_balance = self.lp_balance(&pair.id, &event.from);
        let to_balance = self.lp_balance(&pair.id, &event.to);

        create_user(&mut self.store, event.from);
        create_user(&mut self.store, event.to);

        let mut transaction = self
            .store
            .load_transaction(&meta.tx_hash)
            .unwrap_or_else(|| Transaction::new(meta.tx_hash, meta.block_number, meta.timestamp));

        // mint: open a logical mint unless the tail one is still waiting for its Mint event
        if event.from.is_zero() {
            pair.total_supply = pair.total_supply.saturating_add(value);

            let tail_complete = transaction
                .mints
                .last()
                .map(|id| self.is_complete_mint(id));
            if tail_complete.unwrap_or(true) {
                let mint = MintEvent {
                    id: operation_id(&transaction.id, transaction.mints.len()),
                    transaction: transaction.id,
                    timestamp: transaction.timestamp,
                    pair: pair.id,
                    to: event.to,
                    liquidity: value,
                    sender: None,
                    amount0: None,
                    amount1: None,
                    log_index: None,
                    amount_usd: None,
                };
                debug!("Opened mint {}", mint.id);
                transaction.mints.push(mint.id.clone());
                self.store.save_mint(mint);
            }
        }

        // LP tokens sent back to the pair ahead of a burn
        if event.to == pair.id {
            let burn = BurnEvent {
                id: operation_id(&transaction.id, transaction.burns.len()),
                transaction: transaction.id,
                timestamp: transaction.timestamp,
                pair: pair.id,
                liquidity: value,
                sender: Some(event.from),
                to: Some(event.to),
                amount0: None,
                amount1: None,
                log_index: None,
                amount_usd: None,
                needs_complete: true,
                fee_to: None,
                fee_liquidity: None,
            };
            debug!("Opened burn {} (awaiting completion)", burn.id);
            transaction.burns.push(burn.id.clone());
            self.store.save_burn(burn);
        }

        // burn: the pair destroys the LP tokens it holds
        if event.to.is_zero() && event.from == pair.id {
            pair.total_supply = pair.total_supply.saturating_sub(value);

            let mut burn = match transaction.burns.last().and_then(|id| self.store.load_burn(id)) {
                Some(tail) if tail.needs_complete => tail,
                _ => BurnEvent {
                    id: operation_id(&transaction.id, transaction.burns.len()),
                    transaction: transaction.id,
                    timestamp: transaction.timestamp,
                    pair: pair.id,
                    liquidity: value,
                    sender: None,
                    to: None,
                    amount0: None,
                    amount1: None,
                    log_index: None,
                    amount_usd: None,
                    needs_complete: false,
                    fee_to: None,
                    fee_liquidity: None,
                },
            };

            // an incomplete mint right before the burn is the protocol fee mint
            if let Some(mint_id) = transaction.mints.last().cloned() {
                if !self.is_complete_mint(&mint_id) {
                    if let Some(fee_mint) = self.store.remove_mint(&mint_id) {
                        burn.fee_to = Some(fee_mint.to);
                        burn.fee_liquidity = Some(fee_mint.liquidity);
                    }
                    transaction.mints.pop();
                    debug!("Fee mint {} absorbed into burn {}", mint_id, burn.id);
                }
            }

            if burn.needs_complete {
                if let Some(tail) = transaction.burns.last_mut() {
                    *tail = burn.id.clone();
                }
            } else {
                transaction.burns.push(burn.id.clone());
            }
            self.store.save_burn(burn);
        }

        for (address, balance) in [(event.from, from_balance), (event.to, to_balance)] {
            if address.is_zero() || address == pair.id {
                continue;
            }
            let mut position = create_liquidity_position(&mut self.store, &mut pair, address);
            if let Some(balance) = balance {
                position.liquidity_token_balance = balance;
            }
            self.store.save_position(position.clone());
            create_liquidity_snapshot(&mut self.store, &position, &pair, meta);
        }

        self.store.save_transaction(transaction);
        self.store.save_pair(pair);
        Ok(())
    }

    /// Missing mints count as incomplete
    fn is_complete_mint(&self, id: &str) -> bool {
        self.store
            .load_mint(id)
            .map(|mint| mint.is_complete())
            .unwrap_or(false)
    }

    /// Authoritative balance after the transfer. An unrepresentable balance
    /// reads as unknown and the position keeps its stored value.
    fn lp_balance(&self, pair: &Address, owner: &Address) -> Option<Decimal> {
        let raw = self.balances.balance_of(pair, owner)?;
        match convert_token_to_decimal(raw, LP_TOKEN_DECIMALS) {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!("LP balance of {:?} in {:?} unavailable: {}", owner, pair, e);
                None
            }
        }
    }
}
