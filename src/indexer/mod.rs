//! Pair Event Indexer
//!
//! Single-threaded state machine applied to the ordered pair event stream.
//! Handlers are split by concern:
//! - `correlator`: liquidity-token transfers → logical mints/burns
//! - `sync`: reserves, prices and protocol liquidity
//! - `finalizer`: Mint/Burn/Swap amounts, counters and rollups
//!
//! Every handler returns `Result`, and every conversion that can fail runs
//! before the first write, so an `Err` leaves the store untouched.
//! `process` is the non-fatal boundary: errors are logged and the stream
//! moves on.
//!
//! Created: 2026-10-13

mod correlator;
mod finalizer;
mod sync;

use crate::config::IndexerConfig;
use crate::error::Result;
use crate::events::{PairCreated, PairEvent, TokenInfo};
use crate::positions::{BalanceSource, TransferLedger};
use crate::pricing::{PriceOracle, WhitelistOracle};
use crate::store::EntityStore;
use crate::types::{Bundle, Pair, Protocol, Token};
use tracing::{debug, info, warn};

pub struct Indexer<O: PriceOracle, B: BalanceSource> {
    config: IndexerConfig,
    store: EntityStore,
    oracle: O,
    balances: B,
}

impl Indexer<WhitelistOracle, TransferLedger> {
    /// Indexer with the whitelist oracle and replayed LP balances
    pub fn from_config(config: IndexerConfig) -> Self {
        let oracle = WhitelistOracle::new(&config.pricing);
        Self::new(config, oracle, TransferLedger::new())
    }
}

impl<O: PriceOracle, B: BalanceSource> Indexer<O, B> {
    pub fn new(config: IndexerConfig, oracle: O, balances: B) -> Self {
        Self {
            config,
            store: EntityStore::new(),
            oracle,
            balances,
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn into_store(self) -> EntityStore {
        self.store
    }

    /// Apply one event. Failures are logged and never propagate.
    pub fn process(&mut self, event: &PairEvent) {
        let result = match event {
            PairEvent::PairCreated(e) => self.handle_pair_created(e),
            PairEvent::Transfer(e) => self.handle_transfer(e),
            PairEvent::Sync(e) => self.handle_sync(e),
            PairEvent::Mint(e) => self.handle_mint(e),
            PairEvent::Burn(e) => self.handle_burn(e),
            PairEvent::Swap(e) => self.handle_swap(e),
        };

        if let Err(e) = result {
            let meta = event.meta();
            warn!(
                "Skipping {} (tx {:?}, log {}): {}",
                event.name(),
                meta.tx_hash,
                meta.log_index,
                e
            );
        }
    }

    /// Register a new pair, its tokens, and the protocol/bundle singletons
    pub fn handle_pair_created(&mut self, event: &PairCreated) -> Result<()> {
        if self.store.load_pair(&event.pair).is_some() {
            debug!("Pair {:?} already indexed", event.pair);
            return Ok(());
        }

        let mut protocol = self
            .store
            .load_protocol()
            .unwrap_or_else(|| Protocol::new(self.config.factory_address));
        protocol.pair_count += 1;
        self.store.save_protocol(protocol);

        if self.store.load_bundle().is_none() {
            self.store.save_bundle(Bundle::default());
        }

        self.ensure_token(&event.token0);
        self.ensure_token(&event.token1);

        let pair = Pair::new(
            event.pair,
            event.token0.address,
            event.token1.address,
            event.meta.timestamp,
            event.meta.block_number,
        );
        self.store.save_pair(pair);

        info!(
            "Pair created: {:?} ({} / {})",
            event.pair, event.token0.symbol, event.token1.symbol
        );
        Ok(())
    }

    fn ensure_token(&mut self, info: &TokenInfo) {
        if self.store.load_token(&info.address).is_some() {
            return;
        }
        if info.decimals.is_none() {
            warn!("Token {:?} has unknown decimals; its amounts will not be indexed", info.address);
        }
        self.store.save_token(Token::new(
            info.address,
            info.symbol.clone(),
            info.name.clone(),
            info.decimals,
        ));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::events::EventMeta;
    use alloy::primitives::{Address, B256};

    pub const FACTORY: Address = Address::repeat_byte(0xfa);
    pub const PAIR: Address = Address::repeat_byte(0xaa);
    pub const TOKEN0: Address = Address::repeat_byte(0x10);
    pub const TOKEN1: Address = Address::repeat_byte(0x11);

    pub fn create_test_meta(tx: u8, log_index: u64) -> EventMeta {
        EventMeta {
            address: PAIR,
            tx_hash: B256::repeat_byte(tx),
            tx_from: Address::repeat_byte(0x99),
            block_number: 100,
            timestamp: 1_700_000_000,
            log_index,
        }
    }

    pub fn create_test_pair_created(decimals0: Option<u8>, decimals1: Option<u8>) -> PairCreated {
        PairCreated {
            meta: EventMeta {
                address: FACTORY,
                ..create_test_meta(0x01, 0)
            },
            pair: PAIR,
            token0: TokenInfo {
                address: TOKEN0,
                symbol: "TK0".to_string(),
                name: "Token Zero".to_string(),
                decimals: decimals0,
            },
            token1: TokenInfo {
                address: TOKEN1,
                symbol: "TK1".to_string(),
                name: "Token One".to_string(),
                decimals: decimals1,
            },
        }
    }

    /// Indexer with one 18/6-decimal pair registered
    pub fn create_test_indexer() -> Indexer<WhitelistOracle, TransferLedger> {
        let mut indexer = Indexer::from_config(IndexerConfig::new(FACTORY));
        indexer
            .handle_pair_created(&create_test_pair_created(Some(18), Some(6)))
            .unwrap();
        indexer
    }

    #[test]
    fn test_pair_created_initialises_singletons() {
        let indexer = create_test_indexer();
        let store = indexer.store();

        let protocol = store.load_protocol().unwrap();
        assert_eq!(protocol.id, FACTORY);
        assert_eq!(protocol.pair_count, 1);
        assert!(store.load_bundle().is_some());
        assert_eq!(store.pair_for_tokens(&TOKEN1, &TOKEN0), Some(PAIR));
        assert_eq!(store.load_token(&TOKEN1).unwrap().decimals, Some(6));
    }

    #[test]
    fn test_pair_created_twice_is_noop() {
        let mut indexer = create_test_indexer();
        indexer.process(&PairEvent::PairCreated(create_test_pair_created(Some(18), Some(6))));
        assert_eq!(indexer.store().load_protocol().unwrap().pair_count, 1);
    }

    #[test]
    fn test_unknown_decimals_still_creates_token() {
        let mut indexer = Indexer::from_config(IndexerConfig::new(FACTORY));
        indexer
            .handle_pair_created(&create_test_pair_created(None, Some(6)))
            .unwrap();
        assert_eq!(indexer.store().load_token(&TOKEN0).unwrap().decimals, None);
    }
}
