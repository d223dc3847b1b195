//! Contract Event Definitions
//!
//! Pair and factory event ABIs, defined using alloy's `sol!` macro, and the
//! mapping from raw logs to the indexer's `PairEvent`.
//!
//! Created: 2026-10-12
//! Modified: 2026-10-18 - decode_raw_log for the binary's raw replay mode

use crate::events::{
    Burn, EventMeta, Mint, PairCreated, PairEvent, RawLog, Swap, Sync, TokenInfo, Transfer,
};
use alloy::primitives::{Address, LogData, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use tracing::debug;

// ── Pair ─────────────────────────────────────────────────────────────

sol! {
    interface ITeleswapPair {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Mint(address indexed sender, uint256 amount0, uint256 amount1);
        event Burn(address indexed sender, uint256 amount0, uint256 amount1, address indexed to);
        event Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to);
        event Sync(uint112 reserve0, uint112 reserve1);
    }
}

// ── Factory ──────────────────────────────────────────────────────────

sol! {
    interface ITeleswapFactory {
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 pairIndex);
    }
}

/// Decode a pair log into a `PairEvent`. Unknown or undecodable logs → None.
pub fn decode_pair_log(log: &LogData, meta: EventMeta) -> Option<PairEvent> {
    let topic0 = *log.topics().first()?;

    let event = if topic0 == ITeleswapPair::Transfer::SIGNATURE_HASH {
        let ev = ITeleswapPair::Transfer::decode_log_data(log).ok()?;
        PairEvent::Transfer(Transfer {
            meta,
            from: ev.from,
            to: ev.to,
            value: ev.value,
        })
    } else if topic0 == ITeleswapPair::Sync::SIGNATURE_HASH {
        let ev = ITeleswapPair::Sync::decode_log_data(log).ok()?;
        PairEvent::Sync(Sync {
            meta,
            reserve0: U256::from(ev.reserve0),
            reserve1: U256::from(ev.reserve1),
        })
    } else if topic0 == ITeleswapPair::Mint::SIGNATURE_HASH {
        let ev = ITeleswapPair::Mint::decode_log_data(log).ok()?;
        PairEvent::Mint(Mint {
            meta,
            sender: ev.sender,
            amount0: ev.amount0,
            amount1: ev.amount1,
        })
    } else if topic0 == ITeleswapPair::Burn::SIGNATURE_HASH {
        let ev = ITeleswapPair::Burn::decode_log_data(log).ok()?;
        PairEvent::Burn(Burn {
            meta,
            sender: ev.sender,
            amount0: ev.amount0,
            amount1: ev.amount1,
            to: ev.to,
        })
    } else if topic0 == ITeleswapPair::Swap::SIGNATURE_HASH {
        let ev = ITeleswapPair::Swap::decode_log_data(log).ok()?;
        PairEvent::Swap(Swap {
            meta,
            sender: ev.sender,
            amount0_in: ev.amount0In,
            amount1_in: ev.amount1In,
            amount0_out: ev.amount0Out,
            amount1_out: ev.amount1Out,
            to: ev.to,
        })
    } else {
        debug!("Ignoring log with unknown topic {:?}", topic0);
        return None;
    };

    Some(event)
}

/// Decode a factory `PairCreated` log into (token0, token1, pair).
/// Token metadata is resolved by the caller.
pub fn decode_pair_created(log: &LogData) -> Option<(Address, Address, Address)> {
    let topic0 = *log.topics().first()?;
    if topic0 != ITeleswapFactory::PairCreated::SIGNATURE_HASH {
        return None;
    }
    let ev = ITeleswapFactory::PairCreated::decode_log_data(log).ok()?;
    Some((ev.token0, ev.token1, ev.pair))
}

/// Decode an exported log, factory or pair. Factory tokens missing from
/// `raw.tokens` are registered with unknown decimals.
pub fn decode_raw_log(raw: &RawLog) -> Option<PairEvent> {
    let log = LogData::new(raw.topics.clone(), raw.data.clone())?;

    if let Some((token0, token1, pair)) = decode_pair_created(&log) {
        let info = |address: Address| {
            raw.tokens
                .iter()
                .find(|t| t.address == address)
                .cloned()
                .unwrap_or_else(|| TokenInfo {
                    address,
                    symbol: String::new(),
                    name: String::new(),
                    decimals: None,
                })
        };
        return Some(PairEvent::PairCreated(PairCreated {
            meta: raw.meta.clone(),
            pair,
            token0: info(token0),
            token1: info(token1),
        }));
    }

    decode_pair_log(&log, raw.meta.clone())
}
