//! Day/Hour Rollups
//!
//! Return-or-create for the time-bucketed aggregates. Each update refreshes
//! the bucket's snapshot fields from the current pair/token/protocol state,
//! increments its transaction counter and saves it. Swap handling then adds
//! its volume deltas to the returned record and saves it again.
//!
//! Buckets are fixed-width windows on the event's block timestamp:
//! day = 86400s, hour = 3600s.
//!
//! Created: 2026-10-13

use crate::events::EventMeta;
use crate::math::safe_mul;
use crate::store::EntityStore;
use crate::types::{PairDayData, PairHourData, ProtocolDayData, Token, TokenDayData};
use chrono::DateTime;
use rust_decimal::Decimal;
use tracing::debug;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_HOUR: u64 = 3_600;

/// Start of the day bucket containing `timestamp`
pub fn day_start(timestamp: u64) -> u64 {
    (timestamp / SECONDS_PER_DAY) * SECONDS_PER_DAY
}

/// Start of the hour bucket containing `timestamp`
pub fn hour_start(timestamp: u64) -> u64 {
    (timestamp / SECONDS_PER_HOUR) * SECONDS_PER_HOUR
}

fn bucket_label(start: u64) -> String {
    DateTime::from_timestamp(start as i64, 0)
        .map(|d| d.format("%Y-%m-%d %H:00").to_string())
        .unwrap_or_else(|| start.to_string())
}

/// Pair day bucket for the emitting pair; None if the pair is unknown
pub fn update_pair_day_data(store: &mut EntityStore, meta: &EventMeta) -> Option<PairDayData> {
    let pair = store.load_pair(&meta.address)?;
    let date = day_start(meta.timestamp);

    let mut data = store.load_pair_day_data(&pair.id, date).unwrap_or_else(|| {
        debug!("New pair day bucket {:?} @ {}", pair.id, bucket_label(date));
        PairDayData {
            date,
            pair: pair.id,
            token0: pair.token0,
            token1: pair.token1,
            reserve0: Decimal::ZERO,
            reserve1: Decimal::ZERO,
            total_supply: Decimal::ZERO,
            reserve_usd: Decimal::ZERO,
            daily_volume_token0: Decimal::ZERO,
            daily_volume_token1: Decimal::ZERO,
            daily_volume_usd: Decimal::ZERO,
            daily_txns: 0,
        }
    });

    data.total_supply = pair.total_supply;
    data.reserve0 = pair.reserve0;
    data.reserve1 = pair.reserve1;
    data.reserve_usd = pair.reserve_usd;
    data.daily_txns += 1;

    store.save_pair_day_data(data.clone());
    Some(data)
}

/// Pair hour bucket for the emitting pair; None if the pair is unknown
pub fn update_pair_hour_data(store: &mut EntityStore, meta: &EventMeta) -> Option<PairHourData> {
    let pair = store.load_pair(&meta.address)?;
    let start = hour_start(meta.timestamp);

    let mut data = store.load_pair_hour_data(&pair.id, start).unwrap_or_else(|| {
        debug!("New pair hour bucket {:?} @ {}", pair.id, bucket_label(start));
        PairHourData {
            hour_start_unix: start,
            pair: pair.id,
            reserve0: Decimal::ZERO,
            reserve1: Decimal::ZERO,
            total_supply: Decimal::ZERO,
            reserve_usd: Decimal::ZERO,
            hourly_volume_token0: Decimal::ZERO,
            hourly_volume_token1: Decimal::ZERO,
            hourly_volume_usd: Decimal::ZERO,
            hourly_txns: 0,
        }
    });

    data.total_supply = pair.total_supply;
    data.reserve0 = pair.reserve0;
    data.reserve1 = pair.reserve1;
    data.reserve_usd = pair.reserve_usd;
    data.hourly_txns += 1;

    store.save_pair_hour_data(data.clone());
    Some(data)
}

/// Protocol day bucket; None if the protocol aggregate does not exist
pub fn update_protocol_day_data(store: &mut EntityStore, meta: &EventMeta) -> Option<ProtocolDayData> {
    let protocol = store.load_protocol()?;
    let date = day_start(meta.timestamp);

    let mut data = store.load_protocol_day_data(date).unwrap_or(ProtocolDayData {
        date,
        daily_volume_eth: Decimal::ZERO,
        daily_volume_usd: Decimal::ZERO,
        daily_volume_untracked: Decimal::ZERO,
        total_volume_eth: Decimal::ZERO,
        total_volume_usd: Decimal::ZERO,
        total_liquidity_eth: Decimal::ZERO,
        total_liquidity_usd: Decimal::ZERO,
        tx_count: 0,
    });

    data.total_volume_eth = protocol.total_volume_eth;
    data.total_volume_usd = protocol.total_volume_usd;
    data.total_liquidity_eth = protocol.total_liquidity_eth;
    data.total_liquidity_usd = protocol.total_liquidity_usd;
    data.tx_count = protocol.tx_count;

    store.save_protocol_day_data(data.clone());
    Some(data)
}

/// Token day bucket, priced at the stored bundle
pub fn update_token_day_data(store: &mut EntityStore, token: &Token, meta: &EventMeta) -> TokenDayData {
    let eth_price = store.load_bundle().map(|b| b.eth_price).unwrap_or_default();
    let derived_eth = token.derived_eth.unwrap_or_default();
    let date = day_start(meta.timestamp);

    let mut data = store.load_token_day_data(&token.id, date).unwrap_or(TokenDayData {
        date,
        token: token.id,
        daily_volume_token: Decimal::ZERO,
        daily_volume_eth: Decimal::ZERO,
        daily_volume_usd: Decimal::ZERO,
        daily_txns: 0,
        total_liquidity_token: Decimal::ZERO,
        total_liquidity_eth: Decimal::ZERO,
        total_liquidity_usd: Decimal::ZERO,
        price_usd: Decimal::ZERO,
    });

    let total_liquidity = token.total_liquidity.unwrap_or_default();
    data.price_usd = safe_mul(derived_eth, eth_price);
    data.total_liquidity_token = total_liquidity;
    data.total_liquidity_eth = safe_mul(total_liquidity, derived_eth);
    data.total_liquidity_usd = safe_mul(data.total_liquidity_eth, eth_price);
    data.daily_txns += 1;

    store.save_token_day_data(data.clone());
    data
}
