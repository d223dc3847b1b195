//! Entity Store
//!
//! In-memory persistence for every indexed entity. Loads hand out owned
//! copies; handlers mutate their copy and save it back, so nothing is
//! visible to other readers until the handler writes it.
//!
//! The protocol aggregate and bundle live in dedicated singleton slots and
//! are loaded/saved explicitly by the caller like any other entity.
//!
//! Created: 2026-10-12

use crate::error::Result;
use crate::types::{
    Bundle, BurnEvent, LiquidityPosition, LiquidityPositionSnapshot, MintEvent, Pair, PairDayData,
    PairHourData, Protocol, ProtocolDayData, SwapEvent, Token, TokenDayData, Transaction, User,
};
use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default)]
pub struct EntityStore {
    pairs: HashMap<Address, Pair>,
    /// (tokenA, tokenB) → pair, both orderings
    pair_index: HashMap<(Address, Address), Address>,
    tokens: HashMap<Address, Token>,
    protocol: Option<Protocol>,
    bundle: Option<Bundle>,
    transactions: HashMap<B256, Transaction>,
    mints: HashMap<String, MintEvent>,
    burns: HashMap<String, BurnEvent>,
    swaps: HashMap<String, SwapEvent>,
    users: HashMap<Address, User>,
    positions: HashMap<String, LiquidityPosition>,
    snapshots: HashMap<String, LiquidityPositionSnapshot>,
    pair_day_data: HashMap<(Address, u64), PairDayData>,
    pair_hour_data: HashMap<(Address, u64), PairHourData>,
    protocol_day_data: HashMap<u64, ProtocolDayData>,
    token_day_data: HashMap<(Address, u64), TokenDayData>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Pairs & tokens ──────────────────────────────────────────────

    pub fn load_pair(&self, id: &Address) -> Option<Pair> {
        self.pairs.get(id).cloned()
    }

    pub fn save_pair(&mut self, pair: Pair) {
        self.pair_index.insert((pair.token0, pair.token1), pair.id);
        self.pair_index.insert((pair.token1, pair.token0), pair.id);
        self.pairs.insert(pair.id, pair);
    }

    /// Pair address for a token combination, in either order
    pub fn pair_for_tokens(&self, token_a: &Address, token_b: &Address) -> Option<Address> {
        self.pair_index.get(&(*token_a, *token_b)).copied()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.values()
    }

    pub fn load_token(&self, id: &Address) -> Option<Token> {
        self.tokens.get(id).cloned()
    }

    pub fn save_token(&mut self, token: Token) {
        self.tokens.insert(token.id, token);
    }

    // ── Singletons ──────────────────────────────────────────────────

    pub fn load_protocol(&self) -> Option<Protocol> {
        self.protocol.clone()
    }

    pub fn save_protocol(&mut self, protocol: Protocol) {
        self.protocol = Some(protocol);
    }

    pub fn load_bundle(&self) -> Option<Bundle> {
        self.bundle.clone()
    }

    pub fn save_bundle(&mut self, bundle: Bundle) {
        self.bundle = Some(bundle);
    }

    // ── Transactions & logical operations ───────────────────────────

    pub fn load_transaction(&self, id: &B256) -> Option<Transaction> {
        self.transactions.get(id).cloned()
    }

    pub fn save_transaction(&mut self, transaction: Transaction) {
        self.transactions.insert(transaction.id, transaction);
    }

    pub fn load_mint(&self, id: &str) -> Option<MintEvent> {
        self.mints.get(id).cloned()
    }

    pub fn save_mint(&mut self, mint: MintEvent) {
        self.mints.insert(mint.id.clone(), mint);
    }

    pub fn remove_mint(&mut self, id: &str) -> Option<MintEvent> {
        debug!("Removing mint {}", id);
        self.mints.remove(id)
    }

    pub fn load_burn(&self, id: &str) -> Option<BurnEvent> {
        self.burns.get(id).cloned()
    }

    pub fn save_burn(&mut self, burn: BurnEvent) {
        self.burns.insert(burn.id.clone(), burn);
    }

    pub fn load_swap(&self, id: &str) -> Option<SwapEvent> {
        self.swaps.get(id).cloned()
    }

    pub fn save_swap(&mut self, swap: SwapEvent) {
        self.swaps.insert(swap.id.clone(), swap);
    }

    // ── Users & positions ───────────────────────────────────────────

    pub fn load_user(&self, id: &Address) -> Option<User> {
        self.users.get(id).cloned()
    }

    pub fn save_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn load_position(&self, id: &str) -> Option<LiquidityPosition> {
        self.positions.get(id).cloned()
    }

    pub fn save_position(&mut self, position: LiquidityPosition) {
        self.positions.insert(position.id.clone(), position);
    }

    pub fn load_snapshot(&self, id: &str) -> Option<LiquidityPositionSnapshot> {
        self.snapshots.get(id).cloned()
    }

    pub fn save_snapshot(&mut self, snapshot: LiquidityPositionSnapshot) {
        self.snapshots.insert(snapshot.id.clone(), snapshot);
    }

    /// Snapshots of one position, oldest first
    pub fn snapshots_for(&self, position_id: &str) -> Vec<LiquidityPositionSnapshot> {
        let mut found: Vec<_> = self
            .snapshots
            .values()
            .filter(|s| s.liquidity_position == position_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.timestamp);
        found
    }

    // ── Rollups (keyed by bucket start, unix seconds) ───────────────

    pub fn load_pair_day_data(&self, pair: &Address, date: u64) -> Option<PairDayData> {
        self.pair_day_data.get(&(*pair, date)).cloned()
    }

    pub fn save_pair_day_data(&mut self, data: PairDayData) {
        self.pair_day_data.insert((data.pair, data.date), data);
    }

    pub fn load_pair_hour_data(&self, pair: &Address, hour_start: u64) -> Option<PairHourData> {
        self.pair_hour_data.get(&(*pair, hour_start)).cloned()
    }

    pub fn save_pair_hour_data(&mut self, data: PairHourData) {
        self.pair_hour_data.insert((data.pair, data.hour_start_unix), data);
    }

    pub fn load_protocol_day_data(&self, date: u64) -> Option<ProtocolDayData> {
        self.protocol_day_data.get(&date).cloned()
    }

    pub fn save_protocol_day_data(&mut self, data: ProtocolDayData) {
        self.protocol_day_data.insert(data.date, data);
    }

    pub fn load_token_day_data(&self, token: &Address, date: u64) -> Option<TokenDayData> {
        self.token_day_data.get(&(*token, date)).cloned()
    }

    pub fn save_token_day_data(&mut self, data: TokenDayData) {
        self.token_day_data.insert((data.token, data.date), data);
    }

    // ── Export ──────────────────────────────────────────────────────

    /// Serializable overview of the store
    pub fn summary(&self) -> StoreSummary {
        let mut pairs: Vec<Pair> = self.pairs.values().cloned().collect();
        pairs.sort_by_key(|p| p.id);
        let mut tokens: Vec<Token> = self.tokens.values().cloned().collect();
        tokens.sort_by_key(|t| t.id);

        StoreSummary {
            protocol: self.protocol.clone(),
            bundle: self.bundle.clone(),
            pairs,
            tokens,
            transactions: self.transactions.len(),
            mints: self.mints.len(),
            burns: self.burns.len(),
            swaps: self.swaps.len(),
            users: self.users.len(),
            positions: self.positions.len(),
            snapshots: self.snapshots.len(),
        }
    }

    /// Write the summary as pretty JSON (temp file + rename)
    pub fn write_summary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.summary())?;

        let temp_path = path.as_ref().with_extension("tmp");
        std::fs::write(&temp_path, &json)?;
        std::fs::rename(&temp_path, path.as_ref())?;

        Ok(())
    }
}

/// Snapshot of aggregate state written by the replay binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSummary {
    pub protocol: Option<Protocol>,
    pub bundle: Option<Bundle>,
    pub pairs: Vec<Pair>,
    pub tokens: Vec<Token>,
    pub transactions: usize,
    pub mints: usize,
    pub burns: usize,
    pub swaps: usize,
    pub users: usize,
    pub positions: usize,
    pub snapshots: usize,
}
