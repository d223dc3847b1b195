//! Teleswap Pair Indexer
//!
//! Replays a newline-delimited JSON file of pair events through the indexer
//! in file order, then optionally writes the aggregate summary. With `--raw`
//! each line is an exported log that is ABI-decoded first.
//!
//! Usage:
//!   teleswap-indexer --config indexer.toml --events events.jsonl --summary out.json
//!   teleswap-indexer --config indexer.toml --events logs.jsonl --raw
//!
//! Created: 2026-10-14
//! Modified: 2026-10-18 - Raw log replay

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use teleswap_indexer::config::load_config_from_file;
use teleswap_indexer::contracts::decode_raw_log;
use teleswap_indexer::error::IndexerError;
use teleswap_indexer::events::RawLog;
use teleswap_indexer::{Indexer, PairEvent};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Progress is logged every this many events
const PROGRESS_INTERVAL: usize = 10_000;

#[derive(Parser)]
#[command(name = "teleswap-indexer", about = "Replay Teleswap pair events into aggregates")]
struct Args {
    /// Indexer configuration (TOML)
    #[arg(short, long, env = "INDEXER_CONFIG")]
    config: PathBuf,

    /// Events, one JSON object per line
    #[arg(short, long)]
    events: PathBuf,

    /// Lines are raw logs (topics + data) rather than decoded events
    #[arg(long)]
    raw: bool,

    /// Write the store summary here when done
    #[arg(short, long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = load_config_from_file(&args.config)?;
    info!(
        "Configuration loaded from {} (factory {:?}, {} whitelisted tokens)",
        args.config.display(),
        config.factory_address,
        config.pricing.whitelist.len()
    );

    let file = File::open(&args.events)
        .with_context(|| format!("Failed to open events file: {}", args.events.display()))?;
    let reader = BufReader::new(file);

    let mut indexer = Indexer::from_config(config);
    let mut processed = 0usize;
    let mut skipped = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(IndexerError::from)?;
        if line.trim().is_empty() {
            continue;
        }

        let malformed = |source: serde_json::Error| IndexerError::MalformedEvent { line: index + 1, source };
        let event = if args.raw {
            let raw: RawLog = serde_json::from_str(&line).map_err(malformed)?;
            match decode_raw_log(&raw) {
                Some(event) => event,
                None => {
                    debug!("Line {}: not a pair or factory event", index + 1);
                    skipped += 1;
                    continue;
                }
            }
        } else {
            serde_json::from_str::<PairEvent>(&line).map_err(malformed)?
        };
        indexer.process(&event);
        processed += 1;

        if processed % PROGRESS_INTERVAL == 0 {
            info!("Processed {} events (block {})", processed, event.meta().block_number);
        }
    }

    let summary = indexer.store().summary();
    info!(
        "Replay complete: {} events ({} undecodable logs skipped), {} pairs, {} tokens, {} swaps",
        processed,
        skipped,
        summary.pairs.len(),
        summary.tokens.len(),
        summary.swaps
    );

    if let Some(path) = &args.summary {
        indexer
            .store()
            .write_summary(path)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
        info!("Summary written to {}", path.display());
    }

    Ok(())
}
