//! Price synchronization: records -> identifiers -> prices -> metadata.
//!
//! ## What this does
//! - Loads candidate records from the store (one snapshot, ascending id).
//! - Fetches the provider catalog and indexes it by symbol.
//! - Resolves every record independently; failures are collected, not fatal.
//! - Fetches USD prices for the deduplicated identifiers (batched, paced).
//! - Merges each price into its record's metadata, skipping records without a
//!   price.
//!
//! ## Transactions & consistency
//! Nothing is written until every network call has succeeded. All updates are
//! then applied in a single store transaction, so a run commits all of its
//! updates or none of them.
//!
//! ## Dry-run
//! When [`SyncOptions::dry_run`] is `true` the full computation runs and the
//! returned [`SyncReport`] lists what would change, but the store is never
//! written.

mod report;

pub use report::{
    ResolvedRecord, SkipReason, SkippedRecord, SyncReport, UnresolvedRecord, UpdatedRecord,
};

use chrono::Utc;
use tracing::{debug, info};

use crate::{
    catalog::{CatalogIndex, overrides::OverrideTable},
    config::RunConfig,
    db::store::RecordStore,
    error::SyncError,
    metadata::{apply_price, format_updated_at},
    models::MetadataUpdate,
    pricing::fetch_prices,
    providers::PriceProvider,
    resolve::resolve,
};

/// Options for a price sync.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// If true, compute and report everything but write nothing.
    pub dry_run: bool,
    /// Process at most this many records (lowest ids first). `Some(0)` means no limit.
    pub limit: Option<u32>,
    /// Batching, pacing, and timeout knobs.
    pub run: RunConfig,
}

/// Sync USD prices into record metadata.
///
/// Returns the run's report. Per-record problems (unresolvable symbols,
/// missing prices, unmergeable metadata) are reported; provider and store
/// faults abort the run before anything is committed.
pub async fn sync_prices<S, P>(
    store: &mut S,
    provider: &P,
    overrides: &OverrideTable,
    opt: &SyncOptions,
) -> Result<SyncReport, SyncError>
where
    S: RecordStore + ?Sized,
    P: PriceProvider + ?Sized,
{
    let mut report = SyncReport::new(opt.dry_run);

    let records = store.load_candidates(opt.limit)?;
    if records.is_empty() {
        info!("no records with a token symbol");
        return Ok(report);
    }
    info!(records = records.len(), "loaded candidate records");

    let index = CatalogIndex::build(provider.fetch_catalog().await?);
    info!(symbols = index.len(), "catalog indexed");

    let mut resolved = Vec::new();
    for record in &records {
        let symbol = record.token_symbol.as_deref();
        match resolve(symbol, record.stored_coin_id(), &index, overrides) {
            Ok(res) => {
                debug!(id = record.id, coin_id = %res.coin_id, reason = %res.reason, "resolved");
                let entry = ResolvedRecord {
                    id: record.id,
                    project_key: record.project_key.clone(),
                    symbol: record.token_symbol.clone(),
                    coin_id: res.coin_id,
                    reason: res.reason,
                };
                resolved.push((record, entry));
            }
            Err(reason) => {
                debug!(id = record.id, %reason, "unresolved");
                report.unresolved.push(UnresolvedRecord {
                    id: record.id,
                    project_key: record.project_key.clone(),
                    symbol: record.token_symbol.clone(),
                    reason,
                });
            }
        }
    }
    report.resolved = resolved.iter().map(|(_, r)| r.clone()).collect();
    info!(
        resolved = report.resolved.len(),
        unresolved = report.unresolved.len(),
        "resolution done"
    );

    if resolved.is_empty() {
        info!("no resolvable identifiers");
        return Ok(report);
    }

    let ids = resolved.iter().map(|(_, r)| r.coin_id.clone());
    let quotes = fetch_prices(provider, ids, &opt.run).await?;
    let updated_at = format_updated_at(Utc::now());

    let mut updates = Vec::new();
    for (record, entry) in resolved {
        let Some(quote) = quotes.get(&entry.coin_id) else {
            report.skipped.push(SkippedRecord {
                record: entry,
                reason: SkipReason::NoUsdPrice,
            });
            continue;
        };
        match apply_price(record, &entry.coin_id, quote.usd, &updated_at) {
            Ok(metadata) => {
                updates.push(MetadataUpdate {
                    id: record.id,
                    metadata: metadata.clone(),
                });
                report.updated.push(UpdatedRecord {
                    record: entry,
                    usd: quote.usd,
                    metadata,
                });
            }
            Err(e) => report.skipped.push(SkippedRecord {
                record: entry,
                reason: SkipReason::Merge(e),
            }),
        }
    }

    if !opt.dry_run && !updates.is_empty() {
        report.written = store.apply_updates(&updates)?;
        info!(written = report.written, "committed metadata updates");
    }
    info!(
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        dry_run = opt.dry_run,
        "sync finished"
    );

    Ok(report)
}
