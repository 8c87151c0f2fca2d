//! Batched, paced price fetching.
//!
//! Identifiers are deduplicated and sorted so batch composition is the same on
//! every run, then requested `batch_size` at a time with a fixed pause between
//! requests. The pause is not adaptive: a throttled request fails the run like
//! any other network fault, and nothing fetched so far is used.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::{
    config::RunConfig,
    providers::{PriceProvider, PriceQuote, ProviderError},
};

/// Fetch USD quotes for `ids`, keyed by identifier.
///
/// Identifiers the provider did not price are absent from the map; that is not
/// an error. The first failing request aborts the whole fetch.
pub async fn fetch_prices<P, I>(
    provider: &P,
    ids: I,
    cfg: &RunConfig,
) -> Result<BTreeMap<String, PriceQuote>, ProviderError>
where
    P: PriceProvider + ?Sized,
    I: IntoIterator<Item = String>,
{
    let ids: Vec<String> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    let batches: Vec<&[String]> = ids.chunks(cfg.batch_size.get()).collect();
    info!(ids = ids.len(), batches = batches.len(), "fetching prices");

    let mut prices = BTreeMap::new();
    for (i, batch) in batches.iter().enumerate() {
        if i > 0 && !cfg.pacing.is_zero() {
            tokio::time::sleep(cfg.pacing).await;
        }
        debug!(batch = i + 1, size = batch.len(), "requesting price batch");
        for quote in provider.fetch_usd_prices(batch).await? {
            prices.insert(quote.coin_id.clone(), quote);
        }
    }

    Ok(prices)
}
