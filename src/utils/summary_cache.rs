use moka::future::Cache;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::domain::ledger::LedgerSummary;

/// Per-warehouse chart-of-accounts summaries. Entries are dropped whenever
/// an account in the warehouse changes, so the TTL only bounds staleness
/// from writes made outside this service.
pub static SUMMARY_CACHE: Lazy<Cache<u64, LedgerSummary>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(300))
        .build()
});

/// Per-warehouse counter bumped on every invalidation. A summary computed
/// from reads taken before a bump is never left in the cache.
static GENERATIONS: Lazy<RwLock<HashMap<u64, u64>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Read this before querying the balances a summary is built from.
pub fn generation(warehouse_id: u64) -> u64 {
    let generations = GENERATIONS.read().unwrap_or_else(|e| e.into_inner());
    generations.get(&warehouse_id).copied().unwrap_or_default()
}

pub async fn get(warehouse_id: u64) -> Option<LedgerSummary> {
    SUMMARY_CACHE.get(&warehouse_id).await
}

/// Caches `summary` unless an invalidation happened since `seen` was read.
pub async fn put(warehouse_id: u64, seen: u64, summary: LedgerSummary) {
    if generation(warehouse_id) != seen {
        return;
    }
    SUMMARY_CACHE.insert(warehouse_id, summary).await;
    // an invalidation may have landed between the check and the insert
    if generation(warehouse_id) != seen {
        SUMMARY_CACHE.invalidate(&warehouse_id).await;
    }
}

pub async fn invalidate(warehouse_id: u64) {
    {
        let mut generations = GENERATIONS.write().unwrap_or_else(|e| e.into_inner());
        *generations.entry(warehouse_id).or_default() += 1;
    }
    SUMMARY_CACHE.invalidate(&warehouse_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::{AccountType, summarize};
    use rust_decimal_macros::dec;

    #[actix_web::test]
    async fn put_get_invalidate() {
        let summary = summarize(vec![(AccountType::Asset, dec!(10))]);
        put(9001, generation(9001), summary).await;
        assert!(get(9001).await.is_some());

        invalidate(9001).await;
        assert!(get(9001).await.is_none());
    }

    #[actix_web::test]
    async fn summary_read_before_a_posting_is_not_cached() {
        let seen = generation(9002);
        // a journal posting commits while the summary is being computed
        invalidate(9002).await;

        put(9002, seen, summarize(vec![(AccountType::Asset, dec!(5))])).await;
        assert!(get(9002).await.is_none());
    }
}
