use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 200_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static BATCH_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Batch numbers are unique per product and compared case-insensitively.
#[inline]
fn key(product_id: u64, batch_number: &str) -> String {
    format!("{}:{}", product_id, batch_number.trim().to_lowercase())
}

/// false means the batch number is definitely free for this product.
pub fn might_exist(product_id: u64, batch_number: &str) -> bool {
    let key = key(product_id, batch_number);
    match BATCH_FILTER.read() {
        Ok(filter) => filter.contains(&key),
        // a poisoned filter cannot answer negatively, fall through to the database
        Err(_) => true,
    }
}

pub fn insert(product_id: u64, batch_number: &str) {
    let key = key(product_id, batch_number);
    if let Ok(mut filter) = BATCH_FILTER.write() {
        filter.add(&key);
    }
}

pub fn remove(product_id: u64, batch_number: &str) {
    let key = key(product_id, batch_number);
    if let Ok(mut filter) = BATCH_FILTER.write() {
        filter.remove(&key);
    }
}

/// Authoritative check: filter first, database only on a possible hit.
pub async fn is_taken(pool: &MySqlPool, product_id: u64, batch_number: &str) -> Result<bool> {
    if !might_exist(product_id, batch_number) {
        return Ok(false);
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM product_batches WHERE product_id = ? AND LOWER(batch_number) = ? LIMIT 1)",
    )
    .bind(product_id)
    .bind(batch_number.trim().to_lowercase())
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Warm up the filter using streaming + batching
pub async fn warmup_batch_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (u64, String)>("SELECT product_id, batch_number FROM product_batches")
            .fetch(pool);

    let mut pending = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (product_id, batch_number) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        pending.push(key(product_id, &batch_number));
        total += 1;

        if pending.len() == batch_size {
            insert_keys(&pending);
            pending.clear();
        }
    }

    if !pending.is_empty() {
        insert_keys(&pending);
    }

    log::info!("Batch number filter warmup complete: {} batches", total);
    Ok(())
}

fn insert_keys(keys: &[String]) {
    if let Ok(mut filter) = BATCH_FILTER.write() {
        for key in keys {
            filter.add(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_numbers_are_found_per_product() {
        insert(7001, "LOT-A1");
        assert!(might_exist(7001, "lot-a1 "));
        assert!(!might_exist(7002, "LOT-Z9-unused"));
        remove(7001, "LOT-A1");
    }
}
