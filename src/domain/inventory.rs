use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatchSyncStatus {
    InSync,
    /// stock not yet assigned to any batch
    UnderAllocated,
    /// batches claim more units than the product has
    OverAllocated,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockReconciliation {
    pub product_id: u64,
    pub stock: i64,
    pub batch_total: i64,
    pub batch_count: u32,
    /// stock minus batch total
    pub difference: i64,
    pub status: BatchSyncStatus,
}

pub fn reconcile(product_id: u64, stock: i64, quantities: &[i64]) -> StockReconciliation {
    let batch_total: i64 = quantities.iter().sum();
    let difference = stock - batch_total;
    let status = match difference {
        0 => BatchSyncStatus::InSync,
        d if d > 0 => BatchSyncStatus::UnderAllocated,
        _ => BatchSyncStatus::OverAllocated,
    };
    StockReconciliation {
        product_id,
        stock,
        batch_total,
        batch_count: quantities.len() as u32,
        difference,
        status,
    }
}

/// Stock level that makes the product agree with its batches.
pub fn sync_target(quantities: &[i64]) -> i64 {
    quantities.iter().sum()
}

pub fn validate_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        Err(DomainError::Invalid("quantity cannot be negative".to_string()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BatchExpiry {
    pub batch_id: u64,
    pub product_id: u64,
    pub batch_number: String,
    pub quantity: i64,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpiryNotice {
    pub batch_id: u64,
    pub product_id: u64,
    pub batch_number: String,
    pub quantity: i64,
    pub expiration_date: NaiveDate,
    pub days_until_expiry: i64,
    pub expired: bool,
}

/// Batches that are expired or expire within `within_days`, soonest first.
/// Batches without an expiration date never appear.
pub fn expiring(batches: Vec<BatchExpiry>, as_of: NaiveDate, within_days: i64) -> Vec<ExpiryNotice> {
    let mut notices: Vec<ExpiryNotice> = batches
        .into_iter()
        .filter_map(|b| {
            let expiration_date = b.expiration_date?;
            let days_until_expiry = (expiration_date - as_of).num_days();
            (days_until_expiry <= within_days).then(|| ExpiryNotice {
                batch_id: b.batch_id,
                product_id: b.product_id,
                batch_number: b.batch_number,
                quantity: b.quantity,
                expiration_date,
                days_until_expiry,
                expired: days_until_expiry < 0,
            })
        })
        .collect();
    notices.sort_by_key(|n| (n.expiration_date, n.batch_id));
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_statuses() {
        assert_eq!(reconcile(1, 100, &[60, 40]).status, BatchSyncStatus::InSync);
        let under = reconcile(1, 100, &[60]);
        assert_eq!(under.status, BatchSyncStatus::UnderAllocated);
        assert_eq!(under.difference, 40);
        let over = reconcile(1, 50, &[60, 40]);
        assert_eq!(over.status, BatchSyncStatus::OverAllocated);
        assert_eq!(over.difference, -50);
        assert_eq!(reconcile(1, 0, &[]).status, BatchSyncStatus::InSync);
    }

    #[test]
    fn sync_restores_equality() {
        let batches = [25, 10, 0, 7];
        let stock = sync_target(&batches);
        let after = reconcile(9, stock, &batches);
        assert_eq!(after.batch_total, after.stock);
        assert_eq!(after.status, BatchSyncStatus::InSync);
    }

    #[test]
    fn negative_quantity_rejected() {
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(0).is_ok());
    }

    #[test]
    fn expiring_window() {
        let as_of = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let batch = |id, exp: Option<NaiveDate>| BatchExpiry {
            batch_id: id,
            product_id: 1,
            batch_number: format!("B{id}"),
            quantity: 10,
            expiration_date: exp,
        };
        let notices = expiring(
            vec![
                batch(1, Some(as_of + chrono::Duration::days(45))),
                batch(2, Some(as_of + chrono::Duration::days(10))),
                batch(3, Some(as_of - chrono::Duration::days(2))),
                batch(4, None),
                batch(5, Some(as_of + chrono::Duration::days(30))),
            ],
            as_of,
            30,
        );
        let ids: Vec<_> = notices.iter().map(|n| n.batch_id).collect();
        assert_eq!(ids, vec![3, 2, 5]);
        assert!(notices[0].expired);
        assert!(!notices[1].expired);
    }
}
