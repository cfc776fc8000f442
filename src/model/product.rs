use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::inventory::BatchExpiry;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Product {
    pub id: u64,
    pub warehouse_id: u64,
    #[schema(example = "SKU-10042")]
    pub sku: String,
    pub name: String,
    /// aggregate on-hand count
    pub stock: i64,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ProductBatch {
    pub id: u64,
    pub product_id: u64,
    #[schema(example = "LOT-2026-031")]
    pub batch_number: String,
    pub quantity: i64,
    #[schema(nullable = true)]
    pub expiration_date: Option<NaiveDate>,
    #[schema(example = "A-04-2", nullable = true)]
    pub location: Option<String>,
    pub received_date: NaiveDate,
}

impl From<ProductBatch> for BatchExpiry {
    fn from(b: ProductBatch) -> Self {
        BatchExpiry {
            batch_id: b.id,
            product_id: b.product_id,
            batch_number: b.batch_number,
            quantity: b.quantity,
            expiration_date: b.expiration_date,
        }
    }
}
