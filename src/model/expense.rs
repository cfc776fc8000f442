use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Expense {
    pub id: u64,
    pub warehouse_id: u64,
    #[schema(example = "utilities")]
    pub category: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(nullable = true)]
    pub vendor: Option<String>,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
}
