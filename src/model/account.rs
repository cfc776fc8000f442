use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::ledger::AccountType;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Account {
    pub id: u64,
    pub warehouse_id: u64,
    #[schema(example = "1010")]
    pub code: String,
    #[schema(example = "Cash - Operating")]
    pub name: String,
    #[schema(example = "asset")]
    pub account_type: String,
    pub opening_balance: Decimal,
    pub balance: Decimal,
    pub is_active: bool,
}

impl Account {
    pub fn kind(&self) -> DomainResult<AccountType> {
        AccountType::from_str(&self.account_type).map_err(|_| {
            DomainError::Invalid(format!("unknown account type {:?}", self.account_type))
        })
    }
}
