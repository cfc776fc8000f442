use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::payroll::PayrollStatus;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollEntry {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,
    pub hours: Decimal,
    pub overtime_hours: Decimal,
    pub gross_pay: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
    #[schema(example = "draft")]
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub processed_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub paid_at: Option<NaiveDateTime>,
}

impl PayrollEntry {
    pub fn status(&self) -> DomainResult<PayrollStatus> {
        PayrollStatus::from_str(&self.status)
            .map_err(|_| DomainError::Invalid(format!("unknown payroll status {:?}", self.status)))
    }
}
