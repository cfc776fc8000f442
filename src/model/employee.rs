use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::payroll::{Compensation, PayType};
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "position": "Forklift Operator",
        "warehouse_id": 1,
        "pay_type": "hourly",
        "hourly_rate": "22.50",
        "annual_salary": "0.00",
        "withholding_pct": "18.00",
        "benefit_deduction": "45.00",
        "status": "active",
        "can_inventory": true,
        "can_shipments": true,
        "can_accounting": false,
        "can_payroll": false,
        "can_employees": false
    })
)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub warehouse_id: u64,

    #[schema(example = "hourly")]
    pub pay_type: String,
    pub hourly_rate: Decimal,
    pub annual_salary: Decimal,
    pub withholding_pct: Decimal,
    pub benefit_deduction: Decimal,

    #[schema(example = "active")]
    pub status: String,

    // page-level permission flags
    pub can_inventory: bool,
    pub can_shipments: bool,
    pub can_accounting: bool,
    pub can_payroll: bool,
    pub can_employees: bool,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn compensation(&self) -> DomainResult<Compensation> {
        let pay_type = PayType::from_str(&self.pay_type).map_err(|_| {
            DomainError::Invalid(format!("unknown pay_type {:?}", self.pay_type))
        })?;
        Ok(Compensation {
            pay_type,
            hourly_rate: self.hourly_rate,
            annual_salary: self.annual_salary,
            withholding_pct: self.withholding_pct,
            benefit_deduction: self.benefit_deduction,
        })
    }
}
