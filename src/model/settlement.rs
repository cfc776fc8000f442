//! Vendor bills (AP), customer invoices (AR) and the payments recorded against them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aging::AgingInput;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct VendorBill {
    pub id: u64,
    pub warehouse_id: u64,
    pub vendor_name: String,
    pub bill_number: String,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: u64,
    pub warehouse_id: u64,
    pub customer_name: String,
    pub invoice_number: String,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: Option<String>,
}

impl From<VendorBill> for AgingInput {
    fn from(bill: VendorBill) -> Self {
        AgingInput {
            id: bill.id,
            counterparty: bill.vendor_name,
            document_number: bill.bill_number,
            amount: bill.amount,
            paid_amount: bill.paid_amount,
            due_date: bill.due_date,
        }
    }
}

impl From<Invoice> for AgingInput {
    fn from(invoice: Invoice) -> Self {
        AgingInput {
            id: invoice.id,
            counterparty: invoice.customer_name,
            document_number: invoice.invoice_number,
            amount: invoice.amount,
            paid_amount: invoice.paid_amount,
            due_date: invoice.due_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Payment {
    pub id: u64,
    pub document_kind: String,
    pub document_id: u64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: String,
    #[schema(nullable = true)]
    pub reference: Option<String>,
}
