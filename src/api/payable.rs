use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::api::settlement::{
    self, DocumentKind, DocumentPage, DocumentQuery, NewDocument, PaymentResult, RecordPayment,
    SettlementDocument,
};
use crate::domain::aging::AgingReport;
use crate::domain::payment::{DocumentStatus, derive_status, outstanding};
use crate::error::ApiResult;
use crate::model::settlement::{Payment, VendorBill};
use crate::models::{AsOfQuery, MessageResponse};

#[derive(Deserialize, ToSchema)]
pub struct CreateVendorBill {
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "Acme Packaging Supply")]
    pub vendor_name: String,
    #[schema(example = "BILL-2026-0042")]
    pub bill_number: String,
    #[schema(example = "1500.00")]
    pub amount: Decimal,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub issue_date: NaiveDate,
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub due_date: NaiveDate,
    pub description: Option<String>,
}

/// Vendor bill with its derived settlement state.
#[derive(Serialize, ToSchema)]
pub struct VendorBillView {
    pub id: u64,
    pub warehouse_id: u64,
    pub vendor_name: String,
    pub bill_number: String,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub outstanding: Decimal,
    pub status: DocumentStatus,
    #[schema(value_type = String, format = "date")]
    pub issue_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub due_date: NaiveDate,
    pub description: Option<String>,
}

impl SettlementDocument for VendorBill {
    const KIND: DocumentKind = DocumentKind::Bill;
    type View = VendorBillView;

    fn into_view(self, as_of: NaiveDate) -> VendorBillView {
        VendorBillView {
            outstanding: outstanding(self.amount, self.paid_amount),
            status: derive_status(self.amount, self.paid_amount, self.due_date, as_of),
            id: self.id,
            warehouse_id: self.warehouse_id,
            vendor_name: self.vendor_name,
            bill_number: self.bill_number,
            amount: self.amount,
            paid_amount: self.paid_amount,
            issue_date: self.issue_date,
            due_date: self.due_date,
            description: self.description,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct VendorBillListResponse {
    pub data: Vec<VendorBillView>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl From<DocumentPage<VendorBillView>> for VendorBillListResponse {
    fn from(page: DocumentPage<VendorBillView>) -> Self {
        Self {
            data: page.data,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/payables",
    request_body = CreateVendorBill,
    responses(
        (status = 201, description = "Bill recorded", body = MessageResponse),
        (status = 400, description = "Invalid amount or dates"),
        (status = 409, description = "Bill number already recorded")
    ),
    tag = "Accounts Payable"
)]
pub async fn create_bill(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateVendorBill>,
) -> ApiResult<impl Responder> {
    let id = settlement::create_document(
        pool.get_ref(),
        DocumentKind::Bill,
        NewDocument {
            warehouse_id: payload.warehouse_id,
            counterparty: &payload.vendor_name,
            number: &payload.bill_number,
            amount: payload.amount,
            issue_date: payload.issue_date,
            due_date: payload.due_date,
            description: payload.description.as_deref(),
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(MessageResponse::created("Bill recorded", id)))
}

#[utoipa::path(
    get,
    path = "/api/payables",
    params(DocumentQuery),
    responses((status = 200, body = VendorBillListResponse)),
    tag = "Accounts Payable"
)]
pub async fn list_bills(
    pool: web::Data<MySqlPool>,
    query: web::Query<DocumentQuery>,
) -> ApiResult<impl Responder> {
    let page = settlement::list_documents::<VendorBill>(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(VendorBillListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/payables/{bill_id}",
    params(("bill_id", Path, description = "Bill ID")),
    responses((status = 200, body = VendorBillView), (status = 404)),
    tag = "Accounts Payable"
)]
pub async fn get_bill(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let bill = settlement::fetch_document::<VendorBill>(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bill))
}

/// Pays part or all of a bill. A payment larger than what is still owed is rejected.
#[utoipa::path(
    post,
    path = "/api/payables/{bill_id}/payments",
    params(("bill_id", Path, description = "Bill ID")),
    request_body = RecordPayment,
    responses(
        (status = 201, body = PaymentResult),
        (status = 400, description = "Payment is not positive or exceeds the outstanding balance", body = Object, example = json!({
            "message": "payment of 100.00 exceeds outstanding balance of 0"
        })),
        (status = 404)
    ),
    tag = "Accounts Payable"
)]
pub async fn record_bill_payment(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RecordPayment>,
) -> ApiResult<impl Responder> {
    let result =
        settlement::record_payment(pool.get_ref(), DocumentKind::Bill, path.into_inner(), &payload)
            .await?;
    Ok(HttpResponse::Created().json(result))
}

#[utoipa::path(
    get,
    path = "/api/payables/{bill_id}/payments",
    params(("bill_id", Path, description = "Bill ID")),
    responses((status = 200, body = [Payment]), (status = 404)),
    tag = "Accounts Payable"
)]
pub async fn list_bill_payments(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let payments =
        settlement::list_payments(pool.get_ref(), DocumentKind::Bill, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payments))
}

#[utoipa::path(
    get,
    path = "/api/payables/aging",
    params(AsOfQuery),
    responses((status = 200, body = AgingReport)),
    tag = "Accounts Payable"
)]
pub async fn payables_aging(
    pool: web::Data<MySqlPool>,
    query: web::Query<AsOfQuery>,
) -> ApiResult<impl Responder> {
    let report =
        settlement::aging_report::<VendorBill>(pool.get_ref(), query.warehouse_id, query.date())
            .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn view_derives_settlement_state() {
        let bill = VendorBill {
            id: 3,
            warehouse_id: 1,
            vendor_name: "Acme".to_string(),
            bill_number: "B-3".to_string(),
            amount: dec!(100),
            paid_amount: dec!(40),
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            description: None,
        };
        let view = bill.into_view(NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
        assert_eq!(view.outstanding, dec!(60));
        assert_eq!(view.status, DocumentStatus::Overdue);
    }
}
