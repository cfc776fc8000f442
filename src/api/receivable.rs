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
use crate::model::settlement::{Invoice, Payment};
use crate::models::{AsOfQuery, MessageResponse};

#[derive(Deserialize, ToSchema)]
pub struct CreateInvoice {
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "Northwind Retail")]
    pub customer_name: String,
    #[schema(example = "INV-2026-0117")]
    pub invoice_number: String,
    #[schema(example = "1500.00")]
    pub amount: Decimal,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub issue_date: NaiveDate,
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub due_date: NaiveDate,
    pub description: Option<String>,
}

impl CreateInvoice {
    fn as_new(&self) -> NewDocument<'_> {
        NewDocument {
            warehouse_id: self.warehouse_id,
            counterparty: &self.customer_name,
            number: &self.invoice_number,
            amount: self.amount,
            issue_date: self.issue_date,
            due_date: self.due_date,
            description: self.description.as_deref(),
        }
    }
}

/// Customer invoice with its derived settlement state.
#[derive(Serialize, ToSchema)]
pub struct InvoiceView {
    pub id: u64,
    pub warehouse_id: u64,
    pub customer_name: String,
    pub invoice_number: String,
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

impl SettlementDocument for Invoice {
    const KIND: DocumentKind = DocumentKind::Invoice;
    type View = InvoiceView;

    fn into_view(self, as_of: NaiveDate) -> InvoiceView {
        InvoiceView {
            outstanding: outstanding(self.amount, self.paid_amount),
            status: derive_status(self.amount, self.paid_amount, self.due_date, as_of),
            id: self.id,
            warehouse_id: self.warehouse_id,
            customer_name: self.customer_name,
            invoice_number: self.invoice_number,
            amount: self.amount,
            paid_amount: self.paid_amount,
            issue_date: self.issue_date,
            due_date: self.due_date,
            description: self.description,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct InvoiceListResponse {
    pub data: Vec<InvoiceView>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl From<DocumentPage<InvoiceView>> for InvoiceListResponse {
    fn from(page: DocumentPage<InvoiceView>) -> Self {
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
    path = "/api/receivables",
    request_body = CreateInvoice,
    responses(
        (status = 201, description = "Invoice issued", body = MessageResponse),
        (status = 400, description = "Invalid amount or dates"),
        (status = 409, description = "Invoice number already used")
    ),
    tag = "Accounts Receivable"
)]
pub async fn create_invoice(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateInvoice>,
) -> ApiResult<impl Responder> {
    let id =
        settlement::create_document(pool.get_ref(), DocumentKind::Invoice, payload.as_new())
            .await?;
    Ok(HttpResponse::Created().json(MessageResponse::created("Invoice issued", id)))
}

#[utoipa::path(
    get,
    path = "/api/receivables",
    params(DocumentQuery),
    responses((status = 200, body = InvoiceListResponse)),
    tag = "Accounts Receivable"
)]
pub async fn list_invoices(
    pool: web::Data<MySqlPool>,
    query: web::Query<DocumentQuery>,
) -> ApiResult<impl Responder> {
    let page = settlement::list_documents::<Invoice>(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(InvoiceListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/receivables/{invoice_id}",
    params(("invoice_id", Path, description = "Invoice ID")),
    responses((status = 200, body = InvoiceView), (status = 404)),
    tag = "Accounts Receivable"
)]
pub async fn get_invoice(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let invoice = settlement::fetch_document::<Invoice>(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

#[utoipa::path(
    post,
    path = "/api/receivables/{invoice_id}/payments",
    params(("invoice_id", Path, description = "Invoice ID")),
    request_body = RecordPayment,
    responses(
        (status = 201, body = PaymentResult),
        (status = 400, description = "Payment is not positive or exceeds the outstanding balance"),
        (status = 404)
    ),
    tag = "Accounts Receivable"
)]
pub async fn record_invoice_payment(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RecordPayment>,
) -> ApiResult<impl Responder> {
    let result = settlement::record_payment(
        pool.get_ref(),
        DocumentKind::Invoice,
        path.into_inner(),
        &payload,
    )
    .await?;
    Ok(HttpResponse::Created().json(result))
}

#[utoipa::path(
    get,
    path = "/api/receivables/{invoice_id}/payments",
    params(("invoice_id", Path, description = "Invoice ID")),
    responses((status = 200, body = [Payment]), (status = 404)),
    tag = "Accounts Receivable"
)]
pub async fn list_invoice_payments(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let payments =
        settlement::list_payments(pool.get_ref(), DocumentKind::Invoice, path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(payments))
}

/// Outstanding receivables grouped into current, 1-30, 31-60, 61-90 and 90+ days past due.
#[utoipa::path(
    get,
    path = "/api/receivables/aging",
    params(AsOfQuery),
    responses((status = 200, body = AgingReport)),
    tag = "Accounts Receivable"
)]
pub async fn receivables_aging(
    pool: web::Data<MySqlPool>,
    query: web::Query<AsOfQuery>,
) -> ApiResult<impl Responder> {
    let report =
        settlement::aging_report::<Invoice>(pool.get_ref(), query.warehouse_id, query.date())
            .await?;
    Ok(HttpResponse::Ok().json(report))
}
