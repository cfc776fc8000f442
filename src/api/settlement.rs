//! Storage, payment recording and aging shared by payables and receivables.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlRow;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::aging::{AgingInput, AgingReport};
use crate::domain::payment::{
    DocumentStatus, apply_payment, derive_status, outstanding, validate_document,
};
use crate::domain::require;
use crate::error::{ApiError, ApiResult};
use crate::model::settlement::Payment;
use crate::models::{PageQuery, today};
use crate::utils::db_utils::Filters;

#[derive(Debug, Clone, Copy)]
pub(crate) enum DocumentKind {
    Bill,
    Invoice,
}

impl DocumentKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            DocumentKind::Bill => "vendor_bills",
            DocumentKind::Invoice => "invoices",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DocumentKind::Bill => "Bill",
            DocumentKind::Invoice => "Invoice",
        }
    }

    /// Value stored in `payments.document_kind`.
    fn key(self) -> &'static str {
        match self {
            DocumentKind::Bill => "bill",
            DocumentKind::Invoice => "invoice",
        }
    }

    fn party_column(self) -> &'static str {
        match self {
            DocumentKind::Bill => "vendor_name",
            DocumentKind::Invoice => "customer_name",
        }
    }

    fn number_column(self) -> &'static str {
        match self {
            DocumentKind::Bill => "bill_number",
            DocumentKind::Invoice => "invoice_number",
        }
    }

    fn columns(self) -> String {
        format!(
            "id, warehouse_id, {}, {}, amount, paid_amount, issue_date, due_date, description",
            self.party_column(),
            self.number_column()
        )
    }
}

/// A stored bill or invoice row and the view it is served as.
pub(crate) trait SettlementDocument:
    for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin + Into<AgingInput>
{
    const KIND: DocumentKind;
    type View: Serialize;

    fn into_view(self, as_of: NaiveDate) -> Self::View;
}

/// Fields every new bill or invoice carries.
pub(crate) struct NewDocument<'a> {
    pub warehouse_id: u64,
    pub counterparty: &'a str,
    pub number: &'a str,
    pub amount: Decimal,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: Option<&'a str>,
}

pub(crate) struct DocumentPage<V> {
    pub data: Vec<V>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DocumentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub warehouse_id: Option<u64>,
    /// Derived status to filter by
    pub status: Option<DocumentStatus>,
    /// Search by counterparty or document number
    pub search: Option<String>,
}

/// SQL equivalent of `derive_status`; the `?` (if any) binds today's date.
pub(crate) fn status_filter(filters: Filters, status: Option<DocumentStatus>) -> Filters {
    let as_of = today();
    match status {
        None => filters,
        Some(DocumentStatus::Paid) => filters.clause("paid_amount >= amount"),
        Some(DocumentStatus::Overdue) => {
            filters.clause_with_date("paid_amount < amount AND due_date < ?", as_of)
        }
        Some(DocumentStatus::Partial) => filters.clause_with_date(
            "paid_amount > 0 AND paid_amount < amount AND due_date >= ?",
            as_of,
        ),
        Some(DocumentStatus::Pending) => filters.clause_with_date(
            "paid_amount <= 0 AND paid_amount < amount AND due_date >= ?",
            as_of,
        ),
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RecordPayment {
    #[schema(example = "500.00")]
    pub amount: Decimal,
    /// Defaults to today
    #[schema(example = "2026-03-20", format = "date", value_type = Option<String>)]
    pub payment_date: Option<NaiveDate>,
    #[schema(example = "bank_transfer")]
    pub method: Option<String>,
    #[schema(example = "CHK-10293")]
    pub reference: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentResult {
    pub payment_id: u64,
    pub document_id: u64,
    pub paid_amount: Decimal,
    pub outstanding: Decimal,
    pub status: DocumentStatus,
}

fn document_filters(kind: DocumentKind, query: &DocumentQuery) -> Filters {
    status_filter(
        Filters::new()
            .eq_u64("warehouse_id", query.warehouse_id)
            .search(
                &[kind.party_column(), kind.number_column()],
                query.search.as_deref(),
            ),
        query.status,
    )
}

pub(crate) async fn create_document(
    pool: &MySqlPool,
    kind: DocumentKind,
    doc: NewDocument<'_>,
) -> ApiResult<u64> {
    require(kind.party_column(), doc.counterparty)?;
    require(kind.number_column(), doc.number)?;
    validate_document(doc.amount, doc.issue_date, doc.due_date)?;

    let sql = format!(
        "INSERT INTO {} (warehouse_id, {}, {}, amount, issue_date, due_date, description) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        kind.table(),
        kind.party_column(),
        kind.number_column()
    );
    let id = sqlx::query(&sql)
        .bind(doc.warehouse_id)
        .bind(doc.counterparty.trim())
        .bind(doc.number.trim())
        .bind(doc.amount)
        .bind(doc.issue_date)
        .bind(doc.due_date)
        .bind(doc.description)
        .execute(pool)
        .await?
        .last_insert_id();

    info!(
        document = kind.key(),
        document_id = id,
        counterparty = %doc.counterparty,
        amount = %doc.amount,
        "Document recorded"
    );
    Ok(id)
}

pub(crate) async fn list_documents<D: SettlementDocument>(
    pool: &MySqlPool,
    query: &DocumentQuery,
) -> ApiResult<DocumentPage<D::View>> {
    let kind = D::KIND;
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
        warehouse_id: query.warehouse_id,
    }
    .bounds();

    let filters = document_filters(kind, query);
    let where_clause = filters.where_clause();

    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {} {}",
            kind.table(),
            where_clause
        )))
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "SELECT {} FROM {} {} ORDER BY due_date, id LIMIT ? OFFSET ?",
        kind.columns(),
        kind.table(),
        where_clause
    );
    let as_of = today();
    let data = filters
        .bind_as(sqlx::query_as::<_, D>(&data_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| row.into_view(as_of))
        .collect();

    Ok(DocumentPage {
        data,
        page,
        per_page,
        total,
    })
}

pub(crate) async fn fetch_document<D: SettlementDocument>(
    pool: &MySqlPool,
    document_id: u64,
) -> ApiResult<D::View> {
    let kind = D::KIND;
    let row = sqlx::query_as::<_, D>(&format!(
        "SELECT {} FROM {} WHERE id = ?",
        kind.columns(),
        kind.table()
    ))
    .bind(document_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(kind.label()))?;

    Ok(row.into_view(today()))
}

/// Locks the document row, applies the payment rule and records the payment.
pub(crate) async fn record_payment(
    pool: &MySqlPool,
    kind: DocumentKind,
    document_id: u64,
    payload: &RecordPayment,
) -> ApiResult<PaymentResult> {
    let mut tx = pool.begin().await?;

    let (amount, paid_amount, due_date) = sqlx::query_as::<_, (Decimal, Decimal, NaiveDate)>(
        &format!(
            "SELECT amount, paid_amount, due_date FROM {} WHERE id = ? FOR UPDATE",
            kind.table()
        ),
    )
    .bind(document_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found(kind.label()))?;

    let new_paid = apply_payment(amount, paid_amount, payload.amount)?;
    let payment_date = payload.payment_date.unwrap_or_else(today);
    let method = payload
        .method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("bank_transfer");

    sqlx::query(&format!(
        "UPDATE {} SET paid_amount = ? WHERE id = ?",
        kind.table()
    ))
    .bind(new_paid)
    .bind(document_id)
    .execute(&mut *tx)
    .await?;

    let payment_id = sqlx::query(
        r#"
        INSERT INTO payments (document_kind, document_id, amount, payment_date, method, reference)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(kind.key())
    .bind(document_id)
    .bind(new_paid - paid_amount)
    .bind(payment_date)
    .bind(method)
    .bind(&payload.reference)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    tx.commit().await?;

    let status = derive_status(amount, new_paid, due_date, today());
    info!(
        document = kind.key(),
        document_id,
        payment_id,
        paid = %new_paid,
        status = %status,
        "Payment recorded"
    );

    Ok(PaymentResult {
        payment_id,
        document_id,
        paid_amount: new_paid,
        outstanding: outstanding(amount, new_paid),
        status,
    })
}

pub(crate) async fn list_payments(
    pool: &MySqlPool,
    kind: DocumentKind,
    document_id: u64,
) -> ApiResult<Vec<Payment>> {
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)",
        kind.table()
    ))
    .bind(document_id)
    .fetch_one(pool)
    .await?;
    if !exists {
        return Err(ApiError::not_found(kind.label()));
    }

    Ok(sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, document_kind, document_id, amount, payment_date, method, reference
        FROM payments
        WHERE document_kind = ? AND document_id = ?
        ORDER BY payment_date, id
        "#,
    )
    .bind(kind.key())
    .bind(document_id)
    .fetch_all(pool)
    .await?)
}

/// Builds the aging report from every unsettled document.
pub(crate) async fn aging_report<D: SettlementDocument>(
    pool: &MySqlPool,
    warehouse_id: Option<u64>,
    as_of: NaiveDate,
) -> ApiResult<AgingReport> {
    let filters = Filters::new()
        .eq_u64("warehouse_id", warehouse_id)
        .clause("paid_amount < amount");
    let full_sql = format!(
        "SELECT {} FROM {} {}",
        D::KIND.columns(),
        D::KIND.table(),
        filters.where_clause()
    );

    let rows: Vec<D> = filters
        .bind_as(sqlx::query_as::<_, D>(&full_sql))
        .fetch_all(pool)
        .await?;

    Ok(AgingReport::build(rows.into_iter().map(Into::into), as_of))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_matches_derivation_rules() {
        let where_clause = |status| status_filter(Filters::new(), status).where_clause();
        assert_eq!(where_clause(None), "");
        assert_eq!(
            where_clause(Some(DocumentStatus::Paid)),
            "WHERE (paid_amount >= amount)"
        );
        assert_eq!(
            where_clause(Some(DocumentStatus::Overdue)),
            "WHERE (paid_amount < amount AND due_date < ?)"
        );
    }

    #[test]
    fn tables_and_keys() {
        assert_eq!(DocumentKind::Bill.table(), "vendor_bills");
        assert_eq!(DocumentKind::Invoice.key(), "invoice");
        assert_eq!(
            DocumentKind::Invoice.columns(),
            "id, warehouse_id, customer_name, invoice_number, amount, paid_amount, issue_date, due_date, description"
        );
    }

    #[test]
    fn list_filters_search_the_counterparty_of_each_kind() {
        let query = DocumentQuery {
            page: None,
            per_page: None,
            warehouse_id: Some(2),
            status: Some(DocumentStatus::Paid),
            search: Some("acme".to_string()),
        };
        let bills = document_filters(DocumentKind::Bill, &query).where_clause();
        assert!(bills.starts_with("WHERE warehouse_id = ?"));
        assert!(bills.contains("vendor_name LIKE ?"));
        assert!(bills.contains("bill_number LIKE ?"));
        assert!(bills.ends_with("(paid_amount >= amount)"));

        let invoices = document_filters(DocumentKind::Invoice, &query).where_clause();
        assert!(invoices.contains("customer_name LIKE ?"));
        assert!(!invoices.contains("vendor_name"));
    }
}
