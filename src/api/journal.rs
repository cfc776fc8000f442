use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::info;
use utoipa::ToSchema;

use crate::api::account::ACCOUNT_COLUMNS;
use crate::domain::DomainError;
use crate::domain::ledger::{EntryLine, validate_entry};
use crate::error::{ApiError, ApiResult};
use crate::model::account::Account;
use crate::model::journal::JournalEntry;
use crate::models::{MessageResponse, PageQuery};
use crate::utils::db_utils::Filters;
use crate::utils::summary_cache;

#[derive(Deserialize, ToSchema)]
pub struct CreateJournalEntry {
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "2026-03-15", format = "date", value_type = String)]
    pub entry_date: NaiveDate,
    #[schema(example = "Pallet racking purchase")]
    pub memo: Option<String>,
    #[schema(example = "PO-8812")]
    pub reference: Option<String>,
    pub lines: Vec<EntryLine>,
}

#[derive(Serialize, ToSchema, sqlx::FromRow)]
pub struct JournalLineView {
    pub id: u64,
    pub entry_id: u64,
    pub account_id: u64,
    pub account_code: String,
    pub account_name: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Serialize, ToSchema)]
pub struct JournalEntryView {
    pub id: u64,
    pub warehouse_id: u64,
    #[schema(value_type = String, format = "date")]
    pub entry_date: NaiveDate,
    pub memo: Option<String>,
    pub reference: Option<String>,
    pub lines: Vec<JournalLineView>,
}

#[derive(Serialize, ToSchema)]
pub struct JournalListResponse {
    pub data: Vec<JournalEntryView>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Posts a balanced entry and moves every touched account balance in the
/// same transaction.
#[utoipa::path(
    post,
    path = "/api/journal",
    request_body = CreateJournalEntry,
    responses(
        (status = 201, description = "Entry posted", body = MessageResponse),
        (status = 400, description = "Unbalanced or malformed entry", body = Object, example = json!({
            "message": "journal entry is unbalanced: debits 100.00 != credits 90.00"
        })),
        (status = 404, description = "Unknown account")
    ),
    tag = "Journal"
)]
pub async fn post_journal_entry(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateJournalEntry>,
) -> ApiResult<impl Responder> {
    let (debits, _) = validate_entry(&payload.lines)?;

    let mut account_ids: Vec<u64> = payload.lines.iter().map(|l| l.account_id).collect();
    account_ids.sort_unstable();
    account_ids.dedup();

    let mut tx = pool.begin().await?;

    // lock in id order so concurrent postings cannot deadlock
    let placeholders = vec!["?"; account_ids.len()].join(", ");
    let lock_sql = format!(
        "SELECT {} FROM accounts WHERE id IN ({}) ORDER BY id FOR UPDATE",
        ACCOUNT_COLUMNS, placeholders
    );
    let mut lock_query = sqlx::query_as::<_, Account>(&lock_sql);
    for id in &account_ids {
        lock_query = lock_query.bind(*id);
    }
    let accounts: HashMap<u64, Account> = lock_query
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    for id in &account_ids {
        let account = accounts
            .get(id)
            .ok_or_else(|| ApiError::NotFound(format!("Account {} not found", id)))?;
        if account.warehouse_id != payload.warehouse_id {
            return Err(DomainError::Invalid(format!(
                "account {} belongs to another warehouse",
                account.code
            ))
            .into());
        }
        if !account.is_active {
            return Err(DomainError::Invalid(format!("account {} is inactive", account.code)).into());
        }
    }

    let entry_id = sqlx::query(
        "INSERT INTO journal_entries (warehouse_id, entry_date, memo, reference) VALUES (?, ?, ?, ?)",
    )
    .bind(payload.warehouse_id)
    .bind(payload.entry_date)
    .bind(&payload.memo)
    .bind(&payload.reference)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    let mut deltas: HashMap<u64, Decimal> = HashMap::new();
    for line in &payload.lines {
        sqlx::query(
            "INSERT INTO journal_lines (entry_id, account_id, debit, credit) VALUES (?, ?, ?, ?)",
        )
        .bind(entry_id)
        .bind(line.account_id)
        .bind(line.debit)
        .bind(line.credit)
        .execute(&mut *tx)
        .await?;

        // accounts were checked above, the lookup cannot miss
        if let Some(account) = accounts.get(&line.account_id) {
            let delta = account.kind()?.balance_delta(line.debit, line.credit);
            *deltas.entry(line.account_id).or_default() += delta;
        }
    }

    for (account_id, delta) in &deltas {
        sqlx::query("UPDATE accounts SET balance = balance + ? WHERE id = ?")
            .bind(*delta)
            .bind(*account_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    summary_cache::invalidate(payload.warehouse_id).await;
    info!(entry_id, total = %debits, lines = payload.lines.len(), "Journal entry posted");

    Ok(HttpResponse::Created().json(MessageResponse::created("Journal entry posted", entry_id)))
}

#[utoipa::path(
    get,
    path = "/api/journal",
    params(PageQuery),
    responses((status = 200, body = JournalListResponse)),
    tag = "Journal"
)]
pub async fn list_journal_entries(
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> ApiResult<impl Responder> {
    let (page, per_page, offset) = query.bounds();
    let filters = Filters::new().eq_u64("warehouse_id", query.warehouse_id);
    let where_clause = filters.where_clause();

    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM journal_entries {}",
            where_clause
        )))
        .fetch_one(pool.get_ref())
        .await?;

    let entries_sql = format!(
        "SELECT id, warehouse_id, entry_date, memo, reference FROM journal_entries {} \
         ORDER BY entry_date DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let entries = filters
        .bind_as(sqlx::query_as::<_, JournalEntry>(&entries_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    let mut lines_by_entry: HashMap<u64, Vec<JournalLineView>> = HashMap::new();
    if !entries.is_empty() {
        let placeholders = vec!["?"; entries.len()].join(", ");
        let lines_sql = format!(
            r#"
            SELECT l.id, l.entry_id, l.account_id, a.code AS account_code, a.name AS account_name,
                   l.debit, l.credit
            FROM journal_lines l
            JOIN accounts a ON a.id = l.account_id
            WHERE l.entry_id IN ({})
            ORDER BY l.id
            "#,
            placeholders
        );
        let mut lines_query = sqlx::query_as::<_, JournalLineView>(&lines_sql);
        for entry in &entries {
            lines_query = lines_query.bind(entry.id);
        }
        for line in lines_query.fetch_all(pool.get_ref()).await? {
            lines_by_entry.entry(line.entry_id).or_default().push(line);
        }
    }

    let data = entries
        .into_iter()
        .map(|e| JournalEntryView {
            lines: lines_by_entry.remove(&e.id).unwrap_or_default(),
            id: e.id,
            warehouse_id: e.warehouse_id,
            entry_date: e.entry_date,
            memo: e.memo,
            reference: e.reference,
        })
        .collect();

    Ok(HttpResponse::Ok().json(JournalListResponse {
        data,
        page,
        per_page,
        total,
    }))
}
