use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ledger::{
    AccountType, BalanceReconciliation, LedgerRow, LedgerSummary, Posting, reconcile,
    running_balance, summarize,
};
use crate::domain::{DomainError, require};
use crate::error::{ApiError, ApiResult};
use crate::model::account::Account;
use crate::model::journal::PostingRow;
use crate::models::{MessageResponse, PageQuery};
use crate::utils::db_utils::Filters;
use crate::utils::summary_cache;

pub(crate) const ACCOUNT_COLUMNS: &str =
    "id, warehouse_id, code, name, account_type, opening_balance, balance, is_active";

#[derive(Deserialize, ToSchema)]
pub struct CreateAccount {
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "1010")]
    pub code: String,
    #[schema(example = "Cash - Operating")]
    pub name: String,
    #[schema(example = "asset")]
    pub account_type: AccountType,
    #[serde(default)]
    #[schema(example = "5000.00")]
    pub opening_balance: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAccount {
    #[schema(example = "Cash - Main Operating")]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct AccountListResponse {
    pub data: Vec<Account>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AccountLedgerResponse {
    pub account: Account,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub rows: Vec<LedgerRow>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SummaryQuery {
    #[schema(example = 1)]
    pub warehouse_id: u64,
}

pub async fn fetch_account(pool: &MySqlPool, account_id: u64) -> ApiResult<Account> {
    let sql = format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS);
    sqlx::query_as::<_, Account>(&sql)
        .bind(account_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))
}

async fn fetch_postings<'e, E>(executor: E, account_id: u64) -> ApiResult<Vec<Posting>>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let rows = sqlx::query_as::<_, PostingRow>(
        r#"
        SELECT l.id AS line_id, l.entry_id, e.entry_date, e.memo, l.debit, l.credit
        FROM journal_lines l
        JOIN journal_entries e ON e.id = l.entry_id
        WHERE l.account_id = ?
        ORDER BY e.entry_date, l.id
        "#,
    )
    .bind(account_id)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(Posting::from).collect())
}

#[utoipa::path(
    post,
    path = "/api/accounts",
    request_body = CreateAccount,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 409, description = "Code already used in this warehouse")
    ),
    tag = "Accounts"
)]
pub async fn create_account(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAccount>,
) -> ApiResult<impl Responder> {
    require("code", &payload.code)?;
    require("name", &payload.name)?;

    let result = sqlx::query(
        r#"
        INSERT INTO accounts (warehouse_id, code, name, account_type, opening_balance, balance)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.warehouse_id)
    .bind(payload.code.trim())
    .bind(payload.name.trim())
    .bind(payload.account_type.to_string())
    .bind(payload.opening_balance)
    .bind(payload.opening_balance)
    .execute(pool.get_ref())
    .await?;

    summary_cache::invalidate(payload.warehouse_id).await;

    let id = result.last_insert_id();
    info!(account_id = id, code = %payload.code, "Account created");
    Ok(HttpResponse::Created().json(MessageResponse::created("Account created", id)))
}

#[utoipa::path(
    get,
    path = "/api/accounts",
    params(PageQuery),
    responses((status = 200, body = AccountListResponse)),
    tag = "Accounts"
)]
pub async fn list_accounts(
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> ApiResult<impl Responder> {
    let (page, per_page, offset) = query.bounds();
    let filters = Filters::new().eq_u64("warehouse_id", query.warehouse_id);
    let where_clause = filters.where_clause();

    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM accounts {}",
            where_clause
        )))
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {} FROM accounts {} ORDER BY warehouse_id, code LIMIT ? OFFSET ?",
        ACCOUNT_COLUMNS, where_clause
    );
    let data = filters
        .bind_as(sqlx::query_as::<_, Account>(&data_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(AccountListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}",
    params(("account_id", Path, description = "Account ID")),
    responses((status = 200, body = Account), (status = 404)),
    tag = "Accounts"
)]
pub async fn get_account(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let account = fetch_account(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// Renames or (de)activates an account. Type and balance are not editable.
#[utoipa::path(
    put,
    path = "/api/accounts/{account_id}",
    params(("account_id", Path, description = "Account ID")),
    request_body = UpdateAccount,
    responses((status = 200, body = Account), (status = 404)),
    tag = "Accounts"
)]
pub async fn update_account(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateAccount>,
) -> ApiResult<impl Responder> {
    let account_id = path.into_inner();
    let current = fetch_account(pool.get_ref(), account_id).await?;

    let name = match &body.name {
        Some(n) => {
            require("name", n)?;
            n.trim().to_string()
        }
        None => current.name.clone(),
    };
    let is_active = body.is_active.unwrap_or(current.is_active);

    sqlx::query("UPDATE accounts SET name = ?, is_active = ? WHERE id = ?")
        .bind(&name)
        .bind(is_active)
        .bind(account_id)
        .execute(pool.get_ref())
        .await?;

    summary_cache::invalidate(current.warehouse_id).await;

    let account = fetch_account(pool.get_ref(), account_id).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// Account activity with the balance carried forward after each line.
#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/ledger",
    params(("account_id", Path, description = "Account ID")),
    responses((status = 200, body = AccountLedgerResponse), (status = 404)),
    tag = "Accounts"
)]
pub async fn account_ledger(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let account = fetch_account(pool.get_ref(), path.into_inner()).await?;
    let kind = account.kind()?;
    let postings = fetch_postings(pool.get_ref(), account.id).await?;

    let rows = running_balance(account.opening_balance, kind, postings);
    let closing_balance = rows
        .last()
        .map(|r| r.balance)
        .unwrap_or(account.opening_balance);

    Ok(HttpResponse::Ok().json(AccountLedgerResponse {
        opening_balance: account.opening_balance,
        closing_balance,
        rows,
        account,
    }))
}

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/reconcile",
    params(("account_id", Path, description = "Account ID")),
    responses((status = 200, body = BalanceReconciliation), (status = 404)),
    tag = "Accounts"
)]
pub async fn reconcile_account(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let account = fetch_account(pool.get_ref(), path.into_inner()).await?;
    let postings = fetch_postings(pool.get_ref(), account.id).await?;

    let report = reconcile(
        account.opening_balance,
        account.balance,
        account.kind()?,
        &postings,
    );
    Ok(HttpResponse::Ok().json(report))
}

async fn lock_account(tx: &mut Transaction<'_, MySql>, account_id: u64) -> ApiResult<Account> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE id = ? FOR UPDATE",
        ACCOUNT_COLUMNS
    );
    sqlx::query_as::<_, Account>(&sql)
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))
}

/// Rewrites the stored balance from journal activity.
#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/reconcile",
    params(("account_id", Path, description = "Account ID")),
    responses(
        (status = 200, description = "Balance before and after the repair", body = BalanceReconciliation),
        (status = 404)
    ),
    tag = "Accounts"
)]
pub async fn repair_account_balance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let account_id = path.into_inner();
    let mut tx = pool.begin().await?;

    let account = lock_account(&mut tx, account_id).await?;
    let postings = fetch_postings(&mut *tx, account_id).await?;
    let report = reconcile(
        account.opening_balance,
        account.balance,
        account.kind()?,
        &postings,
    );

    if !report.in_balance {
        warn!(
            account_id,
            drift = %report.drift,
            "Stored account balance drifted from journal activity; repairing"
        );
        sqlx::query("UPDATE accounts SET balance = ? WHERE id = ?")
            .bind(report.computed_balance)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    summary_cache::invalidate(account.warehouse_id).await;
    Ok(HttpResponse::Ok().json(report))
}

/// Every account counts toward the totals, active or not.
fn summarize_accounts(rows: Vec<(String, Decimal, bool)>) -> ApiResult<LedgerSummary> {
    let mut inactive_accounts = 0;
    let mut balances = Vec::with_capacity(rows.len());
    for (ty, balance, is_active) in rows {
        let account_type = ty
            .parse::<AccountType>()
            .map_err(|_| DomainError::Invalid(format!("unknown account type {:?}", ty)))?;
        if !is_active {
            inactive_accounts += 1;
        }
        balances.push((account_type, balance));
    }

    let mut summary = summarize(balances);
    summary.inactive_accounts = inactive_accounts;
    Ok(summary)
}

/// Totals by account type for one warehouse plus the accounting-equation check.
#[utoipa::path(
    get,
    path = "/api/accounts/summary",
    params(SummaryQuery),
    responses((status = 200, body = LedgerSummary)),
    tag = "Accounts"
)]
pub async fn account_summary(
    pool: web::Data<MySqlPool>,
    query: web::Query<SummaryQuery>,
) -> ApiResult<impl Responder> {
    let warehouse_id = query.warehouse_id;
    if let Some(summary) = summary_cache::get(warehouse_id).await {
        debug!(warehouse_id, "Account summary served from cache");
        return Ok(HttpResponse::Ok().json(summary));
    }

    let generation = summary_cache::generation(warehouse_id);
    let rows = sqlx::query_as::<_, (String, Decimal, bool)>(
        "SELECT account_type, balance, is_active FROM accounts WHERE warehouse_id = ?",
    )
    .bind(warehouse_id)
    .fetch_all(pool.get_ref())
    .await?;

    let summary = summarize_accounts(rows)?;
    if !summary.imbalance.is_zero() {
        warn!(warehouse_id, imbalance = %summary.imbalance, "Books do not balance");
    }
    summary_cache::put(warehouse_id, generation, summary.clone()).await;

    Ok(HttpResponse::Ok().json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(ty: &str, balance: Decimal, is_active: bool) -> (String, Decimal, bool) {
        (ty.to_string(), balance, is_active)
    }

    #[test]
    fn deactivated_accounts_stay_in_the_equation() {
        let summary = summarize_accounts(vec![
            row("asset", dec!(700), true),
            row("asset", dec!(300), false),
            row("liability", dec!(250), true),
            row("equity", dec!(750), true),
        ])
        .unwrap();
        assert_eq!(summary.imbalance, Decimal::ZERO);
        assert_eq!(summary.inactive_accounts, 1);
    }

    #[test]
    fn unknown_account_type_is_rejected() {
        assert!(summarize_accounts(vec![row("cash", dec!(1), true)]).is_err());
    }
}
