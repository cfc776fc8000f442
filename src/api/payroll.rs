use actix_web::http::header;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use std::str::FromStr;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::api::employee::fetch_employee;
use crate::config::Config;
use crate::domain::DomainError;
use crate::domain::export::{PayrollCsvRow, payroll_csv};
use crate::domain::payroll::{PayBreakdown, PayrollStatus, compute_pay};
use crate::error::{ApiError, ApiResult};
use crate::model::employee::Employee;
use crate::model::payroll::PayrollEntry;
use crate::models::PageQuery;
use crate::utils::db_utils::Filters;

const PAYROLL_COLUMNS: &str = "id, employee_id, period_start, period_end, hours, overtime_hours, \
     gross_pay, deductions, net_pay, status, processed_at, paid_at";

#[derive(Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub period_start: NaiveDate,

    #[schema(example = "2026-03-14", value_type = String, format = "date")]
    pub period_end: NaiveDate,

    #[schema(example = "80.00")]
    #[serde(default)]
    pub hours: Decimal,

    #[schema(example = "4.50")]
    #[serde(default)]
    pub overtime_hours: Decimal,
}

/// Only hours and the period can change; pay is recomputed from the
/// employee's current compensation.
#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(example = "76.00")]
    pub hours: Option<Decimal>,

    #[schema(example = "0.00")]
    pub overtime_hours: Option<Decimal>,

    #[schema(value_type = Option<String>, format = "date")]
    pub period_start: Option<NaiveDate>,

    #[schema(value_type = Option<String>, format = "date")]
    pub period_end: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayrollStatus {
    #[schema(example = "processed")]
    pub status: PayrollStatus,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 20)]
    pub per_page: Option<u32>,

    #[schema(example = 1)]
    pub employee_id: Option<u64>,

    pub status: Option<PayrollStatus>,

    /// Entries whose period ends on or after this date
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,

    /// Entries whose period starts on or before this date
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

impl PayrollQuery {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
            warehouse_id: None,
        }
    }

    fn filters(&self, prefix: &str) -> Filters {
        let status = self.status.map(|s| s.to_string());
        let mut filters = Filters::new()
            .eq_u64(&format!("{}employee_id", prefix), self.employee_id)
            .eq_str(&format!("{}status", prefix), status.as_deref());
        if let Some(from) = self.from {
            filters = filters.clause_with_date(&format!("{}period_end >= ?", prefix), from);
        }
        if let Some(to) = self.to {
            filters = filters.clause_with_date(&format!("{}period_start <= ?", prefix), to);
        }
        filters
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<PayrollEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct PayrollCreated {
    pub id: u64,
    pub employee_id: u64,
    pub breakdown: PayBreakdown,
}

fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<(), DomainError> {
    if start > end {
        return Err(DomainError::Invalid(
            "period_start cannot be after period_end".to_string(),
        ));
    }
    Ok(())
}

fn pay_for(
    employee: &Employee,
    hours: Decimal,
    overtime_hours: Decimal,
    config: &Config,
) -> ApiResult<PayBreakdown> {
    if employee.status != "active" {
        return Err(DomainError::Invalid(format!(
            "employee {} is not active",
            employee.employee_code
        ))
        .into());
    }
    let compensation = employee.compensation()?;
    compensation.validate()?;
    Ok(compute_pay(
        &compensation,
        hours,
        overtime_hours,
        config.pay_policy(),
    )?)
}

async fn lock_payroll(
    tx: &mut Transaction<'_, MySql>,
    payroll_id: u64,
) -> ApiResult<PayrollEntry> {
    let sql = format!(
        "SELECT {} FROM payroll_entries WHERE id = ? FOR UPDATE",
        PAYROLL_COLUMNS
    );
    sqlx::query_as::<_, PayrollEntry>(&sql)
        .bind(payroll_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Payroll entry"))
}

async fn fetch_payroll(pool: &MySqlPool, payroll_id: u64) -> ApiResult<PayrollEntry> {
    let sql = format!("SELECT {} FROM payroll_entries WHERE id = ?", PAYROLL_COLUMNS);
    sqlx::query_as::<_, PayrollEntry>(&sql)
        .bind(payroll_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Payroll entry"))
}

/// Creates a draft entry with gross, deductions and net computed from the
/// employee's compensation.
#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll entry created", body = PayrollCreated),
        (status = 400, description = "Invalid period, hours or compensation"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Payroll"
)]
pub async fn create_payroll(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreatePayroll>,
) -> ApiResult<impl Responder> {
    validate_period(payload.period_start, payload.period_end)?;

    let employee = fetch_employee(pool.get_ref(), payload.employee_id).await?;
    let breakdown = pay_for(
        &employee,
        payload.hours,
        payload.overtime_hours,
        config.get_ref(),
    )?;

    let id = sqlx::query(
        r#"
        INSERT INTO payroll_entries
        (employee_id, period_start, period_end, hours, overtime_hours, gross_pay, deductions, net_pay, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.period_start)
    .bind(payload.period_end)
    .bind(payload.hours)
    .bind(payload.overtime_hours)
    .bind(breakdown.gross_pay)
    .bind(breakdown.deductions)
    .bind(breakdown.net_pay)
    .bind(PayrollStatus::Draft.to_string())
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    info!(
        payroll_id = id,
        employee_id = payload.employee_id,
        employee = %employee.full_name(),
        gross = %breakdown.gross_pay,
        net = %breakdown.net_pay,
        "Payroll entry created"
    );

    Ok(HttpResponse::Created().json(PayrollCreated {
        id,
        employee_id: payload.employee_id,
        breakdown,
    }))
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll updated", body = PayrollEntry),
        (status = 404, description = "Payroll not found"),
        (status = 409, description = "Entry is no longer a draft")
    ),
    tag = "Payroll"
)]
pub async fn update_payroll(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> ApiResult<impl Responder> {
    let payroll_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let current = lock_payroll(&mut tx, payroll_id).await?;

    let status = current.status()?;
    if !status.is_editable() {
        return Err(ApiError::Conflict(format!(
            "payroll entry is {} and can no longer be edited",
            status
        )));
    }

    let period_start = body.period_start.unwrap_or(current.period_start);
    let period_end = body.period_end.unwrap_or(current.period_end);
    validate_period(period_start, period_end)?;

    let hours = body.hours.unwrap_or(current.hours);
    let overtime_hours = body.overtime_hours.unwrap_or(current.overtime_hours);

    let employee = fetch_employee(pool.get_ref(), current.employee_id).await?;
    let breakdown = pay_for(&employee, hours, overtime_hours, config.get_ref())?;

    sqlx::query(
        r#"
        UPDATE payroll_entries
        SET period_start = ?, period_end = ?, hours = ?, overtime_hours = ?,
            gross_pay = ?, deductions = ?, net_pay = ?
        WHERE id = ?
        "#,
    )
    .bind(period_start)
    .bind(period_end)
    .bind(hours)
    .bind(overtime_hours)
    .bind(breakdown.gross_pay)
    .bind(breakdown.deductions)
    .bind(breakdown.net_pay)
    .bind(payroll_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(payroll_id, net = %breakdown.net_pay, "Payroll entry recomputed");
    Ok(HttpResponse::Ok().json(fetch_payroll(pool.get_ref(), payroll_id).await?))
}

/// Moves an entry one step forward: draft → processed → paid.
#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}/status",
    request_body = UpdatePayrollStatus,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Status changed", body = PayrollEntry),
        (status = 404, description = "Payroll not found"),
        (status = 409, description = "Transition not allowed", body = Object, example = json!({
            "message": "payroll entry cannot move from paid to draft"
        }))
    ),
    tag = "Payroll"
)]
pub async fn update_payroll_status(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayrollStatus>,
) -> ApiResult<impl Responder> {
    let payroll_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let current = lock_payroll(&mut tx, payroll_id).await?;
    let next = current.status()?.advance_to(body.status)?;

    let stamp_column = match next {
        PayrollStatus::Processed => "processed_at",
        PayrollStatus::Paid => "paid_at",
        // advance_to never returns to draft
        PayrollStatus::Draft => return Err(ApiError::Internal),
    };
    sqlx::query(&format!(
        "UPDATE payroll_entries SET status = ?, {} = NOW() WHERE id = ?",
        stamp_column
    ))
    .bind(next.to_string())
    .bind(payroll_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(payroll_id, from = %current.status, to = %next, "Payroll status changed");
    Ok(HttpResponse::Ok().json(fetch_payroll(pool.get_ref(), payroll_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, body = PayrollEntry),
        (status = 404)
    ),
    tag = "Payroll"
)]
pub async fn get_payroll(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let payroll = fetch_payroll(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payroll))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse)
    ),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> ApiResult<impl Responder> {
    let (page, per_page, offset) = query.page_query().bounds();

    let filters = query.filters("");
    let where_clause = filters.where_clause();

    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM payroll_entries {}",
            where_clause
        )))
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {} FROM payroll_entries {} ORDER BY period_start DESC, id DESC LIMIT ? OFFSET ?",
        PAYROLL_COLUMNS, where_clause
    );
    let data = filters
        .bind_as(sqlx::query_as::<_, PayrollEntry>(&data_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[derive(sqlx::FromRow)]
struct ExportRow {
    employee_code: String,
    first_name: String,
    last_name: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    hours: Decimal,
    overtime_hours: Decimal,
    gross_pay: Decimal,
    deductions: Decimal,
    net_pay: Decimal,
    status: String,
}

impl TryFrom<ExportRow> for PayrollCsvRow {
    type Error = DomainError;

    fn try_from(row: ExportRow) -> Result<Self, Self::Error> {
        let status = PayrollStatus::from_str(&row.status)
            .map_err(|_| DomainError::Invalid(format!("unknown payroll status {:?}", row.status)))?;
        Ok(PayrollCsvRow {
            employee_code: row.employee_code,
            employee_name: format!("{} {}", row.first_name, row.last_name)
                .trim()
                .to_string(),
            period_start: row.period_start,
            period_end: row.period_end,
            hours: row.hours,
            overtime_hours: row.overtime_hours,
            gross_pay: row.gross_pay,
            deductions: row.deductions,
            net_pay: row.net_pay,
            status,
        })
    }
}

/// Payroll history as a CSV attachment. Takes the list filters, ignores paging.
#[utoipa::path(
    get,
    path = "/api/payroll/export",
    params(PayrollQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String)
    ),
    tag = "Payroll"
)]
pub async fn export_payroll(
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> ApiResult<impl Responder> {
    let filters = query.filters("p.");
    let sql = format!(
        r#"
        SELECT e.employee_code, e.first_name, e.last_name,
               p.period_start, p.period_end, p.hours, p.overtime_hours,
               p.gross_pay, p.deductions, p.net_pay, p.status
        FROM payroll_entries p
        JOIN employees e ON e.id = p.employee_id
        {}
        ORDER BY p.period_start, e.employee_code, p.id
        "#,
        filters.where_clause()
    );

    let rows = filters
        .bind_as(sqlx::query_as::<_, ExportRow>(&sql))
        .fetch_all(pool.get_ref())
        .await?
        .into_iter()
        .map(PayrollCsvRow::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let body = payroll_csv(&rows)?;
    info!(rows = rows.len(), "Payroll exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"payroll.csv\"",
        ))
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> PayrollQuery {
        PayrollQuery {
            page: None,
            per_page: None,
            employee_id: Some(4),
            status: Some(PayrollStatus::Processed),
            from: None,
            to: NaiveDate::from_ymd_opt(2026, 3, 31),
        }
    }

    #[test]
    fn paging_far_past_the_end_keeps_a_wide_offset() {
        let mut q = query();
        q.page = Some(u32::MAX);
        q.per_page = Some(100);
        assert_eq!(
            q.page_query().bounds(),
            (u32::MAX, 100, (u32::MAX as u64 - 1) * 100)
        );
    }

    #[test]
    fn period_must_not_be_inverted() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert!(validate_period(d(1), d(14)).is_ok());
        assert!(validate_period(d(14), d(14)).is_ok());
        assert!(validate_period(d(15), d(14)).is_err());
    }

    #[test]
    fn export_filters_use_table_prefix() {
        assert_eq!(
            query().filters("p.").where_clause(),
            "WHERE p.employee_id = ? AND p.status = ? AND (p.period_start <= ?)"
        );
        assert_eq!(
            query().filters("").where_clause(),
            "WHERE employee_id = ? AND status = ? AND (period_start <= ?)"
        );
    }

    #[test]
    fn export_row_rejects_unknown_status() {
        let row = |status: &str| ExportRow {
            employee_code: "EMP-1".to_string(),
            first_name: "Ana".to_string(),
            last_name: String::new(),
            period_start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            hours: Decimal::from(80),
            overtime_hours: Decimal::ZERO,
            gross_pay: Decimal::from(1600),
            deductions: Decimal::from(320),
            net_pay: Decimal::from(1280),
            status: status.to_string(),
        };
        let csv_row = PayrollCsvRow::try_from(row("paid")).unwrap();
        assert_eq!(csv_row.employee_name, "Ana");
        assert_eq!(csv_row.status, PayrollStatus::Paid);
        assert!(PayrollCsvRow::try_from(row("void")).is_err());
    }
}
