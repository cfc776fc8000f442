use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::money::round_cents;
use crate::domain::{DomainError, require};
use crate::error::ApiResult;
use crate::model::expense::Expense;
use crate::models::{MessageResponse, PageQuery, today};
use crate::utils::db_utils::Filters;

#[derive(Deserialize, ToSchema)]
pub struct CreateExpense {
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "utilities")]
    pub category: String,
    #[schema(example = "March electricity")]
    pub description: Option<String>,
    #[schema(example = "City Power & Light")]
    pub vendor: Option<String>,
    #[schema(example = "842.17")]
    pub amount: Decimal,
    /// Defaults to today
    #[schema(example = "2026-03-31", format = "date", value_type = Option<String>)]
    pub expense_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ExpenseQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub warehouse_id: Option<u64>,
    pub category: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

impl ExpenseQuery {
    fn filters(&self) -> Filters {
        let mut filters = Filters::new()
            .eq_u64("warehouse_id", self.warehouse_id)
            .eq_str("category", self.category.as_deref());
        if let Some(from) = self.from {
            filters = filters.clause_with_date("expense_date >= ?", from);
        }
        if let Some(to) = self.to {
            filters = filters.clause_with_date("expense_date <= ?", to);
        }
        filters
    }
}

#[derive(Serialize, ToSchema)]
pub struct ExpenseListResponse {
    pub data: Vec<Expense>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub count: i64,
    pub total: Decimal,
}

#[derive(Serialize, ToSchema)]
pub struct ExpenseSummary {
    pub categories: Vec<CategoryTotal>,
    pub grand_total: Decimal,
}

fn validate_expense(payload: &CreateExpense) -> Result<(), DomainError> {
    require("category", &payload.category)?;
    if payload.amount <= Decimal::ZERO {
        return Err(DomainError::Invalid(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpense,
    responses(
        (status = 201, description = "Expense recorded", body = MessageResponse),
        (status = 400, description = "Missing category or non-positive amount")
    ),
    tag = "Expenses"
)]
pub async fn create_expense(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateExpense>,
) -> ApiResult<impl Responder> {
    validate_expense(&payload)?;

    let amount = round_cents(payload.amount);
    let id = sqlx::query(
        r#"
        INSERT INTO expenses (warehouse_id, category, description, vendor, amount, expense_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.warehouse_id)
    .bind(payload.category.trim().to_lowercase())
    .bind(&payload.description)
    .bind(&payload.vendor)
    .bind(amount)
    .bind(payload.expense_date.unwrap_or_else(today))
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    info!(expense_id = id, category = %payload.category, amount = %amount, "Expense recorded");
    Ok(HttpResponse::Created().json(MessageResponse::created("Expense recorded", id)))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    params(ExpenseQuery),
    responses((status = 200, body = ExpenseListResponse)),
    tag = "Expenses"
)]
pub async fn list_expenses(
    pool: web::Data<MySqlPool>,
    query: web::Query<ExpenseQuery>,
) -> ApiResult<impl Responder> {
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
        warehouse_id: query.warehouse_id,
    }
    .bounds();

    let filters = query.filters();
    let where_clause = filters.where_clause();

    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM expenses {}",
            where_clause
        )))
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT id, warehouse_id, category, description, vendor, amount, expense_date \
         FROM expenses {} ORDER BY expense_date DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let data = filters
        .bind_as(sqlx::query_as::<_, Expense>(&data_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(ExpenseListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Totals per category, largest first. Accepts the same filters as the list.
#[utoipa::path(
    get,
    path = "/api/expenses/summary",
    params(ExpenseQuery),
    responses((status = 200, body = ExpenseSummary)),
    tag = "Expenses"
)]
pub async fn expense_summary(
    pool: web::Data<MySqlPool>,
    query: web::Query<ExpenseQuery>,
) -> ApiResult<impl Responder> {
    let filters = query.filters();
    let sql = format!(
        "SELECT category, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total \
         FROM expenses {} GROUP BY category ORDER BY total DESC, category",
        filters.where_clause()
    );
    let categories = filters
        .bind_as(sqlx::query_as::<_, CategoryTotal>(&sql))
        .fetch_all(pool.get_ref())
        .await?;

    let grand_total = categories.iter().map(|c| c.total).sum();
    Ok(HttpResponse::Ok().json(ExpenseSummary {
        categories,
        grand_total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn expense(category: &str, amount: Decimal) -> CreateExpense {
        CreateExpense {
            warehouse_id: 1,
            category: category.to_string(),
            description: None,
            vendor: None,
            amount,
            expense_date: None,
        }
    }

    #[test]
    fn rejects_blank_category_and_non_positive_amount() {
        assert!(validate_expense(&expense("fuel", dec!(12.40))).is_ok());
        assert!(validate_expense(&expense("  ", dec!(12.40))).is_err());
        assert!(validate_expense(&expense("fuel", Decimal::ZERO)).is_err());
        assert!(validate_expense(&expense("fuel", dec!(-3))).is_err());
    }

    #[test]
    fn query_filters_include_date_range() {
        let query = ExpenseQuery {
            page: None,
            per_page: None,
            warehouse_id: Some(2),
            category: None,
            from: NaiveDate::from_ymd_opt(2026, 1, 1),
            to: NaiveDate::from_ymd_opt(2026, 1, 31),
        };
        assert_eq!(
            query.filters().where_clause(),
            "WHERE warehouse_id = ? AND (expense_date >= ?) AND (expense_date <= ?)"
        );
    }
}
