use actix_web::{HttpResponse, Responder, web};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::api::product::{BATCH_COLUMNS, BatchChange, current_reconciliation};
use crate::config::Config;
use crate::domain::inventory::{
    BatchExpiry, ExpiryNotice, StockReconciliation, expiring, validate_quantity,
};
use crate::domain::require;
use crate::error::{ApiError, ApiResult};
use crate::model::product::ProductBatch;
use crate::models::today;
use crate::utils::batch_number_filter;
use crate::utils::db_utils::Filters;

#[derive(Deserialize, ToSchema)]
pub struct UpdateBatch {
    #[schema(example = "LOT-2026-031B")]
    pub batch_number: Option<String>,
    #[schema(example = 96)]
    pub quantity: Option<i64>,
    #[schema(format = "date", value_type = Option<String>)]
    pub expiration_date: Option<NaiveDate>,
    #[schema(example = "B-01-1")]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ExpiringQuery {
    /// Look-ahead window in days, defaults to EXPIRY_WARNING_DAYS
    #[schema(example = 30)]
    pub within_days: Option<i64>,
    /// Defaults to today
    #[schema(format = "date", value_type = Option<String>)]
    pub as_of: Option<NaiveDate>,
    pub warehouse_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ExpiringResponse {
    #[schema(value_type = String, format = "date")]
    pub as_of: NaiveDate,
    pub within_days: i64,
    pub batches: Vec<ExpiryNotice>,
}

#[derive(Serialize, ToSchema)]
pub struct BatchDeleted {
    pub message: String,
    pub reconciliation: StockReconciliation,
}

/// Widest look-ahead the expiry report accepts, ten years.
const MAX_EXPIRY_WINDOW_DAYS: i64 = 3650;

fn expiry_horizon(as_of: NaiveDate, within_days: i64) -> ApiResult<NaiveDate> {
    if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&within_days) {
        return Err(ApiError::BadRequest(format!(
            "within_days must be between 0 and {}",
            MAX_EXPIRY_WINDOW_DAYS
        )));
    }
    as_of
        .checked_add_signed(Duration::days(within_days))
        .ok_or_else(|| ApiError::BadRequest("as_of is out of range".to_string()))
}

async fn lock_batch(tx: &mut Transaction<'_, MySql>, batch_id: u64) -> ApiResult<ProductBatch> {
    sqlx::query_as::<_, ProductBatch>(&format!(
        "SELECT {} FROM product_batches WHERE id = ? FOR UPDATE",
        BATCH_COLUMNS
    ))
    .bind(batch_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Batch"))
}

#[utoipa::path(
    put,
    path = "/api/batches/{batch_id}",
    params(("batch_id", Path, description = "Batch ID")),
    request_body = UpdateBatch,
    responses(
        (status = 200, body = BatchChange),
        (status = 400, description = "Blank batch number or negative quantity"),
        (status = 404),
        (status = 409, description = "Batch number already used for this product")
    ),
    tag = "Inventory"
)]
pub async fn update_batch(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateBatch>,
) -> ApiResult<impl Responder> {
    let batch_id = path.into_inner();
    if let Some(number) = &payload.batch_number {
        require("batch_number", number)?;
    }
    if let Some(quantity) = payload.quantity {
        validate_quantity(quantity)?;
    }

    let mut tx = pool.begin().await?;
    let current = lock_batch(&mut tx, batch_id).await?;

    let batch_number = payload
        .batch_number
        .as_deref()
        .map(str::trim)
        .unwrap_or(current.batch_number.as_str())
        .to_string();
    let renamed = !batch_number.eq_ignore_ascii_case(&current.batch_number);
    if renamed
        && batch_number_filter::is_taken(pool.get_ref(), current.product_id, &batch_number).await?
    {
        return Err(ApiError::Conflict(format!(
            "Batch number {} already exists for this product",
            batch_number
        )));
    }

    sqlx::query(
        r#"
        UPDATE product_batches
        SET batch_number = ?, quantity = ?, expiration_date = ?, location = ?
        WHERE id = ?
        "#,
    )
    .bind(&batch_number)
    .bind(payload.quantity.unwrap_or(current.quantity))
    .bind(payload.expiration_date.or(current.expiration_date))
    .bind(payload.location.clone().or_else(|| current.location.clone()))
    .bind(batch_id)
    .execute(&mut *tx)
    .await?;

    let batch = lock_batch(&mut tx, batch_id).await?;
    tx.commit().await?;

    if renamed {
        batch_number_filter::remove(current.product_id, &current.batch_number);
        batch_number_filter::insert(current.product_id, &batch_number);
    }

    let reconciliation = current_reconciliation(pool.get_ref(), batch.product_id).await?;
    info!(batch_id, product_id = batch.product_id, quantity = batch.quantity, "Batch updated");
    Ok(HttpResponse::Ok().json(BatchChange {
        batch,
        reconciliation,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/batches/{batch_id}",
    params(("batch_id", Path, description = "Batch ID")),
    responses((status = 200, body = BatchDeleted), (status = 404)),
    tag = "Inventory"
)]
pub async fn delete_batch(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let batch_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let batch = lock_batch(&mut tx, batch_id).await?;
    sqlx::query("DELETE FROM product_batches WHERE id = ?")
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    batch_number_filter::remove(batch.product_id, &batch.batch_number);

    let reconciliation = current_reconciliation(pool.get_ref(), batch.product_id).await?;
    info!(batch_id, product_id = batch.product_id, "Batch deleted");
    Ok(HttpResponse::Ok().json(BatchDeleted {
        message: "Batch deleted".to_string(),
        reconciliation,
    }))
}

/// Batches already expired or expiring inside the window, soonest first.
#[utoipa::path(
    get,
    path = "/api/batches/expiring",
    params(ExpiringQuery),
    responses(
        (status = 200, body = ExpiringResponse),
        (status = 400, description = "Window outside 0..=3650 days")
    ),
    tag = "Inventory"
)]
pub async fn expiring_batches(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ExpiringQuery>,
) -> ApiResult<impl Responder> {
    let as_of = query.as_of.unwrap_or_else(today);
    let within_days = query.within_days.unwrap_or(config.expiry_warning_days);
    let horizon = expiry_horizon(as_of, within_days)?;

    let filters = Filters::new()
        .eq_u64("p.warehouse_id", query.warehouse_id)
        .clause_with_date("b.expiration_date <= ?", horizon);
    let sql = format!(
        "SELECT b.id, b.product_id, b.batch_number, b.quantity, b.expiration_date, b.location, b.received_date \
         FROM product_batches b JOIN products p ON p.id = b.product_id {}",
        filters.where_clause()
    );
    let rows = filters
        .bind_as(sqlx::query_as::<_, ProductBatch>(&sql))
        .fetch_all(pool.get_ref())
        .await?;

    let batches = expiring(
        rows.into_iter().map(BatchExpiry::from).collect(),
        as_of,
        within_days,
    );

    Ok(HttpResponse::Ok().json(ExpiringResponse {
        as_of,
        within_days,
        batches,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use rust_decimal::Decimal;
    use sqlx::mysql::MySqlPoolOptions;

    fn config() -> Config {
        Config {
            database_url: "mysql://wms@127.0.0.1:1/wms".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            rate_api_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            pay_periods_per_year: 26,
            overtime_multiplier: Decimal::new(15, 1),
            expiry_warning_days: 30,
        }
    }

    #[core::prelude::v1::test]
    fn horizon_adds_the_window() {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            expiry_horizon(as_of, 30).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
        );
        assert_eq!(expiry_horizon(as_of, 0).unwrap(), as_of);
    }

    #[core::prelude::v1::test]
    fn horizon_rejects_out_of_range_windows() {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(expiry_horizon(as_of, -1).is_err());
        assert!(expiry_horizon(as_of, MAX_EXPIRY_WINDOW_DAYS + 1).is_err());
        assert!(expiry_horizon(NaiveDate::MAX, 1).is_err());
    }

    #[actix_web::test]
    async fn huge_window_is_a_bad_request() {
        let cfg = config();
        let pool = MySqlPoolOptions::new()
            .connect_lazy(&cfg.database_url)
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(cfg))
                .route("/batches/expiring", web::get().to(expiring_batches)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/batches/expiring?within_days=9223372036854775")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
