use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::domain::inventory::{
    BatchSyncStatus, StockReconciliation, reconcile, sync_target, validate_quantity,
};
use crate::domain::require;
use crate::error::{ApiError, ApiResult};
use crate::model::product::{Product, ProductBatch};
use crate::models::{MessageResponse, PageQuery, today};
use crate::utils::batch_number_filter;
use crate::utils::db_utils::Filters;

pub(crate) const BATCH_COLUMNS: &str =
    "id, product_id, batch_number, quantity, expiration_date, location, received_date";

#[derive(Deserialize, ToSchema)]
pub struct CreateProduct {
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "SKU-10042")]
    pub sku: String,
    #[schema(example = "Stretch wrap 18in")]
    pub name: String,
    #[schema(example = 240)]
    #[serde(default)]
    pub stock: i64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub warehouse_id: Option<u64>,
    /// Search by SKU or name
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductListResponse {
    pub data: Vec<Product>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateBatch {
    #[schema(example = "LOT-2026-031")]
    pub batch_number: String,
    #[schema(example = 120)]
    pub quantity: i64,
    #[schema(example = "2027-01-31", format = "date", value_type = Option<String>)]
    pub expiration_date: Option<NaiveDate>,
    #[schema(example = "A-04-2")]
    pub location: Option<String>,
    /// Defaults to today
    #[schema(format = "date", value_type = Option<String>)]
    pub received_date: Option<NaiveDate>,
}

/// Result of a batch change together with where the product now stands.
#[derive(Serialize, ToSchema)]
pub struct BatchChange {
    pub batch: ProductBatch,
    pub reconciliation: StockReconciliation,
}

#[derive(Serialize, ToSchema)]
pub struct SyncResult {
    pub before: StockReconciliation,
    pub after: StockReconciliation,
}

pub(crate) async fn fetch_product(pool: &MySqlPool, product_id: u64) -> ApiResult<Product> {
    sqlx::query_as::<_, Product>(
        "SELECT id, warehouse_id, sku, name, stock FROM products WHERE id = ?",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Product"))
}

async fn lock_product(tx: &mut Transaction<'_, MySql>, product_id: u64) -> ApiResult<Product> {
    sqlx::query_as::<_, Product>(
        "SELECT id, warehouse_id, sku, name, stock FROM products WHERE id = ? FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Product"))
}

pub(crate) async fn batch_quantities<'e, E>(executor: E, product_id: u64) -> ApiResult<Vec<i64>>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT quantity FROM product_batches WHERE product_id = ?")
            .bind(product_id)
            .fetch_all(executor)
            .await?,
    )
}

/// Current stock-vs-batch position for a product, logged when batches claim
/// more than is on hand.
pub(crate) async fn current_reconciliation(
    pool: &MySqlPool,
    product_id: u64,
) -> ApiResult<StockReconciliation> {
    let product = fetch_product(pool, product_id).await?;
    let quantities = batch_quantities(pool, product_id).await?;
    let report = reconcile(product.id, product.stock, &quantities);
    if report.status == BatchSyncStatus::OverAllocated {
        warn!(
            product_id,
            stock = report.stock,
            batch_total = report.batch_total,
            "Batches exceed product stock"
        );
    }
    Ok(report)
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = MessageResponse),
        (status = 400, description = "Missing fields or negative stock"),
        (status = 409, description = "SKU already exists")
    ),
    tag = "Inventory"
)]
pub async fn create_product(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateProduct>,
) -> ApiResult<impl Responder> {
    require("sku", &payload.sku)?;
    require("name", &payload.name)?;
    validate_quantity(payload.stock)?;

    let id = sqlx::query("INSERT INTO products (warehouse_id, sku, name, stock) VALUES (?, ?, ?, ?)")
        .bind(payload.warehouse_id)
        .bind(payload.sku.trim())
        .bind(payload.name.trim())
        .bind(payload.stock)
        .execute(pool.get_ref())
        .await?
        .last_insert_id();

    info!(product_id = id, sku = %payload.sku, "Product created");
    Ok(HttpResponse::Created().json(MessageResponse::created("Product created", id)))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses((status = 200, body = ProductListResponse)),
    tag = "Inventory"
)]
pub async fn list_products(
    pool: web::Data<MySqlPool>,
    query: web::Query<ProductQuery>,
) -> ApiResult<impl Responder> {
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
        warehouse_id: query.warehouse_id,
    }
    .bounds();

    let filters = Filters::new()
        .eq_u64("warehouse_id", query.warehouse_id)
        .search(&["sku", "name"], query.search.as_deref());
    let where_clause = filters.where_clause();

    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM products {}",
            where_clause
        )))
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT id, warehouse_id, sku, name, stock FROM products {} ORDER BY sku LIMIT ? OFFSET ?",
        where_clause
    );
    let data = filters
        .bind_as(sqlx::query_as::<_, Product>(&data_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(ProductListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    params(("product_id", Path, description = "Product ID")),
    responses((status = 200, body = Product), (status = 404)),
    tag = "Inventory"
)]
pub async fn get_product(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let product = fetch_product(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[utoipa::path(
    get,
    path = "/api/products/{product_id}/batches",
    params(("product_id", Path, description = "Product ID")),
    responses((status = 200, body = [ProductBatch]), (status = 404)),
    tag = "Inventory"
)]
pub async fn list_batches(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let product = fetch_product(pool.get_ref(), path.into_inner()).await?;

    // soonest expiry first, undated batches last
    let batches = sqlx::query_as::<_, ProductBatch>(&format!(
        "SELECT {} FROM product_batches WHERE product_id = ? \
         ORDER BY expiration_date IS NULL, expiration_date, received_date, id",
        BATCH_COLUMNS
    ))
    .bind(product.id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(batches))
}

/// Adds a batch. Batches may exceed stock; the response reports the
/// resulting allocation so the caller can decide to sync.
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/batches",
    params(("product_id", Path, description = "Product ID")),
    request_body = CreateBatch,
    responses(
        (status = 201, body = BatchChange),
        (status = 400, description = "Missing batch number or negative quantity"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Batch number already used for this product", body = Object, example = json!({
            "message": "Batch number LOT-2026-031 already exists for this product"
        }))
    ),
    tag = "Inventory"
)]
pub async fn create_batch(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateBatch>,
) -> ApiResult<impl Responder> {
    require("batch_number", &payload.batch_number)?;
    validate_quantity(payload.quantity)?;

    let product = fetch_product(pool.get_ref(), path.into_inner()).await?;
    let batch_number = payload.batch_number.trim();

    if batch_number_filter::is_taken(pool.get_ref(), product.id, batch_number).await? {
        return Err(ApiError::Conflict(format!(
            "Batch number {} already exists for this product",
            batch_number
        )));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO product_batches
        (product_id, batch_number, quantity, expiration_date, location, received_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(product.id)
    .bind(batch_number)
    .bind(payload.quantity)
    .bind(payload.expiration_date)
    .bind(&payload.location)
    .bind(payload.received_date.unwrap_or_else(today))
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    batch_number_filter::insert(product.id, batch_number);

    let batch = sqlx::query_as::<_, ProductBatch>(&format!(
        "SELECT {} FROM product_batches WHERE id = ?",
        BATCH_COLUMNS
    ))
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;
    let reconciliation = current_reconciliation(pool.get_ref(), product.id).await?;

    info!(batch_id = id, product_id = product.id, quantity = payload.quantity, "Batch created");
    Ok(HttpResponse::Created().json(BatchChange {
        batch,
        reconciliation,
    }))
}

#[utoipa::path(
    get,
    path = "/api/products/{product_id}/reconcile",
    params(("product_id", Path, description = "Product ID")),
    responses((status = 200, body = StockReconciliation), (status = 404)),
    tag = "Inventory"
)]
pub async fn reconcile_product(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let report = current_reconciliation(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Sets product stock to the batch total so the two agree exactly.
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/sync",
    params(("product_id", Path, description = "Product ID")),
    responses(
        (status = 200, description = "Stock before and after the sync", body = SyncResult),
        (status = 404)
    ),
    tag = "Inventory"
)]
pub async fn sync_product_stock(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let product_id = path.into_inner();
    let mut tx = pool.begin().await?;

    let product = lock_product(&mut tx, product_id).await?;
    let quantities = sqlx::query_scalar::<_, i64>(
        "SELECT quantity FROM product_batches WHERE product_id = ? FOR UPDATE",
    )
    .bind(product_id)
    .fetch_all(&mut *tx)
    .await?;

    let before = reconcile(product.id, product.stock, &quantities);
    let target = sync_target(&quantities);

    if before.status != BatchSyncStatus::InSync {
        sqlx::query("UPDATE products SET stock = ? WHERE id = ?")
            .bind(target)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let after = reconcile(product.id, target, &quantities);
    info!(
        product_id,
        from = before.stock,
        to = after.stock,
        "Stock synced to batches"
    );
    Ok(HttpResponse::Ok().json(SyncResult { before, after }))
}
