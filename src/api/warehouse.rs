use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::require;
use crate::error::{ApiError, ApiResult};
use crate::model::warehouse::Warehouse;
use crate::models::MessageResponse;

#[derive(Deserialize, ToSchema)]
pub struct CreateWarehouse {
    #[schema(example = "WH-EAST")]
    pub code: String,
    #[schema(example = "East Distribution Center")]
    pub name: String,
    #[schema(example = "Newark, NJ", nullable = true)]
    pub location: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/warehouses",
    request_body = CreateWarehouse,
    responses(
        (status = 201, description = "Warehouse created", body = MessageResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Code already in use")
    ),
    tag = "Warehouse"
)]
pub async fn create_warehouse(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateWarehouse>,
) -> ApiResult<impl Responder> {
    require("code", &payload.code)?;
    require("name", &payload.name)?;

    let result = sqlx::query("INSERT INTO warehouses (code, name, location) VALUES (?, ?, ?)")
        .bind(payload.code.trim())
        .bind(payload.name.trim())
        .bind(&payload.location)
        .execute(pool.get_ref())
        .await?;

    let id = result.last_insert_id();
    info!(warehouse_id = id, code = %payload.code, "Warehouse created");

    Ok(HttpResponse::Created().json(MessageResponse::created("Warehouse created", id)))
}

#[utoipa::path(
    get,
    path = "/api/warehouses",
    responses(
        (status = 200, description = "All warehouses", body = [Warehouse])
    ),
    tag = "Warehouse"
)]
pub async fn list_warehouses(pool: web::Data<MySqlPool>) -> ApiResult<impl Responder> {
    let warehouses = sqlx::query_as::<_, Warehouse>(
        "SELECT id, code, name, location FROM warehouses ORDER BY code",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(warehouses))
}

#[utoipa::path(
    get,
    path = "/api/warehouses/{warehouse_id}",
    params(("warehouse_id", Path, description = "Warehouse ID")),
    responses(
        (status = 200, body = Warehouse),
        (status = 404, description = "Warehouse not found")
    ),
    tag = "Warehouse"
)]
pub async fn get_warehouse(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let warehouse = fetch_warehouse(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(warehouse))
}

pub async fn fetch_warehouse(pool: &MySqlPool, warehouse_id: u64) -> ApiResult<Warehouse> {
    sqlx::query_as::<_, Warehouse>("SELECT id, code, name, location FROM warehouses WHERE id = ?")
        .bind(warehouse_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Warehouse"))
}
