use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::warehouse::fetch_warehouse;
use crate::domain::require;
use crate::domain::shipment::ShipmentStatus;
use crate::error::{ApiError, ApiResult};
use crate::model::shipment::Shipment;
use crate::models::{MessageResponse, PageQuery};
use crate::utils::db_utils::Filters;

const SHIPMENT_COLUMNS: &str = "id, warehouse_id, shipment_number, recipient, destination, carrier, \
     tracking_number, status, shipped_at, delivered_at";

#[derive(Deserialize, ToSchema)]
pub struct CreateShipment {
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "Harbor Foods Inc.")]
    pub recipient: String,
    #[schema(example = "221 Dock St, Baltimore, MD")]
    pub destination: String,
    #[schema(example = "UPS")]
    pub carrier: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateShipmentStatus {
    #[schema(example = "shipped")]
    pub status: ShipmentStatus,
    /// Recorded when supplied, kept otherwise
    #[schema(example = "UPS")]
    pub carrier: Option<String>,
    #[schema(example = "1Z999AA10123456784")]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ShipmentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub warehouse_id: Option<u64>,
    pub status: Option<ShipmentStatus>,
    /// Search by shipment number, recipient or tracking number
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ShipmentListResponse {
    pub data: Vec<Shipment>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// `SHP-` followed by eight hex digits of a random v4 UUID.
fn shipment_number() -> String {
    let id = Uuid::new_v4().to_simple().to_string();
    format!("SHP-{}", id[..8].to_uppercase())
}

async fn fetch_shipment(pool: &MySqlPool, shipment_id: u64) -> ApiResult<Shipment> {
    sqlx::query_as::<_, Shipment>(&format!(
        "SELECT {} FROM shipments WHERE id = ?",
        SHIPMENT_COLUMNS
    ))
    .bind(shipment_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Shipment"))
}

async fn lock_shipment(tx: &mut Transaction<'_, MySql>, shipment_id: u64) -> ApiResult<Shipment> {
    sqlx::query_as::<_, Shipment>(&format!(
        "SELECT {} FROM shipments WHERE id = ? FOR UPDATE",
        SHIPMENT_COLUMNS
    ))
    .bind(shipment_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Shipment"))
}

#[utoipa::path(
    post,
    path = "/api/shipments",
    request_body = CreateShipment,
    responses(
        (status = 201, description = "Shipment created in pending state", body = MessageResponse),
        (status = 400, description = "Missing recipient or destination"),
        (status = 404, description = "Warehouse not found")
    ),
    tag = "Shipments"
)]
pub async fn create_shipment(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateShipment>,
) -> ApiResult<impl Responder> {
    require("recipient", &payload.recipient)?;
    require("destination", &payload.destination)?;
    fetch_warehouse(pool.get_ref(), payload.warehouse_id).await?;

    let number = shipment_number();
    let id = sqlx::query(
        r#"
        INSERT INTO shipments (warehouse_id, shipment_number, recipient, destination, carrier, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.warehouse_id)
    .bind(&number)
    .bind(payload.recipient.trim())
    .bind(payload.destination.trim())
    .bind(&payload.carrier)
    .bind(ShipmentStatus::Pending.to_string())
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    info!(shipment_id = id, shipment_number = %number, "Shipment created");
    Ok(HttpResponse::Created().json(MessageResponse::created(number, id)))
}

#[utoipa::path(
    get,
    path = "/api/shipments",
    params(ShipmentQuery),
    responses((status = 200, body = ShipmentListResponse)),
    tag = "Shipments"
)]
pub async fn list_shipments(
    pool: web::Data<MySqlPool>,
    query: web::Query<ShipmentQuery>,
) -> ApiResult<impl Responder> {
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
        warehouse_id: query.warehouse_id,
    }
    .bounds();

    let status = query.status.map(|s| s.to_string());
    let filters = Filters::new()
        .eq_u64("warehouse_id", query.warehouse_id)
        .eq_str("status", status.as_deref())
        .search(
            &["shipment_number", "recipient", "tracking_number"],
            query.search.as_deref(),
        );
    let where_clause = filters.where_clause();

    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shipments {}",
            where_clause
        )))
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {} FROM shipments {} ORDER BY id DESC LIMIT ? OFFSET ?",
        SHIPMENT_COLUMNS, where_clause
    );
    let data = filters
        .bind_as(sqlx::query_as::<_, Shipment>(&data_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(ShipmentListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/shipments/{shipment_id}",
    params(("shipment_id", Path, description = "Shipment ID")),
    responses((status = 200, body = Shipment), (status = 404)),
    tag = "Shipments"
)]
pub async fn get_shipment(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let shipment = fetch_shipment(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(shipment))
}

/// pending → packed → shipped → delivered, or cancelled before shipping.
#[utoipa::path(
    put,
    path = "/api/shipments/{shipment_id}/status",
    params(("shipment_id", Path, description = "Shipment ID")),
    request_body = UpdateShipmentStatus,
    responses(
        (status = 200, body = Shipment),
        (status = 404),
        (status = 409, description = "Transition not allowed", body = Object, example = json!({
            "message": "shipment cannot move from delivered to pending"
        }))
    ),
    tag = "Shipments"
)]
pub async fn update_shipment_status(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateShipmentStatus>,
) -> ApiResult<impl Responder> {
    let shipment_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let current = lock_shipment(&mut tx, shipment_id).await?;
    let next = current.status()?.transition_to(payload.status)?;

    let stamp = match next {
        ShipmentStatus::Shipped => ", shipped_at = NOW()",
        ShipmentStatus::Delivered => ", delivered_at = NOW()",
        _ => "",
    };
    sqlx::query(&format!(
        "UPDATE shipments SET status = ?, carrier = COALESCE(?, carrier), \
         tracking_number = COALESCE(?, tracking_number){} WHERE id = ?",
        stamp
    ))
    .bind(next.to_string())
    .bind(&payload.carrier)
    .bind(&payload.tracking_number)
    .bind(shipment_id)
    .execute(&mut *tx)
    .await?;

    let shipment = lock_shipment(&mut tx, shipment_id).await?;
    tx.commit().await?;

    info!(
        shipment_id,
        from = %current.status,
        to = %next,
        terminal = next.is_terminal(),
        "Shipment status changed"
    );
    Ok(HttpResponse::Ok().json(shipment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipment_numbers_are_prefixed_and_distinct() {
        let a = shipment_number();
        let b = shipment_number();
        assert!(a.starts_with("SHP-"));
        assert_eq!(a.len(), 12);
        assert!(a[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(a, b);
    }
}
