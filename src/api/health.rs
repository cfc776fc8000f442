use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    pub database: bool,
}

/// Liveness plus a one-row database round trip.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(pool: web::Data<MySqlPool>) -> impl Responder {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool.get_ref())
        .await
    {
        Ok(_) => HttpResponse::Ok().json(HealthResponse {
            status: "ok",
            database: true,
        }),
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded",
                database: false,
            })
        }
    }
}
