use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "code": "WH-EAST",
        "name": "East Distribution Center",
        "location": "Newark, NJ"
    })
)]
pub struct Warehouse {
    pub id: u64,
    pub code: String,
    pub name: String,
    #[schema(nullable = true)]
    pub location: Option<String>,
}
