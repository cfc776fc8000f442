use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::shipment::ShipmentStatus;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Shipment {
    pub id: u64,
    pub warehouse_id: u64,
    #[schema(example = "SHP-4F9A21C0")]
    pub shipment_number: String,
    pub recipient: String,
    pub destination: String,
    #[schema(nullable = true)]
    pub carrier: Option<String>,
    #[schema(nullable = true)]
    pub tracking_number: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub shipped_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub delivered_at: Option<NaiveDateTime>,
}

impl Shipment {
    pub fn status(&self) -> DomainResult<ShipmentStatus> {
        ShipmentStatus::from_str(&self.status)
            .map_err(|_| DomainError::Invalid(format!("unknown shipment status {:?}", self.status)))
    }
}
