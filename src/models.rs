use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 20)]
    /// Items per page, at most 100
    pub per_page: Option<u32>,
    #[schema(example = 1)]
    /// Restrict to a single warehouse
    pub warehouse_id: Option<u64>,
}

impl PageQuery {
    /// Returns (page, per_page, offset).
    pub fn bounds(&self) -> (u32, u32, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page, (page as u64 - 1) * per_page as u64)
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AsOfQuery {
    /// Report date, defaults to today
    #[schema(example = "2026-06-30", format = "date", value_type = Option<String>)]
    pub as_of: Option<NaiveDate>,
    pub warehouse_id: Option<u64>,
}

impl AsOfQuery {
    pub fn date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(today)
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Created successfully")]
    pub message: String,
    #[schema(example = 42, nullable = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl MessageResponse {
    pub fn created(message: impl Into<String>, id: u64) -> Self {
        Self {
            message: message.into(),
            id: Some(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_are_clamped() {
        let q = PageQuery {
            page: Some(0),
            per_page: Some(1000),
            warehouse_id: None,
        };
        assert_eq!(q.bounds(), (1, 100, 0));

        let q = PageQuery {
            page: Some(3),
            per_page: None,
            warehouse_id: None,
        };
        assert_eq!(q.bounds(), (3, 20, 40));
    }

    #[test]
    fn last_page_offset_does_not_overflow() {
        let q = PageQuery {
            page: Some(u32::MAX),
            per_page: Some(100),
            warehouse_id: None,
        };
        let (_, _, offset) = q.bounds();
        assert_eq!(offset, (u32::MAX as u64 - 1) * 100);
    }
}
