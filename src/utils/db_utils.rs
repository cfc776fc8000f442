use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::MySqlArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{MySql, Transaction};
use std::str::FromStr;

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    Decimal(Decimal),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn to_sql_value(column: &str, value: &Value) -> Result<SqlValue, ApiError> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::I64(i),
            None => Decimal::from_str(&n.to_string())
                .map(SqlValue::Decimal)
                .map_err(|_| ApiError::BadRequest(format!("{}: unsupported number", column)))?,
        },
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => {
            return Err(ApiError::BadRequest(format!(
                "{}: unsupported JSON value type",
                column
            )));
        }
    })
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may appear in the payload; column names are
/// never taken from user input unchecked.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Payload must be a JSON object".to_string()))?;

    if obj.is_empty() {
        return Err(ApiError::BadRequest("No fields provided for update".to_string()));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::BadRequest(format!(
            "Field '{}' cannot be updated",
            unknown
        )));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);
    for (column, value) in obj {
        values.push(to_sql_value(column, value)?);
    }

    // WHERE id = ?
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    tx: &mut Transaction<'_, MySql>,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::Decimal(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(&mut **tx).await?;
    Ok(result.rows_affected())
}

/// ===============================
/// Dynamic WHERE clause for list endpoints
/// ===============================
#[derive(Debug, Clone)]
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

#[derive(Debug, Default)]
pub struct Filters {
    clauses: Vec<String>,
    args: Vec<FilterValue>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq_u64(mut self, column: &str, value: Option<u64>) -> Self {
        if let Some(v) = value {
            self.clauses.push(format!("{} = ?", column));
            self.args.push(FilterValue::U64(v));
        }
        self
    }

    pub fn eq_str(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(v) = value {
            self.clauses.push(format!("{} = ?", column));
            self.args.push(FilterValue::Str(v.to_string()));
        }
        self
    }

    /// A fixed condition with no parameters.
    pub fn clause(mut self, clause: &str) -> Self {
        self.clauses.push(format!("({})", clause));
        self
    }

    /// A condition with exactly one `?`, bound to `date`.
    pub fn clause_with_date(mut self, clause: &str, date: NaiveDate) -> Self {
        self.clauses.push(format!("({})", clause));
        self.args.push(FilterValue::Date(date));
        self
    }

    /// `LIKE %term%` over any of the given columns.
    pub fn search(mut self, columns: &[&str], term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            let like = format!("%{}%", term);
            let ors = columns
                .iter()
                .map(|c| format!("{} LIKE ?", c))
                .collect::<Vec<_>>()
                .join(" OR ");
            self.clauses.push(format!("({})", ors));
            for _ in columns {
                self.args.push(FilterValue::Str(like.clone()));
            }
        }
        self
    }

    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn bind_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    ) -> QueryScalar<'q, MySql, O, MySqlArguments> {
        for arg in &self.args {
            query = match arg {
                FilterValue::U64(v) => query.bind(*v),
                FilterValue::Str(s) => query.bind(s.clone()),
                FilterValue::Date(d) => query.bind(*d),
            };
        }
        query
    }

    pub fn bind_as<'q, O>(
        &self,
        mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        for arg in &self.args {
            query = match arg {
                FilterValue::U64(v) => query.bind(*v),
                FilterValue::Str(s) => query.bind(s.clone()),
                FilterValue::Date(d) => query.bind(*d),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const ALLOWED: &[&str] = &["position", "hourly_rate", "can_payroll", "hire_date"];

    #[test]
    fn builds_set_clause_and_binds_id_last() {
        let update = build_update_sql(
            "employees",
            &json!({"position": "Lead", "hourly_rate": 24.75, "can_payroll": true}),
            ALLOWED,
            "id",
            5,
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE employees SET "));
        assert!(update.sql.ends_with(" WHERE id = ?"));
        assert_eq!(update.values.len(), 4);
        assert!(update.values.contains(&SqlValue::Decimal(dec!(24.75))));
        assert!(update.values.contains(&SqlValue::Bool(true)));
        assert_eq!(update.values.last(), Some(&SqlValue::I64(5)));
    }

    #[test]
    fn date_strings_become_dates() {
        let update =
            build_update_sql("employees", &json!({"hire_date": "2026-02-01"}), ALLOWED, "id", 1)
                .unwrap();
        assert_eq!(
            update.values[0],
            SqlValue::Date(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())
        );
    }

    #[test]
    fn rejects_unknown_columns() {
        let err = build_update_sql(
            "employees",
            &json!({"id = 1; DROP TABLE employees; --": 1}),
            ALLOWED,
            "id",
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn filters_build_where_clause() {
        let filters = Filters::new()
            .eq_u64("warehouse_id", Some(3))
            .eq_str("status", None)
            .search(&["first_name", "email"], Some(" ann "));
        assert_eq!(
            filters.where_clause(),
            "WHERE warehouse_id = ? AND (first_name LIKE ? OR email LIKE ?)"
        );
        assert_eq!(filters.args.len(), 3);
        assert_eq!(Filters::new().search(&["sku"], Some("  ")).where_clause(), "");
    }

    #[test]
    fn rejects_empty_and_non_object() {
        assert!(build_update_sql("employees", &json!({}), ALLOWED, "id", 1).is_err());
        assert!(build_update_sql("employees", &json!([1, 2]), ALLOWED, "id", 1).is_err());
        assert!(
            build_update_sql("employees", &json!({"position": [1]}), ALLOWED, "id", 1).is_err()
        );
    }
}
