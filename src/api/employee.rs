use crate::{
    domain::{DomainError, payroll::PayType, require},
    error::{ApiError, ApiResult},
    model::employee::Employee,
    models::{MessageResponse, PageQuery},
    utils::db_utils::{Filters, build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

const EMPLOYEE_COLUMNS: &str = "id, employee_code, first_name, last_name, email, position, warehouse_id, \
     pay_type, hourly_rate, annual_salary, withholding_pct, benefit_deduction, status, \
     can_inventory, can_shipments, can_accounting, can_payroll, can_employees";

/// Columns an edit may touch.
const UPDATABLE_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "position",
    "warehouse_id",
    "pay_type",
    "hourly_rate",
    "annual_salary",
    "withholding_pct",
    "benefit_deduction",
    "status",
    "can_inventory",
    "can_shipments",
    "can_accounting",
    "can_payroll",
    "can_employees",
];

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PagePermissions {
    #[serde(default)]
    pub inventory: bool,
    #[serde(default)]
    pub shipments: bool,
    #[serde(default)]
    pub accounting: bool,
    #[serde(default)]
    pub payroll: bool,
    #[serde(default)]
    pub employees: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-014")]
    pub employee_code: String,
    #[schema(example = "Maria")]
    pub first_name: String,
    #[serde(default)]
    #[schema(example = "Lopez")]
    pub last_name: String,
    #[schema(example = "maria.lopez@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Inventory Clerk")]
    pub position: String,
    #[schema(example = 1)]
    pub warehouse_id: u64,
    #[schema(example = "hourly")]
    pub pay_type: PayType,
    #[serde(default)]
    #[schema(example = "21.00")]
    pub hourly_rate: Decimal,
    #[serde(default)]
    #[schema(example = "0")]
    pub annual_salary: Decimal,
    #[serde(default)]
    #[schema(example = "15")]
    pub withholding_pct: Decimal,
    #[serde(default)]
    #[schema(example = "40.00")]
    pub benefit_deduction: Decimal,
    #[serde(default)]
    pub permissions: PagePermissions,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub warehouse_id: Option<u64>,
    #[schema(example = "active")]
    pub status: Option<String>,
    /// Search by name, email or position
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    require("email", email)?;
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(DomainError::Invalid(format!("invalid email address {:?}", email)))
    }
}

/// Emails are stored trimmed and lowercase, the same as on create.
fn normalize_update(mut body: Value) -> Value {
    if let Some(Value::String(email)) = body.get_mut("email") {
        *email = email.trim().to_lowercase();
    }
    body
}

/// Checks the stored record after an edit, before the transaction commits.
fn validate_employee(employee: &Employee) -> Result<(), DomainError> {
    require("first_name", &employee.first_name)?;
    require("position", &employee.position)?;
    validate_email(&employee.email)?;
    if !matches!(employee.status.as_str(), "active" | "inactive") {
        return Err(DomainError::Invalid(
            "status must be active or inactive".to_string(),
        ));
    }
    employee.compensation()?.validate()
}

pub async fn fetch_employee(pool: &MySqlPool, employee_id: u64) -> ApiResult<Employee> {
    let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee"))
}

async fn fetch_employee_tx(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
) -> ApiResult<Option<Employee>> {
    let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
    Ok(sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(&mut **tx)
        .await?)
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = Object, example = json!({
            "message": "position is required"
        })),
        (status = 409, description = "Employee code or email already in use")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<impl Responder> {
    require("employee_code", &payload.employee_code)?;
    require("first_name", &payload.first_name)?;
    require("position", &payload.position)?;
    validate_email(&payload.email)?;

    let comp = crate::domain::payroll::Compensation {
        pay_type: payload.pay_type,
        hourly_rate: payload.hourly_rate,
        annual_salary: payload.annual_salary,
        withholding_pct: payload.withholding_pct,
        benefit_deduction: payload.benefit_deduction,
    };
    comp.validate()?;

    let perms = &payload.permissions;
    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, position, warehouse_id,
         pay_type, hourly_rate, annual_salary, withholding_pct, benefit_deduction,
         can_inventory, can_shipments, can_accounting, can_payroll, can_employees)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_code.trim())
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.email.trim().to_lowercase())
    .bind(payload.position.trim())
    .bind(payload.warehouse_id)
    .bind(payload.pay_type.to_string())
    .bind(comp.hourly_rate)
    .bind(comp.annual_salary)
    .bind(comp.withholding_pct)
    .bind(comp.benefit_deduction)
    .bind(perms.inventory)
    .bind(perms.shipments)
    .bind(perms.accounting)
    .bind(perms.payroll)
    .bind(perms.employees)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(employee_id = id, code = %payload.employee_code, "Employee created");

    Ok(HttpResponse::Created().json(MessageResponse::created("Employee created", id)))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult<impl Responder> {
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
        warehouse_id: None,
    }
    .bounds();

    let filters = Filters::new()
        .eq_u64("warehouse_id", query.warehouse_id)
        .eq_str("status", query.status.as_deref())
        .search(
            &["first_name", "last_name", "email", "position"],
            query.search.as_deref(),
        );
    let where_clause = filters.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");
    let total = filters
        .bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql))
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {} FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");
    let data = filters
        .bind_as(sqlx::query_as::<_, Employee>(&data_sql))
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Update Employee
///
/// Accepts any subset of the editable fields. The edited record is validated
/// as a whole and the change is rolled back if it breaks a rule.
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Unknown field or invalid value"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<impl Responder> {
    let employee_id = path.into_inner();
    let body = normalize_update(body.into_inner());
    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let mut tx = pool.begin().await?;
    if fetch_employee_tx(&mut tx, employee_id).await?.is_none() {
        return Err(ApiError::not_found("Employee"));
    }

    execute_update(&mut tx, update).await?;

    let employee = fetch_employee_tx(&mut tx, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee"))?;
    validate_employee(&employee)?;
    tx.commit().await?;

    info!(employee_id, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<impl Responder> {
    let employee = fetch_employee(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn employee() -> Employee {
        Employee {
            id: 1,
            employee_code: "EMP-1".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            email: "ana@warehouse.io".to_string(),
            position: "Picker".to_string(),
            warehouse_id: 1,
            pay_type: "hourly".to_string(),
            hourly_rate: dec!(18),
            annual_salary: Decimal::ZERO,
            withholding_pct: dec!(12),
            benefit_deduction: Decimal::ZERO,
            status: "active".to_string(),
            can_inventory: true,
            can_shipments: false,
            can_accounting: false,
            can_payroll: false,
            can_employees: false,
        }
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("ab.co").is_err());
        assert!(validate_email("@b.co").is_err());
        assert_eq!(
            validate_email("  "),
            Err(DomainError::MissingField("email"))
        );
    }

    #[test]
    fn updated_email_is_lowercased() {
        let body = normalize_update(serde_json::json!({
            "email": "  Ana.Silva@Warehouse.IO ",
            "position": "Lead"
        }));
        assert_eq!(body["email"], "ana.silva@warehouse.io");
        assert_eq!(body["position"], "Lead");

        let body = normalize_update(serde_json::json!({ "email": null }));
        assert!(body["email"].is_null());
    }

    #[test]
    fn edited_record_is_validated() {
        assert!(validate_employee(&employee()).is_ok());

        let mut e = employee();
        e.position = " ".to_string();
        assert_eq!(
            validate_employee(&e),
            Err(DomainError::MissingField("position"))
        );

        let mut e = employee();
        e.pay_type = "commission".to_string();
        assert!(validate_employee(&e).is_err());

        let mut e = employee();
        e.status = "fired".to_string();
        assert!(validate_employee(&e).is_err());
    }
}
