use crate::{
    auth::auth::AuthUser,
    error::AttendanceError,
    model::{
        attendance_log::{LogEntry, LogRecord, LogType},
        permission::{MODULE_ATTENDANCE, PermissionAction},
    },
    state::AppState,
    store::{LogFilter, PageRequest},
    utils::csv::push_record,
};
use actix_web::{HttpResponse, Responder, http::header, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

/// Most rows a single CSV export will contain.
pub const EXPORT_LIMIT: u32 = 10_000;

#[derive(Deserialize, ToSchema)]
pub struct AddAttendance {
    #[schema(example = "0004829137")]
    #[serde(default)]
    pub rfid_tag: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct LogQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page, at most 100
    pub per_page: Option<u32>,
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// IN or OUT
    #[param(value_type = Option<String>, example = "IN")]
    pub log_type: Option<LogType>,
    /// First day included (UTC)
    #[param(value_type = Option<String>, format = Date, example = "2026-01-01")]
    pub from: Option<NaiveDate>,
    /// Last day included (UTC)
    #[param(value_type = Option<String>, format = Date, example = "2026-01-31")]
    pub to: Option<NaiveDate>,
    /// Search by employee name or code
    pub search: Option<String>,
}

impl LogQuery {
    fn filter(&self) -> LogFilter {
        LogFilter {
            employee_id: self.employee_id,
            log_type: self.log_type,
            from: self.from,
            to: self.to,
            search: self.search.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LogListResponse {
    pub data: Vec<LogEntry>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 57)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct SessionStateResponse {
    #[schema(example = 1)]
    pub employee_id: u64,
    /// Derived from the latest log: IN means clocked in
    #[schema(example = true)]
    pub clocked_in: bool,
    pub last_log: Option<LogRecord>,
}

fn internal_error(e: impl std::fmt::Display, what: &str) -> actix_web::Error {
    error!(error = %e, "{}", what);
    crate::auth::auth::json_error(HttpResponse::InternalServerError(), "Internal Server Error")
}

/// Kiosk clock-in/out by RFID tag
#[utoipa::path(
    post,
    path = "/api/attendance/add",
    request_body = AddAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = crate::service::attendance::Toggle),
        (status = 400, description = "Missing or malformed tag", body = Object, example = json!({
            "error": "RFID tag is required"
        })),
        (status = 404, description = "Tag not registered", body = Object, example = json!({
            "error": "Employee not found"
        })),
        (status = 500, description = "Persistence failure", body = Object, example = json!({
            "error": "Failed to record attendance"
        }))
    ),
    tag = "Attendance"
)]
pub async fn add_attendance(
    state: web::Data<AppState>,
    payload: web::Json<AddAttendance>,
) -> Result<HttpResponse, AttendanceError> {
    let tag = payload.rfid_tag.as_deref().unwrap_or_default();
    let toggle = state.resolver.toggle(tag).await?;
    Ok(HttpResponse::Ok().json(toggle))
}

/// Paginated attendance log listing
#[utoipa::path(
    get,
    path = "/api/attendance/logs",
    params(LogQuery),
    responses(
        (status = 200, description = "Paginated attendance logs", body = LogListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_logs(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LogQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_permission(state.accounts.as_ref(), MODULE_ATTENDANCE, PermissionAction::Read)
        .await?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page as u64 - 1) * per_page as u64;

    let result = state
        .attendance
        .list_logs(
            &query.filter(),
            PageRequest {
                limit: per_page,
                offset,
            },
        )
        .await
        .map_err(|e| internal_error(e, "Failed to list attendance logs"))?;

    Ok(HttpResponse::Ok().json(LogListResponse {
        data: result.data,
        page,
        per_page,
        total: result.total,
    }))
}

/// CSV export of attendance logs
#[utoipa::path(
    get,
    path = "/api/attendance/logs/export",
    params(LogQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn export_logs(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LogQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_permission(
        state.accounts.as_ref(),
        MODULE_ATTENDANCE,
        PermissionAction::Export,
    )
    .await?;

    let result = state
        .attendance
        .list_logs(
            &query.filter(),
            PageRequest {
                limit: EXPORT_LIMIT,
                offset: 0,
            },
        )
        .await
        .map_err(|e| internal_error(e, "Failed to export attendance logs"))?;

    let mut body = String::new();
    push_record(
        &mut body,
        ["id", "employee_id", "employee_code", "employee_name", "log_type", "logged_at"],
    );
    for entry in &result.data {
        push_record(
            &mut body,
            [
                entry.id.to_string(),
                entry.employee_id.to_string(),
                entry.employee_code.clone(),
                entry.employee_name.clone(),
                entry.log_type.to_string(),
                entry.logged_at.to_rfc3339(),
            ],
        );
    }

    info!(user_id = auth.user_id, rows = result.data.len(), total = result.total, "Attendance export");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"attendance_logs.csv\"",
        ))
        .body(body))
}

/// Current clock-in state of one employee
#[utoipa::path(
    get,
    path = "/api/attendance/employees/{id}/state",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Derived session state", body = SessionStateResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn employee_state(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_permission(state.accounts.as_ref(), MODULE_ATTENDANCE, PermissionAction::Read)
        .await?;

    let employee_id = path.into_inner();

    let employee = state
        .attendance
        .find_employee(employee_id)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch employee"))?;

    if employee.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Employee not found"
        })));
    }

    let last_log = state
        .attendance
        .last_log_for(employee_id)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch last attendance log"))?;

    Ok(HttpResponse::Ok().json(SessionStateResponse {
        employee_id,
        clocked_in: last_log.as_ref().is_some_and(|l| l.log_type == LogType::In),
        last_log,
    }))
}
