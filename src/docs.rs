use crate::api::attendance::{AddAttendance, LogListResponse, SessionStateResponse};
use crate::auth::handlers::{LoginResponse, LoginUser};
use crate::model::attendance_log::{LogEntry, LogRecord};
use crate::model::employee::Employee;
use crate::service::attendance::Toggle;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RFID Attendance API",
        version = "1.0.0",
        description = r#"
## RFID Attendance

Clock-in/out kiosk backed by an RFID reader, plus the admin endpoints that read the
attendance log it produces.

### 🔹 Kiosk
- `POST /api/attendance/add` toggles the scanned employee between **IN** and **OUT**
- Duplicate scans of one badge are serialized, so logs always alternate

### 🔹 Admin
- Paginated, filterable attendance log listing
- CSV export
- Current clocked-in state per employee

### 🔐 Security
Admin endpoints need a **JWT Bearer** token from `/auth/login` and the `attendance`
module permission (`read` or `export`) for the caller's role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::add_attendance,
        crate::api::attendance::list_logs,
        crate::api::attendance::export_logs,
        crate::api::attendance::employee_state,

        crate::auth::handlers::login,
        crate::auth::handlers::me
    ),
    components(
        schemas(
            AddAttendance,
            Toggle,
            Employee,
            LogRecord,
            LogEntry,
            LogListResponse,
            SessionStateResponse,
            LoginResponse,
            LoginUser
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Attendance", description = "Kiosk and attendance log APIs"),
        (name = "Auth", description = "Admin authentication"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_paths_match_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance/add",
            "/api/attendance/logs",
            "/api/attendance/logs/export",
            "/api/attendance/employees/{id}/state",
            "/auth/login",
            "/api/me",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
