use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogType {
    In,
    Out,
}

impl LogType {
    /// Two-state toggle: nothing recorded yet, or last was OUT, means the next event is IN.
    pub fn next_after(last: Option<LogType>) -> LogType {
        match last {
            Some(LogType::In) => LogType::Out,
            Some(LogType::Out) | None => LogType::In,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            LogType::In => "Clocked In",
            LogType::Out => "Clocked Out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogRecord {
    #[schema(example = 981)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "IN", value_type = String)]
    pub log_type: LogType,
    #[schema(example = "2026-01-05T08:59:12.381Z", format = DateTime, value_type = String)]
    pub logged_at: DateTime<Utc>,
}

/// Log row joined with the owning employee, as shown in the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LogEntry {
    #[schema(example = 981)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "ASH-0042")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "IN", value_type = String)]
    pub log_type: LogType,
    #[schema(example = "2026-01-05T08:59:12.381Z", format = DateTime, value_type = String)]
    pub logged_at: DateTime<Utc>,
}

// Raw rows keep `log_type` as text; the column is a VARCHAR.

#[derive(sqlx::FromRow)]
pub struct LogRow {
    pub id: u64,
    pub employee_id: u64,
    pub log_type: String,
    pub logged_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
pub struct LogEntryRow {
    pub id: u64,
    pub employee_id: u64,
    pub employee_code: String,
    pub employee_name: String,
    pub log_type: String,
    pub logged_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for LogRecord {
    type Error = strum::ParseError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(LogRecord {
            id: row.id,
            employee_id: row.employee_id,
            log_type: row.log_type.parse()?,
            logged_at: row.logged_at,
        })
    }
}

impl TryFrom<LogEntryRow> for LogEntry {
    type Error = strum::ParseError;

    fn try_from(row: LogEntryRow) -> Result<Self, Self::Error> {
        Ok(LogEntry {
            id: row.id,
            employee_id: row.employee_id,
            employee_code: row.employee_code,
            employee_name: row.employee_name,
            log_type: row.log_type.parse()?,
            logged_at: row.logged_at,
        })
    }
}
