//! Storage seams for the attendance flow.
//!
//! The toggle resolver and admin handlers only talk to these traits; `mysql` is the
//! production backend and `memory` backs the tests.

pub mod mysql;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, SubsecRound, Utc};

use crate::error::StoreResult;
use crate::model::{
    attendance_log::{LogEntry, LogRecord, LogType},
    employee::Employee,
    permission::ModulePermission,
    user::User,
};

pub use mysql::MySqlStore;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Unique lookup by RFID tag.
    async fn find_by_rfid(&self, rfid_tag: &str) -> StoreResult<Option<Employee>>;

    async fn find_employee(&self, employee_id: u64) -> StoreResult<Option<Employee>>;

    /// Most recent log for the employee (newest `logged_at`, ties broken by id).
    async fn last_log_for(&self, employee_id: u64) -> StoreResult<Option<LogRecord>>;

    /// Writes one immutable log row stamped with [`stamp_after`] the employee's latest row.
    ///
    /// Callers must hold the employee's key lock; the store does not serialize toggles.
    async fn append(&self, employee_id: u64, log_type: LogType) -> StoreResult<LogRecord>;

    async fn list_logs(&self, filter: &LogFilter, page: PageRequest) -> StoreResult<LogPage>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>>;

    async fn module_permission(
        &self,
        role_id: u8,
        module: &str,
    ) -> StoreResult<Option<ModulePermission>>;
}

/// Filters accepted by the admin log listing and export.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub employee_id: Option<u64>,
    pub log_type: Option<LogType>,
    /// Inclusive, UTC calendar day
    pub from: Option<NaiveDate>,
    /// Inclusive, UTC calendar day
    pub to: Option<NaiveDate>,
    /// Matches employee name or code
    pub search: Option<String>,
}

impl LogFilter {
    pub fn from_bound(&self) -> Option<DateTime<Utc>> {
        self.from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Start of the day after `to`, used as an exclusive upper bound.
    pub fn to_bound_exclusive(&self) -> Option<DateTime<Utc>> {
        self.to
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct LogPage {
    pub data: Vec<LogEntry>,
    pub total: i64,
}

/// Timestamps are cut to microseconds so the value we return equals what DATETIME(6) keeps.
pub fn server_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Stamp for a new row: the server clock, held back no earlier than the employee's previous row.
pub fn stamp_after(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = server_timestamp();
    previous.map_or(now, |prev| now.max(prev))
}
