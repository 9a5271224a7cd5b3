use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use tracing::debug;

use super::{AccountStore, AttendanceStore, LogFilter, LogPage, PageRequest, stamp_after};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    attendance_log::{LogEntry, LogEntryRow, LogRecord, LogRow, LogType},
    employee::Employee,
    permission::ModulePermission,
    user::User,
};

const EMPLOYEE_SELECT: &str = r#"
    SELECT
        e.id,
        e.employee_code,
        e.name,
        d.name AS department,
        p.name AS `position`,
        e.rfid_tag,
        e.photo_url,
        e.status
    FROM employees e
    LEFT JOIN departments d ON d.id = e.department_id
    LEFT JOIN positions p ON p.id = e.position_id
"#;

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Time(DateTime<Utc>),
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_employee(&self, column: &str, value: FilterValue) -> StoreResult<Option<Employee>> {
        let sql = format!("{} WHERE e.{} = ?", EMPLOYEE_SELECT, column);
        let query = sqlx::query_as::<_, Employee>(&sql);
        let query = match value {
            FilterValue::U64(v) => query.bind(v),
            FilterValue::Str(s) => query.bind(s),
            FilterValue::Time(t) => query.bind(t),
        };
        Ok(query.fetch_optional(&self.pool).await?)
    }
}

/// Search input is matched literally: LIKE wildcards are escaped with `!`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '!' | '%' | '_') {
            out.push('!');
        }
        out.push(c);
    }
    out
}

fn where_clause(filter: &LogFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(employee_id) = filter.employee_id {
        where_sql.push_str(" AND l.employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }

    if let Some(log_type) = filter.log_type {
        where_sql.push_str(" AND l.log_type = ?");
        args.push(FilterValue::Str(log_type.to_string()));
    }

    if let Some(from) = filter.from_bound() {
        where_sql.push_str(" AND l.logged_at >= ?");
        args.push(FilterValue::Time(from));
    }

    if let Some(to) = filter.to_bound_exclusive() {
        where_sql.push_str(" AND l.logged_at < ?");
        args.push(FilterValue::Time(to));
    }

    if let Some(search) = filter.search_term() {
        where_sql.push_str(" AND (e.name LIKE ? ESCAPE '!' OR e.employee_code LIKE ? ESCAPE '!')");
        let like = format!("%{}%", escape_like(search));
        args.push(FilterValue::Str(like.clone()));
        args.push(FilterValue::Str(like));
    }

    (where_sql, args)
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find_by_rfid(&self, rfid_tag: &str) -> StoreResult<Option<Employee>> {
        self.fetch_employee("rfid_tag", FilterValue::Str(rfid_tag.to_string()))
            .await
    }

    async fn find_employee(&self, employee_id: u64) -> StoreResult<Option<Employee>> {
        self.fetch_employee("id", FilterValue::U64(employee_id)).await
    }

    async fn last_log_for(&self, employee_id: u64) -> StoreResult<Option<LogRecord>> {
        let row = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, employee_id, log_type, logged_at
            FROM attendance_logs
            WHERE employee_id = ?
            ORDER BY logged_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LogRecord::try_from)
            .transpose()
            .map_err(|e| StoreError::CorruptRow(e.to_string()))
    }

    async fn append(&self, employee_id: u64, log_type: LogType) -> StoreResult<LogRecord> {
        let previous = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(logged_at) FROM attendance_logs WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;
        let logged_at = stamp_after(previous);

        // Single-statement insert: the row is either fully written or not at all.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_logs (employee_id, log_type, logged_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(log_type.as_ref())
        .bind(logged_at)
        .execute(&self.pool)
        .await?;

        Ok(LogRecord {
            id: result.last_insert_id(),
            employee_id,
            log_type,
            logged_at,
        })
    }

    async fn list_logs(&self, filter: &LogFilter, page: PageRequest) -> StoreResult<LogPage> {
        let (where_sql, args) = where_clause(filter);

        // ---------- total count ----------
        let count_sql = format!(
            "SELECT COUNT(*) FROM attendance_logs l JOIN employees e ON e.id = l.employee_id{}",
            where_sql
        );
        debug!(sql = %count_sql, "Counting attendance logs");

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
                FilterValue::Time(t) => count_q.bind(*t),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // ---------- data query ----------
        let data_sql = format!(
            r#"
            SELECT
                l.id,
                l.employee_id,
                e.employee_code,
                e.name AS employee_name,
                l.log_type,
                l.logged_at
            FROM attendance_logs l
            JOIN employees e ON e.id = l.employee_id
            {}
            ORDER BY l.logged_at DESC, l.id DESC
            LIMIT ? OFFSET ?
            "#,
            where_sql
        );
        debug!(sql = %data_sql, limit = page.limit, offset = page.offset, "Fetching attendance logs");

        let mut data_q = sqlx::query_as::<_, LogEntryRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Time(t) => data_q.bind(t),
            };
        }

        let rows = data_q
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        let data = rows
            .into_iter()
            .map(LogEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::CorruptRow(e.to_string()))?;

        Ok(LogPage { data, total })
    }
}

#[async_trait]
impl AccountStore for MySqlStore {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, name, role_id
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn module_permission(
        &self,
        role_id: u8,
        module: &str,
    ) -> StoreResult<Option<ModulePermission>> {
        let permission = sqlx::query_as::<_, ModulePermission>(
            r#"
            SELECT can_access, can_read, can_write, can_delete, can_export
            FROM role_permissions
            WHERE role_id = ? AND module = ?
            "#,
        )
        .bind(role_id)
        .bind(module)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_filter_matches_everything() {
        let (sql, args) = where_clause(&LogFilter::default());
        assert_eq!(sql, " WHERE 1=1");
        assert!(args.is_empty());
    }

    #[test]
    fn filters_add_placeholders_in_bind_order() {
        let filter = LogFilter {
            employee_id: Some(3),
            log_type: Some(LogType::Out),
            from: NaiveDate::from_ymd_opt(2026, 3, 1),
            to: None,
            search: Some("doe".into()),
        };
        let (sql, args) = where_clause(&filter);

        assert_eq!(sql.matches('?').count(), args.len());
        assert!(sql.contains("l.employee_id = ?"));
        assert!(sql.contains("l.log_type = ?"));
        assert!(sql.contains("l.logged_at >= ?"));
        assert!(!sql.contains("l.logged_at < ?"));
        assert!(matches!(args[0], FilterValue::U64(3)));
        assert!(matches!(&args[1], FilterValue::Str(s) if s == "OUT"));
        assert!(matches!(&args[3], FilterValue::Str(s) if s == "%doe%"));
    }

    #[test]
    fn search_wildcards_are_literal() {
        assert_eq!(escape_like("doe"), "doe");
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");

        let filter = LogFilter {
            search: Some("_".into()),
            ..Default::default()
        };
        let (sql, args) = where_clause(&filter);
        assert!(sql.contains("LIKE ? ESCAPE '!'"));
        assert!(matches!(&args[0], FilterValue::Str(s) if s == "%!_%"));
    }
}
