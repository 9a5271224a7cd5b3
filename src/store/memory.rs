use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{AccountStore, AttendanceStore, LogFilter, LogPage, PageRequest, server_timestamp, stamp_after};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    attendance_log::{LogEntry, LogRecord, LogType},
    employee::Employee,
    permission::ModulePermission,
    user::User,
};

/// In-process store for tests. Every read yields to the scheduler first so that
/// concurrent toggles interleave the way they would against a real database.
#[derive(Default)]
pub struct MemoryStore {
    employees: Mutex<Vec<Employee>>,
    logs: Mutex<Vec<LogRecord>>,
    users: Mutex<Vec<User>>,
    permissions: Mutex<HashMap<(u8, String), ModulePermission>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(employees: Vec<Employee>) -> Self {
        let store = Self::new();
        *store.employees.lock().unwrap() = employees;
        store
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn grant(&self, role_id: u8, module: &str, permission: ModulePermission) {
        self.permissions
            .lock()
            .unwrap()
            .insert((role_id, module.to_string()), permission);
    }

    /// Seeds a historical row, bypassing the writer.
    pub fn push_log(&self, employee_id: u64, log_type: LogType) -> LogRecord {
        let mut logs = self.logs.lock().unwrap();
        let record = LogRecord {
            id: logs.len() as u64 + 1,
            employee_id,
            log_type,
            logged_at: server_timestamp(),
        };
        logs.push(record.clone());
        record
    }

    pub fn logs_for(&self, employee_id: u64) -> Vec<LogType> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.employee_id == employee_id)
            .map(|l| l.log_type)
            .collect()
    }

    pub fn log_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn entry_matches(filter: &LogFilter, entry: &LogEntry) -> bool {
        if filter.employee_id.is_some_and(|id| id != entry.employee_id) {
            return false;
        }
        if filter.log_type.is_some_and(|t| t != entry.log_type) {
            return false;
        }
        if filter.from_bound().is_some_and(|from| entry.logged_at < from) {
            return false;
        }
        if filter.to_bound_exclusive().is_some_and(|to| entry.logged_at >= to) {
            return false;
        }
        if let Some(term) = filter.search_term() {
            let term = term.to_lowercase();
            return entry.employee_name.to_lowercase().contains(&term)
                || entry.employee_code.to_lowercase().contains(&term);
        }
        true
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_by_rfid(&self, rfid_tag: &str) -> StoreResult<Option<Employee>> {
        tokio::task::yield_now().await;
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.rfid_tag == rfid_tag)
            .cloned())
    }

    async fn find_employee(&self, employee_id: u64) -> StoreResult<Option<Employee>> {
        tokio::task::yield_now().await;
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == employee_id)
            .cloned())
    }

    async fn last_log_for(&self, employee_id: u64) -> StoreResult<Option<LogRecord>> {
        tokio::task::yield_now().await;
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.employee_id == employee_id)
            .max_by_key(|l| (l.logged_at, l.id))
            .cloned())
    }

    async fn append(&self, employee_id: u64, log_type: LogType) -> StoreResult<LogRecord> {
        tokio::task::yield_now().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("connection reset".into()));
        }
        let mut logs = self.logs.lock().unwrap();
        let previous = logs
            .iter()
            .filter(|l| l.employee_id == employee_id)
            .map(|l| l.logged_at)
            .max();
        let record = LogRecord {
            id: logs.len() as u64 + 1,
            employee_id,
            log_type,
            logged_at: stamp_after(previous),
        };
        logs.push(record.clone());
        Ok(record)
    }

    async fn list_logs(&self, filter: &LogFilter, page: PageRequest) -> StoreResult<LogPage> {
        let employees = self.employees.lock().unwrap().clone();
        let mut matching: Vec<LogEntry> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|log| {
                let employee = employees.iter().find(|e| e.id == log.employee_id)?;
                Some(LogEntry {
                    id: log.id,
                    employee_id: log.employee_id,
                    employee_code: employee.employee_code.clone(),
                    employee_name: employee.name.clone(),
                    log_type: log.log_type,
                    logged_at: log.logged_at,
                })
            })
            .filter(|entry| Self::entry_matches(filter, entry))
            .collect();

        matching.sort_by(|a, b| (b.logged_at, b.id).cmp(&(a.logged_at, a.id)));
        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        Ok(LogPage { data, total })
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn module_permission(
        &self,
        role_id: u8,
        module: &str,
    ) -> StoreResult<Option<ModulePermission>> {
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .get(&(role_id, module.to_string()))
            .cloned())
    }
}
