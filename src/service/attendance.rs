use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::error::{AttendanceError, StoreError};
use crate::model::{
    attendance_log::{LogRecord, LogType},
    employee::{Employee, EmployeeStatus},
};
use crate::store::AttendanceStore;
use crate::utils::key_lock::KeyedLocks;

/// Upper bound on tag length; readers emit 8-16 characters.
pub const MAX_TAG_LEN: usize = 64;

/// Outcome of a successful scan.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Toggle {
    pub employee: Employee,
    pub attendance_log: LogRecord,
    #[schema(example = "IN", value_type = String)]
    pub log_type: LogType,
}

/// Anything that can turn a scanned tag into a recorded toggle.
#[async_trait]
pub trait TagResolver: Send + Sync {
    async fn resolve(&self, tag: &str) -> Result<Toggle, AttendanceError>;
}

/// Decides IN vs OUT for a scanned tag and writes the event.
///
/// Reading the last log, deciding, and appending happen under the employee's
/// key lock, so duplicate scans of one badge always produce IN, OUT, IN, ...
pub struct ToggleResolver {
    store: Arc<dyn AttendanceStore>,
    locks: KeyedLocks,
}

fn validate_tag(raw: &str) -> Result<&str, AttendanceError> {
    let tag = raw.trim();
    if tag.is_empty() {
        return Err(AttendanceError::Validation("RFID tag is required".into()));
    }
    if tag.chars().count() > MAX_TAG_LEN || tag.chars().any(char::is_control) {
        return Err(AttendanceError::Validation("Malformed RFID tag".into()));
    }
    Ok(tag)
}

fn persistence(err: StoreError, step: &'static str, tag: &str) -> AttendanceError {
    error!(error = %err, step, rfid_tag = tag, "Attendance store failure");
    AttendanceError::Persistence(err)
}

impl ToggleResolver {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn toggle(&self, raw_tag: &str) -> Result<Toggle, AttendanceError> {
        let tag = validate_tag(raw_tag)?;

        let employee = self
            .store
            .find_by_rfid(tag)
            .await
            .map_err(|e| persistence(e, "find_by_rfid", tag))?
            .ok_or_else(|| {
                info!(rfid_tag = tag, "Unregistered RFID tag");
                AttendanceError::NotFound("Employee not found".into())
            })?;

        if employee.status() != Some(EmployeeStatus::Active) {
            warn!(employee_id = employee.id, status = %employee.status, "Scan by non-active employee");
        }

        let _guard = self.locks.lock(employee.id).await;
        debug!(employee_id = employee.id, held = self.locks.active(), "Employee lock acquired");

        let last = self
            .store
            .last_log_for(employee.id)
            .await
            .map_err(|e| persistence(e, "last_log_for", tag))?;

        let log_type = LogType::next_after(last.map(|l| l.log_type));

        let log = self
            .store
            .append(employee.id, log_type)
            .await
            .map_err(|e| persistence(e, "append", tag))?;

        info!(
            employee_id = employee.id,
            log_id = log.id,
            log_type = %log_type,
            "Attendance recorded"
        );

        Ok(Toggle {
            employee,
            attendance_log: log,
            log_type,
        })
    }
}

#[async_trait]
impl TagResolver for ToggleResolver {
    async fn resolve(&self, tag: &str) -> Result<Toggle, AttendanceError> {
        self.toggle(tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::sample;
    use crate::store::memory::MemoryStore;
    use chrono::{SubsecRound, Utc};

    fn setup() -> (Arc<MemoryStore>, ToggleResolver) {
        let store = Arc::new(MemoryStore::with_employees(vec![
            sample(1, "Ana Ruiz", "TAG-0001"),
            sample(2, "Ben Okafor", "TAG-0002"),
        ]));
        let resolver = ToggleResolver::new(store.clone());
        (store, resolver)
    }

    fn strictly_alternates(types: &[LogType]) -> bool {
        types.windows(2).all(|w| w[0] != w[1])
    }

    #[actix_web::test]
    async fn first_scan_clocks_in() {
        let (store, resolver) = setup();

        let toggle = resolver.toggle("TAG-0001").await.unwrap();

        assert_eq!(toggle.log_type, LogType::In);
        assert_eq!(toggle.employee.id, 1);
        assert_eq!(toggle.attendance_log.employee_id, 1);
        assert_eq!(toggle.attendance_log.log_type, LogType::In);
        assert_eq!(store.logs_for(1), vec![LogType::In]);
    }

    #[actix_web::test]
    async fn last_in_becomes_out() {
        let (store, resolver) = setup();
        store.push_log(1, LogType::In);

        let toggle = resolver.toggle("TAG-0001").await.unwrap();

        assert_eq!(toggle.log_type, LogType::Out);
        assert_eq!(store.logs_for(1), vec![LogType::In, LogType::Out]);
    }

    #[actix_web::test]
    async fn tag_is_trimmed_before_lookup() {
        let (_, resolver) = setup();
        let toggle = resolver.toggle("  TAG-0002\n").await.unwrap();
        assert_eq!(toggle.employee.id, 2);
    }

    #[actix_web::test]
    async fn unknown_tag_writes_nothing() {
        let (store, resolver) = setup();

        let err = resolver.toggle("UNKNOWN123").await.unwrap_err();

        assert!(matches!(err, AttendanceError::NotFound(_)));
        assert_eq!(store.log_count(), 0);
    }

    #[actix_web::test]
    async fn blank_or_malformed_tag_is_rejected() {
        let (store, resolver) = setup();

        let too_long = "9".repeat(MAX_TAG_LEN + 1);
        for tag in ["", "   ", "TAG\u{7}0001", too_long.as_str()] {
            let err = resolver.toggle(tag).await.unwrap_err();
            assert!(matches!(err, AttendanceError::Validation(_)), "tag {tag:?}");
        }
        assert_eq!(store.log_count(), 0);
    }

    #[actix_web::test]
    async fn write_failure_surfaces_as_persistence_error() {
        let (store, resolver) = setup();
        store.fail_writes(true);

        let err = resolver.toggle("TAG-0001").await.unwrap_err();

        assert!(matches!(err, AttendanceError::Persistence(_)));
        assert_eq!(store.log_count(), 0);

        // a fresh scan after recovery starts from the unchanged state
        store.fail_writes(false);
        let toggle = resolver.toggle("TAG-0001").await.unwrap();
        assert_eq!(toggle.log_type, LogType::In);
    }

    #[actix_web::test]
    async fn timestamp_is_assigned_at_write_time() {
        let (_, resolver) = setup();
        let before = Utc::now().trunc_subsecs(6);

        let toggle = resolver.toggle("TAG-0001").await.unwrap();

        assert!(toggle.attendance_log.logged_at >= before);
    }

    #[actix_web::test]
    async fn concurrent_duplicate_scans_alternate() {
        let (store, resolver) = setup();
        store.push_log(1, LogType::Out);

        let (a, b) = futures::join!(resolver.toggle("TAG-0001"), resolver.toggle("TAG-0001"));
        let mut types = vec![a.unwrap().log_type, b.unwrap().log_type];
        types.sort_by_key(|t| t.to_string());
        assert_eq!(types, vec![LogType::In, LogType::Out]);

        assert_eq!(
            store.logs_for(1),
            vec![LogType::Out, LogType::In, LogType::Out]
        );
    }

    #[actix_web::test]
    async fn many_concurrent_scans_keep_each_employee_alternating() {
        let (store, resolver) = setup();

        let scans = (0..20).map(|i| {
            let tag = if i % 2 == 0 { "TAG-0001" } else { "TAG-0002" };
            resolver.toggle(tag)
        });
        let results = futures::future::join_all(scans).await;
        assert!(results.iter().all(Result::is_ok));

        for employee_id in [1, 2] {
            let types = store.logs_for(employee_id);
            assert_eq!(types.len(), 10);
            assert_eq!(types[0], LogType::In);
            assert!(strictly_alternates(&types), "{types:?}");
        }
    }
}
