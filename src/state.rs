use std::sync::Arc;

use crate::service::attendance::ToggleResolver;
use crate::store::{AccountStore, AttendanceStore};

/// Shared handles passed to every handler through `web::Data`.
pub struct AppState {
    pub resolver: Arc<ToggleResolver>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl AppState {
    pub fn new(attendance: Arc<dyn AttendanceStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            resolver: Arc::new(ToggleResolver::new(attendance.clone())),
            attendance,
            accounts,
        }
    }
}
