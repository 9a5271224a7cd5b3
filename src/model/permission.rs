use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Feature area guarded by the attendance admin endpoints.
pub const MODULE_ATTENDANCE: &str = "attendance";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PermissionAction {
    Access,
    Read,
    Write,
    Delete,
    Export,
}

/// Per-role, per-module flag set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct ModulePermission {
    pub can_access: bool,
    pub can_read: bool,
    pub can_write: bool,
    pub can_delete: bool,
    pub can_export: bool,
}

impl ModulePermission {
    /// Every action also needs module access.
    pub fn allows(&self, action: PermissionAction) -> bool {
        if !self.can_access {
            return false;
        }
        match action {
            PermissionAction::Access => true,
            PermissionAction::Read => self.can_read,
            PermissionAction::Write => self.can_write,
            PermissionAction::Delete => self.can_delete,
            PermissionAction::Export => self.can_export,
        }
    }
}
