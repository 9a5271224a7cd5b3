pub mod attendance_log;
pub mod employee;
pub mod permission;
pub mod role;
pub mod user;
