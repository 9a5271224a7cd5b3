pub mod csv;
pub mod key_lock;
