//! Clock-in kiosk: keystroke framing, screen state machine and the session
//! that ties them to the toggle resolver.

pub mod display;
pub mod listener;
pub mod session;

pub use session::KioskSession;
