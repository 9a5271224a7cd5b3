use std::fmt;

use chrono::{DateTime, Utc};

use crate::model::attendance_log::LogType;
use crate::service::attendance::Toggle;

/// What the kiosk shows after a successful scan.
#[derive(Debug, Clone, PartialEq)]
pub struct KioskCard {
    pub employee_name: String,
    pub employee_code: String,
    pub photo_url: Option<String>,
    pub log_type: LogType,
    pub logged_at: DateTime<Utc>,
}

impl KioskCard {
    pub fn status_label(&self) -> &'static str {
        self.log_type.status_label()
    }
}

impl From<&Toggle> for KioskCard {
    fn from(toggle: &Toggle) -> Self {
        KioskCard {
            employee_name: toggle.employee.name.clone(),
            employee_code: toggle.employee.employee_code.clone(),
            photo_url: toggle.employee.photo_url.clone(),
            log_type: toggle.log_type,
            logged_at: toggle.attendance_log.logged_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Idle,
    Processing { tag: String },
    Success(KioskCard),
    Error { message: String },
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::Idle => write!(f, "Please scan your RFID card"),
            DisplayState::Processing { .. } => write!(f, "Processing..."),
            DisplayState::Success(card) => write!(
                f,
                "{} ({}) - {} at {}",
                card.employee_name,
                card.employee_code,
                card.status_label(),
                card.logged_at.format("%H:%M:%S")
            ),
            DisplayState::Error { message } => write!(f, "Error: {}", message),
        }
    }
}

/// Identifies one armed auto-clear timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearToken(u64);

/// Identifies the scan a pending resolve belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

/// Kiosk screen state. The methods are the only legal transitions:
///
/// ```text
/// Idle --begin--> Processing --succeed--> Success --expire/clear--> Idle
///                            \--fail----> Error   --expire/clear--> Idle
/// ```
///
/// `begin` may also be entered from any state; it disarms the pending timer.
#[derive(Debug)]
pub struct KioskDisplay {
    state: DisplayState,
    request_seq: u64,
    timer_seq: u64,
    armed: Option<u64>,
}

impl Default for KioskDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl KioskDisplay {
    pub fn new() -> Self {
        Self {
            state: DisplayState::Idle,
            request_seq: 0,
            timer_seq: 0,
            armed: None,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn has_pending_clear(&self) -> bool {
        self.armed.is_some()
    }

    /// A tag arrived. Results of any earlier scan still in flight are ignored from now on.
    pub fn begin(&mut self, tag: &str) -> RequestId {
        self.request_seq += 1;
        self.armed = None;
        self.state = DisplayState::Processing {
            tag: tag.to_string(),
        };
        RequestId(self.request_seq)
    }

    /// Returns the timer to arm, or `None` when `request` was superseded.
    pub fn succeed(&mut self, request: RequestId, toggle: &Toggle) -> Option<ClearToken> {
        if request.0 != self.request_seq {
            return None;
        }
        self.state = DisplayState::Success(KioskCard::from(toggle));
        Some(self.arm())
    }

    /// The employee card is dropped at once; only the message stays.
    pub fn fail(&mut self, request: RequestId, message: impl Into<String>) -> Option<ClearToken> {
        if request.0 != self.request_seq {
            return None;
        }
        self.state = DisplayState::Error {
            message: message.into(),
        };
        Some(self.arm())
    }

    /// Manual clear. Idempotent.
    pub fn clear(&mut self) {
        self.armed = None;
        self.state = DisplayState::Idle;
    }

    /// Timer fired. Stale or cancelled tokens are a no-op; returns whether the screen cleared.
    pub fn expire(&mut self, token: ClearToken) -> bool {
        if self.armed != Some(token.0) {
            return false;
        }
        self.clear();
        true
    }

    fn arm(&mut self) -> ClearToken {
        self.timer_seq += 1;
        self.armed = Some(self.timer_seq);
        ClearToken(self.timer_seq)
    }
}
