//! Pickup workflow: staff actions and the auto-clear rule
//!
//! Transitions are unconditional. Whatever status a record holds, the action
//! overwrites it; concurrent editors resolve by last write.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{Dismissal, DismissalStatus};

/// An action staff can take on a dismissal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffAction {
    Send,
    Complete,
    Dismiss,
    Archive,
}

impl StaffAction {
    pub fn target_status(self) -> DismissalStatus {
        match self {
            StaffAction::Send => DismissalStatus::Sent,
            StaffAction::Complete => DismissalStatus::Completed,
            StaffAction::Dismiss => DismissalStatus::Dismissed,
            StaffAction::Archive => DismissalStatus::Historical,
        }
    }
}

impl fmt::Display for StaffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffAction::Send => write!(f, "send"),
            StaffAction::Complete => write!(f, "complete"),
            StaffAction::Dismiss => write!(f, "dismiss"),
            StaffAction::Archive => write!(f, "archive"),
        }
    }
}

/// Apply an action, stamping the matching timestamp
pub fn apply(dismissal: &mut Dismissal, action: StaffAction, now_ms: u64) {
    dismissal.status = action.target_status();
    match action {
        StaffAction::Send => dismissal.sent_at_ms = Some(now_ms),
        StaffAction::Complete | StaffAction::Dismiss => dismissal.dismissed_at_ms = Some(now_ms),
        StaffAction::Archive => {}
    }
    dismissal.updated_at_ms = now_ms;
}

/// True when a sent record has waited longer than `delay`
pub fn is_auto_clear_due(dismissal: &Dismissal, now_ms: u64, delay: Duration) -> bool {
    if dismissal.status != DismissalStatus::Sent {
        return false;
    }
    let sent_at = dismissal.sent_at_ms.unwrap_or(dismissal.updated_at_ms);
    now_ms.saturating_sub(sent_at) > delay.as_millis() as u64
}
