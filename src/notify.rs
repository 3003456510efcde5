use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::drag::RescheduleCommand;
use crate::grid::minutes_to_time_string;

pub const RESCHEDULE_SUCCESS_TITLE: &str = "Appointment Updated";
pub const RESCHEDULE_FAILURE_MESSAGE: &str = "Failed to update appointment. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Failure,
}

/// A user-visible message about a commit attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn rescheduled(command: &RescheduleCommand) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: RESCHEDULE_SUCCESS_TITLE.to_string(),
            message: format!(
                "Appointment {} moved to {} {} at {}",
                command.appointment_id,
                command.view_mode,
                command.new_resource_id,
                minutes_to_time_string(command.new_start_minutes)
            ),
        }
    }

    pub fn reschedule_failed() -> Self {
        Self {
            kind: NotificationKind::Failure,
            title: "Error".to_string(),
            message: RESCHEDULE_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Channel for telling the user how a reschedule went
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(title = %notification.title, "{}", notification.message),
            NotificationKind::Failure => warn!(title = %notification.title, "{}", notification.message),
        }
    }
}

/// Keeps the most recent notifications in memory, oldest dropped first
#[derive(Debug)]
pub struct NotificationLog {
    entries: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl NotificationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Newest last
    pub fn recent(&self) -> Vec<Notification> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.iter().cloned().collect()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        LogNotifier.notify(notification.clone());
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ViewMode;

    fn command() -> RescheduleCommand {
        RescheduleCommand {
            appointment_id: 3,
            view_mode: ViewMode::Operatory,
            new_resource_id: 2,
            new_start_minutes: 605,
        }
    }

    #[test]
    fn test_messages() {
        let ok = Notification::rescheduled(&command());
        assert_eq!(ok.title, "Appointment Updated");
        assert_eq!(ok.message, "Appointment 3 moved to operatory 2 at 10:05");

        let failed = Notification::reschedule_failed();
        assert_eq!(failed.kind, NotificationKind::Failure);
        assert_eq!(failed.message, "Failed to update appointment. Please try again.");
    }

    #[test]
    fn test_log_is_bounded() {
        let log = NotificationLog::new(2);
        log.notify(Notification::reschedule_failed());
        log.notify(Notification::rescheduled(&command()));
        log.notify(Notification::reschedule_failed());

        let recent = log.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].kind, NotificationKind::Success);
        assert_eq!(recent[1].kind, NotificationKind::Failure);
    }
}
