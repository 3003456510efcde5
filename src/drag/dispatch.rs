use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::error::{CalendarError, Result};
use crate::notify::{Notification, Notifier};
use crate::practice::AppointmentWriter;
use super::coordinator::RescheduleCommand;

/// Sends one reschedule to the back end and tells the user how it went.
/// No retry; on failure the grid keeps showing the authoritative data.
pub async fn commit_reschedule(
    command: RescheduleCommand,
    writer: &dyn AppointmentWriter,
    notifier: &dyn Notifier,
) -> Result<()> {
    let new_start_time = command.new_start_time();
    match writer
        .reschedule_appointment(command.appointment_id, command.view_mode, command.new_resource_id, &new_start_time)
        .await
    {
        Ok(_) => {
            info!(appointment_id = command.appointment_id, start = %new_start_time, "appointment rescheduled");
            notifier.notify(Notification::rescheduled(&command));
            Ok(())
        }
        Err(e) => {
            warn!(appointment_id = command.appointment_id, error = %e, "reschedule failed");
            notifier.notify(Notification::reschedule_failed());
            if matches!(e, CalendarError::RescheduleFailed(_)) {
                Err(e)
            } else {
                Err(CalendarError::RescheduleFailed(e.to_string()))
            }
        }
    }
}

/// Commits queued commands one at a time until every sender is dropped
pub async fn run_dispatcher(
    mut receiver: UnboundedReceiver<RescheduleCommand>,
    writer: Arc<dyn AppointmentWriter>,
    notifier: Arc<dyn Notifier>,
) {
    while let Some(command) = receiver.recv().await {
        // Failures are already logged and notified
        let _ = commit_reschedule(command, &*writer, &*notifier).await;
    }
    info!("reschedule dispatcher stopped");
}
