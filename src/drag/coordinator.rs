use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::grid::{minutes_to_clock_time, snap_to_time_slot, Appointment, CalendarViewState, GridMetrics, ViewMode, MINUTES_PER_DAY};

/// The change a completed drag asks the back end to make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleCommand {
    pub appointment_id: u32,
    pub view_mode: ViewMode, // dimension `new_resource_id` belongs to
    pub new_resource_id: u32,
    pub new_start_minutes: u32,
}

impl RescheduleCommand {
    /// Start time in the back end's `HH:MM:SS` format
    pub fn new_start_time(&self) -> String {
        minutes_to_clock_time(self.new_start_minutes)
    }
}

/// In-flight gesture; lives only while dragging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragState {
    pub appointment_id: u32,
    pub candidate_resource_id: Option<u32>,
    pub candidate_time_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging(DragState),
}

/// Where the pointer was released
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropTarget {
    pub resource_id: u32,
    pub raw_time: f64, // unsnapped minutes since midnight
}

/// Receives reschedule commands issued by a drag gesture
pub trait RescheduleSink {
    fn submit(&mut self, command: RescheduleCommand);
}

impl RescheduleSink for Vec<RescheduleCommand> {
    fn submit(&mut self, command: RescheduleCommand) {
        self.push(command);
    }
}

impl RescheduleSink for UnboundedSender<RescheduleCommand> {
    fn submit(&mut self, command: RescheduleCommand) {
        if self.send(command).is_err() {
            warn!(appointment_id = command.appointment_id, "reschedule dispatcher has shut down, command dropped");
        }
    }
}

/// Gesture callbacks any UI toolkit can drive
pub trait DragGesture {
    /// Begins a drag of `appointment_id`; ignored when unknown or while another drag is active
    fn on_drag_start(&mut self, appointment_id: u32);

    /// Updates the preview target. No effect on data, safe to repeat.
    fn on_drag_move(&mut self, over_resource_id: u32, over_raw_time: f64);

    /// Ends the gesture. Issues a command when dropped on a target, otherwise cancels.
    fn on_drag_end(&mut self, over: Option<DropTarget>) -> Option<RescheduleCommand>;
}

/// Idle → Dragging → Idle state machine turning a drop into one reschedule command
#[derive(Debug)]
pub struct DragCoordinator<S: RescheduleSink> {
    view_mode: ViewMode,
    granularity_minutes: u32,
    known_appointments: HashSet<u32>,
    phase: DragPhase,
    sink: S,
}

impl<S: RescheduleSink> DragCoordinator<S> {
    /// # Errors
    /// `InvalidConfiguration` when the view's grid constants are unusable.
    pub fn new(view: &CalendarViewState, sink: S) -> Result<Self> {
        Self::with_metrics(view.view_mode, &view.metrics, sink)
    }

    pub fn with_metrics(view_mode: ViewMode, metrics: &GridMetrics, sink: S) -> Result<Self> {
        metrics.validate()?;
        Ok(Self {
            view_mode,
            granularity_minutes: metrics.slot_granularity_minutes,
            known_appointments: HashSet::new(),
            phase: DragPhase::Idle,
            sink,
        })
    }

    /// Refreshes the appointments a drag may start on; call once per render pass
    pub fn sync_appointments(&mut self, appointments: &[Appointment]) {
        self.known_appointments = appointments.iter().map(|a| a.id).collect();
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    /// Current preview target, if any
    pub fn candidate(&self) -> Option<(u32, u32)> {
        match self.phase {
            DragPhase::Dragging(DragState {
                candidate_resource_id: Some(resource),
                candidate_time_minutes: Some(time),
                ..
            }) => Some((resource, time)),
            _ => None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Snaps to the grid and keeps the slot inside the day
    fn snap(&self, raw_time: f64) -> Option<u32> {
        match snap_to_time_slot(raw_time, self.granularity_minutes) {
            Ok(minutes) => Some(minutes.min(MINUTES_PER_DAY - self.granularity_minutes.min(MINUTES_PER_DAY))),
            Err(e) => {
                debug!(error = %e, "ignoring unusable drag position");
                None
            }
        }
    }
}

impl<S: RescheduleSink> DragGesture for DragCoordinator<S> {
    fn on_drag_start(&mut self, appointment_id: u32) {
        if let DragPhase::Dragging(active) = self.phase {
            debug!(appointment_id, active = active.appointment_id, "drag already in progress, ignoring start");
            return;
        }
        if !self.known_appointments.contains(&appointment_id) {
            debug!(appointment_id, "drag started on unknown appointment, staying idle");
            return;
        }
        debug!(appointment_id, "drag started");
        self.phase = DragPhase::Dragging(DragState {
            appointment_id,
            candidate_resource_id: None,
            candidate_time_minutes: None,
        });
    }

    fn on_drag_move(&mut self, over_resource_id: u32, over_raw_time: f64) {
        if !self.is_dragging() {
            return;
        }
        // An unusable position keeps the previous preview
        let Some(candidate_time) = self.snap(over_raw_time) else {
            return;
        };
        if let DragPhase::Dragging(state) = &mut self.phase {
            state.candidate_resource_id = Some(over_resource_id);
            state.candidate_time_minutes = Some(candidate_time);
        }
    }

    fn on_drag_end(&mut self, over: Option<DropTarget>) -> Option<RescheduleCommand> {
        let DragPhase::Dragging(state) = std::mem::replace(&mut self.phase, DragPhase::Idle) else {
            return None;
        };

        let Some(target) = over else {
            debug!(appointment_id = state.appointment_id, "drag cancelled");
            return None;
        };
        let new_start_minutes = self.snap(target.raw_time)?;

        let command = RescheduleCommand {
            appointment_id: state.appointment_id,
            view_mode: self.view_mode,
            new_resource_id: target.resource_id,
            new_start_minutes,
        };
        info!(
            appointment_id = command.appointment_id,
            resource_id = command.new_resource_id,
            start = %command.new_start_time(),
            "issuing reschedule"
        );
        self.sink.submit(command);
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::AppointmentStatus;
    use chrono::NaiveDate;

    fn appointment(id: u32) -> Appointment {
        Appointment {
            id,
            patient_name: format!("Patient {}", id),
            provider_id: 10,
            operatory_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            start_minutes: 540,
            duration_minutes: 60,
            status: AppointmentStatus::Scheduled,
        }
    }

    fn coordinator() -> DragCoordinator<Vec<RescheduleCommand>> {
        let metrics = GridMetrics {
            calendar_start_minutes: 420,
            pixels_per_slot: 10.0,
            slot_granularity_minutes: 5,
        };
        let mut coordinator = DragCoordinator::with_metrics(ViewMode::Operatory, &metrics, Vec::new()).unwrap();
        coordinator.sync_appointments(&[appointment(1), appointment(2)]);
        coordinator
    }

    #[test]
    fn test_rejects_bad_metrics() {
        let metrics = GridMetrics {
            calendar_start_minutes: 420,
            pixels_per_slot: 10.0,
            slot_granularity_minutes: 0,
        };
        assert!(DragCoordinator::with_metrics(ViewMode::Operatory, &metrics, Vec::new()).is_err());
    }

    #[test]
    fn test_start_unknown_appointment_stays_idle() {
        let mut c = coordinator();
        c.on_drag_start(99);
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_move_snaps_candidate() {
        let mut c = coordinator();
        c.on_drag_start(1);
        c.on_drag_move(2, 603.0);
        assert_eq!(c.candidate(), Some((2, 605)));
        c.on_drag_move(2, 602.0);
        assert_eq!(c.candidate(), Some((2, 600)));
    }

    #[test]
    fn test_move_is_idempotent_and_side_effect_free() {
        let mut c = coordinator();
        c.on_drag_start(1);
        c.on_drag_move(3, 611.0);
        let first = c.phase();
        c.on_drag_move(3, 611.0);
        assert_eq!(c.phase(), first);
        assert!(c.sink().is_empty());
    }

    #[test]
    fn test_unusable_move_keeps_previous_candidate() {
        let mut c = coordinator();
        c.on_drag_start(1);
        c.on_drag_move(2, f64::NAN);
        assert_eq!(
            c.phase(),
            DragPhase::Dragging(DragState {
                appointment_id: 1,
                candidate_resource_id: None,
                candidate_time_minutes: None,
            })
        );

        c.on_drag_move(2, 603.0);
        c.on_drag_move(3, f64::INFINITY);
        assert_eq!(c.candidate(), Some((2, 605)));
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let mut c = coordinator();
        c.on_drag_move(2, 603.0);
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_second_start_is_ignored() {
        let mut c = coordinator();
        c.on_drag_start(1);
        c.on_drag_move(2, 700.0);
        let before = c.phase();
        c.on_drag_start(2);
        assert_eq!(c.phase(), before);
    }

    #[test]
    fn test_drop_issues_one_command() {
        let mut c = coordinator();
        c.on_drag_start(1);
        c.on_drag_move(2, 603.0);
        let command = c.on_drag_end(Some(DropTarget { resource_id: 2, raw_time: 603.0 })).unwrap();

        assert_eq!(command.appointment_id, 1);
        assert_eq!(command.new_resource_id, 2);
        assert_eq!(command.new_start_minutes, 605);
        assert_eq!(command.new_start_time(), "10:05:00");
        assert_eq!(c.phase(), DragPhase::Idle);

        // A second end without a new start issues nothing
        assert!(c.on_drag_end(Some(DropTarget { resource_id: 2, raw_time: 603.0 })).is_none());
        assert_eq!(c.into_sink(), vec![command]);
    }

    #[test]
    fn test_cancelled_drop_issues_nothing() {
        let mut c = coordinator();
        c.on_drag_start(1);
        c.on_drag_move(2, 603.0);
        assert!(c.on_drag_end(None).is_none());
        assert_eq!(c.phase(), DragPhase::Idle);
        assert!(c.sink().is_empty());
    }

    #[test]
    fn test_drop_clamps_to_day() {
        let mut c = coordinator();
        c.on_drag_start(2);
        let command = c.on_drag_end(Some(DropTarget { resource_id: 1, raw_time: 1500.0 })).unwrap();
        assert_eq!(command.new_start_minutes, 1435);

        c.on_drag_start(2);
        let command = c.on_drag_end(Some(DropTarget { resource_id: 1, raw_time: -30.0 })).unwrap();
        assert_eq!(command.new_start_minutes, 0);
    }

    #[test]
    fn test_unusable_drop_position_returns_to_idle() {
        let mut c = coordinator();
        c.on_drag_start(1);
        assert!(c.on_drag_end(Some(DropTarget { resource_id: 1, raw_time: f64::NAN })).is_none());
        assert_eq!(c.phase(), DragPhase::Idle);
        assert!(c.sink().is_empty());
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let metrics = GridMetrics {
            calendar_start_minutes: 420,
            pixels_per_slot: 10.0,
            slot_granularity_minutes: 15,
        };
        let mut c = DragCoordinator::with_metrics(ViewMode::Provider, &metrics, tx).unwrap();
        c.sync_appointments(&[appointment(4)]);
        c.on_drag_start(4);
        c.on_drag_end(Some(DropTarget { resource_id: 10, raw_time: 607.5 }));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.view_mode, ViewMode::Provider);
        assert_eq!(received.new_start_minutes, 615);
    }
}
