//! Back-end collaborators of the calendar.
//!
//! Reads are synchronous: a render pass takes a snapshot of resources and
//! appointments. The reschedule write is the only async boundary.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::grid::{Appointment, ResourceColumn, ViewMode};

pub use memory::{InMemoryPractice, PracticeData};

/// Ordered operatories or providers for the active view mode
pub trait ResourceSource: Send + Sync {
    fn list_resources(&self, view_mode: ViewMode) -> Vec<ResourceColumn>;
}

/// Appointments of the day being viewed
pub trait AppointmentSource: Send + Sync {
    fn list_appointments(&self, date: NaiveDate) -> Vec<Appointment>;
}

/// The single write the calendar issues
#[async_trait]
pub trait AppointmentWriter: Send + Sync {
    /// Moves an appointment to `new_resource_id` (in the `view_mode` dimension)
    /// starting at `new_start_time` (`HH:MM:SS`).
    ///
    /// # Errors
    /// `RescheduleFailed` when the back end rejects the change.
    async fn reschedule_appointment(
        &self,
        appointment_id: u32,
        view_mode: ViewMode,
        new_resource_id: u32,
        new_start_time: &str,
    ) -> Result<Appointment>;
}
