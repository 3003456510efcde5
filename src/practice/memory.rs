use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{CalendarError, Result};
use crate::grid::{parse_time_to_minutes, Appointment, ResourceColumn, ViewMode, MINUTES_PER_DAY};
use crate::parser::{load_appointments, load_resources};
use super::{AppointmentSource, AppointmentWriter, ResourceSource};

/// Everything the in-memory back end knows about the practice
#[derive(Debug, Clone, Default)]
pub struct PracticeData {
    pub operatories: Vec<ResourceColumn>,
    pub providers: Vec<ResourceColumn>,
    pub appointments: Vec<Appointment>,
}

impl PracticeData {
    fn resources(&self, view_mode: ViewMode) -> &[ResourceColumn] {
        match view_mode {
            ViewMode::Operatory => &self.operatories,
            ViewMode::Provider => &self.providers,
        }
    }
}

/// In-memory practice back end (in production, this is the REST API)
#[derive(Debug, Default)]
pub struct InMemoryPractice {
    data: Mutex<PracticeData>,
}

impl InMemoryPractice {
    pub fn new(data: PracticeData) -> Self {
        Self { data: Mutex::new(data) }
    }

    /// Loads `operatories.csv`, `providers.csv` and `appointments.csv` from a directory.
    /// Missing files load as empty lists.
    pub fn from_data_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let load_or_empty = |name: &str| -> Result<Vec<ResourceColumn>> {
            let path = dir.join(name);
            if path.exists() {
                load_resources(std::fs::File::open(path)?)
            } else {
                Ok(Vec::new())
            }
        };

        let operatories = load_or_empty("operatories.csv")?;
        let providers = load_or_empty("providers.csv")?;
        let appointments_path = dir.join("appointments.csv");
        let appointments = if appointments_path.exists() {
            load_appointments(std::fs::File::open(appointments_path)?)?
        } else {
            Vec::new()
        };

        info!(
            operatories = operatories.len(),
            providers = providers.len(),
            appointments = appointments.len(),
            dir = %dir.display(),
            "loaded practice data"
        );

        Ok(Self::new(PracticeData {
            operatories,
            providers,
            appointments,
        }))
    }

    fn lock(&self) -> MutexGuard<'_, PracticeData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Swaps in a freshly uploaded appointment list
    pub fn replace_appointments(&self, appointments: Vec<Appointment>) {
        self.lock().appointments = appointments;
    }

    pub fn appointment(&self, appointment_id: u32) -> Option<Appointment> {
        self.lock().appointments.iter().find(|a| a.id == appointment_id).cloned()
    }

    fn apply_reschedule(
        &self,
        appointment_id: u32,
        view_mode: ViewMode,
        new_resource_id: u32,
        new_start_time: &str,
    ) -> std::result::Result<Appointment, String> {
        let new_start = parse_time_to_minutes(new_start_time)
            .ok_or_else(|| format!("invalid start time '{}'", new_start_time))?;

        let mut data = self.lock();
        if !data.resources(view_mode).iter().any(|r| r.id == new_resource_id) {
            return Err(format!("unknown {} {}", view_mode, new_resource_id));
        }

        let appointment = data
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| format!("unknown appointment {}", appointment_id))?;

        if new_start.saturating_add(appointment.duration_minutes) > MINUTES_PER_DAY {
            return Err(format!("appointment {} would run past midnight", appointment_id));
        }

        match view_mode {
            ViewMode::Operatory => appointment.operatory_id = new_resource_id,
            ViewMode::Provider => appointment.provider_id = new_resource_id,
        }
        appointment.start_minutes = new_start;
        Ok(appointment.clone())
    }
}

impl ResourceSource for InMemoryPractice {
    fn list_resources(&self, view_mode: ViewMode) -> Vec<ResourceColumn> {
        self.lock().resources(view_mode).to_vec()
    }
}

impl AppointmentSource for InMemoryPractice {
    fn list_appointments(&self, date: NaiveDate) -> Vec<Appointment> {
        self.lock().appointments.iter().filter(|a| a.date == date).cloned().collect()
    }
}

#[async_trait]
impl AppointmentWriter for InMemoryPractice {
    async fn reschedule_appointment(
        &self,
        appointment_id: u32,
        view_mode: ViewMode,
        new_resource_id: u32,
        new_start_time: &str,
    ) -> Result<Appointment> {
        self.apply_reschedule(appointment_id, view_mode, new_resource_id, new_start_time)
            .map_err(|reason| {
                warn!(appointment_id, %reason, "reschedule rejected");
                CalendarError::RescheduleFailed(reason)
            })
    }
}
