use crate::error::{CalendarError, Result};
use super::types::{Appointment, ResourceColumn, ViewMode};

/// Resource id an appointment is arranged by in the given view mode
pub fn resource_of(appointment: &Appointment, view_mode: ViewMode) -> u32 {
    match view_mode {
        ViewMode::Provider => appointment.provider_id,
        ViewMode::Operatory => appointment.operatory_id,
    }
}

/// Position of the appointment's column.
/// `UnassignedResource` when no column matches; callers leave the appointment out of the render.
pub fn column_of(appointment: &Appointment, view_mode: ViewMode, columns: &[ResourceColumn]) -> Result<usize> {
    let resource_id = resource_of(appointment, view_mode);
    columns
        .iter()
        .position(|column| column.id == resource_id)
        .ok_or(CalendarError::UnassignedResource {
            appointment_id: appointment.id,
            resource_id,
        })
}

/// Columns shown before the practice's resource list has loaded
pub fn placeholder_columns(view_mode: ViewMode) -> Vec<ResourceColumn> {
    match view_mode {
        ViewMode::Operatory => (1..=4).map(|id| ResourceColumn::new(id, format!("OP {}", id))).collect(),
        ViewMode::Provider => (1..=3).map(|id| ResourceColumn::new(id, format!("Provider {}", id))).collect(),
    }
}

/// The loaded resources, or the placeholder set while the list is empty
pub fn effective_columns(resources: Vec<ResourceColumn>, view_mode: ViewMode) -> Vec<ResourceColumn> {
    if resources.is_empty() {
        placeholder_columns(view_mode)
    } else {
        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::types::AppointmentStatus;
    use chrono::NaiveDate;

    fn appointment(provider_id: u32, operatory_id: u32) -> Appointment {
        Appointment {
            id: 11,
            patient_name: "Grace".to_string(),
            provider_id,
            operatory_id,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            start_minutes: 480,
            duration_minutes: 30,
            status: AppointmentStatus::Scheduled,
        }
    }

    #[test]
    fn test_resource_of_follows_view_mode() {
        let appt = appointment(20, 3);
        assert_eq!(resource_of(&appt, ViewMode::Provider), 20);
        assert_eq!(resource_of(&appt, ViewMode::Operatory), 3);
    }

    #[test]
    fn test_column_of_uses_list_position() {
        let columns = vec![
            ResourceColumn::new(5, "OP 5"),
            ResourceColumn::new(3, "OP 3"),
            ResourceColumn::new(9, "OP 9"),
        ];
        assert_eq!(column_of(&appointment(20, 3), ViewMode::Operatory, &columns).unwrap(), 1);
    }

    #[test]
    fn test_column_of_unassigned() {
        let columns = vec![ResourceColumn::new(1, "Dr. Lee")];
        let err = column_of(&appointment(20, 1), ViewMode::Provider, &columns).unwrap_err();
        assert!(matches!(
            err,
            CalendarError::UnassignedResource { appointment_id: 11, resource_id: 20 }
        ));
    }

    #[test]
    fn test_placeholders_when_empty() {
        let columns = effective_columns(Vec::new(), ViewMode::Operatory);
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].name, "OP 1");

        let loaded = vec![ResourceColumn::new(8, "Dr. Kim")];
        assert_eq!(effective_columns(loaded.clone(), ViewMode::Provider), loaded);
    }
}
