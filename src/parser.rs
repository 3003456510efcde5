use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::warn;

use crate::error::Result;
use crate::grid::{parse_time_to_minutes, Appointment, AppointmentStatus, ResourceColumn, MINUTES_PER_DAY};

/// Finds a column by (case-insensitive) header name
fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|name| h.trim().eq_ignore_ascii_case(name)))
}

/// Parses a number, returning None if empty or invalid
fn parse_number(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

fn field<'r>(record: &'r StringRecord, col: Option<usize>) -> &'r str {
    col.and_then(|c| record.get(c)).unwrap_or("").trim()
}

/// Loads an `id,name` resource list (operatories or providers), keeping file order
pub fn load_resources<R: Read>(reader: R) -> Result<Vec<ResourceColumn>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_col = find_column(&headers, &["id"]).or(Some(0));
    let name_col = find_column(&headers, &["name"]).or(Some(1));

    let mut resources: Vec<ResourceColumn> = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let Some(id) = parse_number(field(&record, id_col)) else {
            warn!(line = line + 2, "skipping resource row without a numeric id");
            continue;
        };
        let name = field(&record, name_col).to_string();

        // A repeated id renames the earlier resource in place
        match resources.iter_mut().find(|r| r.id == id) {
            Some(existing) => existing.name = name,
            None => resources.push(ResourceColumn { id, name }),
        }
    }

    Ok(resources)
}

/// Loads appointments from CSV.
///
/// Columns (any order): `id,patient,provider,operatory,date,start,duration,status`.
/// Rows missing an id, date or start time, or with zero duration, are skipped.
/// A repeated id replaces the earlier row.
pub fn load_appointments<R: Read>(reader: R) -> Result<Vec<Appointment>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_col = find_column(&headers, &["id", "appointment_id"]);
    let patient_col = find_column(&headers, &["patient", "patient_name"]);
    let provider_col = find_column(&headers, &["provider", "provider_id"]);
    let operatory_col = find_column(&headers, &["operatory", "operatory_id"]);
    let date_col = find_column(&headers, &["date"]);
    let start_col = find_column(&headers, &["start", "start_time"]);
    let duration_col = find_column(&headers, &["duration", "duration_minutes"]);
    let status_col = find_column(&headers, &["status"]);

    let mut appointments: Vec<Appointment> = Vec::new();
    let mut index_by_id: HashMap<u32, usize> = HashMap::new();

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let line = line + 2; // header is line 1

        let Some(id) = parse_number(field(&record, id_col)) else {
            warn!(line, "skipping appointment row without a numeric id");
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(field(&record, date_col), "%Y-%m-%d") else {
            warn!(line, id, "skipping appointment with an unreadable date");
            continue;
        };
        let Some(start_minutes) = parse_time_to_minutes(field(&record, start_col)) else {
            warn!(line, id, "skipping appointment with an unreadable start time");
            continue;
        };
        let duration_minutes = parse_number(field(&record, duration_col)).unwrap_or(0);
        let past_midnight = start_minutes
            .checked_add(duration_minutes)
            .map_or(true, |end| end > MINUTES_PER_DAY);
        if duration_minutes == 0 || past_midnight {
            warn!(line, id, duration_minutes, "skipping appointment with an invalid duration");
            continue;
        }

        let appointment = Appointment {
            id,
            patient_name: field(&record, patient_col).to_string(),
            provider_id: parse_number(field(&record, provider_col)).unwrap_or(0),
            operatory_id: parse_number(field(&record, operatory_col)).unwrap_or(0),
            date,
            start_minutes,
            duration_minutes,
            status: AppointmentStatus::parse_lenient(field(&record, status_col)),
        };

        match index_by_id.get(&id) {
            Some(&idx) => appointments[idx] = appointment,
            None => {
                index_by_id.insert(id, appointments.len());
                appointments.push(appointment);
            }
        }
    }

    Ok(appointments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_resources() {
        let csv = "id,name\n3,OP 3\n1,OP 1\nx,Broken\n3,Surgery\n";
        let resources = load_resources(csv.as_bytes()).unwrap();
        assert_eq!(resources, vec![ResourceColumn::new(3, "Surgery"), ResourceColumn::new(1, "OP 1")]);
    }

    #[test]
    fn test_load_appointments_any_column_order() {
        let csv = "Status,Date,Start,Duration,ID,Patient,Operatory,Provider\n\
                   No Show,2024-03-04,09:30,45,12,Ada Lovelace,2,10\n";
        let appointments = load_appointments(csv.as_bytes()).unwrap();
        assert_eq!(appointments.len(), 1);
        let appt = &appointments[0];
        assert_eq!(appt.id, 12);
        assert_eq!(appt.patient_name, "Ada Lovelace");
        assert_eq!((appt.provider_id, appt.operatory_id), (10, 2));
        assert_eq!(appt.start_minutes, 570);
        assert_eq!(appt.duration_minutes, 45);
        assert_eq!(appt.status, AppointmentStatus::NoShow);
    }

    #[test]
    fn test_load_appointments_skips_and_replaces() {
        let csv = "id,patient,provider,operatory,date,start,duration,status\n\
                   1,Ada,10,1,2024-03-04,09:00,60,confirmed\n\
                   2,Bob,10,1,not-a-date,09:00,60,\n\
                   3,Cy,10,1,2024-03-04,25:00,60,\n\
                   4,Di,10,1,2024-03-04,10:00,0,\n\
                   5,Ed,10,1,2024-03-04,23:30,60,\n\
                   1,Ada,10,2,2024-03-04,11:00:00,30,\n";
        let appointments = load_appointments(csv.as_bytes()).unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].operatory_id, 2);
        assert_eq!(appointments[0].start_minutes, 660);
        assert_eq!(appointments[0].status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_load_appointments_skips_huge_duration() {
        let csv = "id,patient,provider,operatory,date,start,duration,status\n\
                   1,Ada,10,1,2024-03-04,09:00,4294967295,\n\
                   2,Bob,10,1,2024-03-04,09:00,1441,\n\
                   3,Cy,10,1,2024-03-04,23:00,60,\n";
        let appointments = load_appointments(csv.as_bytes()).unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].id, 3);
    }
}
