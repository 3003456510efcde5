use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CalendarError, Result};
use super::columns::column_of;
use super::mapper::time_to_position;
use super::slot_utils::build_time_slots;
use super::types::{Appointment, AppointmentStatus, CalendarViewState, ResourceColumn, TimeSlot, ViewMode};

/// An appointment block positioned on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedAppointment {
    pub appointment_id: u32,
    pub patient_name: String,
    pub status: AppointmentStatus,
    pub start_minutes: u32,
    pub duration_minutes: u32,
    pub column: usize,
    pub lane: usize,       // side-by-side position inside the column
    pub lane_count: usize, // lanes used by the overlap cluster this block belongs to
    pub top: f64,
    pub height: f64,
}

/// One render pass of the calendar for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLayout {
    pub date: chrono::NaiveDate,
    pub view_mode: ViewMode,
    pub slots: Vec<TimeSlot>,
    pub columns: Vec<ResourceColumn>,
    pub blocks: Vec<PlacedAppointment>,
    pub unassigned: Vec<u32>, // appointment ids with no matching column
}

/// Lays out one day: slots, columns and a block per appointment that has a column
pub fn layout_day(
    view: &CalendarViewState,
    columns: &[ResourceColumn],
    appointments: &[Appointment],
) -> Result<DayLayout> {
    view.metrics.validate()?;
    let slots = build_time_slots(view.start_hour, view.end_hour, view.metrics.slot_granularity_minutes)?;

    let mut blocks = Vec::new();
    let mut unassigned = Vec::new();

    for appointment in appointments.iter().filter(|a| a.date == view.date) {
        match column_of(appointment, view.view_mode, columns) {
            Ok(column) => {
                let position = time_to_position(appointment, &view.metrics)?;
                blocks.push(PlacedAppointment {
                    appointment_id: appointment.id,
                    patient_name: appointment.patient_name.clone(),
                    status: appointment.status,
                    start_minutes: appointment.start_minutes,
                    duration_minutes: appointment.duration_minutes,
                    column,
                    lane: 0,
                    lane_count: 1,
                    top: position.top,
                    height: position.height,
                });
            }
            Err(CalendarError::UnassignedResource { appointment_id, resource_id }) => {
                debug!(appointment_id, resource_id, "appointment has no visible column");
                unassigned.push(appointment_id);
            }
            Err(e) => return Err(e),
        }
    }

    for column in 0..columns.len() {
        assign_lanes(&mut blocks, column);
    }

    blocks.sort_by(|a, b| {
        a.column
            .cmp(&b.column)
            .then(a.start_minutes.cmp(&b.start_minutes))
            .then(a.appointment_id.cmp(&b.appointment_id))
    });

    Ok(DayLayout {
        date: view.date,
        view_mode: view.view_mode,
        slots,
        columns: columns.to_vec(),
        blocks,
        unassigned,
    })
}

/// Gives overlapping blocks in one column distinct lanes.
/// Greedy interval partitioning: each block takes the lowest lane that is free at its start.
fn assign_lanes(blocks: &mut [PlacedAppointment], column: usize) {
    let end_of = |block: &PlacedAppointment| block.start_minutes.saturating_add(block.duration_minutes);

    let mut indices: Vec<usize> = (0..blocks.len()).filter(|&i| blocks[i].column == column).collect();
    indices.sort_by(|&a, &b| {
        let (a, b) = (&blocks[a], &blocks[b]);
        a.start_minutes
            .cmp(&b.start_minutes)
            .then(end_of(b).cmp(&end_of(a)))
            .then(a.appointment_id.cmp(&b.appointment_id))
    });

    let mut lane_ends: Vec<u32> = Vec::new();
    let mut cluster: Vec<usize> = Vec::new();
    let mut cluster_end = 0;

    for idx in indices {
        let start = blocks[idx].start_minutes;
        let end = end_of(&blocks[idx]);

        // A block starting after everything in the cluster has ended closes it
        if !cluster.is_empty() && start >= cluster_end {
            close_cluster(blocks, &cluster, lane_ends.len());
            cluster.clear();
            lane_ends.clear();
        }

        let lane = match lane_ends.iter().position(|&lane_end| lane_end <= start) {
            Some(lane) => {
                lane_ends[lane] = end;
                lane
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };
        blocks[idx].lane = lane;
        cluster.push(idx);
        cluster_end = cluster_end.max(end);
    }

    if !cluster.is_empty() {
        close_cluster(blocks, &cluster, lane_ends.len());
    }
}

fn close_cluster(blocks: &mut [PlacedAppointment], cluster: &[usize], lane_count: usize) {
    for &idx in cluster {
        blocks[idx].lane_count = lane_count;
    }
}
