pub mod types;
pub mod slot_utils;
pub mod mapper;
pub mod columns;
pub mod layout;

pub use types::{
    Appointment, AppointmentStatus, CalendarViewState, GridMetrics, ResourceColumn, SlotTier, TimeSlot, ViewMode,
    MINUTES_PER_DAY,
};
pub use slot_utils::{build_time_slots, minutes_to_clock_time, minutes_to_time_string, parse_time_to_minutes};
pub use mapper::{pixel_to_time, snap_to_time_slot, time_to_position, SlotPosition};
pub use columns::{column_of, effective_columns, placeholder_columns, resource_of};
pub use layout::{layout_day, DayLayout, PlacedAppointment};
