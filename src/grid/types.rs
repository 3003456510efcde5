use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// Minutes in one calendar day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Visual weight of a time-slot gridline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotTier {
    Major,
    Medium,
    Minor,
    Untiered,
}

/// One row of the day grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub offset_minutes: u32, // minutes since local midnight
    pub label: String,
    pub tier: SlotTier,
}

/// Which resource dimension the calendar columns represent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Operatory,
    Provider,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Operatory => write!(f, "operatory"),
            ViewMode::Provider => write!(f, "provider"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "operatory" | "operatories" | "op" => Ok(ViewMode::Operatory),
            "provider" | "providers" | "prov" => Ok(ViewMode::Provider),
            other => Err(CalendarError::InvalidConfiguration(format!("unknown view mode '{}'", other))),
        }
    }
}

/// An operatory or provider shown as one calendar column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceColumn {
    pub id: u32,
    pub name: String,
}

impl ResourceColumn {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::CheckedIn => "checked in",
            AppointmentStatus::InProgress => "in progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no show",
        }
    }

    /// Lenient parse used by the CSV loader; unknown values fall back to `Scheduled`
    pub fn parse_lenient(value: &str) -> Self {
        let normalized: String = value
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "confirmed" => AppointmentStatus::Confirmed,
            "checkedin" | "arrived" => AppointmentStatus::CheckedIn,
            "inprogress" | "seated" => AppointmentStatus::InProgress,
            "completed" | "complete" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            "noshow" => AppointmentStatus::NoShow,
            _ => AppointmentStatus::Scheduled,
        }
    }
}

/// An appointment as the calendar sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: u32,
    pub patient_name: String,
    pub provider_id: u32,
    pub operatory_id: u32,
    pub date: NaiveDate,
    pub start_minutes: u32,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn end_minutes(&self) -> u32 {
        self.start_minutes.saturating_add(self.duration_minutes)
    }

    /// Checks `duration_minutes > 0` and `start_minutes` within the day
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes == 0 {
            return Err(CalendarError::InvalidConfiguration(format!(
                "appointment {} has zero duration",
                self.id
            )));
        }
        if self.start_minutes >= MINUTES_PER_DAY {
            return Err(CalendarError::InvalidRange(format!(
                "appointment {} starts at minute {}, past the end of the day",
                self.id, self.start_minutes
            )));
        }
        Ok(())
    }
}

/// Constants mapping grid rows to pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMetrics {
    pub calendar_start_minutes: u32,
    pub pixels_per_slot: f64,
    pub slot_granularity_minutes: u32,
}

impl GridMetrics {
    /// Fails fast on constants that would make the mapper divide by zero
    pub fn validate(&self) -> Result<()> {
        if self.slot_granularity_minutes == 0 {
            return Err(CalendarError::InvalidConfiguration(
                "slot granularity must be positive".to_string(),
            ));
        }
        if !self.pixels_per_slot.is_finite() || self.pixels_per_slot <= 0.0 {
            return Err(CalendarError::InvalidConfiguration(format!(
                "pixels per slot must be a positive number, got {}",
                self.pixels_per_slot
            )));
        }
        Ok(())
    }
}

/// Everything a render pass or a drag gesture needs to know about the current view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarViewState {
    pub date: NaiveDate,
    pub view_mode: ViewMode,
    pub start_hour: u32,
    pub end_hour: u32,
    pub metrics: GridMetrics,
}

impl CalendarViewState {
    pub fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }
}
