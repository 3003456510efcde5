use chrono::NaiveTime;

use crate::error::{CalendarError, Result};
use super::types::{SlotTier, TimeSlot, MINUTES_PER_DAY};

/// Parses a time string (HH:MM or HH:MM:SS) to minutes since midnight
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    let hours: u32 = parts[0].parse().ok()?;
    let minutes: u32 = parts[1].parse().ok()?;
    if let Some(seconds) = parts.get(2) {
        let seconds: u32 = seconds.parse().ok()?;
        if seconds >= 60 {
            return None;
        }
    }
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Formats minutes since midnight to time string (HH:MM)
pub fn minutes_to_time_string(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    format!("{:02}:{:02}", hours % 24, mins)
}

/// Formats minutes since midnight as the back end's HH:MM:SS field
pub fn minutes_to_clock_time(minutes: u32) -> String {
    format!("{}:00", minutes_to_time_string(minutes))
}

/// 12-hour wall-clock label for a gridline, e.g. "7:00 AM"
pub fn slot_label(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| minutes_to_time_string(minutes))
}

/// Hour lines are major, half hours medium, quarter hours minor
pub fn classify_tier(offset_minutes: u32) -> SlotTier {
    if offset_minutes % 60 == 0 {
        SlotTier::Major
    } else if offset_minutes % 30 == 0 {
        SlotTier::Medium
    } else if offset_minutes % 15 == 0 {
        SlotTier::Minor
    } else {
        SlotTier::Untiered
    }
}

/// Builds the rows of a business day.
/// One slot every `granularity_minutes` from `start_hour:00` to `end_hour:00` inclusive.
pub fn build_time_slots(start_hour: u32, end_hour: u32, granularity_minutes: u32) -> Result<Vec<TimeSlot>> {
    if granularity_minutes == 0 {
        return Err(CalendarError::InvalidRange("slot granularity must be positive".to_string()));
    }
    if end_hour < start_hour {
        return Err(CalendarError::InvalidRange(format!(
            "end hour {} is before start hour {}",
            end_hour, start_hour
        )));
    }
    if end_hour > 24 {
        return Err(CalendarError::InvalidRange(format!("end hour {} is past midnight", end_hour)));
    }

    let start_minutes = start_hour * 60;
    let end_minutes = end_hour * 60;

    let slots = (start_minutes..=end_minutes)
        .step_by(granularity_minutes as usize)
        .map(|offset_minutes| TimeSlot {
            offset_minutes,
            label: slot_label(offset_minutes),
            tier: classify_tier(offset_minutes),
        })
        .collect();

    Ok(slots)
}
