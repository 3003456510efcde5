use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use super::types::{Appointment, GridMetrics};

/// Vertical placement of an appointment block, in pixels from the first grid row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotPosition {
    pub top: f64,
    pub height: f64,
}

/// Maps an appointment's start and duration to a pixel offset and height.
/// `top` is negative for appointments starting before the calendar does.
pub fn time_to_position(appointment: &Appointment, metrics: &GridMetrics) -> Result<SlotPosition> {
    metrics.validate()?;
    let granularity = f64::from(metrics.slot_granularity_minutes);
    let minutes_from_start = f64::from(appointment.start_minutes) - f64::from(metrics.calendar_start_minutes);

    Ok(SlotPosition {
        top: minutes_from_start / granularity * metrics.pixels_per_slot,
        height: f64::from(appointment.duration_minutes) / granularity * metrics.pixels_per_slot,
    })
}

/// Converts a pixel offset back into unsnapped minutes since midnight
pub fn pixel_to_time(pixel_offset: f64, metrics: &GridMetrics) -> Result<f64> {
    metrics.validate()?;
    if !pixel_offset.is_finite() {
        return Err(CalendarError::InvalidConfiguration(format!(
            "pixel offset must be finite, got {}",
            pixel_offset
        )));
    }
    let slots = pixel_offset / metrics.pixels_per_slot;
    Ok(f64::from(metrics.calendar_start_minutes) + slots * f64::from(metrics.slot_granularity_minutes))
}

/// Rounds to the nearest multiple of the granularity, halves rounding up.
/// Times before midnight clamp to 0.
pub fn snap_to_time_slot(raw_minutes: f64, granularity_minutes: u32) -> Result<u32> {
    if granularity_minutes == 0 {
        return Err(CalendarError::InvalidConfiguration(
            "slot granularity must be positive".to_string(),
        ));
    }
    if !raw_minutes.is_finite() {
        return Err(CalendarError::InvalidConfiguration(format!(
            "raw time must be finite, got {}",
            raw_minutes
        )));
    }
    let granularity = f64::from(granularity_minutes);
    let slots = (raw_minutes / granularity + 0.5).floor();
    if slots <= 0.0 {
        return Ok(0);
    }
    Ok((slots as u32).saturating_mul(granularity_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::types::AppointmentStatus;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn metrics() -> GridMetrics {
        GridMetrics {
            calendar_start_minutes: 420,
            pixels_per_slot: 10.0,
            slot_granularity_minutes: 5,
        }
    }

    fn appointment(start: u32, duration: u32) -> Appointment {
        Appointment {
            id: 7,
            patient_name: "Ada".to_string(),
            provider_id: 1,
            operatory_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            start_minutes: start,
            duration_minutes: duration,
            status: AppointmentStatus::Confirmed,
        }
    }

    #[test]
    fn test_position_of_nine_am_appointment() {
        let pos = time_to_position(&appointment(540, 70), &metrics()).unwrap();
        assert_eq!(pos.top, 240.0);
        assert_eq!(pos.height, 140.0);
    }

    #[test]
    fn test_position_before_calendar_start_is_negative() {
        let pos = time_to_position(&appointment(400, 10), &metrics()).unwrap();
        assert_eq!(pos.top, -40.0);
        assert_eq!(pos.height, 20.0);
    }

    #[test]
    fn test_pixel_to_time() {
        assert_eq!(pixel_to_time(240.0, &metrics()).unwrap(), 540.0);
        assert_eq!(pixel_to_time(0.0, &metrics()).unwrap(), 420.0);
        assert_eq!(pixel_to_time(5.0, &metrics()).unwrap(), 422.5);
    }

    #[test]
    fn test_snap_rounding() {
        assert_eq!(snap_to_time_slot(602.0, 5).unwrap(), 600);
        assert_eq!(snap_to_time_slot(603.0, 5).unwrap(), 605);
        assert_eq!(snap_to_time_slot(602.5, 5).unwrap(), 605);
        assert_eq!(snap_to_time_slot(607.4, 15).unwrap(), 600);
        assert_eq!(snap_to_time_slot(607.5, 15).unwrap(), 615);
        assert_eq!(snap_to_time_slot(-12.0, 5).unwrap(), 0);
    }

    #[test]
    fn test_zero_constants_fail_fast() {
        let zero_pixels = GridMetrics { pixels_per_slot: 0.0, ..metrics() };
        let zero_granularity = GridMetrics { slot_granularity_minutes: 0, ..metrics() };

        assert!(matches!(
            time_to_position(&appointment(540, 70), &zero_pixels),
            Err(CalendarError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            time_to_position(&appointment(540, 70), &zero_granularity),
            Err(CalendarError::InvalidConfiguration(_))
        ));
        assert!(pixel_to_time(100.0, &zero_pixels).is_err());
        assert!(pixel_to_time(f64::INFINITY, &metrics()).is_err());
        assert!(snap_to_time_slot(600.0, 0).is_err());
        assert!(snap_to_time_slot(f64::NAN, 5).is_err());
    }

    proptest! {
        #[test]
        fn prop_snap_is_idempotent(raw in 0.0f64..1440.0, granularity in 1u32..=60) {
            let once = snap_to_time_slot(raw, granularity).unwrap();
            let twice = snap_to_time_slot(f64::from(once), granularity).unwrap();
            prop_assert_eq!(once, twice);
            prop_assert_eq!(once % granularity, 0);
        }

        #[test]
        fn prop_position_round_trips(
            start in 0u32..1440,
            duration in 1u32..240,
            calendar_start_hour in 0u32..24,
            pixels in 1.0f64..40.0,
            granularity in prop::sample::select(vec![5u32, 10, 15, 30]),
        ) {
            let metrics = GridMetrics {
                calendar_start_minutes: calendar_start_hour * 60,
                pixels_per_slot: pixels,
                slot_granularity_minutes: granularity,
            };
            let appt = appointment(start, duration);
            let pos = time_to_position(&appt, &metrics).unwrap();
            let raw = pixel_to_time(pos.top, &metrics).unwrap();
            let snapped = snap_to_time_slot(raw, granularity).unwrap();
            prop_assert!((i64::from(snapped) - i64::from(start)).unsigned_abs() <= u64::from(granularity));
        }
    }
}
