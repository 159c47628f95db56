use chrono::{Datelike, Days, NaiveDateTime, Timelike};
use serde::Serialize;

use super::schedule::{DaySchedule, WeeklySchedule};

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Open/closed status shown in the site header and contact section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityStatus {
    pub is_open: bool,
    pub status_message: String,
    pub next_open: Option<NaiveDateTime>,
    /// Emergency dispatch is advertised around the clock.
    pub emergency_available: bool,
}

/// Derive the availability status for `now` from the weekly schedule.
pub fn compute_status(now: NaiveDateTime, schedule: &WeeklySchedule) -> AvailabilityStatus {
    let weekday = now.weekday().num_days_from_sunday();
    let hour = now.hour();

    let (is_open, status_message) = match schedule.day(weekday) {
        DaySchedule::Closed => (
            false,
            format!(
                "Closed {} - Emergency service available",
                WEEKDAY_NAMES[weekday as usize]
            ),
        ),
        day @ DaySchedule::Open {
            open_hour,
            close_hour,
        } => {
            if day.contains_hour(hour) {
                (true, format!("Open until {}", format_hour(close_hour)))
            } else if hour < open_hour {
                (false, format!("Opens at {}", format_hour(open_hour)))
            } else {
                (false, "Closed - Emergency service available".to_string())
            }
        }
    };

    let next_open = if is_open {
        None
    } else {
        next_opening(now, schedule)
    };

    AvailabilityStatus {
        is_open,
        status_message,
        next_open,
        emergency_available: true,
    }
}

/// First scheduled opening on one of the following seven days.
pub fn next_opening(now: NaiveDateTime, schedule: &WeeklySchedule) -> Option<NaiveDateTime> {
    let today = now.date();
    let weekday = now.weekday().num_days_from_sunday();

    (1..=7u32).find_map(|offset| {
        let open_hour = schedule.day(weekday + offset).open_hour()?;
        today
            .checked_add_days(Days::new(u64::from(offset)))?
            .and_hms_opt(open_hour, 0, 0)
    })
}

/// Render a 24h hour on a 12-hour clock, e.g. `17` as `5:00 PM`.
pub fn format_hour(hour: u32) -> String {
    let hour = hour % 24;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{display}:00 {suffix}")
}
