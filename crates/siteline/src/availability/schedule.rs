use std::fmt;
use std::str::FromStr;

use serde::Serialize;

const WEEKDAY_KEYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];
const WEEKDAY_FULL_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Opening hours for a single weekday, in local 24h time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaySchedule {
    /// Open on the half-open interval `[open_hour, close_hour)`.
    Open { open_hour: u32, close_hour: u32 },
    Closed,
}

impl DaySchedule {
    pub fn open_hour(&self) -> Option<u32> {
        match self {
            DaySchedule::Open { open_hour, .. } => Some(*open_hour),
            DaySchedule::Closed => None,
        }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        match self {
            DaySchedule::Open {
                open_hour,
                close_hour,
            } => *open_hour <= hour && hour < *close_hour,
            DaySchedule::Closed => false,
        }
    }
}

/// Weekly opening hours keyed by weekday index, 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySchedule {
    days: [DaySchedule; 7],
}

impl WeeklySchedule {
    pub fn new(days: [DaySchedule; 7]) -> Result<Self, ScheduleError> {
        for (index, day) in days.iter().enumerate() {
            validate_day(index, day)?;
        }
        Ok(Self { days })
    }

    /// Monday to Friday 7am-7pm, Saturday 8am-5pm, closed Sunday.
    pub fn standard() -> Self {
        let weekday = DaySchedule::Open {
            open_hour: 7,
            close_hour: 19,
        };
        Self {
            days: [
                DaySchedule::Closed,
                weekday,
                weekday,
                weekday,
                weekday,
                weekday,
                DaySchedule::Open {
                    open_hour: 8,
                    close_hour: 17,
                },
            ],
        }
    }

    /// Entry for a weekday index; indexes wrap modulo 7.
    pub fn day(&self, weekday_index: u32) -> DaySchedule {
        self.days[(weekday_index % 7) as usize]
    }

    pub fn days(&self) -> &[DaySchedule; 7] {
        &self.days
    }

    pub fn is_always_closed(&self) -> bool {
        self.days.iter().all(|day| *day == DaySchedule::Closed)
    }
}

fn validate_day(index: usize, day: &DaySchedule) -> Result<(), ScheduleError> {
    if let DaySchedule::Open {
        open_hour,
        close_hour,
    } = *day
    {
        if close_hour > 24 {
            return Err(ScheduleError::HourOutOfRange {
                weekday: WEEKDAY_KEYS[index],
                hour: close_hour,
            });
        }
        if open_hour >= close_hour {
            return Err(ScheduleError::EmptyInterval {
                weekday: WEEKDAY_KEYS[index],
                open_hour,
                close_hour,
            });
        }
    }
    Ok(())
}

/// Parses `"sun=closed;mon=7-19;sat=8-17"`. Days that are not listed stay closed.
impl FromStr for WeeklySchedule {
    type Err = ScheduleError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut days = [None; 7];

        for entry in raw.split([';', ',']).map(str::trim).filter(|e| !e.is_empty()) {
            let (key, hours) = entry
                .split_once('=')
                .ok_or_else(|| ScheduleError::MalformedEntry(entry.to_string()))?;
            let index = weekday_index(key.trim())
                .ok_or_else(|| ScheduleError::UnknownWeekday(key.trim().to_string()))?;
            if days[index].is_some() {
                return Err(ScheduleError::DuplicateWeekday(WEEKDAY_KEYS[index]));
            }
            days[index] = Some(parse_hours(hours.trim(), entry)?);
        }

        WeeklySchedule::new(days.map(|day| day.unwrap_or(DaySchedule::Closed)))
    }
}

fn weekday_index(key: &str) -> Option<usize> {
    let key = key.to_ascii_lowercase();
    if let Ok(index) = key.parse::<usize>() {
        return (index < 7).then_some(index);
    }
    WEEKDAY_KEYS
        .iter()
        .zip(WEEKDAY_FULL_NAMES)
        .position(|(short, full)| key == *short || key == full)
}

fn parse_hours(hours: &str, entry: &str) -> Result<DaySchedule, ScheduleError> {
    if hours.eq_ignore_ascii_case("closed") {
        return Ok(DaySchedule::Closed);
    }
    let (open, close) = hours
        .split_once('-')
        .ok_or_else(|| ScheduleError::MalformedEntry(entry.to_string()))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|_| ScheduleError::MalformedEntry(entry.to_string()))
    };
    Ok(DaySchedule::Open {
        open_hour: parse(open)?,
        close_hour: parse(close)?,
    })
}

impl fmt::Display for WeeklySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, day) in self.days.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            match day {
                DaySchedule::Open {
                    open_hour,
                    close_hour,
                } => write!(f, "{}={}-{}", WEEKDAY_KEYS[index], open_hour, close_hour)?,
                DaySchedule::Closed => write!(f, "{}=closed", WEEKDAY_KEYS[index])?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("entry '{0}' must look like 'mon=7-19' or 'sun=closed'")]
    MalformedEntry(String),
    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
    #[error("{0} is listed more than once")]
    DuplicateWeekday(&'static str),
    #[error("{weekday}: hour {hour} is past the end of the day")]
    HourOutOfRange { weekday: &'static str, hour: u32 },
    #[error("{weekday}: opens at {open_hour} but closes at {close_hour}")]
    EmptyInterval {
        weekday: &'static str,
        open_hour: u32,
        close_hour: u32,
    },
}
