//! Business-hours availability: the pure status calculation and the polling
//! monitor that keeps a current value for the site.

mod clock;
mod engine;
mod monitor;
mod schedule;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{compute_status, format_hour, next_opening, AvailabilityStatus};
pub use monitor::AvailabilityMonitor;
pub use schedule::{DaySchedule, ScheduleError, WeeklySchedule};
