use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// weekly recurring service pattern plus validity date range for one
/// GTFS service id, the in-store form of a calendar.txt row.
///
/// a calendar whose seven weekday flags are all false is legal: it marks
/// exception-only service, where every active day comes from an Added
/// exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCalendar {
    pub service_id: String,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    /// first date (inclusive) the weekly pattern applies
    pub start_date: NaiveDate,
    /// last date (inclusive) the weekly pattern applies
    pub end_date: NaiveDate,
}

impl ServiceCalendar {
    /// the weekly-pattern bit for one weekday.
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// tests intersection (inclusive) of a date with the validity range.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start_date <= *date && *date <= self.end_date
    }
}

/// polarity of a single-date service override from calendar_dates.txt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    Added,
    Removed,
}

/// a single-date override of the weekly pattern for one service id. an
/// exception applies whether or not the date falls inside the calendar's
/// validity range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
    pub service_id: String,
    pub date: NaiveDate,
    pub exception: ExceptionKind,
}

/// the persisted calendar document: every service calendar and every
/// per-date exception known to the schedule store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarStore {
    pub calendars: Vec<ServiceCalendar>,
    pub exceptions: Vec<CalendarException>,
}
