use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::schedule::{CalendarStore, ExceptionKind, ServiceCalendar};

/// the day a query runs against: either a concrete date, or a generic
/// weekday when the analysis models "a typical Tuesday" rather than a
/// calendar day.
///
/// weekday mode cannot consult calendar exceptions or validity date
/// ranges (there is no concrete date to test), so it can count service
/// that a feed's date ranges were meant to exclude. that is the selected
/// behavior, not an inaccuracy to correct here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceDay {
    Date(NaiveDate),
    Weekday(Weekday),
}

/// answers "does service_id run on this day", combining weekly calendar
/// patterns with per-date exceptions.
pub struct CalendarResolver {
    calendars: HashMap<String, ServiceCalendar>,
    exceptions: HashMap<String, HashMap<NaiveDate, ExceptionKind>>,
}

impl CalendarResolver {
    pub fn new(store: CalendarStore) -> Self {
        let mut calendars: HashMap<String, ServiceCalendar> =
            HashMap::with_capacity(store.calendars.len());
        for calendar in store.calendars {
            let service_id = calendar.service_id.clone();
            if calendars.insert(service_id.clone(), calendar).is_some() {
                log::warn!("duplicate calendar for service_id '{service_id}'; keeping the later entry");
            }
        }

        let mut exceptions: HashMap<String, HashMap<NaiveDate, ExceptionKind>> = HashMap::new();
        for exception in store.exceptions {
            let prev = exceptions
                .entry(exception.service_id.clone())
                .or_default()
                .insert(exception.date, exception.exception);
            if prev.is_some() {
                log::warn!(
                    "duplicate calendar exception for service_id '{}' on {}; keeping the later entry",
                    exception.service_id,
                    exception.date
                );
            }
        }

        Self {
            calendars,
            exceptions,
        }
    }

    /// whether service runs on the given day.
    ///
    /// for a concrete date, an exception for that exact date always wins,
    /// whether or not the date falls inside the calendar's validity
    /// range; otherwise the date must fall in range and match the weekly
    /// pattern. for a generic weekday only the weekly pattern applies.
    ///
    /// an unknown service id is inactive, not an error: feeds routinely
    /// reference services removed by upstream filtering.
    pub fn is_service_active(&self, service_id: &str, day: &ServiceDay) -> bool {
        match day {
            ServiceDay::Date(date) => {
                if let Some(kind) = self
                    .exceptions
                    .get(service_id)
                    .and_then(|by_date| by_date.get(date))
                {
                    return matches!(kind, ExceptionKind::Added);
                }
                match self.calendars.get(service_id) {
                    None => {
                        log::debug!("unknown service_id '{service_id}' treated as inactive");
                        false
                    }
                    Some(calendar) => calendar.contains(date) && calendar.runs_on(date.weekday()),
                }
            }
            ServiceDay::Weekday(weekday) => match self.calendars.get(service_id) {
                None => {
                    log::debug!("unknown service_id '{service_id}' treated as inactive");
                    false
                }
                Some(calendar) => calendar.runs_on(*weekday),
            },
        }
    }
}
