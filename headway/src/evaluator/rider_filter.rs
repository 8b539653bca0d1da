use std::collections::HashSet;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::evaluator::calendar::ServiceDay;

/// rider constraints applied to every traversal query of an analysis:
/// excluded routes/trips and accessibility requirements. each condition
/// is independently necessary; a run must pass all of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderFilter {
    pub exclude_route_ids: HashSet<String>,
    pub exclude_trip_ids: HashSet<String>,
    pub require_wheelchair_accessible: bool,
    pub require_bikes_allowed: bool,
}

impl RiderFilter {
    /// a filter that admits every run.
    pub fn none() -> Self {
        Self::default()
    }
}

/// the moment a traversal query asks about: a service day plus minutes
/// since midnight on that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryInstant {
    pub day: ServiceDay,
    pub minutes: f64,
}

impl QueryInstant {
    pub fn on_date(date: NaiveDate, minutes: f64) -> Self {
        Self {
            day: ServiceDay::Date(date),
            minutes,
        }
    }

    pub fn on_weekday(weekday: Weekday, minutes: f64) -> Self {
        Self {
            day: ServiceDay::Weekday(weekday),
            minutes,
        }
    }
}

/// the direction of a time-dependent path search. a forward search wants
/// the first run departing at or after the query instant; a backward
/// ("arrive by") search wants the last run arriving at or before it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TravelDirection {
    #[default]
    DepartAfter,
    ArriveBefore,
}
