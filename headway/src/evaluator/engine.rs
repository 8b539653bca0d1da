use serde::Serialize;

use crate::evaluator::calendar::{CalendarResolver, ServiceDay};
use crate::evaluator::rider_filter::{QueryInstant, RiderFilter, TravelDirection};
use crate::evaluator::run_index::{RunIndex, SegmentRuns};
use crate::schedule::Run;

/// outcome of one traversal-time query. `Unusable` is an expected,
/// frequent result ("no eligible run right now") that callers treat as
/// an untraversable edge, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TraversalResult {
    Usable {
        /// minutes spent waiting for the vehicle
        wait_minutes: f64,
        /// minutes riding across the segment
        ride_minutes: f64,
        /// trip the chosen run belongs to
        trip_id: String,
    },
    Unusable,
}

impl TraversalResult {
    pub fn is_usable(&self) -> bool {
        matches!(self, TraversalResult::Usable { .. })
    }
}

/// the loaded, immutable query engine: a calendar resolver plus a run
/// index. safe for concurrent unsynchronized reads once built; the query
/// path performs no I/O and raises no errors.
pub struct TraversalEngine {
    calendar: CalendarResolver,
    index: RunIndex,
}

impl TraversalEngine {
    pub fn new(calendar: CalendarResolver, index: RunIndex) -> Self {
        Self { calendar, index }
    }

    pub fn calendar(&self) -> &CalendarResolver {
        &self.calendar
    }

    pub fn index(&self) -> &RunIndex {
        &self.index
    }

    /// finds the best usable run across a segment for one query instant.
    ///
    /// binary-searches the segment's runs for the candidate nearest the
    /// instant in the search direction, then walks outward in time order
    /// until a run passes the calendar and rider filters. equal departure
    /// times resolve to the lexicographically smallest trip id, so
    /// repeated solves are reproducible.
    pub fn traverse(
        &self,
        segment_id: i64,
        instant: &QueryInstant,
        direction: TravelDirection,
        filter: &RiderFilter,
    ) -> TraversalResult {
        let Some(segment) = self.index.segment(segment_id) else {
            return TraversalResult::Unusable;
        };
        match direction {
            TravelDirection::DepartAfter => self.first_departure_at_or_after(segment, instant, filter),
            TravelDirection::ArriveBefore => self.last_arrival_at_or_before(segment, instant, filter),
        }
    }

    fn first_departure_at_or_after(
        &self,
        segment: &SegmentRuns,
        instant: &QueryInstant,
        filter: &RiderFilter,
    ) -> TraversalResult {
        let runs = segment.runs();
        // first run departing at or after the instant (inclusive)
        let start = runs.partition_point(|r| r.departure < instant.minutes);
        for run in &runs[start..] {
            if self.eligible(run, &instant.day, filter) {
                return TraversalResult::Usable {
                    wait_minutes: run.departure - instant.minutes,
                    ride_minutes: run.ride_minutes(),
                    trip_id: run.trip_id.clone(),
                };
            }
        }
        TraversalResult::Unusable
    }

    fn last_arrival_at_or_before(
        &self,
        segment: &SegmentRuns,
        instant: &QueryInstant,
        filter: &RiderFilter,
    ) -> TraversalResult {
        let runs = segment.runs();
        let order = segment.by_arrival();
        // end of the arrivals at or before the instant (inclusive)
        let end = order.partition_point(|&i| runs[i as usize].arrival <= instant.minutes);
        for &i in order[..end].iter().rev() {
            let run = &runs[i as usize];
            if self.eligible(run, &instant.day, filter) {
                return TraversalResult::Usable {
                    wait_minutes: instant.minutes - run.arrival,
                    ride_minutes: run.ride_minutes(),
                    trip_id: run.trip_id.clone(),
                };
            }
        }
        TraversalResult::Unusable
    }

    /// a run is eligible when it passes every rider constraint and its
    /// service runs on the query day. an `Unknown` accessibility flag
    /// satisfies any requirement: missing data must never deny a rider a
    /// route.
    fn eligible(&self, run: &Run, day: &ServiceDay, filter: &RiderFilter) -> bool {
        if filter.exclude_route_ids.contains(&run.route_id) {
            return false;
        }
        if filter.exclude_trip_ids.contains(&run.trip_id) {
            return false;
        }
        if filter.require_wheelchair_accessible && !run.wheelchair.satisfies_requirement() {
            return false;
        }
        if filter.require_bikes_allowed && !run.bikes.satisfies_requirement() {
            return false;
        }
        self.calendar.is_service_active(&run.service_id, day)
    }
}
