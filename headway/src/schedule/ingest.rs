//! GTFS ingest: the upstream data-preparation step that turns a transit
//! feed into the persisted runs/segments/calendars store consumed by the
//! evaluator. Each consecutive stop pair of each trip becomes one run
//! across a directed segment; a stop pair traversed in the opposite
//! direction is a distinct segment.
use std::collections::HashMap;

use gtfs_structures::{Availability, BikesAllowedType, Calendar, Exception, Gtfs, Trip};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schedule::calendar_store::{
    CalendarException, CalendarStore, ExceptionKind, ServiceCalendar,
};
use crate::schedule::raw_run_row::RawRunRow;
use crate::schedule::run::RiderFlag;
use crate::schedule::schedule_error::ScheduleError;

/// one directed segment discovered at ingest: a hop between two
/// consecutive stops, identified by a dense id referenced from the runs
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub segment_id: i64,
    pub from_stop: String,
    pub to_stop: String,
}

/// everything produced by ingesting one GTFS feed.
pub struct IngestOutput {
    pub runs: Vec<RawRunRow>,
    pub segments: Vec<SegmentRecord>,
    pub calendars: CalendarStore,
}

/// reads a GTFS archive (zip or directory) and builds the persisted
/// store content. outputs are deterministically ordered so repeated
/// ingests of the same feed produce identical files.
pub fn ingest_feed(gtfs_path: &str) -> Result<IngestOutput, ScheduleError> {
    log::info!("reading GTFS archive {gtfs_path}");
    let gtfs = Gtfs::new(gtfs_path)?;
    build_output(&gtfs)
}

fn build_output(gtfs: &Gtfs) -> Result<IngestOutput, ScheduleError> {
    // iterate trips in id order: segment ids are assigned first-seen, so
    // the iteration order determines the output ids
    let trips: Vec<&Trip> = gtfs
        .trips
        .values()
        .sorted_by(|a, b| a.id.cmp(&b.id))
        .collect();
    log::debug!("extracting legs from {} trips", trips.len());

    let trip_runs: Vec<TripRuns> = trips
        .par_iter()
        .map(|trip| {
            let events = stop_events(trip);
            TripRuns {
                trip_id: trip.id.clone(),
                route_id: trip.route_id.clone(),
                service_id: trip.service_id.clone(),
                wheelchair: wheelchair_flag(&trip.wheelchair_accessible),
                bikes: bikes_flag(&trip.bikes_allowed),
                legs: legs_from_events(&trip.id, &events),
            }
        })
        .collect();

    let (runs, segments) = rows_from_trip_runs(trip_runs);
    let calendars = calendar_store_from_gtfs(gtfs);

    log::debug!(
        "ingest produced {} runs across {} segments, {} calendars, {} exceptions",
        runs.len(),
        segments.len(),
        calendars.calendars.len(),
        calendars.exceptions.len()
    );

    if runs.is_empty() {
        return Err(ScheduleError::InvalidData(String::from(
            "GTFS feed produced no runs; no trip has two consecutive stops with usable times",
        )));
    }

    Ok(IngestOutput {
        runs,
        segments,
        calendars,
    })
}

/// one stop visit within a trip, reduced to what leg extraction needs.
#[derive(Debug, Clone)]
pub(crate) struct StopEvent {
    pub stop_id: String,
    pub sequence: u32,
    pub arrival: Option<u32>,
    pub departure: Option<u32>,
}

/// one extracted trip leg: times are minutes since midnight.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TripLeg {
    pub from_stop: String,
    pub to_stop: String,
    pub departure: f64,
    pub arrival: f64,
}

/// a trip's identity, rider flags, and extracted legs.
#[derive(Debug, Clone)]
pub(crate) struct TripRuns {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub wheelchair: RiderFlag,
    pub bikes: RiderFlag,
    pub legs: Vec<TripLeg>,
}

/// extracts a trip's stop visits ordered by stop_sequence. GTFS does not
/// require stop_times.txt rows to appear in sequence order.
fn stop_events(trip: &Trip) -> Vec<StopEvent> {
    let mut events: Vec<StopEvent> = trip
        .stop_times
        .iter()
        .map(|st| StopEvent {
            stop_id: st.stop.id.clone(),
            sequence: st.stop_sequence,
            arrival: st.arrival_time,
            departure: st.departure_time,
        })
        .collect();
    events.sort_by_key(|e| e.sequence);
    events
}

/// pairs consecutive stop events into legs. a leg departs on the first
/// stop's departure (falling back to its arrival) and arrives on the
/// second stop's arrival (falling back to its departure); a pair missing
/// all times on either end is skipped with a warning.
fn legs_from_events(trip_id: &str, events: &[StopEvent]) -> Vec<TripLeg> {
    let mut legs = vec![];
    for pair in events.windows(2) {
        let depart = pair[0].departure.or(pair[0].arrival);
        let arrive = pair[1].arrival.or(pair[1].departure);
        match (depart, arrive) {
            (Some(d), Some(a)) => legs.push(TripLeg {
                from_stop: pair[0].stop_id.clone(),
                to_stop: pair[1].stop_id.clone(),
                departure: minutes_of_day(d),
                arrival: minutes_of_day(a),
            }),
            _ => log::warn!(
                "trip {trip_id}: no usable stop times between stops {} and {}, leg skipped",
                pair[0].stop_id,
                pair[1].stop_id
            ),
        }
    }
    legs
}

/// converts GTFS seconds-since-midnight into minutes. past-midnight
/// times stay at or above 1440 rather than wrapping to the next day.
pub(crate) fn minutes_of_day(gtfs_seconds: u32) -> f64 {
    gtfs_seconds as f64 / 60.0
}

/// assigns dense directional segment ids in first-seen order and emits
/// one run row per leg.
fn rows_from_trip_runs(trips: Vec<TripRuns>) -> (Vec<RawRunRow>, Vec<SegmentRecord>) {
    let mut segment_ids: HashMap<(String, String), i64> = HashMap::new();
    let mut segments: Vec<SegmentRecord> = vec![];
    let mut runs: Vec<RawRunRow> = vec![];

    for trip in trips {
        for leg in trip.legs {
            let next_id = segment_ids.len() as i64;
            let segment_id = *segment_ids
                .entry((leg.from_stop.clone(), leg.to_stop.clone()))
                .or_insert_with(|| {
                    segments.push(SegmentRecord {
                        segment_id: next_id,
                        from_stop: leg.from_stop.clone(),
                        to_stop: leg.to_stop.clone(),
                    });
                    next_id
                });
            runs.push(RawRunRow {
                segment_id: Some(segment_id),
                trip_id: trip.trip_id.clone(),
                route_id: trip.route_id.clone(),
                service_id: trip.service_id.clone(),
                departure: leg.departure,
                arrival: leg.arrival,
                wheelchair: trip.wheelchair,
                bikes: trip.bikes,
            });
        }
    }

    runs.sort_by(|a, b| {
        (a.segment_id, ordered_float::OrderedFloat(a.departure), &a.trip_id).cmp(&(
            b.segment_id,
            ordered_float::OrderedFloat(b.departure),
            &b.trip_id,
        ))
    });

    (runs, segments)
}

fn calendar_store_from_gtfs(gtfs: &Gtfs) -> CalendarStore {
    let mut calendars: Vec<ServiceCalendar> = gtfs
        .calendar
        .values()
        .map(service_calendar_from_gtfs)
        .collect();
    calendars.sort_by(|a, b| a.service_id.cmp(&b.service_id));

    let mut exceptions: Vec<CalendarException> = vec![];
    for (service_id, dates) in &gtfs.calendar_dates {
        for cd in dates {
            let exception = if cd.exception_type == Exception::Added {
                ExceptionKind::Added
            } else {
                ExceptionKind::Removed
            };
            exceptions.push(CalendarException {
                service_id: service_id.clone(),
                date: cd.date,
                exception,
            });
        }
    }
    exceptions.sort_by(|a, b| (&a.service_id, a.date).cmp(&(&b.service_id, b.date)));

    CalendarStore {
        calendars,
        exceptions,
    }
}

fn service_calendar_from_gtfs(calendar: &Calendar) -> ServiceCalendar {
    ServiceCalendar {
        service_id: calendar.id.clone(),
        monday: calendar.monday,
        tuesday: calendar.tuesday,
        wednesday: calendar.wednesday,
        thursday: calendar.thursday,
        friday: calendar.friday,
        saturday: calendar.saturday,
        sunday: calendar.sunday,
        start_date: calendar.start_date,
        end_date: calendar.end_date,
    }
}

fn wheelchair_flag(availability: &Availability) -> RiderFlag {
    match availability {
        Availability::Available => RiderFlag::Yes,
        Availability::NotAvailable => RiderFlag::No,
        _ => RiderFlag::Unknown,
    }
}

fn bikes_flag(bikes: &BikesAllowedType) -> RiderFlag {
    match bikes {
        BikesAllowedType::AtLeastOneBike => RiderFlag::Yes,
        BikesAllowedType::NoBikesAllowed => RiderFlag::No,
        _ => RiderFlag::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(stop_id: &str, sequence: u32, arrival: Option<u32>, departure: Option<u32>) -> StopEvent {
        StopEvent {
            stop_id: stop_id.to_string(),
            sequence,
            arrival,
            departure,
        }
    }

    fn trip_runs(trip_id: &str, legs: Vec<TripLeg>) -> TripRuns {
        TripRuns {
            trip_id: trip_id.to_string(),
            route_id: String::from("r1"),
            service_id: String::from("WKDY"),
            wheelchair: RiderFlag::Unknown,
            bikes: RiderFlag::Unknown,
            legs,
        }
    }

    fn leg(from: &str, to: &str, departure: f64, arrival: f64) -> TripLeg {
        TripLeg {
            from_stop: from.to_string(),
            to_stop: to.to_string(),
            departure,
            arrival,
        }
    }

    #[test]
    fn test_minutes_of_day_conversion() {
        assert_eq!(minutes_of_day(28800), 480.0); // 08:00:00
        assert_eq!(minutes_of_day(28830), 480.5);
    }

    #[test]
    fn test_minutes_of_day_past_midnight_stays_above_1440() {
        // 25:30:00 on the service day
        assert_eq!(minutes_of_day(91800), 1530.0);
    }

    #[test]
    fn test_legs_pair_consecutive_events() {
        let events = vec![
            event("A", 1, None, Some(28800)),
            event("B", 2, Some(29100), Some(29160)),
            event("C", 3, Some(29400), None),
        ];
        let legs = legs_from_events("t1", &events);
        assert_eq!(
            legs,
            vec![leg("A", "B", 480.0, 485.0), leg("B", "C", 486.0, 490.0)]
        );
    }

    #[test]
    fn test_legs_fall_back_across_missing_times() {
        // first stop has only an arrival, second only a departure
        let events = vec![
            event("A", 1, Some(28800), None),
            event("B", 2, None, Some(29100)),
        ];
        let legs = legs_from_events("t1", &events);
        assert_eq!(legs, vec![leg("A", "B", 480.0, 485.0)]);
    }

    #[test]
    fn test_leg_with_no_usable_times_is_skipped() {
        let events = vec![
            event("A", 1, None, None),
            event("B", 2, Some(29100), None),
            event("C", 3, Some(29400), None),
        ];
        let legs = legs_from_events("t1", &events);
        assert_eq!(legs, vec![leg("B", "C", 485.0, 490.0)]);
    }

    #[test]
    fn test_reversed_stop_pair_gets_distinct_segment() {
        let trips = vec![
            trip_runs("t1", vec![leg("A", "B", 480.0, 485.0)]),
            trip_runs("t2", vec![leg("B", "A", 490.0, 495.0)]),
        ];
        let (runs, segments) = rows_from_trip_runs(trips);
        assert_eq!(segments.len(), 2);
        assert_ne!(runs[0].segment_id, runs[1].segment_id);
    }

    #[test]
    fn test_shared_stop_pair_reuses_segment_id() {
        let trips = vec![
            trip_runs("t1", vec![leg("A", "B", 480.0, 485.0)]),
            trip_runs("t2", vec![leg("A", "B", 540.0, 545.0)]),
        ];
        let (runs, segments) = rows_from_trip_runs(trips);
        assert_eq!(segments.len(), 1);
        assert_eq!(runs[0].segment_id, runs[1].segment_id);
    }

    #[test]
    fn test_rows_sorted_by_segment_then_departure_then_trip() {
        let trips = vec![
            trip_runs("t2", vec![leg("A", "B", 480.0, 485.0)]),
            trip_runs("t1", vec![leg("A", "B", 480.0, 486.0), leg("B", "C", 490.0, 495.0)]),
        ];
        let (runs, _) = rows_from_trip_runs(trips);
        let keys: Vec<(Option<i64>, f64, &str)> = runs
            .iter()
            .map(|r| (r.segment_id, r.departure, r.trip_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Some(0), 480.0, "t1"),
                (Some(0), 480.0, "t2"),
                (Some(1), 490.0, "t1"),
            ]
        );
    }
}
