use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::evaluator::engine::TraversalEngine;
use crate::schedule::Run;

/// one transit leg of an externally-solved route: the segment traversed
/// and the solver's observed entry/exit instants, in minutes since
/// midnight of the analysis day.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraversedLeg {
    pub segment_id: i64,
    pub enter: f64,
    pub exit: f64,
}

/// one run reported as an equally-good match for an ambiguous leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunCandidate {
    pub trip_id: String,
    pub route_id: String,
    pub departure: f64,
    pub arrival: f64,
}

impl RunCandidate {
    fn from_run(run: &Run) -> Self {
        Self {
            trip_id: run.trip_id.clone(),
            route_id: run.route_id.clone(),
            departure: run.departure,
            arrival: run.arrival,
        }
    }
}

/// the match report for one traversed leg.
///
/// a unique match fills the scalar transit fields. when several runs
/// match equally well the leg is flagged ambiguous, every candidate is
/// listed, and the scalar fields stay empty: ambiguity is surfaced
/// rather than hidden behind a guess. a leg with no match within
/// tolerance keeps empty fields and produces a warning, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct LegMatch {
    pub segment_id: i64,
    pub enter: f64,
    pub exit: f64,
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub wait_minutes: Option<f64>,
    pub ride_minutes: Option<f64>,
    pub ambiguous: bool,
    pub candidates: Vec<RunCandidate>,
}

/// re-identifies the run used on each leg of a solved route by matching
/// the observed (enter, exit) instants against the run index, within a
/// tolerance that absorbs the solver's floating rounding.
pub fn match_legs(
    engine: &TraversalEngine,
    legs: &[TraversedLeg],
    tolerance: f64,
) -> Vec<LegMatch> {
    legs.iter()
        .map(|leg| match_leg(engine, leg, tolerance))
        .collect()
}

fn match_leg(engine: &TraversalEngine, leg: &TraversedLeg, tolerance: f64) -> LegMatch {
    let runs = engine.index().runs_for_segment(leg.segment_id);

    // only departures within tolerance of the observed entry can match
    let lo = runs.partition_point(|r| r.departure < leg.enter - tolerance);
    let hi = runs.partition_point(|r| r.departure <= leg.enter + tolerance);

    let mut best: Vec<&Run> = vec![];
    let mut best_score = f64::INFINITY;
    for run in &runs[lo..hi] {
        let score = (run.departure - leg.enter)
            .abs()
            .max((run.arrival - leg.exit).abs());
        if score > tolerance {
            continue;
        }
        if score < best_score {
            best_score = score;
            best.clear();
            best.push(run);
        } else if score == best_score {
            best.push(run);
        }
    }

    match best.as_slice() {
        [] => {
            log::warn!(
                "segment {}: no run matches observed instants ({}, {}) within {} minutes",
                leg.segment_id,
                leg.enter,
                leg.exit,
                tolerance
            );
            LegMatch {
                segment_id: leg.segment_id,
                enter: leg.enter,
                exit: leg.exit,
                trip_id: None,
                route_id: None,
                wait_minutes: None,
                ride_minutes: None,
                ambiguous: false,
                candidates: vec![],
            }
        }
        [run] => LegMatch {
            segment_id: leg.segment_id,
            enter: leg.enter,
            exit: leg.exit,
            trip_id: Some(run.trip_id.clone()),
            route_id: Some(run.route_id.clone()),
            wait_minutes: Some(run.departure - leg.enter),
            ride_minutes: Some(run.ride_minutes()),
            ambiguous: false,
            candidates: vec![],
        },
        tied => {
            log::warn!(
                "segment {}: {} runs match observed instants ({}, {}) equally well; reporting all candidates",
                leg.segment_id,
                tied.len(),
                leg.enter,
                leg.exit
            );
            let candidates = tied
                .iter()
                .map(|run| RunCandidate::from_run(run))
                .sorted_by(|a, b| a.trip_id.cmp(&b.trip_id))
                .collect();
            LegMatch {
                segment_id: leg.segment_id,
                enter: leg.enter,
                exit: leg.exit,
                trip_id: None,
                route_id: None,
                wait_minutes: None,
                ride_minutes: None,
                ambiguous: true,
                candidates,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::calendar::CalendarResolver;
    use crate::evaluator::run_index::RunIndex;
    use crate::schedule::{CalendarStore, RawRunRow, RiderFlag};

    fn row(segment_id: i64, trip_id: &str, departure: f64, arrival: f64) -> RawRunRow {
        RawRunRow {
            segment_id: Some(segment_id),
            trip_id: trip_id.to_string(),
            route_id: String::from("r1"),
            service_id: String::from("WKDY"),
            departure,
            arrival,
            wheelchair: RiderFlag::Unknown,
            bikes: RiderFlag::Unknown,
        }
    }

    fn engine(rows: Vec<RawRunRow>) -> TraversalEngine {
        TraversalEngine::new(
            CalendarResolver::new(CalendarStore::default()),
            RunIndex::from_rows(rows).expect("test index should build"),
        )
    }

    fn leg(segment_id: i64, enter: f64, exit: f64) -> TraversedLeg {
        TraversedLeg {
            segment_id,
            enter,
            exit,
        }
    }

    #[test]
    fn test_exact_round_trip_with_zero_tolerance() {
        let engine = engine(vec![row(0, "t1", 500.0, 515.0)]);
        let matches = match_legs(&engine, &[leg(0, 500.0, 515.0)], 0.0);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].trip_id.as_deref(), Some("t1"));
        assert_eq!(matches[0].wait_minutes, Some(0.0));
        assert_eq!(matches[0].ride_minutes, Some(15.0));
        assert!(!matches[0].ambiguous);
    }

    #[test]
    fn test_wait_and_ride_split_from_observed_entry() {
        // the solver entered the segment at 475 and waited 5 minutes
        let engine = engine(vec![row(0, "t1", 480.0, 485.0)]);
        let matches = match_legs(&engine, &[leg(0, 475.0, 485.0)], 6.0);

        assert_eq!(matches[0].trip_id.as_deref(), Some("t1"));
        assert_eq!(matches[0].wait_minutes, Some(5.0));
        assert_eq!(matches[0].ride_minutes, Some(5.0));
    }

    #[test]
    fn test_tolerance_absorbs_float_rounding() {
        let engine = engine(vec![row(0, "t1", 500.0, 515.0)]);
        let matches = match_legs(&engine, &[leg(0, 500.01, 514.99)], 0.1);
        assert_eq!(matches[0].trip_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_nearest_of_several_runs_wins() {
        let engine = engine(vec![
            row(0, "t1", 480.0, 495.0),
            row(0, "t2", 500.0, 515.0),
            row(0, "t3", 520.0, 535.0),
        ]);
        let matches = match_legs(&engine, &[leg(0, 501.0, 516.0)], 5.0);
        assert_eq!(matches[0].trip_id.as_deref(), Some("t2"));
    }

    #[test]
    fn test_ambiguous_match_reports_all_candidates() {
        // identical schedule entries under two trips
        let engine = engine(vec![
            row(0, "tB", 500.0, 515.0),
            row(0, "tA", 500.0, 515.0),
        ]);
        let matches = match_legs(&engine, &[leg(0, 500.0, 515.0)], 0.0);

        let report = &matches[0];
        assert!(report.ambiguous);
        assert_eq!(report.trip_id, None);
        assert_eq!(report.wait_minutes, None);
        let trips: Vec<&str> = report.candidates.iter().map(|c| c.trip_id.as_str()).collect();
        assert_eq!(trips, vec!["tA", "tB"]);
    }

    #[test]
    fn test_no_match_leaves_fields_empty() {
        let engine = engine(vec![row(0, "t1", 500.0, 515.0)]);
        let matches = match_legs(&engine, &[leg(0, 600.0, 615.0)], 1.0);

        let report = &matches[0];
        assert_eq!(report.trip_id, None);
        assert_eq!(report.ride_minutes, None);
        assert!(!report.ambiguous);
        assert!(report.candidates.is_empty());
    }

    #[test]
    fn test_unknown_segment_leaves_fields_empty() {
        let engine = engine(vec![row(0, "t1", 500.0, 515.0)]);
        let matches = match_legs(&engine, &[leg(7, 500.0, 515.0)], 1.0);
        assert_eq!(matches[0].trip_id, None);
    }
}
