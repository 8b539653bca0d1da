//! Command-line operations over the headway schedule store: GTFS
//! ingest, store summaries, one-off traversal queries, and run-match
//! reports for externally-solved routes.
use std::path::Path;

use chrono::NaiveDate;
use clap::Subcommand;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::evaluator::{
    match_legs, AnalysisConfig, QueryInstant, RiderFilter, ScheduleCache, TravelDirection,
    TraversedLeg,
};
use crate::schedule::{
    ingest_feed, read_calendar_store, read_run_rows, write_calendar_store, write_run_rows,
    write_segment_records, ScheduleSource,
};

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum HeadwayOperation {
    /// convert a GTFS archive into the persisted runs/segments/calendars store
    Ingest {
        /// a GTFS archive (zip) or extracted feed directory
        #[arg(long)]
        input: String,

        #[arg(long)]
        output_directory: String,

        /// refuse to replace existing store files when false
        #[arg(long, default_value_t = true)]
        overwrite: bool,
    },
    /// summarize the contents of a persisted schedule store
    Summary {
        #[arg(long)]
        runs_file: String,

        #[arg(long)]
        calendars_file: String,
    },
    /// answer one traversal-time query against a loaded store
    Query {
        #[arg(long)]
        runs_file: String,

        #[arg(long)]
        calendars_file: String,

        /// segment id to traverse
        #[arg(long)]
        segment: i64,

        /// analysis date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// query the concrete date rather than its generic weekday
        #[arg(long, default_value_t = false)]
        use_specific_date: bool,

        /// time of day, HH:MM or HH:MM:SS; past-midnight times like 25:30 allowed
        #[arg(long)]
        time: String,

        #[arg(long, value_enum)]
        direction: Option<TravelDirection>,

        /// route id to exclude; repeatable
        #[arg(long)]
        exclude_route: Vec<String>,

        /// trip id to exclude; repeatable
        #[arg(long)]
        exclude_trip: Vec<String>,

        #[arg(long, default_value_t = false)]
        require_wheelchair_accessible: bool,

        #[arg(long, default_value_t = false)]
        require_bikes_allowed: bool,
    },
    /// re-identify the runs used by an externally-solved route
    MatchRuns {
        #[arg(long)]
        runs_file: String,

        #[arg(long)]
        calendars_file: String,

        /// csv of traversed legs with columns segment_id,enter,exit
        #[arg(long)]
        legs_file: String,

        /// matching tolerance in minutes
        #[arg(long, default_value_t = 0.5)]
        tolerance: f64,
    },
}

impl HeadwayOperation {
    pub fn run(&self) {
        match self {
            HeadwayOperation::Ingest {
                input,
                output_directory,
                overwrite,
            } => ingest(input, output_directory, *overwrite),
            HeadwayOperation::Summary {
                runs_file,
                calendars_file,
            } => summary(runs_file, calendars_file),
            HeadwayOperation::Query {
                runs_file,
                calendars_file,
                segment,
                date,
                use_specific_date,
                time,
                direction,
                exclude_route,
                exclude_trip,
                require_wheelchair_accessible,
                require_bikes_allowed,
            } => {
                let config = AnalysisConfig {
                    use_specific_date: *use_specific_date,
                    cache_every_solve: false,
                    filter: RiderFilter {
                        exclude_route_ids: exclude_route.iter().cloned().collect(),
                        exclude_trip_ids: exclude_trip.iter().cloned().collect(),
                        require_wheelchair_accessible: *require_wheelchair_accessible,
                        require_bikes_allowed: *require_bikes_allowed,
                    },
                };
                query(
                    runs_file,
                    calendars_file,
                    *segment,
                    date,
                    time,
                    direction.unwrap_or_default(),
                    &config,
                )
            }
            HeadwayOperation::MatchRuns {
                runs_file,
                calendars_file,
                legs_file,
                tolerance,
            } => match_runs(runs_file, calendars_file, legs_file, *tolerance),
        }
    }
}

fn ingest(input: &str, output_directory: &str, overwrite: bool) {
    let output = ingest_feed(input).expect("failure ingesting GTFS feed");

    let dir = Path::new(output_directory);
    std::fs::create_dir_all(dir)
        .unwrap_or_else(|e| panic!("failed creating output directory '{output_directory}': {e}"));

    let runs_path = output_path(dir, "runs.csv", overwrite);
    let segments_path = output_path(dir, "segments.csv", overwrite);
    let calendars_path = output_path(dir, "calendars.json", overwrite);

    write_run_rows(&runs_path, &output.runs).expect("failure writing runs table");
    write_segment_records(&segments_path, &output.segments).expect("failure writing segment table");
    write_calendar_store(&calendars_path, &output.calendars)
        .expect("failure writing calendar store");

    println!(
        "wrote {} runs across {} segments and {} calendars to {output_directory}",
        output.runs.len(),
        output.segments.len(),
        output.calendars.calendars.len()
    );
}

fn output_path(dir: &Path, name: &str, overwrite: bool) -> String {
    let path = dir.join(name);
    if !overwrite && path.exists() {
        panic!("output file {path:?} exists and --overwrite is false");
    }
    path.to_str()
        .unwrap_or_else(|| panic!("output path {path:?} is not valid utf-8"))
        .to_string()
}

fn summary(runs_file: &str, calendars_file: &str) {
    let rows = read_run_rows(runs_file).expect("failure reading runs table");
    let store = read_calendar_store(calendars_file).expect("failure reading calendar store");

    let n_segments = rows.iter().filter_map(|r| r.segment_id).unique().count();
    let n_trips = rows.iter().map(|r| &r.trip_id).unique().count();
    let n_routes = rows.iter().map(|r| &r.route_id).unique().count();
    let n_services = rows.iter().map(|r| &r.service_id).unique().count();
    let unlinked = rows.iter().filter(|r| r.segment_id.is_none()).count();

    println!("runs:      {}", rows.len());
    println!("segments:  {n_segments}");
    println!("trips:     {n_trips}");
    println!("routes:    {n_routes}");
    println!("services:  {n_services}");
    if unlinked > 0 {
        println!("WARNING: {unlinked} runs are missing segment linkage ids and will fail to load");
    }

    if let Some((first, last)) = rows
        .iter()
        .map(|r| r.departure)
        .minmax()
        .into_option()
    {
        println!("departures span [{first:.1}, {last:.1}] minutes of day");
    }

    let validity = store
        .calendars
        .iter()
        .map(|c| (c.start_date, c.end_date))
        .fold(None::<(NaiveDate, NaiveDate)>, |acc, (start, end)| {
            Some(match acc {
                None => (start, end),
                Some((lo, hi)) => (lo.min(start), hi.max(end)),
            })
        });
    match validity {
        Some((lo, hi)) => println!(
            "{} calendars valid over [{lo}, {hi}], {} exceptions",
            store.calendars.len(),
            store.exceptions.len()
        ),
        None => println!(
            "no calendars; {} exceptions (exception-only service)",
            store.exceptions.len()
        ),
    }
}

fn query(
    runs_file: &str,
    calendars_file: &str,
    segment: i64,
    date: &str,
    time: &str,
    direction: TravelDirection,
    config: &AnalysisConfig,
) {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap_or_else(|e| panic!("invalid --date '{date}', expected YYYY-MM-DD: {e}"));
    let minutes =
        parse_time_of_day(time).unwrap_or_else(|e| panic!("invalid --time '{time}': {e}"));

    let source = ScheduleSource {
        runs_file: runs_file.to_string(),
        calendars_file: calendars_file.to_string(),
    };
    let mut cache = ScheduleCache::new(source, config.cache_policy());
    let engine = cache.ensure_loaded().expect("failure loading schedule store");

    let instant = QueryInstant {
        day: config.service_day(date),
        minutes,
    };
    let result = engine.traverse(segment, &instant, direction, &config.filter);
    println!(
        "{}",
        serde_json::to_string_pretty(&result).expect("failure serializing traversal result")
    );
}

fn match_runs(runs_file: &str, calendars_file: &str, legs_file: &str, tolerance: f64) {
    let reader = csv::ReaderBuilder::new()
        .from_path(legs_file)
        .unwrap_or_else(|e| panic!("failure reading legs file '{legs_file}': {e}"));
    let legs = reader
        .into_deserialize::<TraversedLeg>()
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| panic!("failure reading legs file '{legs_file}': {e}"));

    let source = ScheduleSource {
        runs_file: runs_file.to_string(),
        calendars_file: calendars_file.to_string(),
    };
    let mut cache = ScheduleCache::new(source, Default::default());
    let engine = cache.ensure_loaded().expect("failure loading schedule store");

    for leg_match in match_legs(&engine, &legs, tolerance) {
        println!(
            "{}",
            serde_json::to_string(&leg_match).expect("failure serializing leg match")
        );
    }
}

/// parses HH:MM or HH:MM:SS into minutes since midnight. hours past 24
/// express past-midnight times on the same service day.
fn parse_time_of_day(value: &str) -> Result<f64, String> {
    let parts: Vec<&str> = value.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m] => (*h, *m, "0"),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(format!("expected HH:MM or HH:MM:SS, got '{value}'")),
    };
    let hours: u32 = hours
        .parse()
        .map_err(|e| format!("invalid hours in '{value}': {e}"))?;
    let minutes: u32 = minutes
        .parse()
        .map_err(|e| format!("invalid minutes in '{value}': {e}"))?;
    let seconds: u32 = seconds
        .parse()
        .map_err(|e| format!("invalid seconds in '{value}': {e}"))?;
    if minutes >= 60 || seconds >= 60 {
        return Err(format!("minutes/seconds out of range in '{value}'"));
    }
    Ok(hours as f64 * 60.0 + minutes as f64 + seconds as f64 / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("08:00"), Ok(480.0));
        assert_eq!(parse_time_of_day("08:00:30"), Ok(480.5));
        assert_eq!(parse_time_of_day("00:00"), Ok(0.0));
    }

    #[test]
    fn test_parse_time_of_day_past_midnight() {
        assert_eq!(parse_time_of_day("25:30"), Ok(1530.0));
    }

    #[test]
    fn test_parse_time_of_day_rejects_garbage() {
        assert!(parse_time_of_day("8").is_err());
        assert!(parse_time_of_day("08:61").is_err());
        assert!(parse_time_of_day("8:00:00:00").is_err());
        assert!(parse_time_of_day("eight").is_err());
    }
}
