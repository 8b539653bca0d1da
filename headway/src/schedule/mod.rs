//! # Schedule
//!
//! Data model and persisted-store codecs for transit runs, service
//! calendars, and calendar exceptions, plus the GTFS ingest that
//! produces the store consumed by the evaluator.
mod calendar_store;
mod ingest;
mod raw_run_row;
mod run;
mod schedule_error;
mod store;

pub use calendar_store::{CalendarException, CalendarStore, ExceptionKind, ServiceCalendar};
pub use ingest::{ingest_feed, IngestOutput, SegmentRecord};
pub use raw_run_row::RawRunRow;
pub use run::{RiderFlag, Run, RunList};
pub use schedule_error::ScheduleError;
pub use store::{
    read_calendar_store, read_run_rows, read_run_rows_from_reader, write_calendar_store,
    write_run_rows, write_segment_records, ScheduleSource,
};
