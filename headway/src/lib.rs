//! # headway
//!
//! A time-dependent transit schedule query engine. Given a directed
//! network segment, a query instant, and rider constraints, the
//! evaluator answers "when does the next usable vehicle cross this
//! segment, and how long is the wait + ride": the cost contract a
//! time-aware router calls at every edge expansion. The schedule module
//! defines the persisted store the evaluator loads and the GTFS ingest
//! that produces it.
pub mod app;
pub mod evaluator;
pub mod schedule;
