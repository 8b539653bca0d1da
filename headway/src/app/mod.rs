//! # App
//!
//! Command-line surface over the ingest, store, and evaluator modules.
mod operation;

pub use operation::HeadwayOperation;
