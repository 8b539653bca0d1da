//! # Evaluator
//!
//! The runtime query engine: calendar resolution, the per-segment run
//! index, the schedule cache that loads both from the persisted store,
//! the traversal-time query itself, and the run-matching post-processor
//! for solved routes.
mod cache;
mod cache_policy;
mod calendar;
mod config;
mod engine;
mod rider_filter;
mod run_index;
mod run_matching;

pub use cache::ScheduleCache;
pub use cache_policy::CachePolicy;
pub use calendar::{CalendarResolver, ServiceDay};
pub use config::AnalysisConfig;
pub use engine::{TraversalEngine, TraversalResult};
pub use rider_filter::{QueryInstant, RiderFilter, TravelDirection};
pub use run_index::{RunIndex, SegmentRuns};
pub use run_matching::{match_legs, LegMatch, RunCandidate, TraversedLeg};
