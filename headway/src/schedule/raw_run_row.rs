use serde::{Deserialize, Serialize};

use crate::schedule::run::{RiderFlag, Run};

/// record type for one row of the persisted runs table.
///
/// `segment_id` is optional in the file format: an empty value means the
/// upstream segment-linkage assignment never ran for that row, which the
/// loader reports as a fatal error rather than silently dropping the run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRunRow {
    pub segment_id: Option<i64>,
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    /// minutes since midnight, possibly >= 1440 for past-midnight trips
    pub departure: f64,
    pub arrival: f64,
    pub wheelchair: RiderFlag,
    pub bikes: RiderFlag,
}

impl RawRunRow {
    pub fn into_run(self) -> Run {
        Run {
            trip_id: self.trip_id,
            route_id: self.route_id,
            service_id: self.service_id,
            departure: self.departure,
            arrival: self.arrival,
            wheelchair: self.wheelchair,
            bikes: self.bikes,
        }
    }
}
