use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use skiplist::OrderedSkipList;

/// an ordered collection of [`Run`] values used while building the run
/// index; ordered insertion keeps each segment's runs sorted by departure
/// as rows stream in from the store.
pub type RunList = OrderedSkipList<Run>;

/// tri-state rider constraint flag carried by a run. GTFS leaves
/// accessibility fields optional, so absence of information is its own
/// state: a rider requirement never excludes a run whose flag is
/// [`RiderFlag::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiderFlag {
    Yes,
    No,
    #[default]
    Unknown,
}

impl RiderFlag {
    /// true if this flag satisfies a rider requirement. only an explicit
    /// `No` fails the requirement.
    pub fn satisfies_requirement(&self) -> bool {
        !matches!(self, RiderFlag::No)
    }
}

/// a single scheduled vehicle passage across one directed network segment.
///
/// departure and arrival are minutes since midnight on the service day;
/// values at or past 1440 express past-midnight trips without wrapping, so
/// comparisons stay monotonic across a 24h+ query window.
#[derive(Debug, Clone)]
pub struct Run {
    /// GTFS trip this passage belongs to
    pub trip_id: String,
    /// GTFS route the trip runs on
    pub route_id: String,
    /// service calendar governing which days this run operates
    pub service_id: String,
    /// minutes since midnight when the vehicle departs the segment start
    pub departure: f64,
    /// minutes since midnight when the vehicle reaches the segment end
    pub arrival: f64,
    pub wheelchair: RiderFlag,
    pub bikes: RiderFlag,
}

impl Run {
    /// scheduled in-vehicle time across the segment, in minutes.
    pub fn ride_minutes(&self) -> f64 {
        (self.arrival - self.departure).abs()
    }
}

impl PartialEq for Run {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Run {}

impl PartialOrd for Run {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Run {
    /// runs order by departure time; equal departures fall back to the
    /// lexicographic trip id so searches and tie-breaks are reproducible.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (OrderedFloat(self.departure), &self.trip_id)
            .cmp(&(OrderedFloat(other.departure), &other.trip_id))
    }
}
