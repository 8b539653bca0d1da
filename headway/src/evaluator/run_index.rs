use std::collections::HashMap;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::schedule::{RawRunRow, Run, RunList, ScheduleError};

/// the runs crossing one directed segment, frozen for read-only query
/// access after load.
pub struct SegmentRuns {
    /// sorted by (departure, trip_id)
    runs: Box<[Run]>,
    /// permutation of `runs` ordered by arrival ascending with trip_id
    /// descending, so a reverse scan visits equal arrivals in ascending
    /// trip order
    by_arrival: Box<[u32]>,
}

impl SegmentRuns {
    fn from_sorted(runs: Vec<Run>) -> Self {
        let mut by_arrival: Vec<u32> = (0..runs.len() as u32).collect();
        by_arrival.sort_by(|&a, &b| {
            let run_a = &runs[a as usize];
            let run_b = &runs[b as usize];
            OrderedFloat(run_a.arrival)
                .cmp(&OrderedFloat(run_b.arrival))
                .then_with(|| run_b.trip_id.cmp(&run_a.trip_id))
        });
        Self {
            runs: runs.into_boxed_slice(),
            by_arrival: by_arrival.into_boxed_slice(),
        }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub(crate) fn by_arrival(&self) -> &[u32] {
        &self.by_arrival
    }
}

/// in-memory index from segment id to that segment's scheduled runs.
/// only forward-direction runs are indexed: traversing a transit line
/// against its direction of travel is modeled upstream as a distinct
/// segment id (or no segment at all).
pub struct RunIndex {
    segments: HashMap<i64, SegmentRuns>,
}

impl RunIndex {
    /// builds the index from raw store rows, grouping by segment and
    /// ordering each segment's runs by departure as they are inserted.
    ///
    /// fails when any row lacks its segment linkage id, which means the
    /// upstream segment assignment step never ran for that table.
    pub fn from_rows(rows: Vec<RawRunRow>) -> Result<RunIndex, ScheduleError> {
        let missing = rows.iter().filter(|r| r.segment_id.is_none()).count();
        if missing > 0 {
            return Err(ScheduleError::MissingLinkage { rows: missing });
        }

        let mut lists: HashMap<i64, RunList> = HashMap::new();
        for row in rows {
            if let Some(segment_id) = row.segment_id {
                lists.entry(segment_id).or_default().insert(row.into_run());
            }
        }

        let drained: Vec<(i64, Vec<Run>)> = lists
            .into_iter()
            .map(|(segment_id, list)| (segment_id, list.iter().cloned().collect()))
            .collect();

        let segments: HashMap<i64, SegmentRuns> = drained
            .into_par_iter()
            .map(|(segment_id, runs)| (segment_id, SegmentRuns::from_sorted(runs)))
            .collect();

        log::debug!("built run index over {} segments", segments.len());
        Ok(RunIndex { segments })
    }

    /// the runs crossing a segment, ordered by departure time-of-day.
    /// a segment with no scheduled service yields an empty slice.
    pub fn runs_for_segment(&self, segment_id: i64) -> &[Run] {
        self.segments
            .get(&segment_id)
            .map(|s| s.runs())
            .unwrap_or(&[])
    }

    pub(crate) fn segment(&self, segment_id: i64) -> Option<&SegmentRuns> {
        self.segments.get(&segment_id)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn run_count(&self) -> usize {
        self.segments.values().map(|s| s.runs.len()).sum()
    }
}
