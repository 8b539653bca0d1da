use serde::{Deserialize, Serialize};

/// controls when the schedule cache rebuilds its in-memory structures.
///
/// loading is the one expensive operation (minutes for large schedules);
/// queries against a loaded cache are cheap. `OncePerProcess` loads on
/// first use and reuses the structures for every later solve.
/// `EverySolve` forces a fresh load per solve batch, for callers that
/// mutate the underlying store between solves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    #[default]
    OncePerProcess,
    EverySolve,
}
