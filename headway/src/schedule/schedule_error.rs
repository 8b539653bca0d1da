#[derive(thiserror::Error, Debug)]
pub enum ScheduleError {
    #[error("{rows} run rows are missing segment linkage ids. re-run the segment assignment step (`headway ingest`) so every run row carries a segment_id, then reload")]
    MissingLinkage { rows: usize },
    #[error("failed to read runs table '{path}': {message}")]
    RunsRead { path: String, message: String },
    #[error("failed to read calendar store '{path}': {message}")]
    CalendarRead { path: String, message: String },
    #[error("failed to write schedule store file '{path}': {message}")]
    StoreWrite { path: String, message: String },
    #[error("schedule load cancelled; cache left unloaded")]
    LoadCancelled,
    #[error("failed to parse GTFS archive: {0}")]
    GtfsRead(#[from] gtfs_structures::Error),
    #[error("GTFS archive is malformed: {0}")]
    MalformedGtfs(String),
    #[error("error due to dataset contents: {0}")]
    InvalidData(String),
    #[error("internal error: {0}")]
    Internal(String),
}
