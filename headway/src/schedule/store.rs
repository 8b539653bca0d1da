use std::fs::File;
use std::io::{BufReader, Read};

use flate2::bufread::GzDecoder;
use kdam::{Bar, BarExt};
use serde::{Deserialize, Serialize};

use crate::schedule::calendar_store::CalendarStore;
use crate::schedule::ingest::SegmentRecord;
use crate::schedule::raw_run_row::RawRunRow;
use crate::schedule::schedule_error::ScheduleError;

/// locations of the persisted schedule store consumed by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSource {
    /// runs table path (.csv, or .csv.gz for gzip-compressed tables)
    pub runs_file: String,
    /// calendar store path (.json)
    pub calendars_file: String,
}

/// reads the runs table from a csv file, transparently decompressing
/// `.gz` inputs.
pub fn read_run_rows(path: &str) -> Result<Vec<RawRunRow>, ScheduleError> {
    let file = File::open(path).map_err(|e| ScheduleError::RunsRead {
        path: path.to_string(),
        message: format!("{e}"),
    })?;
    let buffered = BufReader::new(file);

    let bar = Bar::builder()
        .desc("read runs table")
        .build()
        .map_err(ScheduleError::Internal)?;

    let rows = if path.ends_with(".gz") {
        read_run_rows_from_reader(GzDecoder::new(buffered), Some(bar))
    } else {
        read_run_rows_from_reader(buffered, Some(bar))
    }
    .map_err(|e| ScheduleError::RunsRead {
        path: path.to_string(),
        message: format!("{e}"),
    })?;

    log::debug!("{path} - loaded {} run rows", rows.len());
    Ok(rows)
}

/// deserializes run rows from any reader. exposed separately from
/// [`read_run_rows`] so codec tests can run against in-memory bytes.
pub fn read_run_rows_from_reader<R: Read>(
    reader: R,
    bar: Option<Bar>,
) -> Result<Vec<RawRunRow>, csv::Error> {
    let csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let mut bar = bar;
    let mut rows = vec![];
    for row in csv_reader.into_deserialize::<RawRunRow>() {
        rows.push(row?);
        if let Some(b) = bar.as_mut() {
            let _ = b.update(1);
        }
    }
    Ok(rows)
}

pub fn read_calendar_store(path: &str) -> Result<CalendarStore, ScheduleError> {
    let file = File::open(path).map_err(|e| ScheduleError::CalendarRead {
        path: path.to_string(),
        message: format!("{e}"),
    })?;
    let store: CalendarStore =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| ScheduleError::CalendarRead {
            path: path.to_string(),
            message: format!("{e}"),
        })?;
    log::debug!(
        "{path} - loaded {} calendars, {} exceptions",
        store.calendars.len(),
        store.exceptions.len()
    );
    Ok(store)
}

pub fn write_run_rows(path: &str, rows: &[RawRunRow]) -> Result<(), ScheduleError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ScheduleError::StoreWrite {
        path: path.to_string(),
        message: format!("{e}"),
    })?;
    for row in rows {
        writer.serialize(row).map_err(|e| ScheduleError::StoreWrite {
            path: path.to_string(),
            message: format!("{e}"),
        })?;
    }
    writer.flush().map_err(|e| ScheduleError::StoreWrite {
        path: path.to_string(),
        message: format!("{e}"),
    })
}

pub fn write_segment_records(path: &str, records: &[SegmentRecord]) -> Result<(), ScheduleError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ScheduleError::StoreWrite {
        path: path.to_string(),
        message: format!("{e}"),
    })?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| ScheduleError::StoreWrite {
                path: path.to_string(),
                message: format!("{e}"),
            })?;
    }
    writer.flush().map_err(|e| ScheduleError::StoreWrite {
        path: path.to_string(),
        message: format!("{e}"),
    })
}

pub fn write_calendar_store(path: &str, store: &CalendarStore) -> Result<(), ScheduleError> {
    let file = File::create(path).map_err(|e| ScheduleError::StoreWrite {
        path: path.to_string(),
        message: format!("{e}"),
    })?;
    serde_json::to_writer_pretty(file, store).map_err(|e| ScheduleError::StoreWrite {
        path: path.to_string(),
        message: format!("{e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::run::RiderFlag;

    const RUNS_CSV: &str = "\
segment_id,trip_id,route_id,service_id,departure,arrival,wheelchair,bikes
0,t1,r1,WKDY,480.0,485.0,yes,unknown
0,t2,r1,WKDY,520.5,531.0,unknown,no
1,t1,r1,WKDY,485.0,492.0,yes,unknown
";

    #[test]
    fn test_read_run_rows_from_csv_bytes() {
        let rows =
            read_run_rows_from_reader(RUNS_CSV.as_bytes(), None).expect("rows should parse");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].segment_id, Some(0));
        assert_eq!(rows[0].wheelchair, RiderFlag::Yes);
        assert_eq!(rows[1].departure, 520.5);
        assert_eq!(rows[1].bikes, RiderFlag::No);
    }

    #[test]
    fn test_empty_segment_id_reads_as_none() {
        let csv = "\
segment_id,trip_id,route_id,service_id,departure,arrival,wheelchair,bikes
,t1,r1,WKDY,480.0,485.0,unknown,unknown
";
        let rows = read_run_rows_from_reader(csv.as_bytes(), None).expect("rows should parse");
        assert_eq!(rows[0].segment_id, None);
    }

    #[test]
    fn test_gzipped_runs_table_reads_identically() {
        use flate2::read::GzEncoder;
        use flate2::Compression;
        use std::io::Read;

        let mut encoder = GzEncoder::new(RUNS_CSV.as_bytes(), Compression::default());
        let mut compressed = vec![];
        encoder
            .read_to_end(&mut compressed)
            .expect("gzip should encode");

        let plain =
            read_run_rows_from_reader(RUNS_CSV.as_bytes(), None).expect("rows should parse");
        let unzipped =
            read_run_rows_from_reader(GzDecoder::new(compressed.as_slice()), None)
                .expect("gzipped rows should parse");

        assert_eq!(unzipped.len(), plain.len());
        assert_eq!(unzipped[1].trip_id, plain[1].trip_id);
        assert_eq!(unzipped[1].departure, plain[1].departure);
    }

    #[test]
    fn test_run_rows_round_trip_through_writer() {
        let rows =
            read_run_rows_from_reader(RUNS_CSV.as_bytes(), None).expect("rows should parse");

        let mut buffer = vec![];
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            for row in &rows {
                writer.serialize(row).expect("row should serialize");
            }
            writer.flush().expect("writer should flush");
        }

        let reparsed = read_run_rows_from_reader(buffer.as_slice(), None)
            .expect("rewritten rows should parse");
        assert_eq!(reparsed.len(), rows.len());
        assert_eq!(reparsed[2].segment_id, Some(1));
        assert_eq!(reparsed[2].arrival, 492.0);
    }
}
