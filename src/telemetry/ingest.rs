// Capture batch reading and validation.
//
// A capture file is one batch: a delimited table with a header row and one
// row per data-out packet received. All validation happens here, before any
// accumulated state is touched.

use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

use itertools::Itertools;
use log::debug;

use crate::errors::PitwallError;
use crate::track_data::TrackTable;

use super::Sample;

/// Fields every capture batch must provide
pub(crate) const REQUIRED_FIELDS: [&str; 7] = [
    "timestamp_ms",
    "car_ordinal",
    "track_ordinal",
    "dist_traveled",
    "lap_no",
    "last_lap_time",
    "cur_lap_time",
];

/// A parsed batch bound to its identifier and resolved track
#[derive(Clone, Debug)]
pub struct ValidatedBatch {
    pub samples: Vec<Sample>,
    pub filename: String,
    pub track_ordinal: i32,
    pub lap_length_m: f64,
}

// The recorder writes comma-separated files by default and tab-separated on
// request; the extension is the only marker.
fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

/// Reads one capture file into a batch of samples
pub fn read_batch_file(path: &Path) -> Result<Vec<Sample>, PitwallError> {
    let file = File::open(path).map_err(|e| PitwallError::BatchIo {
        path: path.display().to_string(),
        source: e,
    })?;
    read_batch(file, delimiter_for(path))
}

/// Reads a delimited capture table into a batch of samples. Fails if any
/// required field is absent from the header or any cell is malformed.
pub fn read_batch<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Sample>, PitwallError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| PitwallError::SampleParse {
            record: 0,
            reason: format!("could not read header row: {e}"),
        })?
        .clone();

    // Resolve every required field to its column up front; the remaining
    // columns are passthrough channels.
    let mut required_columns = [0usize; REQUIRED_FIELDS.len()];
    let mut missing = Vec::new();
    for (slot, field) in REQUIRED_FIELDS.iter().enumerate() {
        match headers.iter().position(|h| h == *field) {
            Some(column) => required_columns[slot] = column,
            None => missing.push(field.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(PitwallError::MissingFields { fields: missing });
    }

    let extra_columns = headers
        .iter()
        .enumerate()
        .filter(|(column, _)| !required_columns.contains(column))
        .map(|(column, name)| (column, name.to_string()))
        .collect_vec();

    let mut samples = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record_no = row + 1;
        let record = record.map_err(|e| PitwallError::SampleParse {
            record: record_no,
            reason: e.to_string(),
        })?;
        samples.push(parse_record(
            &record,
            record_no,
            &required_columns,
            &extra_columns,
        )?);
    }

    debug!("Parsed {} samples from capture table", samples.len());
    Ok(samples)
}

fn parse_record(
    record: &csv::StringRecord,
    record_no: usize,
    required_columns: &[usize; REQUIRED_FIELDS.len()],
    extra_columns: &[(usize, String)],
) -> Result<Sample, PitwallError> {
    let [timestamp_col, car_col, track_col, dist_col, lap_col, last_lap_col, cur_lap_col] =
        *required_columns;

    let timestamp_ms = integer_cell(record, record_no, timestamp_col, "timestamp_ms")?;
    let timestamp_ms =
        u32::try_from(timestamp_ms).map_err(|_| PitwallError::SampleParse {
            record: record_no,
            reason: format!("field timestamp_ms is out of range: {timestamp_ms}"),
        })?;

    // An empty track cell is preserved as None so validation can report
    // missing track ids separately from genuinely mixed tracks.
    let track_ordinal = match record.get(track_col).unwrap_or("") {
        "" => None,
        _ => Some(int32_cell(record, record_no, track_col, "track_ordinal")?),
    };

    let mut extras = BTreeMap::new();
    for (column, name) in extra_columns {
        let raw = record.get(*column).unwrap_or("");
        if raw.is_empty() {
            // the channel is simply absent for this row
            continue;
        }
        extras.insert(name.clone(), numeric_cell(record, record_no, *column, name)?);
    }

    Ok(Sample {
        timestamp_ms,
        car_ordinal: int32_cell(record, record_no, car_col, "car_ordinal")?,
        track_ordinal,
        dist_traveled: numeric_cell(record, record_no, dist_col, "dist_traveled")?,
        lap_no: int32_cell(record, record_no, lap_col, "lap_no")?,
        last_lap_time: numeric_cell(record, record_no, last_lap_col, "last_lap_time")?,
        cur_lap_time: numeric_cell(record, record_no, cur_lap_col, "cur_lap_time")?,
        extras,
    })
}

fn numeric_cell(
    record: &csv::StringRecord,
    record_no: usize,
    column: usize,
    name: &str,
) -> Result<f64, PitwallError> {
    let raw = record.get(column).unwrap_or("");
    let value = raw.parse::<f64>().map_err(|_| PitwallError::SampleParse {
        record: record_no,
        reason: format!("field {name} has non-numeric value {raw:?}"),
    })?;
    if !value.is_finite() {
        return Err(PitwallError::SampleParse {
            record: record_no,
            reason: format!("field {name} has non-finite value {raw:?}"),
        });
    }
    Ok(value)
}

// Integer columns round-trip through pandas as floats once a null appears
// anywhere in the column, so "17.0" is accepted while "17.5" is not.
fn integer_cell(
    record: &csv::StringRecord,
    record_no: usize,
    column: usize,
    name: &str,
) -> Result<i64, PitwallError> {
    let value = numeric_cell(record, record_no, column, name)?;
    if value.fract() != 0.0 || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(PitwallError::SampleParse {
            record: record_no,
            reason: format!("field {name} is not an integer: {value}"),
        });
    }
    Ok(value as i64)
}

fn int32_cell(
    record: &csv::StringRecord,
    record_no: usize,
    column: usize,
    name: &str,
) -> Result<i32, PitwallError> {
    let value = integer_cell(record, record_no, column, name)?;
    i32::try_from(value).map_err(|_| PitwallError::SampleParse {
        record: record_no,
        reason: format!("field {name} is out of range: {value}"),
    })
}

/// Validates one parsed batch against the track reference data and binds it
/// to its identifier. Pure: a failed validation leaves nothing mutated.
pub fn validate_batch(
    samples: Vec<Sample>,
    filename: &str,
    tracks: &TrackTable,
) -> Result<ValidatedBatch, PitwallError> {
    if samples.is_empty() {
        return Err(PitwallError::EmptyBatch {
            filename: filename.to_string(),
        });
    }

    let missing_track = samples
        .iter()
        .filter(|s| s.track_ordinal.is_none())
        .count();
    if missing_track > 0 {
        return Err(PitwallError::UnknownTrack {
            filename: filename.to_string(),
            reason: format!("{missing_track} samples have no track ordinal"),
        });
    }

    let ordinals = samples
        .iter()
        .filter_map(|s| s.track_ordinal)
        .unique()
        .sorted()
        .collect_vec();
    if ordinals.len() > 1 {
        return Err(PitwallError::MixedTrack {
            filename: filename.to_string(),
            ordinals,
        });
    }

    let track_ordinal = ordinals[0];
    let lap_length_m =
        tracks
            .lap_length(track_ordinal)
            .ok_or_else(|| PitwallError::UnknownTrack {
                filename: filename.to_string(),
                reason: format!(
                    "track {track_ordinal} is not in the track data; update the track data and retry"
                ),
            })?;

    debug!(
        "Validated batch {} ({} samples, track {}, lap length {}m)",
        filename,
        samples.len(),
        track_ordinal,
        lap_length_m
    );
    Ok(ValidatedBatch {
        samples,
        filename: filename.to_string(),
        track_ordinal,
        lap_length_m,
    })
}
