// Track reference data: the read-only lookup from track ordinal to lap
// length. The surrounding application maintains the backing CSV resource;
// the engine only consumes it.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::PitwallError;

const TRACK_DATA_FILE_NAME: &str = "tracks.csv";

/// Maps `track_ordinal` to the track's lap length in meters
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackTable {
    lengths: HashMap<i32, f64>,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, track_ordinal: i32, lap_length_m: f64) {
        self.lengths.insert(track_ordinal, lap_length_m);
    }

    /// Lap length for a track, if the track is known
    pub fn lap_length(&self, track_ordinal: i32) -> Option<f64> {
        self.lengths.get(&track_ordinal).copied()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Track ordinals with their lap lengths, sorted by ordinal
    pub fn entries(&self) -> Vec<(i32, f64)> {
        let mut entries: Vec<(i32, f64)> = self.lengths.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(ordinal, _)| *ordinal);
        entries
    }

    /// Loads the table from a CSV resource with `track_ordinal` and
    /// `lap_length` columns. Extra columns (display names and the like) are
    /// ignored. Duplicate ordinals and non-positive lengths are rejected.
    pub fn from_csv_path(path: &Path) -> Result<Self, PitwallError> {
        let file = File::open(path).map_err(|e| PitwallError::TrackDataIo { source: e })?;
        let mut reader = csv::Reader::from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| PitwallError::TrackDataParse {
                record: 0,
                reason: format!("could not read header row: {e}"),
            })?
            .clone();
        let ordinal_column = headers.iter().position(|h| h == "track_ordinal");
        let length_column = headers.iter().position(|h| h == "lap_length");
        let (Some(ordinal_column), Some(length_column)) = (ordinal_column, length_column) else {
            return Err(PitwallError::TrackDataParse {
                record: 0,
                reason: "header must contain track_ordinal and lap_length".to_string(),
            });
        };

        let mut table = Self::new();
        for (row, record) in reader.records().enumerate() {
            let record_no = row + 1;
            let record = record.map_err(|e| PitwallError::TrackDataParse {
                record: record_no,
                reason: e.to_string(),
            })?;

            let ordinal: i32 = record
                .get(ordinal_column)
                .unwrap_or("")
                .parse()
                .map_err(|_| PitwallError::TrackDataParse {
                    record: record_no,
                    reason: format!(
                        "track_ordinal has non-integer value {:?}",
                        record.get(ordinal_column).unwrap_or("")
                    ),
                })?;
            let lap_length_m: f64 = record
                .get(length_column)
                .unwrap_or("")
                .parse()
                .map_err(|_| PitwallError::TrackDataParse {
                    record: record_no,
                    reason: format!(
                        "lap_length has non-numeric value {:?}",
                        record.get(length_column).unwrap_or("")
                    ),
                })?;

            if !lap_length_m.is_finite() || lap_length_m <= 0.0 {
                return Err(PitwallError::TrackDataParse {
                    record: record_no,
                    reason: format!("lap_length must be positive, got {lap_length_m}"),
                });
            }
            if table.lengths.contains_key(&ordinal) {
                return Err(PitwallError::TrackDataParse {
                    record: record_no,
                    reason: format!("duplicate track ordinal {ordinal}"),
                });
            }
            table.insert(ordinal, lap_length_m);
        }

        debug!("Loaded {} tracks from {}", table.len(), path.display());
        Ok(table)
    }

    /// The default location of the track data resource
    pub fn default_data_path() -> Result<PathBuf, PitwallError> {
        let app_data_dir = dirs::data_dir().ok_or(PitwallError::NoDataDir)?;
        Ok(app_data_dir.join("pitwall").join(TRACK_DATA_FILE_NAME))
    }
}
