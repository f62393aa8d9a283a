pub(crate) mod ingest;
pub(crate) mod manager;
pub(crate) mod order;
pub(crate) mod segmentation;
pub(crate) mod summary;

use std::collections::BTreeMap;

pub use ingest::{read_batch, read_batch_file, validate_batch, ValidatedBatch};
pub use manager::{BatchReport, SessionManager};
pub use order::{ReorderOutcome, restore_chronology};
pub use segmentation::tag_batch;
pub use summary::{best_lap, build_lap_summary};

use serde::{Deserialize, Serialize};

/// Tolerance in meters when matching a lap's final distance against the track length
pub const LAP_DISTANCE_TOLERANCE_M: f64 = 5.0;

/// Adjacent-sample gap, in device milliseconds, that signals a timestamp wraparound.
/// Packets arrive many times per second, so anything over an hour cannot be a
/// normal inter-packet interval.
pub const TIMESTAMP_GAP_THRESHOLD_MS: u64 = 3_600_000;

/// One telemetry reading, one row per data-out packet received
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Device-local wrapping millisecond counter, not wall-clock time
    pub timestamp_ms: u32,
    /// Identifies the car in use
    pub car_ordinal: i32,
    /// Identifies the track; `None` when the capture row carried no value
    pub track_ordinal: Option<i32>,
    /// Meters traveled since the race start, negative behind the start line
    pub dist_traveled: f64,
    /// Lap counter as reported by the game; not consistent across restarts
    pub lap_no: i32,
    /// Previous lap time in seconds
    pub last_lap_time: f64,
    /// Time spent in the current lap in seconds
    pub cur_lap_time: f64,
    /// The remaining data-out channels, passed through untouched (booleans
    /// arrive as 0/1)
    #[serde(flatten)]
    pub extras: BTreeMap<String, f64>,
}

/// A sample annotated with the columns derived during ingestion. The raw
/// sample is carried unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedSample {
    /// Identifier of the batch this sample came from
    pub filename: String,
    /// Session index, contiguous across batches
    pub session_no: u32,
    /// Restart index within the session; -1 before the first reset transition
    pub restart_no: i32,
    /// Distance around the current lap in meters, 0 behind the start line
    pub cur_lap_distance: f64,
    #[serde(flatten)]
    pub sample: Sample,
}

/// One row per completed lap, the externally consumed artifact
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LapSummary {
    pub filename: String,
    pub session_no: u32,
    pub restart_no: i32,
    pub lap_no: i32,
    pub car_ordinal: i32,
    /// Time of the completed lap in seconds
    pub lap_time: f64,
}

/// Formats a lap time in seconds as `M:SS.mmm`. Milliseconds are truncated,
/// not rounded.
pub fn format_lap_time(lap_time_s: f64) -> String {
    let minutes = (lap_time_s / 60.0).floor();
    let seconds = lap_time_s - minutes * 60.0;
    let millis = ((seconds - seconds.floor()) * 1000.0).floor();
    format!(
        "{}:{:02}.{:03}",
        minutes as u32, seconds as u32, millis as u32
    )
}
