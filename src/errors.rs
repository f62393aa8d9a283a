// Error types for pitwall

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PitwallError {
    // Errors while reading a capture file
    #[snafu(display("Error reading capture file {path}"))]
    BatchIo { path: String, source: io::Error },
    #[snafu(display("Capture file is missing required fields: {}", fields.join(", ")))]
    MissingFields { fields: Vec<String> },
    #[snafu(display("Malformed sample at record {record}: {reason}"))]
    SampleParse { record: usize, reason: String },

    // Batch validation errors
    #[snafu(display("Batch {filename} contains no samples"))]
    EmptyBatch { filename: String },
    #[snafu(display("Batch {filename} spans multiple tracks: {}", ordinals.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(", ")))]
    MixedTrack { filename: String, ordinals: Vec<i32> },
    #[snafu(display("Batch {filename} has an unknown track: {reason}"))]
    UnknownTrack { filename: String, reason: String },
    #[snafu(display(
        "Batch {filename} was recorded on track {batch_track} but the accumulated data is for track {accumulated_track}"
    ))]
    MixedBatchTrack {
        filename: String,
        batch_track: i32,
        accumulated_track: i32,
    },

    // Track reference data errors
    #[snafu(display("Error reading track data file"))]
    TrackDataIo { source: io::Error },
    #[snafu(display("Malformed track data at record {record}: {reason}"))]
    TrackDataParse { record: usize, reason: String },
    #[snafu(display("Could not find application data directory for track data"))]
    NoDataDir,

    // Errors for the export writer
    #[snafu(display("Error writing export file"))]
    ExportIo { source: io::Error },
}
