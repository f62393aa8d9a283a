use std::path::Path;

use serde_jsonlines::write_json_lines;

use crate::{
    errors::PitwallError,
    telemetry::{LapSummary, TaggedSample},
};

/// Writes the annotated sample table as JSON Lines, one object per sample.
/// Derived columns and raw channels share one flat namespace, matching the
/// column set the display collaborators expect.
pub fn write_annotated(file: &Path, rows: &[TaggedSample]) -> Result<(), PitwallError> {
    write_json_lines(file, rows).map_err(|e| PitwallError::ExportIo { source: e })
}

/// Writes the lap summary as JSON Lines, one object per completed lap
pub fn write_summary(file: &Path, summary: &[LapSummary]) -> Result<(), PitwallError> {
    write_json_lines(file, summary).map_err(|e| PitwallError::ExportIo { source: e })
}
