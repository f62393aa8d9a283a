// The session manager: the single owned accumulator for processed telemetry.

use log::info;

use crate::errors::PitwallError;
use crate::track_data::TrackTable;

use super::{
    LapSummary, Sample, TaggedSample, ingest::validate_batch, order::restore_chronology,
    segmentation::tag_batch, summary::build_lap_summary,
};

/// What one successful ingestion did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub filename: String,
    pub samples: usize,
    pub sessions_added: u32,
    pub wrap_corrected: bool,
}

/// Owns the accumulated sample table and its lap summary. Every mutation
/// goes through `ingest` or `reset`; a failed ingest leaves the accumulation
/// untouched. Callers embedding this in a threaded host must serialize
/// access themselves; there is no interior locking.
pub struct SessionManager {
    tracks: TrackTable,
    track_ordinal: Option<i32>,
    lap_length_m: f64,
    rows: Vec<TaggedSample>,
    summary: Vec<LapSummary>,
    session_count: u32,
}

impl SessionManager {
    pub fn new(tracks: TrackTable) -> Self {
        Self {
            tracks,
            track_ordinal: None,
            lap_length_m: 0.0,
            rows: Vec::new(),
            summary: Vec::new(),
            session_count: 0,
        }
    }

    /// Validates, reorders and tags one batch, merges it into the
    /// accumulation, and rebuilds the lap summary over the full table. The
    /// summary is always recomputed whole rather than patched; batches are
    /// small relative to how often they arrive. Every failure path runs
    /// before the first mutation.
    pub fn ingest(
        &mut self,
        samples: Vec<Sample>,
        filename: &str,
    ) -> Result<BatchReport, PitwallError> {
        let batch = validate_batch(samples, filename, &self.tracks)?;

        // All merged batches must share one track
        if let Some(accumulated_track) = self.track_ordinal {
            if accumulated_track != batch.track_ordinal {
                return Err(PitwallError::MixedBatchTrack {
                    filename: filename.to_string(),
                    batch_track: batch.track_ordinal,
                    accumulated_track,
                });
            }
        }

        let (ordered, outcome) = restore_chronology(batch.samples);
        let (tagged, session_count) = tag_batch(
            ordered,
            &batch.filename,
            batch.lap_length_m,
            self.session_count,
        );

        let report = BatchReport {
            filename: batch.filename,
            samples: tagged.len(),
            sessions_added: session_count - self.session_count,
            wrap_corrected: outcome.wrap_corrected,
        };

        // commit point: nothing below fails
        self.track_ordinal = Some(batch.track_ordinal);
        self.lap_length_m = batch.lap_length_m;
        self.session_count = session_count;
        self.rows.extend(tagged);
        self.summary = build_lap_summary(&self.rows, self.lap_length_m);

        info!(
            "Ingested batch {} ({} samples, {} new sessions, {} completed laps accumulated)",
            report.filename,
            report.samples,
            report.sessions_added,
            self.summary.len()
        );
        Ok(report)
    }

    /// Drops the accumulation. The track reference data is kept.
    pub fn reset(&mut self) {
        self.track_ordinal = None;
        self.lap_length_m = 0.0;
        self.rows.clear();
        self.summary.clear();
        self.session_count = 0;
        info!("Session manager reset");
    }

    /// The accumulated, annotated sample table in processing order
    pub fn samples(&self) -> &[TaggedSample] {
        &self.rows
    }

    /// The lap summary over everything accumulated so far
    pub fn lap_summary(&self) -> &[LapSummary] {
        &self.summary
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    /// The track every accumulated batch belongs to, once one was ingested
    pub fn track_ordinal(&self) -> Option<i32> {
        self.track_ordinal
    }
}
