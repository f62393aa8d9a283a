// Chronological reordering of a capture batch.
//
// UDP delivery reorders packets, and the device timestamp is a wrapping
// 32-bit millisecond counter, so arrival order and raw timestamp order are
// both unreliable on their own.

use itertools::Itertools;
use log::{debug, warn};

use super::{Sample, TIMESTAMP_GAP_THRESHOLD_MS};

/// What the reordering pass did to a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReorderOutcome {
    /// Whether a timestamp wraparound was detected and corrected
    pub wrap_corrected: bool,
    /// Gaps larger than the threshold remaining after the single correction.
    /// A second wrap cannot be told apart from a long recording hole, so
    /// these are reported rather than corrected.
    pub residual_gaps: usize,
}

/// Restores true time order: a stable sort on the device timestamp, with at
/// most one counter wraparound corrected per batch. Samples with equal
/// timestamps keep their arrival order. The stored timestamps are not
/// modified.
pub fn restore_chronology(samples: Vec<Sample>) -> (Vec<Sample>, ReorderOutcome) {
    // Widen the sort keys so the wrap correction cannot itself overflow
    let mut keyed = samples
        .into_iter()
        .map(|s| (s.timestamp_ms as u64, s))
        .collect_vec();
    keyed.sort_by_key(|(key, _)| *key);

    let mut outcome = ReorderOutcome::default();
    if let Some(split) = first_gap(&keyed) {
        // Samples before the gap carry post-wrap timestamps: the counter
        // wrapped past them, so they logically follow everything else.
        let bump = keyed.last().map(|(key, _)| key + 1).unwrap_or(0);
        for (key, _) in &mut keyed[..split] {
            *key += bump;
        }
        keyed.sort_by_key(|(key, _)| *key);
        outcome.wrap_corrected = true;
        debug!("Corrected a timestamp wraparound ({split} post-wrap samples)");
    }

    outcome.residual_gaps = count_gaps(&keyed);
    if outcome.residual_gaps > 0 {
        warn!(
            "{} large timestamp gaps remain after reordering; the batch may span a second counter wrap or a long recording hole",
            outcome.residual_gaps
        );
    }

    (keyed.into_iter().map(|(_, s)| s).collect(), outcome)
}

// Index of the first sample whose distance to its predecessor exceeds the
// gap threshold, in sorted-key order.
fn first_gap(keyed: &[(u64, Sample)]) -> Option<usize> {
    keyed
        .iter()
        .tuple_windows()
        .position(|((earlier, _), (later, _))| later - earlier > TIMESTAMP_GAP_THRESHOLD_MS)
        .map(|gap| gap + 1)
}

fn count_gaps(keyed: &[(u64, Sample)]) -> usize {
    keyed
        .iter()
        .tuple_windows()
        .filter(|((earlier, _), (later, _))| later - earlier > TIMESTAMP_GAP_THRESHOLD_MS)
        .count()
}
