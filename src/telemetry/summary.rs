// Completed-lap filtering and the lap summary table.

use std::collections::BTreeMap;

use super::{LAP_DISTANCE_TOLERANCE_M, LapSummary, TaggedSample};

/// Rebuilds the lap summary from the full accumulated sample table. Samples
/// group by `(filename, session_no, restart_no, lap_no)`; the last sample of
/// each group decides completeness and provides the lap facts. Partial and
/// abandoned laps are dropped.
pub fn build_lap_summary(rows: &[TaggedSample], lap_length_m: f64) -> Vec<LapSummary> {
    // Keyed grouping, not run-length grouping: repeated keys (a re-ingested
    // file name, interleaved batches) fold into one group instead of
    // splitting it. First and last sample of each group are kept; the last
    // decides completeness and provides the lap facts.
    let mut groups: BTreeMap<(&str, u32, i32, i32), (&TaggedSample, &TaggedSample)> =
        BTreeMap::new();
    for row in rows {
        groups
            .entry((
                row.filename.as_str(),
                row.session_no,
                row.restart_no,
                row.sample.lap_no,
            ))
            .and_modify(|(_, last)| *last = row)
            .or_insert((row, row));
    }

    groups
        .into_iter()
        .filter(|(_, (first, last))| is_lap_complete(first, last, lap_length_m))
        .map(|((filename, session_no, restart_no, lap_no), (_, last))| LapSummary {
            filename: filename.to_string(),
            session_no,
            restart_no,
            lap_no,
            car_ordinal: last.sample.car_ordinal,
            lap_time: last.sample.cur_lap_time,
        })
        .collect()
}

// A lap counts as complete when its last sample sits on the start/finish
// line within tolerance. The lap distance is a modulo value, so "on the
// line" shows up either just below the lap length or, when the raw distance
// is just past an exact multiple, just above zero. The second case needs a
// guard: a lap the capture cut off moments after it began also has a lap
// distance near zero, so the group must have covered close to a full lap
// circumference for the wrapped reading to mean "finished".
fn is_lap_complete(first: &TaggedSample, last: &TaggedSample, lap_length_m: f64) -> bool {
    let reached_line = last.cur_lap_distance >= lap_length_m - LAP_DISTANCE_TOLERANCE_M;
    let covered = last.sample.dist_traveled - first.sample.dist_traveled;
    let wrapped_past_line = last.cur_lap_distance <= LAP_DISTANCE_TOLERANCE_M
        && covered >= lap_length_m - 2.0 * LAP_DISTANCE_TOLERANCE_M;
    reached_line || wrapped_past_line
}

/// The completed lap with the lowest strictly positive lap time. Zero lap
/// times show up before the game has timed a full lap and are masked out.
pub fn best_lap(summary: &[LapSummary]) -> Option<&LapSummary> {
    summary
        .iter()
        .filter(|lap| lap.lap_time > 0.0)
        .min_by(|a, b| a.lap_time.total_cmp(&b.lap_time))
}
