// Session and restart tagging over a time-ordered batch.
//
// A session is a maximal run of one car ordinal. A restart begins each time
// the distance counter drops below zero: the game always places the car a
// few meters behind the start line when the player restarts or skips a lap,
// and that reset is the only reliable boundary signal (the reported lap
// number is not consistent across restarts).

use super::{Sample, TaggedSample};

/// Tags a time-ordered batch with session numbers, restart numbers and the
/// per-sample lap distance. Session numbering continues from
/// `prior_sessions` so batches merged into one accumulation never collide.
/// Returns the tagged rows and the updated total session count.
pub fn tag_batch(
    samples: Vec<Sample>,
    filename: &str,
    lap_length_m: f64,
    prior_sessions: u32,
) -> (Vec<TaggedSample>, u32) {
    debug_assert!(lap_length_m > 0.0, "validation admits only positive lap lengths");

    let mut session_no = prior_sessions;
    let mut prev_car: Option<i32> = None;
    let mut restart_no = -1i32;
    let mut prev_dist_positive = true;

    let mut rows = Vec::with_capacity(samples.len());
    for sample in samples {
        match prev_car {
            None => prev_car = Some(sample.car_ordinal),
            Some(car) if car != sample.car_ordinal => {
                session_no += 1;
                restart_no = -1;
                prev_car = Some(sample.car_ordinal);
            }
            Some(_) => {}
        }

        if prev_dist_positive && sample.dist_traveled < 0.0 {
            restart_no += 1;
        }
        prev_dist_positive = sample.dist_traveled >= 0.0;

        let cur_lap_distance = if sample.dist_traveled >= 0.0 {
            sample.dist_traveled % lap_length_m
        } else {
            0.0
        };

        rows.push(TaggedSample {
            filename: filename.to_string(),
            session_no,
            restart_no,
            cur_lap_distance,
            sample,
        });
    }

    let session_count = if rows.is_empty() {
        prior_sessions
    } else {
        session_no + 1
    };
    (rows, session_count)
}
