// Integration tests for the full capture-file-to-lap-summary flow
//
// These tests drive the engine the way the application does:
// 1. Write capture files to disk
// 2. Read and ingest them through one SessionManager
// 3. Check the annotated table and the lap summary
// 4. Export and reload the results

use std::io::Write;
use std::path::PathBuf;

use pitwall::telemetry::read_batch_file;
use pitwall::{LapSummary, PitwallError, SessionManager, TaggedSample, TrackTable, writer};
use tempfile::TempDir;

const HEADER: &str =
    "timestamp_ms,car_ordinal,track_ordinal,dist_traveled,lap_no,last_lap_time,cur_lap_time,speed";

// Maple Valley in the test reference data
const TRACK: i32 = 101;
const LAP_LENGTH: f64 = 1500.0;

fn tracks() -> TrackTable {
    let mut tracks = TrackTable::new();
    tracks.insert(TRACK, LAP_LENGTH);
    tracks.insert(202, 6515.0);
    tracks
}

fn write_capture(dir: &TempDir, name: &str, rows: &[String]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create capture file");
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    path
}

fn capture_row(
    timestamp_ms: u32,
    car_ordinal: i32,
    dist_traveled: f64,
    lap_no: i32,
    cur_lap_time: f64,
) -> String {
    format!("{timestamp_ms},{car_ordinal},{TRACK},{dist_traveled},{lap_no},0.0,{cur_lap_time},44.7")
}

#[test]
fn test_single_capture_file_produces_lap_summary() {
    let dir = TempDir::new().unwrap();
    let path = write_capture(
        &dir,
        "morning.csv",
        &[
            // lap 0 from behind the start line to the line
            capture_row(0, 5, -2.0, 0, 0.0),
            capture_row(1000, 5, 750.0, 0, 45.0),
            capture_row(2000, 5, 1499.0, 0, 89.5),
            // lap 1 abandoned mid-lap
            capture_row(3000, 5, 1501.0, 1, 0.1),
            capture_row(4000, 5, 2250.0, 1, 45.2),
        ],
    );

    let mut manager = SessionManager::new(tracks());
    let batch = read_batch_file(&path).expect("Failed to read capture file");
    let report = manager.ingest(batch, "morning.csv").unwrap();

    assert_eq!(report.samples, 5);
    assert_eq!(report.sessions_added, 1);
    assert!(!report.wrap_corrected);

    // only the finished lap survives
    let summary = manager.lap_summary();
    assert_eq!(summary.len(), 1, "expected one completed lap: {summary:?}");
    assert_eq!(summary[0].filename, "morning.csv");
    assert_eq!(summary[0].session_no, 0);
    assert_eq!(summary[0].restart_no, 0);
    assert_eq!(summary[0].lap_no, 0);
    assert_eq!(summary[0].car_ordinal, 5);
    assert_eq!(summary[0].lap_time, 89.5);

    // passthrough channels survive into the annotated table
    assert_eq!(manager.samples()[0].sample.extras.get("speed"), Some(&44.7));
}

#[test]
fn test_sessions_number_contiguously_across_files() {
    let dir = TempDir::new().unwrap();
    let first = write_capture(
        &dir,
        "first.csv",
        &[
            capture_row(0, 5, -2.0, 0, 0.0),
            capture_row(1000, 5, 1500.0, 0, 90.0),
        ],
    );
    let second = write_capture(
        &dir,
        "second.csv",
        &[
            capture_row(0, 7, -3.0, 0, 0.0),
            capture_row(1000, 7, 1500.0, 0, 92.0),
        ],
    );

    let mut manager = SessionManager::new(tracks());
    for (path, name) in [(&first, "first.csv"), (&second, "second.csv")] {
        let batch = read_batch_file(path).unwrap();
        manager.ingest(batch, name).unwrap();
    }

    assert_eq!(manager.session_count(), 2);
    let sessions: Vec<u32> = manager.samples().iter().map(|r| r.session_no).collect();
    assert_eq!(sessions, vec![0, 0, 1, 1]);

    let summary = manager.lap_summary();
    assert_eq!(summary.len(), 2);
    assert_eq!(
        summary
            .iter()
            .map(|l| (l.filename.as_str(), l.session_no))
            .collect::<Vec<_>>(),
        vec![("first.csv", 0), ("second.csv", 1)]
    );
}

#[test]
fn test_track_mismatch_is_atomic() {
    let dir = TempDir::new().unwrap();
    let good = write_capture(
        &dir,
        "good.csv",
        &[
            capture_row(0, 5, -2.0, 0, 0.0),
            capture_row(1000, 5, 1500.0, 0, 90.0),
        ],
    );
    let other_track = write_capture(
        &dir,
        "other.csv",
        &["0,5,202,10.0,0,0.0,1.0,44.7".to_string()],
    );

    let mut manager = SessionManager::new(tracks());
    manager
        .ingest(read_batch_file(&good).unwrap(), "good.csv")
        .unwrap();

    let rows_before: Vec<TaggedSample> = manager.samples().to_vec();
    let summary_before: Vec<LapSummary> = manager.lap_summary().to_vec();
    let before = serde_json::to_string(&(&rows_before, &summary_before)).unwrap();

    let err = manager
        .ingest(read_batch_file(&other_track).unwrap(), "other.csv")
        .unwrap_err();
    assert!(
        matches!(err, PitwallError::MixedBatchTrack { .. }),
        "expected MixedBatchTrack, got {err:?}"
    );

    // the accumulation is byte-for-byte what it was
    let after =
        serde_json::to_string(&(manager.samples(), manager.lap_summary())).unwrap();
    assert_eq!(before, after);
    assert_eq!(manager.session_count(), 1);
}

#[test]
fn test_missing_fields_are_reported_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "timestamp_ms,car_ordinal,speed").unwrap();
    writeln!(file, "0,5,44.7").unwrap();

    let err = read_batch_file(&path).unwrap_err();
    match err {
        PitwallError::MissingFields { fields } => {
            assert!(fields.contains(&"dist_traveled".to_string()));
            assert!(fields.contains(&"track_ordinal".to_string()));
        }
        other => panic!("expected MissingFields, got {other:?}"),
    }
}

#[test]
fn test_wrapped_capture_is_reordered_transparently() {
    let dir = TempDir::new().unwrap();
    // the device counter wraps mid-capture; distances record the true order
    let path = write_capture(
        &dir,
        "overnight.csv",
        &[
            capture_row(u32::MAX - 200, 5, -2.0, 0, 0.0),
            capture_row(u32::MAX - 100, 5, 700.0, 0, 40.0),
            capture_row(50, 5, 1499.5, 0, 89.9),
            capture_row(150, 5, 1502.0, 1, 0.2),
        ],
    );

    let mut manager = SessionManager::new(tracks());
    let report = manager
        .ingest(read_batch_file(&path).unwrap(), "overnight.csv")
        .unwrap();

    assert!(report.wrap_corrected);
    let dists: Vec<f64> = manager
        .samples()
        .iter()
        .map(|r| r.sample.dist_traveled)
        .collect();
    assert_eq!(dists, vec![-2.0, 700.0, 1499.5, 1502.0]);

    // the wrap never splits the session or the lap
    assert_eq!(manager.session_count(), 1);
    assert_eq!(manager.lap_summary().len(), 1);
    assert_eq!(manager.lap_summary()[0].lap_time, 89.9);
}

#[test]
fn test_exports_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = write_capture(
        &dir,
        "evening.csv",
        &[
            capture_row(0, 5, -2.0, 0, 0.0),
            capture_row(1000, 5, 1500.0, 0, 90.0),
        ],
    );

    let mut manager = SessionManager::new(tracks());
    manager
        .ingest(read_batch_file(&path).unwrap(), "evening.csv")
        .unwrap();

    let annotated_path = dir.path().join("annotated.jsonl");
    let summary_path = dir.path().join("summary.jsonl");
    writer::write_annotated(&annotated_path, manager.samples()).unwrap();
    writer::write_summary(&summary_path, manager.lap_summary()).unwrap();

    let annotated: Vec<TaggedSample> = serde_jsonlines::json_lines(&annotated_path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(annotated.as_slice(), manager.samples());

    let summary: Vec<LapSummary> = serde_jsonlines::json_lines(&summary_path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(summary.as_slice(), manager.lap_summary());
}
