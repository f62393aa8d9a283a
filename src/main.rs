use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use pitwall::telemetry::{best_lap, format_lap_time, read_batch_file};
use pitwall::{PitwallError, SessionManager, TrackTable, writer};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process capture files and print the completed-lap table
    Process {
        /// Capture files (.csv or .tsv), ingested in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Track data file; defaults to the application data directory
        #[arg(short, long)]
        tracks: Option<PathBuf>,

        /// Write the annotated sample table to this JSON Lines file
        #[arg(long)]
        annotated_out: Option<PathBuf>,

        /// Write the lap summary to this JSON Lines file
        #[arg(long)]
        summary_out: Option<PathBuf>,
    },
    /// List the known tracks from the track data file
    Tracks {
        /// Track data file; defaults to the application data directory
        #[arg(short, long)]
        tracks: Option<PathBuf>,
    },
}

fn load_tracks(path: &Option<PathBuf>) -> Result<TrackTable, PitwallError> {
    let path = match path {
        Some(path) => path.clone(),
        None => TrackTable::default_data_path()?,
    };
    TrackTable::from_csv_path(&path)
}

fn process(
    files: &[PathBuf],
    tracks: &Option<PathBuf>,
    annotated_out: &Option<PathBuf>,
    summary_out: &Option<PathBuf>,
) -> Result<(), PitwallError> {
    let track_table = load_tracks(tracks)?;
    let mut manager = SessionManager::new(track_table);

    for file in files {
        let batch = read_batch_file(file)?;
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        let report = manager.ingest(batch, &filename)?;
        if report.wrap_corrected {
            info!("{}: device timestamp wrapped during this capture", report.filename);
        }
    }

    println!(
        "{:<28} {:>7} {:>7} {:>5} {:>6} {:>12}",
        "file", "session", "restart", "lap", "car", "lap time"
    );
    let best = best_lap(manager.lap_summary());
    for lap in manager.lap_summary() {
        let marker = match best {
            Some(best) if std::ptr::eq(best, lap) => " *",
            _ => "",
        };
        println!(
            "{:<28} {:>7} {:>7} {:>5} {:>6} {:>12}{}",
            lap.filename,
            lap.session_no,
            lap.restart_no,
            lap.lap_no,
            lap.car_ordinal,
            format_lap_time(lap.lap_time),
            marker
        );
    }

    if let Some(out) = annotated_out {
        writer::write_annotated(out, manager.samples())?;
        info!("Wrote annotated samples to {}", out.display());
    }
    if let Some(out) = summary_out {
        writer::write_summary(out, manager.lap_summary())?;
        info!("Wrote lap summary to {}", out.display());
    }
    Ok(())
}

fn list_tracks(tracks: &Option<PathBuf>) -> Result<(), PitwallError> {
    let table = load_tracks(tracks)?;
    for (ordinal, lap_length_m) in table.entries() {
        println!("{ordinal:>8}  {lap_length_m:>10.1} m");
    }
    Ok(())
}

fn main() {
    colog::init();

    let cli = Args::parse();
    match &cli.command {
        Commands::Process {
            files,
            tracks,
            annotated_out,
            summary_out,
        } => {
            process(files, tracks, annotated_out, summary_out)
                .expect("Error while processing capture files");
        }
        Commands::Tracks { tracks } => {
            list_tracks(tracks).expect("Error while listing tracks");
        }
    };
}
