use forward_tracking::config::{self, write_json_file};
use forward_tracking::synthetic::{generate_event, SyntheticEvent};
use forward_tracking::{LineFitter, TrackFinder, TrackingReport};
use std::collections::BTreeSet;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = match env::args().nth(1) {
        Some(path) => config::load_config(Path::new(&path))?,
        None => {
            eprintln!("{}", usage());
            config::RuntimeConfig::default()
        }
    };

    let finder = TrackFinder::new(config.finder.clone()).map_err(|e| e.to_string())?;
    let event = generate_event(&config.event, &config.finder.geometry);
    let fitter = config.fit_sigma.map(LineFitter::new).unwrap_or_default();
    let report = finder
        .find_tracks(&event.records, &fitter)
        .map_err(|e| e.to_string())?;

    print_summary(&event, &report, config.output.list_tracks);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: track_demo <config.json> (running with defaults)".to_string()
}

fn print_summary(event: &SyntheticEvent, report: &TrackingReport, list_tracks: bool) {
    let trace = &report.trace;
    println!("Tracking summary");
    println!("  generated: {} hits, {} true tracks", event.records.len(), event.tracks.len());
    println!("  {}", trace.summary());
    for stage in &trace.segment_stages {
        println!(
            "  {}-hit segments: {} ({} edges), removed {} segments / {} edges",
            stage.segment_len, stage.segments, stage.edges, stage.removed_segments, stage.removed_edges
        );
    }
    for timing in &trace.timings.stages {
        println!("  {:<10} {:>8.3} ms", timing.label, timing.elapsed_ms);
    }

    // Record index == hit id for events built from records.
    let true_sets: BTreeSet<Vec<u32>> = event
        .tracks
        .iter()
        .filter(|t| t.len() >= 3)
        .map(|t| t.iter().map(|&i| i as u32).collect())
        .collect();
    let matched = report
        .tracks
        .iter()
        .filter(|t| true_sets.contains(&t.hit_ids().iter().map(|id| id.0).collect::<Vec<_>>()))
        .count();
    println!(
        "  found {} tracks, {} of {} reconstructable true tracks matched exactly",
        report.tracks.len(),
        matched,
        true_sets.len()
    );

    if list_tracks {
        for (i, track) in report.tracks.iter().enumerate() {
            let ids: Vec<String> = track.hits.iter().map(|h| h.id.0.to_string()).collect();
            println!(
                "  track {i}: quality {:.4} chi2 {:.3} hits [{}]",
                track.fit.quality,
                track.fit.chi2,
                ids.join(", ")
            );
        }
    }
}
