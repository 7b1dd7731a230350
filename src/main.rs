use forward_tracking::{FinderParams, HitRecord, LineFitter, TrackFinder};

fn main() {
    // Demo stub: one straight forward track through five disks
    let records: Vec<HitRecord> = (1..=5)
        .map(|layer| {
            let z = 200.0 * layer as f64;
            HitRecord::new([0.15 * z, 0.05 * z, z], 1, layer, 0, 0)
        })
        .collect();

    let finder = match TrackFinder::new(FinderParams::default()) {
        Ok(finder) => finder,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };
    match finder.find_tracks(&records, &LineFitter::default()) {
        Ok(report) => println!(
            "tracks={} latency_ms={:.3}",
            report.tracks.len(),
            report.trace.timings.total_ms
        ),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
