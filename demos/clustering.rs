//! Density peak clustering on a distance file or a synthetic 2D dataset.
//!
//! ```text
//! cargo run --example clustering                       # synthetic blobs
//! cargo run --example clustering -- distances.txt 5 2  # file, thresholds
//! RUST_LOG=dpeak=debug cargo run --example clustering  # stage logs
//! ```
//!
//! Distance files hold one `i j d` record per line with 1-based ids.

use dpeak::cluster::{DcSelection, DensityPeaks};
use dpeak::distance::io::load_distances;
use dpeak::distance::{DistanceIndex, DistanceMatrix, Euclidean};
use dpeak::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn blobs() -> Vec<Vec<f32>> {
    let mut data = Vec::new();
    for (cx, cy) in [(0.0f32, 0.0f32), (5.0, 5.0), (10.0, 0.0)] {
        for k in 0..20 {
            let angle = k as f32 * 0.9;
            let radius = 0.1 + (k % 5) as f32 * 0.12;
            data.push(vec![cx + radius * angle.cos(), cy + radius * angle.sin()]);
        }
    }
    data
}

fn parse_arg<T: std::str::FromStr>(
    arg: Option<&String>,
    name: &'static str,
    default: T,
) -> dpeak::Result<T> {
    match arg {
        None => Ok(default),
        Some(s) => s.parse().map_err(|_| Error::InvalidParameter {
            name,
            message: "could not parse command line value",
        }),
    }
}

fn run<D: DistanceIndex + ?Sized>(
    index: &D,
    density_threshold: f64,
    distance_threshold: f32,
) -> dpeak::Result<()> {
    let model = DensityPeaks::new(density_threshold, distance_threshold)
        .with_dc_selection(DcSelection::auto())
        .with_parallel(true);

    // The decision graph is threshold-independent: inspect it, then assign.
    let graph = model.decision_graph(index)?;
    let mut ranked: Vec<(usize, f64, f32)> = graph
        .points()
        .enumerate()
        .map(|(i, (rho, delta))| (i, rho, delta))
        .collect();
    ranked.sort_by(|a, b| (f64::from(b.2) * b.1).total_cmp(&(f64::from(a.2) * a.1)));
    println!("dc = {:.4} (converged: {})", graph.dc().dc, graph.dc().converged);
    println!("top of the decision graph (rho * delta):");
    for &(i, rho, delta) in ranked.iter().take(5) {
        println!("  point {:4}  rho {:8.3}  delta {:8.3}", i + 1, rho, delta);
    }

    let fit = graph.assign(density_threshold, distance_threshold)?;
    println!("\n{} clusters, {} unassigned", fit.n_clusters(), fit.halo().len());
    for (center, members) in fit.clusters() {
        info!(
            center = center + 1,
            rho = fit.rho()[center],
            delta = fit.delta()[center],
            size = members.len(),
            "cluster"
        );
        println!(
            "  center {:4}  rho {:8.3}  delta {:8.3}  size {}",
            center + 1,
            fit.rho()[center],
            fit.delta()[center],
            members.len()
        );
    }
    Ok(())
}

fn main() -> dpeak::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first() {
        Some(path) => {
            let table = load_distances(path)?;
            let density_threshold = parse_arg(args.get(1), "density_threshold", 1.0)?;
            let distance_threshold = parse_arg(args.get(2), "distance_threshold", 0.1)?;
            run(&table, density_threshold, distance_threshold)
        }
        None => {
            let matrix = DistanceMatrix::from_vectors(&blobs(), &Euclidean)?;
            run(&matrix, 0.5, 2.0)
        }
    }
}
