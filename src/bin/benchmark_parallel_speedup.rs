//! Run one batch sequentially and once in parallel, then print timings and speedup.
//!
//! Usage: cargo run --release --bin benchmark_parallel_speedup [runs]
//!
//! Run from the project root so data/ is available.

use std::time::Instant;

use shinsen::data::catalog::load_catalog;
use shinsen::data::roster::load_matchup;
use shinsen::data::{load_tuning, DEFAULT_DATA_DIR};
use shinsen::parallel::WorkerPool;
use shinsen::simulation::{simulate, simulate_parallel, SeedSequence};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let runs: usize = std::env::args()
        .nth(1)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(20_000);
    let seed = SeedSequence::new(12345);

    let data_dir = std::path::Path::new(DEFAULT_DATA_DIR);
    let catalog = load_catalog(data_dir)?;
    let tuning = load_tuning(data_dir.join("tuning.json"))?;
    let (roster_a, roster_b) = load_matchup(data_dir.join("matchup.json"))?.build(&catalog)?;

    println!("Battles: {runs} (matchup={}/matchup.json)", data_dir.display());
    println!();

    let t0 = Instant::now();
    let seq = simulate(&roster_a, &roster_b, &tuning, &seed, runs)?;
    let elapsed_seq = t0.elapsed();
    let seq_ms = elapsed_seq.as_secs_f64() * 1000.0;
    println!("Sequential:  {:.2} ms  ({:.1} battles/s)", seq_ms, runs as f64 / elapsed_seq.as_secs_f64());

    let pool = WorkerPool::default_workers();
    let t0 = Instant::now();
    let par = simulate_parallel(&roster_a, &roster_b, &tuning, &seed, runs, &pool)?;
    let elapsed_par = t0.elapsed();
    let par_ms = elapsed_par.as_secs_f64() * 1000.0;
    println!(
        "Parallel:    {:.2} ms  ({:.1} battles/s, {} workers)",
        par_ms,
        runs as f64 / elapsed_par.as_secs_f64(),
        pool.effective_workers()
    );

    println!();
    println!("Speedup:     {:.2}x faster (parallel vs sequential)", seq_ms / par_ms);

    if seq != par {
        return Err("parallel result differs from sequential result".into());
    }
    println!("(Results match sequential vs parallel)");
    Ok(())
}
