use std::ops::Range;

use rayon::prelude::*;

use crate::combat::engine::{BattleSetup, TraceMode};
use crate::combat::rng::{derive_seed, RandomSource, Rng};
use crate::data::roster::Roster;
use crate::data::tuning::TuningTable;
use crate::error::{ConfigError, SimResult};
use crate::parallel::{batch_ranges, batches_for, Progress, WorkerPool};
use crate::simulation::aggregate::{AggregateResult, RunSummary, RunTally};

/// Runs per progress batch when no batch count is given.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Hands out an independent random source for each run index. The source for
/// a run depends only on its index, never on scheduling, so sequential and
/// parallel batches see the same draws.
pub trait RngFactory: Sync {
    type Source: RandomSource;

    fn source_for(&self, run: u64) -> Self::Source;
}

impl<F: RngFactory + ?Sized> RngFactory for &F {
    type Source = F::Source;

    fn source_for(&self, run: u64) -> Self::Source {
        (**self).source_for(run)
    }
}

/// SplitMix64 streams derived from `(base_seed, offset + run)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSequence {
    pub base_seed: u64,
    pub offset: u64,
}

impl SeedSequence {
    pub fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            offset: 0,
        }
    }

    /// Continue the sequence after `runs` already-simulated runs.
    pub fn skip(self, runs: u64) -> Self {
        Self {
            offset: self.offset.wrapping_add(runs),
            ..self
        }
    }
}

impl RngFactory for SeedSequence {
    type Source = Rng;

    fn source_for(&self, run: u64) -> Rng {
        Rng::new(derive_seed(self.base_seed, self.offset.wrapping_add(run)))
    }
}

/// How a progress-reporting batch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Completed(AggregateResult),
    /// Stopped between batches; `completed` runs had finished.
    Cancelled { completed: u64 },
}

fn prepare<'a>(
    roster_a: &'a Roster,
    roster_b: &'a Roster,
    tuning: &TuningTable,
    runs: usize,
) -> SimResult<BattleSetup<'a>> {
    if runs == 0 {
        return Err(ConfigError::EmptyBatch.into());
    }
    Ok(BattleSetup::new(roster_a, roster_b, tuning)?.trace(TraceMode::Off))
}

fn run_one<F: RngFactory>(setup: &BattleSetup<'_>, factory: &F, run: usize) -> SimResult<RunSummary> {
    let mut rng = factory.source_for(run as u64);
    setup.run(&mut rng).map(RunSummary::from)
}

fn run_range_parallel<F: RngFactory>(
    setup: &BattleSetup<'_>,
    factory: &F,
    range: Range<usize>,
) -> SimResult<RunTally> {
    let runs: Vec<RunSummary> = range
        .into_par_iter()
        .map(|run| run_one(setup, factory, run))
        .collect::<SimResult<_>>()?;
    Ok(runs.into_iter().collect())
}

fn log_result(result: &AggregateResult) {
    tracing::info!(
        runs = result.runs,
        win_rate_a = result.win_rate_a,
        win_rate_b = result.win_rate_b,
        draw_rate = result.draw_rate,
        "simulation batch finished"
    );
}

/// Resolve `runs` independent battles and fold them into one result.
///
/// Configuration errors are reported before the first battle; an invariant
/// violation in any battle aborts the whole batch.
pub fn simulate<F: RngFactory>(
    roster_a: &Roster,
    roster_b: &Roster,
    tuning: &TuningTable,
    factory: &F,
    runs: usize,
) -> SimResult<AggregateResult> {
    let setup = prepare(roster_a, roster_b, tuning, runs)?;
    tracing::debug!(runs, "starting sequential simulation");
    let mut tally = RunTally::new();
    for run in 0..runs {
        tally.record(&run_one(&setup, factory, run)?);
    }
    let result = tally.finish();
    log_result(&result);
    Ok(result)
}

/// Like [simulate] but distributes runs across `pool`. Runs are folded in
/// index order, so the result equals the sequential one for the same factory.
pub fn simulate_parallel<F: RngFactory>(
    roster_a: &Roster,
    roster_b: &Roster,
    tuning: &TuningTable,
    factory: &F,
    runs: usize,
    pool: &WorkerPool,
) -> SimResult<AggregateResult> {
    let setup = prepare(roster_a, roster_b, tuning, runs)?;
    tracing::debug!(runs, workers = pool.effective_workers(), "starting parallel simulation");
    let tally = pool.install(|| run_range_parallel(&setup, factory, 0..runs))?;
    let result = tally.finish();
    log_result(&result);
    Ok(result)
}

/// Parallel simulation in `batches` chunks, reporting `(completed, total)`
/// after each chunk and stopping early once `progress` is cancelled.
#[allow(clippy::too_many_arguments)]
pub fn simulate_with_progress<F, P>(
    roster_a: &Roster,
    roster_b: &Roster,
    tuning: &TuningTable,
    factory: &F,
    runs: usize,
    pool: &WorkerPool,
    progress: &Progress,
    mut on_progress: P,
) -> SimResult<BatchOutcome>
where
    F: RngFactory,
    P: FnMut(u64, u64),
{
    let setup = prepare(roster_a, roster_b, tuning, runs)?;
    let ranges = batch_ranges(runs, batches_for(runs, DEFAULT_BATCH_SIZE));
    progress.start(runs as u64);
    tracing::debug!(runs, batches = ranges.len(), "starting batched simulation");

    let mut tally = RunTally::new();
    for (start, end) in ranges {
        if progress.is_cancelled() {
            let completed = tally.runs();
            tracing::info!(completed, total = runs, "simulation cancelled");
            return Ok(BatchOutcome::Cancelled { completed });
        }
        let chunk = pool.install(|| run_range_parallel(&setup, factory, start..end))?;
        tally.merge(chunk);
        let done = progress.advance((end - start) as u64);
        on_progress(done, runs as u64);
    }

    let result = tally.finish();
    log_result(&result);
    Ok(BatchOutcome::Completed(result))
}
