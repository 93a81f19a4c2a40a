pub mod aggregate;
pub mod monte_carlo;

pub use aggregate::{
    AggregateResult, LossStats, OutcomeCounts, RunSummary, RunTally, SkillTrigger,
    TOP_TRIGGER_COUNT,
};
pub use monte_carlo::{
    simulate, simulate_parallel, simulate_with_progress, BatchOutcome, RngFactory, SeedSequence,
    DEFAULT_BATCH_SIZE,
};
