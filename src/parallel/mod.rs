pub mod batch;
pub mod pool;
pub mod progress;

pub use batch::{batch_ranges, batches_for};
pub use pool::WorkerPool;
pub use progress::Progress;
