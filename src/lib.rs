//! Monte Carlo battle-outcome simulator for two rosters of up to three units.
//!
//! [combat] resolves one battle; [simulation] runs many and aggregates them;
//! [data] loads the unit/skill catalog and tuning coefficients.

pub mod cli;
pub mod combat;
pub mod data;
pub mod error;
pub mod parallel;
pub mod server;
pub mod simulation;

pub use error::{ConfigError, DataError, SimError, SimResult};
