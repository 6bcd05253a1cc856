//! Pipeline orchestration

pub mod runner;

pub use runner::{run, run_batch, run_with_observer, CancelToken};
