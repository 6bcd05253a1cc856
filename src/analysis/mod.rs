//! Tempo analysis
//!
//! The trait abstraction allows swapping tracking backends without changing
//! pipeline code; the built-in backend is a spectral-flux tracker.

pub mod onset;
pub mod tempo;
pub mod tracker;
pub mod traits;

pub use tempo::{bpm_from_beats, TempoEstimator};
pub use tracker::SpectralFluxTracker;
pub use traits::BeatTracker;
