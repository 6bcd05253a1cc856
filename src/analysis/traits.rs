//! Analysis trait abstractions
//!
//! The beat-tracking backend is swappable behind this trait; the pipeline
//! only depends on the contract: ascending beat timestamps, or empty when
//! the signal carries too little rhythmic information.

use crate::error::Result;
use crate::types::AudioBuffer;

/// Beat tracking backend
pub trait BeatTracker: Send + Sync {
    /// Derive beat timestamps (seconds, ascending, possibly empty) from
    /// a mono audio buffer
    fn track(&self, buffer: &AudioBuffer) -> Result<Vec<f64>>;

    /// Get the name of this tracker (for logging)
    fn name(&self) -> &'static str;
}
