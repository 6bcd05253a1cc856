//! Batch progress reporting
//!
//! The pipeline reports progress through an observer interface instead of a
//! bare callback, so it stays decoupled from any particular presentation.
//! `ChannelProgress` turns updates into an event stream a front end can
//! drain from another thread; `NoopProgress` serves non-interactive callers.

use crossbeam_channel::Sender;

/// One progress event: `completed` of `total` items are done
///
/// `completed` is monotonically increasing and reaches `total` exactly once,
/// at batch completion, even if individual items failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
}

/// Receiver of per-item batch progress
///
/// Implementations must not block the batch.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

/// Observer that discards updates
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Observer that forwards updates into a channel
///
/// Sends are non-blocking; if the receiver is gone the update is dropped -
/// a missing listener must not stall the batch.
pub struct ChannelProgress {
    sender: Sender<ProgressUpdate>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<ProgressUpdate>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        let _ = self.sender.try_send(ProgressUpdate { completed, total });
    }
}
