//! Progress reporting for pipeline stages.
//!
//! Stages report through [`ProgressCallback`] so that the library never
//! depends on a terminal. The binary plugs in `indicatif` bars; tests and
//! library callers use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a loading or pipeline stage.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (files, stages).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Replace the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Mark the work as complete, leaving `msg` on screen.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
