//! Hooks for watching the scheduler work.

use crate::body::BodyId;

/// Observes scheduler ticks (debugging, profiling, tests).
///
/// All methods default to no-ops.
pub trait TickObserver {
    /// A tick arrived before the target interval elapsed and was skipped.
    fn on_frame_skipped(&mut self, _elapsed_ms: f64) {}

    /// A physics substep is about to run.
    fn on_substep(&mut self, _index: usize) {}

    /// One body was advanced.
    fn on_body_update(&mut self, _id: BodyId, _neighbor_count: usize) {}

    /// The draw callback returned successfully.
    fn on_draw(&mut self) {}

    /// The adaptive target interval changed.
    fn on_target_interval(&mut self, _interval_ms: f64) {}
}

/// Observer that ignores everything.
pub struct NoOpTickObserver;

impl TickObserver for NoOpTickObserver {}

/// Counts events; handy in tests and benches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickCounter {
    pub skipped_frames: usize,
    pub substeps: usize,
    pub body_updates: usize,
    pub draws: usize,
    pub interval_changes: usize,
}

impl TickObserver for TickCounter {
    fn on_frame_skipped(&mut self, _elapsed_ms: f64) {
        self.skipped_frames += 1;
    }

    fn on_substep(&mut self, _index: usize) {
        self.substeps += 1;
    }

    fn on_body_update(&mut self, _id: BodyId, _neighbor_count: usize) {
        self.body_updates += 1;
    }

    fn on_draw(&mut self) {
        self.draws += 1;
    }

    fn on_target_interval(&mut self, _interval_ms: f64) {
        self.interval_changes += 1;
    }
}
