//! Per-tick reporting.

use crate::mover::MoveOutcome;

/// Totals for one pass of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Nodes (or deferred entries) that were acted on.
    pub attempted: u32,
    pub moved: u32,
    pub destroyed: u32,
    /// Attempts aborted by a mid-move error.
    pub failed: u32,
    /// Deferred entries discarded without acting.
    pub dropped: u32,
}

impl PassReport {
    pub(crate) fn record(&mut self, outcome: &MoveOutcome) {
        self.moved += outcome.moved;
        self.destroyed += outcome.destroyed;
    }
}

/// Result of an `Engine::step()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Steps taken so far, including this one.
    pub tick: u64,
    /// True if the step ran while paused and did nothing.
    pub paused: bool,
    pub deferred: PassReport,
    pub suction: PassReport,
    pub transfer: PassReport,
}

impl TickReport {
    pub fn moved(&self) -> u32 {
        self.deferred.moved + self.suction.moved + self.transfer.moved
    }
}
