//! Per-lane hold-note state machine.

use fnf_protocol::Lane;
use tracing::debug;

/// A hold in progress on one lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldState {
    /// Conductor time at which the hold was accepted.
    pub started_at: f64,
    /// Conductor time at which the lane may release.
    pub end_time: f64,
}

/// Tracks at most one active hold per lane.
///
/// Lifecycle per lane: Idle -> Holding via [`HoldTracker::begin_hold`]
/// (evaluator acceptance only), Holding -> Idle via [`HoldTracker::expire`]
/// once the end time is reached, or unconditionally via
/// [`HoldTracker::clear`] when the engine leaves the playing state.
/// A lane cannot re-arm while already holding.
#[derive(Debug, Default)]
pub struct HoldTracker {
    holds: [Option<HoldState>; 4],
}

impl HoldTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the lane is currently held.
    pub fn is_holding(&self, lane: Lane) -> bool {
        self.holds[lane.index()].is_some()
    }

    /// Open a hold on an idle lane. A lane already holding keeps its
    /// current hold; the evaluator never re-arms a held lane.
    pub fn begin_hold(&mut self, lane: Lane, started_at: f64, end_time: f64) {
        let slot = &mut self.holds[lane.index()];
        if slot.is_none() {
            debug!(lane = lane.key_name(), end_time, "hold started");
            *slot = Some(HoldState {
                started_at,
                end_time,
            });
        }
    }

    /// Release every hold whose end time has elapsed. Run once per cycle,
    /// before lane evaluation.
    pub fn expire(&mut self, current_conductor_time: f64) {
        for (index, slot) in self.holds.iter_mut().enumerate() {
            let expired = matches!(slot, Some(hold) if current_conductor_time >= hold.end_time);
            if expired {
                debug!(lane = index, "hold ended");
                *slot = None;
            }
        }
    }

    /// Drop every hold unconditionally (engine left the playing state).
    pub fn clear(&mut self) {
        self.holds = [None; 4];
    }

    /// Number of lanes currently held.
    pub fn active_count(&self) -> usize {
        self.holds.iter().filter(|h| h.is_some()).count()
    }
}
