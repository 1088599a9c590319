//! Side observers of the decoded snapshot stream.

use fnf_protocol::{MainState, Snapshot};
use tracing::{debug, info};

/// Receives every successfully decoded snapshot.
///
/// Strictly one-directional: implementations (a frame visualizer, a stats
/// recorder) see the state and feed nothing back into the decision path.
pub trait SnapshotObserver: Send {
    fn on_snapshot(&mut self, snapshot: &Snapshot);
}

/// Logs main-state transitions and per-frame note counts.
#[derive(Debug, Default)]
pub struct StateTraceObserver {
    last_state: Option<(MainState, bool)>,
    frames: u64,
}

impl SnapshotObserver for StateTraceObserver {
    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.frames += 1;
        let state = (snapshot.main_state, snapshot.is_playing);
        if self.last_state != Some(state) {
            info!(
                state = ?snapshot.main_state,
                playing = snapshot.is_playing,
                frame = self.frames,
                "game state changed"
            );
            self.last_state = Some(state);
        }
        debug!(frame = self.frames, notes = snapshot.notes.len(), "snapshot");
    }
}
