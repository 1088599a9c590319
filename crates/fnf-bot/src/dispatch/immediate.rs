use fnf_engine::ActionSet;
use fnf_protocol::wire;

use crate::error::SessionError;
use crate::session::LineSender;

/// Answers every snapshot with the effective command for all four lanes,
/// continuing holds included. Runs fully synchronously within the
/// snapshot-processing step; the line is a full state, not a diff.
pub struct ImmediateDispatcher {
    out: LineSender,
}

impl ImmediateDispatcher {
    pub fn new(out: LineSender) -> Self {
        Self { out }
    }

    pub fn dispatch(&self, actions: &ActionSet) -> Result<(), SessionError> {
        self.send(wire::format_actions(&actions.active_lanes()))
    }

    /// The safe default for cycles that could not be evaluated.
    pub fn dispatch_idle(&self) -> Result<(), SessionError> {
        self.send(wire::NO_ACTION.to_string())
    }

    fn send(&self, line: String) -> Result<(), SessionError> {
        self.out.send(line).map_err(|_| SessionError::WriterClosed)
    }
}
