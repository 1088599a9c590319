//! Wire layer for the autoplay bridge.
//!
//! Both directions speak newline-delimited UTF-8 over a stream socket:
//! inbound lines are JSON game-state snapshots, outbound lines are either
//! a full action line (`none` / `left,down`) or discrete input events.

pub mod framing;
pub mod lane;
pub mod snapshot;
pub mod wire;

pub use framing::LineReader;
pub use lane::Lane;
pub use snapshot::{DecodeError, MainState, NoteObservation, Snapshot, decode_snapshot};
