//! Decoded game-state snapshots.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use thiserror::Error;

/// How much of a malformed line is kept for diagnostics.
const RAW_DIAGNOSTIC_CHARS: usize = 100;

/// A line was not a well-formed snapshot object.
///
/// Recovery is the caller's: answer with the idle output for this cycle and
/// keep reading. The offending text is carried (truncated) for logging only.
#[derive(Debug, Error)]
#[error("malformed snapshot ({reason}): {raw:?}")]
pub struct DecodeError {
    pub reason: String,
    pub raw: String,
}

/// Top-level engine state as reported by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum MainState {
    #[serde(rename = "PLAYING")]
    Playing,
    #[serde(rename = "WAITING")]
    Waiting,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One note as reported in a snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteObservation {
    /// Target lane; values outside 0..=3 are ignored by the evaluator.
    #[serde(default = "unmapped_direction")]
    pub direction: i64,
    /// Absolute game-clock instant at which the note should be hit (ms).
    #[serde(default)]
    pub strum_time: f64,
    /// Game-clock reading at the moment this note was reported.
    #[serde(default)]
    pub conductor_time: Option<f64>,
    #[serde(default)]
    pub is_hold_note: bool,
    /// Extra duration the lane must stay held after the initial hit (ms).
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub may_hit: bool,
    #[serde(default)]
    pub has_missed: bool,
    #[serde(default)]
    pub has_been_hit: bool,
}

impl NoteObservation {
    /// The clock reading used as "now" for this note's timing offset:
    /// its own conductor time if present, else the snapshot's timestamp.
    pub fn reference_time(&self, snapshot_timestamp: f64) -> f64 {
        self.conductor_time.unwrap_or(snapshot_timestamp)
    }
}

fn unmapped_direction() -> i64 {
    -1
}

/// One decoded frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub main_state: MainState,
    #[serde(default)]
    pub is_playing: bool,
    /// Conductor-time fallback for notes that omit their own (ms).
    #[serde(default = "wall_clock_ms")]
    pub timestamp: f64,
    #[serde(default)]
    pub notes: Vec<NoteObservation>,
}

impl Snapshot {
    /// Whether this snapshot drives lane decisions at all.
    pub fn is_active(&self) -> bool {
        self.main_state == MainState::Playing && self.is_playing
    }
}

/// Wall clock in the same unit as game time, used when a snapshot omits
/// its timestamp.
fn wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Parse one raw line as a snapshot.
pub fn decode_snapshot(line: &str) -> Result<Snapshot, DecodeError> {
    serde_json::from_str(line).map_err(|e| DecodeError {
        reason: e.to_string(),
        raw: line.chars().take(RAW_DIAGNOSTIC_CHARS).collect(),
    })
}
