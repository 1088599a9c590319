use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fnf_protocol::{Lane, Snapshot, wire};
use tracing::debug;

use crate::session::LineSender;

/// Notes further out than this are left for a later snapshot.
const SCHEDULE_HORIZON_MS: f64 = 150.0;
/// How long a scheduled press stays down before its paired release.
const KEY_HOLD_MS: u64 = 60;

/// Identity of a scheduled note: whole-millisecond strum time plus lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NoteId {
    strum_ms: i64,
    lane: Lane,
}

impl NoteId {
    fn new(strum_time: f64, lane: Lane) -> Self {
        Self {
            strum_ms: strum_time.round() as i64,
            lane,
        }
    }
}

/// Latency-compensated dispatch for a thin game client.
///
/// Each accepted note spawns an isolated timed task that presses at
/// `strum_time - latency_compensation` (clamped to not-before-now) and
/// releases a fixed short interval later. Tasks share only the outbound
/// line channel and the identity registry; a note pruned from the registry
/// before its task fires turns that fire into a no-op.
pub struct DeferredDispatcher {
    out: LineSender,
    latency_compensation_ms: f64,
    scheduled: Arc<Mutex<HashSet<NoteId>>>,
}

impl DeferredDispatcher {
    pub fn new(out: LineSender, latency_compensation_ms: f64) -> Self {
        Self {
            out,
            latency_compensation_ms,
            scheduled: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Consume one snapshot: drop stale identities, schedule new ones.
    pub fn observe(&self, snapshot: &Snapshot) {
        let upstream: HashSet<NoteId> = snapshot
            .notes
            .iter()
            .filter_map(|note| {
                let lane = Lane::from_direction(note.direction)?;
                (!note.has_been_hit && !note.has_missed)
                    .then(|| NoteId::new(note.strum_time, lane))
            })
            .collect();

        // A scheduled note that vanished upstream was hit, missed, or
        // expired through another path; its pending fire becomes a no-op.
        self.scheduled
            .lock()
            .unwrap()
            .retain(|id| upstream.contains(id));

        for note in &snapshot.notes {
            let Some(lane) = Lane::from_direction(note.direction) else {
                continue;
            };
            if note.has_been_hit || note.has_missed {
                continue;
            }

            // The press is scheduled for when the note will be due, so
            // `may_hit` is not required here; the horizon gates earliness.
            let time_until_hit = note.strum_time - note.reference_time(snapshot.timestamp);
            if !(0.0..=SCHEDULE_HORIZON_MS).contains(&time_until_hit) {
                continue;
            }

            let id = NoteId::new(note.strum_time, lane);
            // Re-observation of an already scheduled identity is a no-op.
            if !self.scheduled.lock().unwrap().insert(id) {
                continue;
            }

            let fire_in_ms = (time_until_hit - self.latency_compensation_ms).max(0.0);
            debug!(lane = lane.key_name(), fire_in_ms, "scheduling press");
            tokio::spawn(fire(
                self.out.clone(),
                Arc::clone(&self.scheduled),
                id,
                lane,
                Duration::from_secs_f64(fire_in_ms / 1000.0),
            ));
        }
    }

    /// Forget every scheduled identity (engine left the playing state).
    /// In-flight tasks notice on their pre-fire registry check.
    pub fn clear(&self) {
        self.scheduled.lock().unwrap().clear();
    }

    /// Identities currently scheduled.
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }
}

/// Timed press/release pair for one scheduled note.
async fn fire(
    out: LineSender,
    scheduled: Arc<Mutex<HashSet<NoteId>>>,
    id: NoteId,
    lane: Lane,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    if !scheduled.lock().unwrap().contains(&id) {
        debug!(lane = lane.key_name(), "scheduled note gone, skipping fire");
        return;
    }

    // Send failures mean the connection is gone; delivery is moot.
    let _ = out.send(wire::input_event_line(lane, true));
    tokio::time::sleep(Duration::from_millis(KEY_HOLD_MS)).await;
    let _ = out.send(wire::input_event_line(lane, false));

    scheduled.lock().unwrap().remove(&id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnf_protocol::{MainState, NoteObservation};
    use tokio::sync::mpsc;

    fn upcoming_note(direction: i64, strum_time: f64) -> NoteObservation {
        NoteObservation {
            direction,
            strum_time,
            conductor_time: None,
            is_hold_note: false,
            length: 0.0,
            may_hit: false,
            has_missed: false,
            has_been_hit: false,
        }
    }

    fn snapshot(timestamp: f64, notes: Vec<NoteObservation>) -> Snapshot {
        Snapshot {
            main_state: MainState::Playing,
            is_playing: true,
            timestamp,
            notes,
        }
    }

    fn pressed(line: &str) -> bool {
        line.contains("\"pressed\":true")
    }

    #[tokio::test(start_paused = true)]
    async fn press_fires_no_earlier_than_compensated_time() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = DeferredDispatcher::new(tx, 30.0);

        // strum 100ms out, 30ms compensation: press at +70, release at +130.
        dispatcher.observe(&snapshot(1000.0, vec![upcoming_note(1, 1100.0)]));

        tokio::time::sleep(Duration::from_millis(69)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let press = rx.try_recv().unwrap();
        assert!(pressed(&press));
        assert!(press.contains("\"keyCode\":1"));

        tokio::time::sleep(Duration::from_millis(61)).await;
        let release = rx.try_recv().unwrap();
        assert!(release.contains("\"pressed\":false"));
        assert_eq!(dispatcher.scheduled_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overdue_press_is_clamped_to_now() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = DeferredDispatcher::new(tx, 30.0);

        // 10ms out with 30ms compensation: already due, fires immediately.
        dispatcher.observe(&snapshot(1000.0, vec![upcoming_note(0, 1010.0)]));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(pressed(&rx.try_recv().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn reobservation_schedules_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = DeferredDispatcher::new(tx, 30.0);

        dispatcher.observe(&snapshot(1000.0, vec![upcoming_note(2, 1100.0)]));
        dispatcher.observe(&snapshot(1020.0, vec![upcoming_note(2, 1100.0)]));
        assert_eq!(dispatcher.scheduled_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let lines: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(lines.iter().filter(|l| pressed(l)).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_note_cancels_pending_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = DeferredDispatcher::new(tx, 30.0);

        dispatcher.observe(&snapshot(1000.0, vec![upcoming_note(3, 1100.0)]));
        assert_eq!(dispatcher.scheduled_count(), 1);

        // Note hit through another path: gone from the next snapshot.
        dispatcher.observe(&snapshot(1030.0, vec![]));
        assert_eq!(dispatcher.scheduled_count(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn horizon_bounds_scheduling() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let dispatcher = DeferredDispatcher::new(tx, 30.0);

        let far = upcoming_note(0, 1200.0); // 200ms out
        let past = upcoming_note(1, 990.0); // already behind
        let edge = upcoming_note(2, 1150.0); // exactly on the horizon
        dispatcher.observe(&snapshot(1000.0, vec![far, past, edge]));

        assert_eq!(dispatcher.scheduled_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hit_and_missed_notes_are_not_scheduled() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let dispatcher = DeferredDispatcher::new(tx, 30.0);

        let mut hit = upcoming_note(0, 1050.0);
        hit.has_been_hit = true;
        let mut missed = upcoming_note(1, 1050.0);
        missed.has_missed = true;
        dispatcher.observe(&snapshot(1000.0, vec![hit, missed]));

        assert_eq!(dispatcher.scheduled_count(), 0);
    }
}
