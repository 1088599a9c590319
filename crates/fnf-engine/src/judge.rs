//! Hit-window evaluation.

use fnf_protocol::{Lane, NoteObservation, Snapshot};
use tracing::debug;

use crate::hold::HoldTracker;

/// What a lane does this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaneAction {
    #[default]
    Idle,
    /// Hit the lane this cycle.
    Press,
    /// Keep the lane engaged for an in-flight hold note.
    Hold,
}

impl LaneAction {
    pub fn is_engaged(self) -> bool {
        !matches!(self, LaneAction::Idle)
    }
}

/// The full four-lane decision for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionSet {
    lanes: [LaneAction; 4],
}

impl ActionSet {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn get(&self, lane: Lane) -> LaneAction {
        self.lanes[lane.index()]
    }

    pub fn set(&mut self, lane: Lane, action: LaneAction) {
        self.lanes[lane.index()] = action;
    }

    /// Pressed or held lanes, in lane order.
    pub fn active_lanes(&self) -> Vec<Lane> {
        Lane::ALL
            .into_iter()
            .filter(|lane| self.get(*lane).is_engaged())
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        self.lanes.iter().all(|a| !a.is_engaged())
    }
}

/// Timing windows, in milliseconds.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Symmetric radius within which a note is hittable at all.
    pub hit_window_ms: f64,
    /// Stricter radius within which a press is actually committed, to
    /// avoid low-quality early/late hits registering upstream.
    pub acceptance_ms: f64,
    /// Floor on hold durations, guarding against degenerate zero-length
    /// hold notes releasing immediately.
    pub min_hold_ms: f64,
}

impl JudgeConfig {
    /// The upstream game's own timing constants. These are a compatibility
    /// contract with its judge (`Constants.HIT_WINDOW_MS` = 160); changing
    /// them desynchronizes from the authoritative scorer.
    pub fn funkin() -> Self {
        Self {
            hit_window_ms: 160.0,
            acceptance_ms: 80.0,
            min_hold_ms: 200.0,
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self::funkin()
    }
}

/// Per-snapshot lane decision engine.
///
/// Pure with respect to the snapshot; mutates only the hold tracker passed
/// in (hold expiry before evaluation, hold creation on acceptance).
#[derive(Debug, Default)]
pub struct Judge {
    config: JudgeConfig,
}

impl Judge {
    pub fn new(config: JudgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    /// Decide every lane for one snapshot.
    pub fn evaluate(&self, snapshot: &Snapshot, tracker: &mut HoldTracker) -> ActionSet {
        if !snapshot.is_active() {
            tracker.clear();
            return ActionSet::idle();
        }

        tracker.expire(snapshot.timestamp);

        let mut actions = ActionSet::idle();
        for lane in Lane::ALL {
            if tracker.is_holding(lane) {
                actions.set(lane, LaneAction::Hold);
                continue;
            }

            let Some((note, diff)) = self.best_candidate(snapshot, lane) else {
                continue;
            };
            if diff.abs() > self.config.acceptance_ms {
                continue;
            }

            actions.set(lane, LaneAction::Press);
            debug!(
                lane = lane.key_name(),
                strum_time = note.strum_time,
                diff,
                "hitting note"
            );

            if note.is_hold_note {
                let reference = note.reference_time(snapshot.timestamp);
                let end_time = reference + note.length.max(self.config.min_hold_ms);
                tracker.begin_hold(lane, reference, end_time);
            }
        }
        actions
    }

    /// The in-window eligible note closest to perfect timing for this lane,
    /// with its signed timing offset. Ties keep the first-seen note.
    fn best_candidate<'a>(
        &self,
        snapshot: &'a Snapshot,
        lane: Lane,
    ) -> Option<(&'a NoteObservation, f64)> {
        let mut best: Option<(&NoteObservation, f64)> = None;
        for note in &snapshot.notes {
            if Lane::from_direction(note.direction) != Some(lane)
                || note.has_been_hit
                || note.has_missed
                || !note.may_hit
            {
                continue;
            }

            let diff = note.strum_time - note.reference_time(snapshot.timestamp);
            if diff.abs() > self.config.hit_window_ms {
                continue;
            }
            match best {
                Some((_, best_diff)) if diff.abs() >= best_diff.abs() => {}
                _ => best = Some((note, diff)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnf_protocol::MainState;

    fn note(direction: i64, strum_time: f64, conductor_time: f64) -> NoteObservation {
        NoteObservation {
            direction,
            strum_time,
            conductor_time: Some(conductor_time),
            is_hold_note: false,
            length: 0.0,
            may_hit: true,
            has_missed: false,
            has_been_hit: false,
        }
    }

    fn playing(timestamp: f64, notes: Vec<NoteObservation>) -> Snapshot {
        Snapshot {
            main_state: MainState::Playing,
            is_playing: true,
            timestamp,
            notes,
        }
    }

    #[test]
    fn perfect_timing_presses() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();
        let snapshot = playing(1000.0, vec![note(0, 1000.0, 1000.0)]);

        let actions = judge.evaluate(&snapshot, &mut tracker);
        assert_eq!(actions.get(Lane::Left), LaneAction::Press);
        assert_eq!(actions.active_lanes(), vec![Lane::Left]);
    }

    #[test]
    fn no_candidates_is_idle() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();
        let snapshot = playing(1000.0, vec![]);

        assert!(judge.evaluate(&snapshot, &mut tracker).is_idle());
    }

    #[test]
    fn already_hit_or_missed_notes_are_excluded() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();

        let mut hit = note(1, 1000.0, 1000.0);
        hit.has_been_hit = true;
        let mut missed = note(2, 1000.0, 1000.0);
        missed.has_missed = true;
        let mut not_yet = note(3, 1000.0, 1000.0);
        not_yet.may_hit = false;

        let snapshot = playing(1000.0, vec![hit, missed, not_yet]);
        assert!(judge.evaluate(&snapshot, &mut tracker).is_idle());
    }

    #[test]
    fn unmappable_direction_is_ignored() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();
        let snapshot = playing(1000.0, vec![note(7, 1000.0, 1000.0), note(-1, 1000.0, 1000.0)]);

        assert!(judge.evaluate(&snapshot, &mut tracker).is_idle());
    }

    #[test]
    fn closest_candidate_wins() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();
        // +90 is in window but outside acceptance; -40 is accepted.
        let snapshot = playing(1000.0, vec![note(0, 1090.0, 1000.0), note(0, 960.0, 1000.0)]);

        let actions = judge.evaluate(&snapshot, &mut tracker);
        assert_eq!(actions.get(Lane::Left), LaneAction::Press);
    }

    #[test]
    fn tie_breaks_to_first_seen() {
        let config = JudgeConfig::funkin();
        let judge = Judge::new(config);
        let mut tracker = HoldTracker::new();
        // Equal |diff|: +50 listed first, then -50. First-seen wins; the
        // winner is a hold note so the tracker records which one was chosen.
        let mut early = note(0, 1050.0, 1000.0);
        early.is_hold_note = true;
        early.length = 300.0;
        let late = note(0, 950.0, 1000.0);
        let snapshot = playing(1000.0, vec![early, late]);

        let actions = judge.evaluate(&snapshot, &mut tracker);
        assert_eq!(actions.get(Lane::Left), LaneAction::Press);
        assert!(tracker.is_holding(Lane::Left));
    }

    #[test]
    fn hold_note_opens_hold_with_floor() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();
        let mut short_hold = note(2, 1000.0, 1000.0);
        short_hold.is_hold_note = true;
        short_hold.length = 50.0;
        let snapshot = playing(1000.0, vec![short_hold]);

        judge.evaluate(&snapshot, &mut tracker);
        assert!(tracker.is_holding(Lane::Up));

        // Below the 200ms floor: still held at +199, released at +200.
        tracker.expire(1199.0);
        assert!(tracker.is_holding(Lane::Up));
        tracker.expire(1200.0);
        assert!(!tracker.is_holding(Lane::Up));
    }

    #[test]
    fn held_lane_reports_hold_without_reevaluation() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();
        let mut hold = note(3, 1000.0, 1000.0);
        hold.is_hold_note = true;
        hold.length = 500.0;

        let first = playing(1000.0, vec![hold]);
        assert_eq!(judge.evaluate(&first, &mut tracker).get(Lane::Right), LaneAction::Press);

        // Later cycle: a fresh perfect note on the same lane is not
        // evaluated while the hold is alive.
        let second = playing(1200.0, vec![note(3, 1200.0, 1200.0)]);
        assert_eq!(judge.evaluate(&second, &mut tracker).get(Lane::Right), LaneAction::Hold);
    }

    #[test]
    fn non_playing_clears_tracker() {
        let judge = Judge::default();
        let mut tracker = HoldTracker::new();
        let mut hold = note(1, 1000.0, 1000.0);
        hold.is_hold_note = true;
        hold.length = 5000.0;
        judge.evaluate(&playing(1000.0, vec![hold]), &mut tracker);
        assert_eq!(tracker.active_count(), 1);

        let paused = Snapshot {
            main_state: MainState::Playing,
            is_playing: false,
            timestamp: 1100.0,
            notes: vec![],
        };
        assert!(judge.evaluate(&paused, &mut tracker).is_idle());
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn idempotent_for_identical_snapshot() {
        let judge = Judge::default();
        let snapshot = playing(1000.0, vec![note(0, 1040.0, 1000.0), note(2, 1100.0, 1000.0)]);

        let mut tracker_a = HoldTracker::new();
        let mut tracker_b = HoldTracker::new();
        let first = judge.evaluate(&snapshot, &mut tracker_a);
        let second = judge.evaluate(&snapshot, &mut tracker_b);
        assert_eq!(first, second);
    }
}
