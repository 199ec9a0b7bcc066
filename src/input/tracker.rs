// User input tracker - Append-only log of key press/release activity
//
// The tracker is independent of playback: the UI layer records physical
// events here and the engines poll it. Both run on the same cooperative
// loop, so no locking is needed.

use crate::melody::matches_pitch;
use std::collections::HashSet;

/// One press/release cycle of a key
///
/// Created open (`release_time == None`) on press; the matching open event
/// is closed on release.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInputEvent {
    /// Pitch name as supplied by the input layer, e.g. "C#4"
    pub note: String,
    /// Press timestamp (ms on the session clock)
    pub press_time: u64,
    /// Release timestamp, None while the key is held
    pub release_time: Option<u64>,
}

impl UserInputEvent {
    /// Held duration in ms, None while the key is still down
    pub fn held_ms(&self) -> Option<u64> {
        self.release_time
            .map(|release| release.saturating_sub(self.press_time))
    }
}

/// Durable, queryable log of key activity
#[derive(Debug, Default)]
pub struct UserInputTracker {
    events: Vec<UserInputEvent>,
    active: HashSet<String>,
}

impl UserInputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press
    ///
    /// No-op while the note already has an open press; this de-duplicates
    /// key-repeat and double-fired touch events.
    pub fn record_press(&mut self, note: &str, ts: u64) {
        if self.active.contains(note) {
            return;
        }

        self.active.insert(note.to_string());
        self.events.push(UserInputEvent {
            note: note.to_string(),
            press_time: ts,
            release_time: None,
        });
    }

    /// Record a key release
    ///
    /// Closes the most recent open event for the note; no-op if none exists.
    pub fn record_release(&mut self, note: &str, ts: u64) {
        if !self.active.remove(note) {
            return;
        }

        if let Some(event) = self
            .events
            .iter_mut()
            .rev()
            .find(|e| e.note == note && e.release_time.is_none())
        {
            event.release_time = Some(ts);
        }
    }

    /// Events whose press time falls in `[start, end]`, in recording order
    pub fn events_in_window(&self, start: u64, end: u64) -> Vec<&UserInputEvent> {
        self.events
            .iter()
            .filter(|e| e.press_time >= start && e.press_time <= end)
            .collect()
    }

    /// Most recent event (open or closed) matching the note
    pub fn latest_event_for_note(&self, note: &str, octave_agnostic: bool) -> Option<&UserInputEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| matches_pitch(note, &e.note, octave_agnostic))
    }

    /// Whether a matching key is currently held
    pub fn is_pressed(&self, note: &str, octave_agnostic: bool) -> bool {
        if !octave_agnostic {
            // Fast path: the active set is keyed by exact note name
            if self.active.contains(note) {
                return true;
            }
        }
        self.events
            .iter()
            .rev()
            .any(|e| e.release_time.is_none() && matches_pitch(note, &e.note, octave_agnostic))
    }

    /// Names of all currently pressed keys
    pub fn active_notes(&self) -> &HashSet<String> {
        &self.active
    }

    /// Total number of recorded events, used as a poll watermark
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Events appended after a saved watermark
    pub fn events_since(&self, watermark: usize) -> &[UserInputEvent] {
        &self.events[watermark.min(self.events.len())..]
    }

    pub fn events(&self) -> &[UserInputEvent] {
        &self.events
    }

    /// Wipe history and the active-press set (session restart)
    pub fn clear(&mut self) {
        self.events.clear();
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_cycle() {
        let mut tracker = UserInputTracker::new();

        tracker.record_press("C4", 100);
        assert!(tracker.is_pressed("C4", false));
        assert_eq!(tracker.event_count(), 1);

        tracker.record_release("C4", 400);
        assert!(!tracker.is_pressed("C4", false));

        let event = &tracker.events()[0];
        assert_eq!(event.press_time, 100);
        assert_eq!(event.release_time, Some(400));
        assert_eq!(event.held_ms(), Some(300));
    }

    #[test]
    fn test_press_dedup() {
        let mut tracker = UserInputTracker::new();

        // Key repeat fires a second press before release
        tracker.record_press("C4", 100);
        tracker.record_press("C4", 150);
        assert_eq!(tracker.event_count(), 1);

        tracker.record_release("C4", 300);
        tracker.record_press("C4", 500);
        assert_eq!(tracker.event_count(), 2);
    }

    #[test]
    fn test_release_without_press() {
        let mut tracker = UserInputTracker::new();
        tracker.record_release("C4", 100);
        assert_eq!(tracker.event_count(), 0);
    }

    #[test]
    fn test_events_in_window() {
        let mut tracker = UserInputTracker::new();
        tracker.record_press("C4", 100);
        tracker.record_release("C4", 200);
        tracker.record_press("D4", 300);
        tracker.record_press("E4", 700);

        let window = tracker.events_in_window(150, 650);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].note, "D4");

        // Bounds are inclusive
        let window = tracker.events_in_window(100, 700);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_latest_event_octave_agnostic() {
        let mut tracker = UserInputTracker::new();
        tracker.record_press("C4", 100);
        tracker.record_release("C4", 200);
        tracker.record_press("C5", 300);

        let latest = tracker.latest_event_for_note("C4", true).unwrap();
        assert_eq!(latest.note, "C5");

        let exact = tracker.latest_event_for_note("C4", false).unwrap();
        assert_eq!(exact.press_time, 100);

        assert!(tracker.latest_event_for_note("G4", true).is_none());
    }

    #[test]
    fn test_is_pressed_octave_agnostic() {
        let mut tracker = UserInputTracker::new();
        tracker.record_press("C5", 100);

        assert!(tracker.is_pressed("C4", true));
        assert!(!tracker.is_pressed("C4", false));
    }

    #[test]
    fn test_watermark() {
        let mut tracker = UserInputTracker::new();
        tracker.record_press("C4", 100);

        let watermark = tracker.event_count();
        tracker.record_press("D4", 200);
        tracker.record_press("E4", 300);

        let fresh = tracker.events_since(watermark);
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].note, "D4");
    }

    #[test]
    fn test_clear() {
        let mut tracker = UserInputTracker::new();
        tracker.record_press("C4", 100);
        tracker.clear();

        assert_eq!(tracker.event_count(), 0);
        assert!(tracker.active_notes().is_empty());
        assert!(!tracker.is_pressed("C4", false));
    }
}
