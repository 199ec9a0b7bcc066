// Playback state - Shared record read by the UI and driven by the engines
//
// One instance per session, owned by the PracticeSession and passed by
// reference to whichever engine is active. All mutation goes through
// accessors so invariants stay checkable in one place.

use crate::grading::PracticeError;
use crate::melody::Melody;

/// Sentinel index meaning "no note" for current/completed/expected positions
pub const NO_INDEX: i32 = -1;

/// Shared playback position and session data
///
/// Index semantics:
/// - `current_note_index`: the note currently sounding or highlighted
/// - `last_completed_note_index`: high-water mark used to resume after pause
/// - `expected_note_index`: the note the user must supply next
///   (interactive modes only)
///
/// All three are -1 when nothing is active.
#[derive(Debug)]
pub struct PlaybackState {
    is_playing: bool,
    melody: Melody,
    current_note_index_value: i32,
    last_completed_note_index_value: i32,
    expected_note_index_value: i32,
    start_after_ts: Option<u64>,
    next_note_to_play: Option<String>,
    errors: Vec<PracticeError>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            is_playing: false,
            melody: Melody::default(),
            current_note_index_value: NO_INDEX,
            last_completed_note_index_value: NO_INDEX,
            expected_note_index_value: NO_INDEX,
            start_after_ts: None,
            next_note_to_play: None,
            errors: Vec::new(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub fn melody(&self) -> &Melody {
        &self.melody
    }

    /// Replace the loaded melody and reset position (new session)
    pub fn load_melody(&mut self, melody: &Melody) {
        self.melody = melody.clone();
        self.reset_position();
    }

    /// Replace the working melody only when the incoming one differs
    /// structurally; returns true when it did
    ///
    /// A parent re-supplying an equivalent-but-new melody instance must not
    /// reset an in-progress practice session.
    pub fn replace_melody_if_changed(&mut self, melody: &Melody) -> bool {
        if self.melody.same_notes(melody) {
            return false;
        }
        self.load_melody(melody);
        true
    }

    pub fn current_note_index(&self) -> i32 {
        self.current_note_index_value
    }

    pub fn set_current_note_index(&mut self, index: i32) {
        debug_assert!(self.valid_index(index), "current index out of range");
        self.current_note_index_value = index;
    }

    pub fn last_completed_note_index(&self) -> i32 {
        self.last_completed_note_index_value
    }

    pub fn set_last_completed_note_index(&mut self, index: i32) {
        debug_assert!(self.valid_index(index), "completed index out of range");
        self.last_completed_note_index_value = index;
    }

    pub fn expected_note_index(&self) -> i32 {
        self.expected_note_index_value
    }

    pub fn set_expected_note_index(&mut self, index: i32) {
        debug_assert!(self.valid_index(index), "expected index out of range");
        self.expected_note_index_value = index;
    }

    /// Index to resume scheduling from: one past the high-water mark
    pub fn resume_index(&self) -> usize {
        (self.last_completed_note_index_value + 1).max(0) as usize
    }

    pub fn start_after_ts(&self) -> Option<u64> {
        self.start_after_ts
    }

    pub fn set_start_after_ts(&mut self, ts: Option<u64>) {
        self.start_after_ts = ts;
    }

    pub fn next_note_to_play(&self) -> Option<&str> {
        self.next_note_to_play.as_deref()
    }

    pub fn set_next_note_to_play(&mut self, note: Option<String>) {
        self.next_note_to_play = note;
    }

    pub fn errors(&self) -> &[PracticeError] {
        &self.errors
    }

    pub fn record_error(&mut self, error: PracticeError) {
        self.errors.push(error);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Reset every position index and UI hint; melody and errors stay
    pub fn reset_position(&mut self) {
        self.current_note_index_value = NO_INDEX;
        self.last_completed_note_index_value = NO_INDEX;
        self.expected_note_index_value = NO_INDEX;
        self.start_after_ts = None;
        self.next_note_to_play = None;
    }

    fn valid_index(&self, index: i32) -> bool {
        index == NO_INDEX || (index >= 0 && index < self.melody.len() as i32)
    }
}
