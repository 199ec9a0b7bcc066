// Practice error records - What the user got wrong, and by how much

use std::time::{SystemTime, UNIX_EPOCH};

/// Kind of practice error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    WrongNote,
    TooEarly,
    TooLate,
    WrongDuration,
    MissedNote,
}

/// A recorded practice error
///
/// These are domain data, not faults: they accumulate in the playback state
/// for the visualizer and never interrupt the session. Append-only; cleared
/// on restart.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeError {
    pub kind: ErrorKind,
    /// Melody index of the note being graded
    pub note_index: usize,
    /// The note the user was supposed to play
    pub expected_note: String,
    /// What was actually played (WrongNote only)
    pub actual_note: Option<String>,
    /// Signed press-timing error in ms, positive = late
    pub timing_error_ms: Option<i64>,
    /// Signed held-duration error in ms, positive = held too long
    pub duration_error_ms: Option<i64>,
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
}

impl PracticeError {
    fn new(kind: ErrorKind, note_index: usize, expected_note: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            kind,
            note_index,
            expected_note: expected_note.to_string(),
            actual_note: None,
            timing_error_ms: None,
            duration_error_ms: None,
            timestamp,
        }
    }

    /// No press at all inside the note's window
    pub fn missed(note_index: usize, expected_note: &str) -> Self {
        Self::new(ErrorKind::MissedNote, note_index, expected_note)
    }

    /// A press happened, but with the wrong pitch
    pub fn wrong_note(note_index: usize, expected_note: &str, actual_note: &str) -> Self {
        let mut err = Self::new(ErrorKind::WrongNote, note_index, expected_note);
        err.actual_note = Some(actual_note.to_string());
        err
    }

    /// Matching press outside the timing tolerance
    /// `kind` must be TooEarly or TooLate, matching the sign of the error
    pub fn timing(kind: ErrorKind, note_index: usize, expected_note: &str, error_ms: i64) -> Self {
        debug_assert!(matches!(kind, ErrorKind::TooEarly | ErrorKind::TooLate));
        let mut err = Self::new(kind, note_index, expected_note);
        err.timing_error_ms = Some(error_ms);
        err
    }

    /// Matching press held for the wrong length
    pub fn wrong_duration(note_index: usize, expected_note: &str, error_ms: i64) -> Self {
        let mut err = Self::new(ErrorKind::WrongDuration, note_index, expected_note);
        err.duration_error_ms = Some(error_ms);
        err
    }
}
