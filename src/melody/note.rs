// Melody representation - Note events and the melody container

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors produced when loading a melody from JSON
#[derive(Debug, Error)]
pub enum MelodyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
///
/// Only consumed by the chart visualizer for bar lines; playback ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 3, 4, 5, 6, 7)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Creates a new time signature
    pub fn new(numerator: u8, denominator: u8) -> Self {
        assert!(numerator > 0, "Time signature numerator must be > 0");
        assert!(
            denominator.is_power_of_two(),
            "Time signature denominator must be power of 2"
        );
        Self {
            numerator,
            denominator,
        }
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::new(3, 4)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A single note of a melody
///
/// `duration` is in relative beat units where 1.0 = one quarter note at the
/// current tempo. Immutable once part of a melody.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NoteEvent {
    /// Pitch name, e.g. "C#4"
    pub note: String,
    /// Length in beats (1.0 = quarter note)
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(note: impl Into<String>, duration: f64) -> Self {
        Self {
            note: note.into(),
            duration,
        }
    }
}

/// An ordered melody plus an optional time signature
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Melody {
    notes: Vec<NoteEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_signature: Option<TimeSignature>,
}

impl Melody {
    /// Create a melody from note events
    pub fn new(notes: Vec<NoteEvent>) -> Self {
        Self {
            notes,
            time_signature: None,
        }
    }

    /// Attach a time signature (visualizer hint)
    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = Some(time_signature);
        self
    }

    /// Load a melody from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, MelodyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a melody from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MelodyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn note(&self, index: usize) -> Option<&NoteEvent> {
        self.notes.get(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn time_signature(&self) -> Option<TimeSignature> {
        self.time_signature
    }

    /// Structural equality on note+duration pairs
    ///
    /// The time signature does not participate: a parent re-supplying an
    /// equivalent-but-new melody instance must not reset a practice session.
    pub fn same_notes(&self, other: &Melody) -> bool {
        self.notes == other.notes
    }
}
