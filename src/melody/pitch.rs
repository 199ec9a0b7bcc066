// Pitch names - Parsing and comparison of note names like "C4" or "F#3"

use std::fmt;
use thiserror::Error;

/// Errors produced when parsing a pitch name
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PitchError {
    #[error("empty pitch name")]
    Empty,

    #[error("invalid note letter: {0}")]
    InvalidLetter(char),

    #[error("missing octave digit in {0:?}")]
    MissingOctave(String),

    #[error("invalid octave in {0:?}")]
    InvalidOctave(String),
}

/// A parsed pitch name
///
/// Pitch names follow the piano convention: a letter A-G, an optional `#`,
/// and an octave number ("C4", "F#3", "A#0"). Letters are accepted in either
/// case; the canonical form is uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pitch {
    /// Note letter, uppercase A-G
    pub letter: char,
    /// Sharp accidental
    pub sharp: bool,
    /// Octave number (C4 = middle C)
    pub octave: i32,
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Pitch {
    /// Parse a pitch name like "C4" or "f#3"
    pub fn parse(name: &str) -> Result<Self, PitchError> {
        let mut chars = name.chars();

        let letter = chars.next().ok_or(PitchError::Empty)?;
        let letter = letter.to_ascii_uppercase();
        if !('A'..='G').contains(&letter) {
            return Err(PitchError::InvalidLetter(letter));
        }

        let rest: String = chars.collect();
        let (sharp, octave_str) = match rest.strip_prefix('#') {
            Some(tail) => (true, tail),
            None => (false, rest.as_str()),
        };

        if octave_str.is_empty() {
            return Err(PitchError::MissingOctave(name.to_string()));
        }

        let octave = octave_str
            .parse::<i32>()
            .map_err(|_| PitchError::InvalidOctave(name.to_string()))?;

        Ok(Self {
            letter,
            sharp,
            octave,
        })
    }

    /// Pitch class without the octave ("C#" for "C#4")
    pub fn class(&self) -> String {
        if self.sharp {
            format!("{}#", self.letter)
        } else {
            self.letter.to_string()
        }
    }

    /// Build a pitch from a MIDI note number (60 = C4)
    pub fn from_midi(midi: u8) -> Self {
        let octave = (midi / 12) as i32 - 1;
        let name = NOTE_NAMES[(midi % 12) as usize];

        Self {
            letter: name.chars().next().unwrap_or('C'),
            sharp: name.ends_with('#'),
            octave,
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class(), self.octave)
    }
}

/// Compare two pitch names
///
/// Octave-agnostic comparison ignores the octave number, so "C4" matches
/// "C5". Malformed names never match; a bad melody entry becomes unplayable
/// instead of aborting the session.
pub fn matches_pitch(expected: &str, actual: &str, octave_agnostic: bool) -> bool {
    let (Ok(expected), Ok(actual)) = (Pitch::parse(expected), Pitch::parse(actual)) else {
        return false;
    };

    let class_match = expected.letter == actual.letter && expected.sharp == actual.sharp;

    if octave_agnostic {
        class_match
    } else {
        class_match && expected.octave == actual.octave
    }
}
