// Melody module - Pitch names, note events, melody container

pub mod note;
pub mod pitch;

pub use note::{Melody, MelodyError, NoteEvent, TimeSignature};
pub use pitch::{Pitch, PitchError, matches_pitch};
