// MyPiano Trainer - Library exports for tests and benchmarks

pub mod audio;
pub mod grading;
pub mod input;
pub mod melody;
pub mod messaging;
pub mod midi;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use audio::{AudioTrigger, ConsoleTrigger, NullTrigger};
pub use grading::{ErrorKind, PracticeError};
pub use input::UserInputTracker;
pub use melody::{Melody, NoteEvent, Pitch, TimeSignature, matches_pitch};
pub use messaging::{Command, create_command_channel};
pub use midi::{MidiEvent, MidiInput};
pub use sequencer::{
    Clock, ManualClock, PlaybackEngine, PlaybackMode, PlaybackState, PracticeSession, SystemClock,
    Tempo,
};
