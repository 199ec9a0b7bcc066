// MIDI types events

use crate::melody::Pitch;

/// Key events parsed from raw MIDI bytes
///
/// Only note on/off matter to the practice tracker; other message types are
/// ignored at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
}

impl MidiEvent {
    /// Parse un RAW MIDI message
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        let status = bytes[0];
        let message_type = status & 0xF0;

        match message_type {
            0x90 => {
                // Note On
                if bytes.len() >= 3 {
                    let note = bytes[1];
                    let velocity = bytes[2];
                    // Velocity 0 = Note Off
                    if velocity == 0 {
                        Some(MidiEvent::NoteOff { note })
                    } else {
                        Some(MidiEvent::NoteOn { note, velocity })
                    }
                } else {
                    None
                }
            }
            0x80 => {
                // Note Off
                if bytes.len() >= 3 {
                    Some(MidiEvent::NoteOff { note: bytes[1] })
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Pitch name of the key this event refers to ("C4" for note 60)
    pub fn pitch_name(&self) -> String {
        let note = match self {
            MidiEvent::NoteOn { note, .. } => *note,
            MidiEvent::NoteOff { note } => *note,
        };
        Pitch::from_midi(note).to_string()
    }
}
