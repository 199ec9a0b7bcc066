// Types de commandes - Communication input/UI → session

use crate::midi::event::MidiEvent;

#[derive(Debug, Clone, Copy)]
pub enum Command {
    Midi(MidiEvent),
    Play,
    Pause,
    Stop,
    Toggle,
    Seek { index: i32, delay_ms: u64 },
    SetTempo(u32),
}
