// Playback router - One session, three engines, a single dispatch point
//
// The session owns the shared playback state, the input tracker, the audio
// trigger and the clock, and forwards the uniform control surface to the
// engine selected by the configured mode.

use std::sync::Arc;

use crate::audio::AudioTrigger;
use crate::input::UserInputTracker;
use crate::melody::Melody;
use crate::messaging::command::Command;
use crate::midi::event::MidiEvent;
use crate::sequencer::clock::{Clock, SystemClock};
use crate::sequencer::engine::{EngineContext, PlaybackEngine};
use crate::sequencer::error_tracking::ErrorTrackingEngine;
use crate::sequencer::normal::NormalEngine;
use crate::sequencer::state::PlaybackState;
use crate::sequencer::tempo::Tempo;
use crate::sequencer::wait_for_user::WaitForUserEngine;

/// Which sequencing engine drives playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Normal,
    WaitForUser,
    ErrorTracking,
}

/// A complete practice session: shared state plus the three engines
pub struct PracticeSession {
    mode: PlaybackMode,
    normal: NormalEngine,
    wait_for_user: WaitForUserEngine,
    error_tracking: ErrorTrackingEngine,
    state: PlaybackState,
    tracker: UserInputTracker,
    audio: Box<dyn AudioTrigger>,
    clock: Arc<dyn Clock>,
}

macro_rules! dispatch {
    ($self:ident, $call:ident $(, $arg:expr)*) => {{
        let mut ctx = EngineContext {
            state: &mut $self.state,
            tracker: &mut $self.tracker,
            audio: $self.audio.as_mut(),
            clock: $self.clock.as_ref(),
        };
        match $self.mode {
            PlaybackMode::Normal => $self.normal.$call(&mut ctx $(, $arg)*),
            PlaybackMode::WaitForUser => $self.wait_for_user.$call(&mut ctx $(, $arg)*),
            PlaybackMode::ErrorTracking => $self.error_tracking.$call(&mut ctx $(, $arg)*),
        }
    }};
}

impl PracticeSession {
    pub fn new(audio: Box<dyn AudioTrigger>) -> Self {
        Self::with_clock(audio, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(audio: Box<dyn AudioTrigger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            mode: PlaybackMode::default(),
            normal: NormalEngine::new(),
            wait_for_user: WaitForUserEngine::new(),
            error_tracking: ErrorTrackingEngine::new(),
            state: PlaybackState::new(),
            tracker: UserInputTracker::new(),
            audio,
            clock,
        }
    }

    /// Set every engine's tempo at construction time
    pub fn with_tempo(mut self, bpm: u32) -> Self {
        let tempo = Tempo::new(bpm);
        self.normal = NormalEngine::with_tempo(tempo);
        self.wait_for_user = WaitForUserEngine::with_tempo(tempo);
        self.error_tracking = ErrorTrackingEngine::with_tempo(tempo);
        self
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Switch the active engine
    ///
    /// The outgoing engine is stopped first so two engines can never hold
    /// timers against the same shared state.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        if mode == self.mode {
            return;
        }
        self.stop();
        self.mode = mode;
    }

    pub fn play(&mut self, melody: Option<&Melody>) {
        dispatch!(self, play, melody)
    }

    pub fn pause(&mut self) {
        dispatch!(self, pause)
    }

    pub fn stop(&mut self) {
        dispatch!(self, stop)
    }

    pub fn toggle(&mut self, melody: Option<&Melody>) {
        dispatch!(self, toggle, melody)
    }

    pub fn seek(&mut self, index: i32, delay_ms: u64) {
        dispatch!(self, seek, index, delay_ms)
    }

    /// Pump the active engine; the host calls this every ~50 ms
    pub fn tick(&mut self) {
        dispatch!(self, tick)
    }

    /// Change the autoplay tempo (Normal mode only)
    pub fn set_tempo(&mut self, bpm: u32) {
        if self.mode == PlaybackMode::Normal {
            self.normal.set_tempo(bpm);
        }
    }

    /// Install the octave-window hook on the Normal engine
    pub fn set_note_callback(&mut self, callback: Option<crate::sequencer::normal::NoteCallback>) {
        self.normal.set_note_callback(callback);
    }

    /// Reactive read surface for the UI layer
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn tracker(&self) -> &UserInputTracker {
        &self.tracker
    }

    /// Record a key press, stamped with the session clock
    pub fn record_press(&mut self, note: &str) {
        let now = self.clock.now_ms();
        self.tracker.record_press(note, now);
    }

    /// Record a key release, stamped with the session clock
    pub fn record_release(&mut self, note: &str) {
        let now = self.clock.now_ms();
        self.tracker.record_release(note, now);
    }

    /// Apply one command from the UI or MIDI channel
    pub fn apply_command(&mut self, command: Command) {
        match command {
            Command::Midi(event) => {
                let name = event.pitch_name();
                match event {
                    MidiEvent::NoteOn { .. } => self.record_press(&name),
                    MidiEvent::NoteOff { .. } => self.record_release(&name),
                }
            }
            Command::Play => self.play(None),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Toggle => self.toggle(None),
            Command::Seek { index, delay_ms } => self.seek(index, delay_ms),
            Command::SetTempo(bpm) => self.set_tempo(bpm),
        }
    }
}
