// Playback engine interface - Uniform control surface over the three modes
//
// The engines are interchangeable state machines behind one trait so the
// router has a single dispatch point. State is passed in per call (not owned
// by the engines), which keeps the shared record single-writer.

use crate::audio::AudioTrigger;
use crate::input::UserInputTracker;
use crate::melody::{Melody, Pitch};
use crate::sequencer::clock::Clock;
use crate::sequencer::state::PlaybackState;

/// Borrowed collaborators handed to an engine for the duration of one call
pub struct EngineContext<'a> {
    pub state: &'a mut PlaybackState,
    pub tracker: &'a mut UserInputTracker,
    pub audio: &'a mut dyn AudioTrigger,
    pub clock: &'a dyn Clock,
}

/// Control surface shared by all three sequencing engines
pub trait PlaybackEngine {
    /// Start or resume playback, optionally supplying a melody
    fn play(&mut self, ctx: &mut EngineContext, melody: Option<&Melody>);

    /// Halt scheduling, keep position for resume
    fn pause(&mut self, ctx: &mut EngineContext);

    /// Halt scheduling and discard the session (position, errors, input log)
    fn stop(&mut self, ctx: &mut EngineContext);

    /// Play if paused, pause if playing
    fn toggle(&mut self, ctx: &mut EngineContext, melody: Option<&Melody>) {
        if ctx.state.is_playing() {
            self.pause(ctx);
        } else {
            self.play(ctx, melody);
        }
    }

    /// Jump to a note index, clamped to [-1, len-1]
    ///
    /// A positive `delay_ms` postpones the first sound after the jump, used
    /// to synchronize with a scroll-snap animation in the visualizer.
    fn seek(&mut self, ctx: &mut EngineContext, index: i32, delay_ms: u64);

    /// Pump timers and input polling; the host calls this every ~50 ms
    fn tick(&mut self, ctx: &mut EngineContext);
}

/// Sound a pitch, tolerating unplayable names and trigger failures
///
/// Returns true when the pitch was actually triggered. A malformed pitch is
/// skipped (its duration still elapses on the caller's schedule); a trigger
/// failure is logged and treated as sounded.
pub(crate) fn sound_note(audio: &mut dyn AudioTrigger, pitch: &str) -> bool {
    if Pitch::parse(pitch).is_err() {
        eprintln!("Warning: unplayable pitch {:?} skipped", pitch);
        return false;
    }
    if let Err(e) = audio.play_note(pitch) {
        eprintln!("Warning: audio trigger failed: {}", e);
    }
    true
}

/// Release a pitch; failures are logged and never abort the scheduling loop
pub(crate) fn silence_note(audio: &mut dyn AudioTrigger, pitch: &str) {
    if let Err(e) = audio.stop_note(pitch) {
        eprintln!("Warning: audio release failed: {}", e);
    }
}

/// Common front half of `play`: melody replacement + restart bookkeeping
///
/// Applies the supplied melody when it differs structurally, and wipes
/// errors and the input log when the session is about to restart from the
/// very beginning. Returns false when the resulting melody is empty and the
/// call should no-op.
pub(crate) fn prepare_play(ctx: &mut EngineContext, melody: Option<&Melody>) -> bool {
    if let Some(melody) = melody {
        ctx.state.replace_melody_if_changed(melody);
    }

    if ctx.state.melody().is_empty() {
        return false;
    }

    // Restarting from the top is a fresh session
    if ctx.state.last_completed_note_index() == crate::sequencer::state::NO_INDEX {
        ctx.state.clear_errors();
        ctx.tracker.clear();
    }

    true
}
