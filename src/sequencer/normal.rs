// Normal engine - Autoplay scheduling at a fixed tempo
//
// State machine: Idle -> Scheduled(i) -> Scheduled(i+1) -> ... -> Stopped.
// Each note arms a one-shot timer for its duration; the fire completes the
// note and enters the next. Successive deadlines chain off the previous
// deadline rather than the observed tick time, so a coarse or late tick
// drains every elapsed note without drifting the schedule.
//
// Cancellation discipline: every state-changing call cancels the
// outstanding handles before touching indices, so a stale deadline can
// never act after pause/stop/seek.

use crate::melody::Melody;
use crate::sequencer::engine::{EngineContext, PlaybackEngine, prepare_play, silence_note, sound_note};
use crate::sequencer::state::NO_INDEX;
use crate::sequencer::tempo::Tempo;
use crate::sequencer::timer::{TimerId, TimerQueue};

/// Hook fired just before a note sounds
///
/// The UI uses it to shift the visible octave window when an out-of-range
/// note is coming up; opaque to scheduling correctness.
pub type NoteCallback = Box<dyn FnMut(&str)>;

/// Autoplay sequencing engine
pub struct NormalEngine {
    tempo: Tempo,
    timers: TimerQueue,
    /// Armed duration timer for the sounding note
    advance_timer: Option<TimerId>,
    /// Deadline of the armed duration timer (base for the next note)
    advance_deadline: u64,
    /// Armed delayed-start timer (scrub-then-play snapping)
    start_timer: Option<TimerId>,
    /// Note index the armed timer refers to
    pending_index: usize,
    /// The note currently sounding, if any
    sounding: Option<String>,
    on_note_about_to_sound: Option<NoteCallback>,
}

impl NormalEngine {
    pub fn new() -> Self {
        Self::with_tempo(Tempo::default())
    }

    pub fn with_tempo(tempo: Tempo) -> Self {
        Self {
            tempo,
            timers: TimerQueue::new(),
            advance_timer: None,
            advance_deadline: 0,
            start_timer: None,
            pending_index: 0,
            sounding: None,
            on_note_about_to_sound: None,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Change the tempo; applies from the next scheduled note
    pub fn set_tempo(&mut self, bpm: u32) {
        self.tempo.set_bpm(bpm);
    }

    /// Install the octave-window hook
    pub fn set_note_callback(&mut self, callback: Option<NoteCallback>) {
        self.on_note_about_to_sound = callback;
    }

    fn cancel_timers(&mut self) {
        self.timers.cancel_all();
        self.advance_timer = None;
        self.start_timer = None;
    }

    fn silence_current(&mut self, ctx: &mut EngineContext) {
        if let Some(pitch) = self.sounding.take() {
            silence_note(ctx.audio, &pitch);
        }
    }

    /// Enter Scheduled(index): sound the note and arm its duration timer
    ///
    /// `start_ms` is the note's nominal start: the previous deadline when
    /// chaining, the current time when entering from play/seek.
    fn enter_note(&mut self, ctx: &mut EngineContext, index: usize, start_ms: u64) {
        // A pending future start postpones the first sound
        if let Some(start_at) = ctx.state.start_after_ts() {
            let now = ctx.clock.now_ms();
            if start_at > now {
                self.pending_index = index;
                self.start_timer = Some(self.timers.schedule_at(start_at));
                return;
            }
            ctx.state.set_start_after_ts(None);
        }

        self.silence_current(ctx);

        let Some(event) = ctx.state.melody().note(index) else {
            return;
        };
        let pitch = event.note.clone();
        let duration_ms = self.tempo.note_duration_ms(event.duration);
        let next_hint = ctx
            .state
            .melody()
            .note(index + 1)
            .map(|next| next.note.clone());

        ctx.state.set_current_note_index(index as i32);
        ctx.state.set_next_note_to_play(next_hint);

        if let Some(callback) = self.on_note_about_to_sound.as_mut() {
            callback(&pitch);
        }

        if sound_note(ctx.audio, &pitch) {
            self.sounding = Some(pitch);
        }

        self.pending_index = index;
        self.advance_deadline = start_ms + duration_ms;
        self.advance_timer = Some(self.timers.schedule_at(self.advance_deadline));
    }

    /// Duration timer fired: mark the note completed and move on
    fn complete_note(&mut self, ctx: &mut EngineContext, index: usize, deadline_ms: u64) {
        ctx.state.set_last_completed_note_index(index as i32);
        self.silence_current(ctx);

        if index + 1 < ctx.state.melody().len() {
            self.enter_note(ctx, index + 1, deadline_ms);
        } else {
            self.finish(ctx);
        }
    }

    /// Terminal transition: like stop, but session results stay readable
    fn finish(&mut self, ctx: &mut EngineContext) {
        self.cancel_timers();
        self.silence_current(ctx);
        ctx.state.set_playing(false);
        ctx.state.reset_position();
    }
}

impl Default for NormalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine for NormalEngine {
    fn play(&mut self, ctx: &mut EngineContext, melody: Option<&Melody>) {
        if !prepare_play(ctx, melody) {
            return;
        }

        // Re-entrant play: drop whatever was armed before rescheduling
        self.cancel_timers();

        let resume = ctx.state.resume_index();
        if resume >= ctx.state.melody().len() {
            self.finish(ctx);
            return;
        }

        ctx.state.set_playing(true);
        let now = ctx.clock.now_ms();
        self.enter_note(ctx, resume, now);
    }

    fn pause(&mut self, ctx: &mut EngineContext) {
        self.cancel_timers();
        self.silence_current(ctx);
        ctx.state.set_playing(false);
        // Indices stay put: play() re-enters the interrupted note
    }

    fn stop(&mut self, ctx: &mut EngineContext) {
        self.finish(ctx);
        ctx.state.clear_errors();
        ctx.tracker.clear();
    }

    fn seek(&mut self, ctx: &mut EngineContext, index: i32, delay_ms: u64) {
        let len = ctx.state.melody().len() as i32;
        let index = index.clamp(NO_INDEX, (len - 1).max(NO_INDEX));

        self.cancel_timers();
        self.silence_current(ctx);

        ctx.state.set_current_note_index(index);
        ctx.state
            .set_last_completed_note_index((index - 1).max(NO_INDEX));

        // Each seek owns the snap delay; a stale one must not linger
        let start_after = (delay_ms > 0).then(|| ctx.clock.now_ms() + delay_ms);
        ctx.state.set_start_after_ts(start_after);

        if ctx.state.is_playing() {
            let resume = ctx.state.resume_index();
            if resume < ctx.state.melody().len() {
                let now = ctx.clock.now_ms();
                self.enter_note(ctx, resume, now);
            } else {
                self.finish(ctx);
            }
        }
    }

    fn tick(&mut self, ctx: &mut EngineContext) {
        loop {
            let now = ctx.clock.now_ms();
            let Some(fired) = self.timers.pop_due(now) else {
                break;
            };

            if self.advance_timer == Some(fired) {
                self.advance_timer = None;
                let index = self.pending_index;
                let deadline = self.advance_deadline;
                self.complete_note(ctx, index, deadline);
            } else if self.start_timer == Some(fired) {
                self.start_timer = None;
                let base = ctx
                    .state
                    .start_after_ts()
                    .unwrap_or_else(|| ctx.clock.now_ms());
                ctx.state.set_start_after_ts(None);
                let index = self.pending_index;
                self.enter_note(ctx, index, base);
            }
        }
    }
}
