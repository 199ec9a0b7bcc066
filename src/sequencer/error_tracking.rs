// Error-tracking engine - Autoplay with per-note practice grading
//
// Scheduling is the Normal engine's: fixed tempo, no waiting. When a note's
// duration elapses (the moment the next note begins, or the final stop),
// the input recorded during that note's sounding window is graded against
// the expected pitch and the verdicts appended to the shared error list.
// Grading never blocks advancement.

use crate::grading::{ErrorKind, PracticeError, TIMING_TOLERANCE_MS, duration_matches, timing_error_ms};
use crate::melody::{Melody, matches_pitch};
use crate::sequencer::engine::{EngineContext, PlaybackEngine, prepare_play, silence_note, sound_note};
use crate::sequencer::state::NO_INDEX;
use crate::sequencer::tempo::Tempo;
use crate::sequencer::timer::{TimerId, TimerQueue};

/// Grading reads input from this long before a note's window opens, so a
/// slightly-early press is attributed to the note it was meant for
const EARLY_GRACE_MS: u64 = 250;

/// Held-duration tolerance for grading (looser than press timing)
const GRADE_DURATION_TOLERANCE_MS: i64 = 150;

/// Autoplay engine that grades user input note by note
pub struct ErrorTrackingEngine {
    tempo: Tempo,
    timers: TimerQueue,
    advance_timer: Option<TimerId>,
    /// Deadline of the armed duration timer; also the grading window end
    advance_deadline: u64,
    start_timer: Option<TimerId>,
    pending_index: usize,
    /// Nominal start of the sounding note (grading window start)
    window_start: u64,
    sounding: Option<String>,
}

impl ErrorTrackingEngine {
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
            window_start: 0,
            sounding: None,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn set_tempo(&mut self, bpm: u32) {
        self.tempo.set_bpm(bpm);
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

    fn enter_note(&mut self, ctx: &mut EngineContext, index: usize, start_ms: u64) {
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
        ctx.state.set_expected_note_index(index as i32);
        ctx.state.set_next_note_to_play(next_hint);

        if sound_note(ctx.audio, &pitch) {
            self.sounding = Some(pitch);
        }

        self.pending_index = index;
        self.window_start = start_ms;
        self.advance_deadline = start_ms + duration_ms;
        self.advance_timer = Some(self.timers.schedule_at(self.advance_deadline));
    }

    /// Duration elapsed: grade the window, then advance or finish
    fn complete_note(&mut self, ctx: &mut EngineContext, index: usize, deadline_ms: u64) {
        self.grade_note(ctx, index, self.window_start, deadline_ms);
        ctx.state.set_last_completed_note_index(index as i32);
        self.silence_current(ctx);

        if index + 1 < ctx.state.melody().len() {
            self.enter_note(ctx, index + 1, deadline_ms);
        } else {
            self.finish(ctx);
        }
    }

    /// Classify the user's input for one note window
    ///
    /// First applicable rule wins for the pitch verdict; timing and duration
    /// verdicts may stack on top of a matched press.
    fn grade_note(&self, ctx: &mut EngineContext, index: usize, window_start: u64, window_end: u64) {
        let Some(event) = ctx.state.melody().note(index) else {
            return;
        };
        let expected_pitch = event.note.clone();
        let expected_ms = self.tempo.note_duration_ms(event.duration);

        let query_start = window_start.saturating_sub(EARLY_GRACE_MS);
        let query_end = window_end.saturating_sub(1);

        let mut verdicts: Vec<PracticeError> = Vec::new();
        let events = ctx.tracker.events_in_window(query_start, query_end);

        if events.is_empty() {
            verdicts.push(PracticeError::missed(index, &expected_pitch));
        } else {
            let matched = events
                .iter()
                .find(|e| matches_pitch(&expected_pitch, &e.note, false));

            match matched {
                None => {
                    // Graded against the first wrong note played
                    verdicts.push(PracticeError::wrong_note(
                        index,
                        &expected_pitch,
                        &events[0].note,
                    ));
                }
                Some(matched) => {
                    let timing = timing_error_ms(window_start, matched.press_time);
                    if timing < -TIMING_TOLERANCE_MS {
                        verdicts.push(PracticeError::timing(
                            ErrorKind::TooEarly,
                            index,
                            &expected_pitch,
                            timing,
                        ));
                    } else if timing > TIMING_TOLERANCE_MS {
                        verdicts.push(PracticeError::timing(
                            ErrorKind::TooLate,
                            index,
                            &expected_pitch,
                            timing,
                        ));
                    }

                    // Only a closed press has a measurable duration
                    if let Some(held_ms) = matched.held_ms() {
                        if !duration_matches(expected_ms, held_ms, GRADE_DURATION_TOLERANCE_MS) {
                            verdicts.push(PracticeError::wrong_duration(
                                index,
                                &expected_pitch,
                                timing_error_ms(expected_ms, held_ms),
                            ));
                        }
                    }
                }
            }
        }

        for verdict in verdicts {
            ctx.state.record_error(verdict);
        }
    }

    /// Terminal transition: indices reset, the session's verdicts stay
    fn finish(&mut self, ctx: &mut EngineContext) {
        self.cancel_timers();
        self.silence_current(ctx);
        ctx.state.set_playing(false);
        ctx.state.reset_position();
    }
}

impl Default for ErrorTrackingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine for ErrorTrackingEngine {
    fn play(&mut self, ctx: &mut EngineContext, melody: Option<&Melody>) {
        if !prepare_play(ctx, melody) {
            return;
        }

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
