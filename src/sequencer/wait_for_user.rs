// Wait-for-user engine - Playback advances only when the user plays
//
// State machine: AwaitingPress(expected) -> HoldingForDuration -> next note.
// A 50 ms host tick polls the input tracker (watermark over the event count,
// so only genuinely new presses are examined) with a backup timer at the
// note's nominal duration in case polling stalls. Sustaining a note for its
// written duration advances; releasing early discards progress on that note
// only and waits for a fresh press.

use crate::grading::PracticeError;
use crate::melody::{Melody, matches_pitch};
use crate::sequencer::engine::{EngineContext, PlaybackEngine, prepare_play, silence_note, sound_note};
use crate::sequencer::state::NO_INDEX;
use crate::sequencer::tempo::Tempo;
use crate::sequencer::timer::{TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldPhase {
    /// Waiting for the user to press the expected note
    Awaiting,
    /// Expected note is down; waiting out its nominal duration
    Holding { press_time: u64 },
}

/// Practice engine that waits for correct input before advancing
pub struct WaitForUserEngine {
    tempo: Tempo,
    timers: TimerQueue,
    backup_timer: Option<TimerId>,
    phase: HoldPhase,
    /// Tracker events already examined
    watermark: usize,
    sounding: Option<String>,
}

impl WaitForUserEngine {
    pub fn new() -> Self {
        Self::with_tempo(Tempo::default())
    }

    pub fn with_tempo(tempo: Tempo) -> Self {
        Self {
            tempo,
            timers: TimerQueue::new(),
            backup_timer: None,
            phase: HoldPhase::Awaiting,
            watermark: 0,
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
        self.backup_timer = None;
    }

    fn silence_current(&mut self, ctx: &mut EngineContext) {
        if let Some(pitch) = self.sounding.take() {
            silence_note(ctx.audio, &pitch);
        }
    }

    /// The note the user must supply next: (index, pitch, nominal ms)
    fn expected(&self, ctx: &EngineContext) -> Option<(usize, String, u64)> {
        let index = ctx.state.expected_note_index();
        if index < 0 {
            return None;
        }
        let event = ctx.state.melody().note(index as usize)?;
        Some((
            index as usize,
            event.note.clone(),
            self.tempo.note_duration_ms(event.duration),
        ))
    }

    fn await_note(&mut self, ctx: &mut EngineContext, index: usize) {
        let hint = ctx.state.melody().note(index).map(|e| e.note.clone());
        ctx.state.set_expected_note_index(index as i32);
        ctx.state.set_next_note_to_play(hint);
        self.phase = HoldPhase::Awaiting;
        self.watermark = ctx.tracker.event_count();
    }

    /// Examine presses recorded since the last poll
    fn scan_for_press(&mut self, ctx: &mut EngineContext) {
        let from = self.watermark;
        self.watermark = ctx.tracker.event_count();

        let Some((index, pitch, duration_ms)) = self.expected(ctx) else {
            return;
        };

        let mut matched: Option<u64> = None;
        let mut wrong: Vec<String> = Vec::new();
        for event in ctx.tracker.events_since(from) {
            if matches_pitch(&pitch, &event.note, false) {
                matched = Some(event.press_time);
                // Later presses in the batch belong to the hold
                break;
            }
            wrong.push(event.note.clone());
        }

        for actual in wrong {
            ctx.state
                .record_error(PracticeError::wrong_note(index, &pitch, &actual));
        }

        if let Some(press_time) = matched {
            self.begin_hold(ctx, index, &pitch, press_time, duration_ms);
        }
    }

    /// Matching press: sound it for feedback and wait out the duration
    fn begin_hold(
        &mut self,
        ctx: &mut EngineContext,
        index: usize,
        pitch: &str,
        press_time: u64,
        duration_ms: u64,
    ) {
        ctx.state.set_current_note_index(index as i32);

        if sound_note(ctx.audio, pitch) {
            self.sounding = Some(pitch.to_string());
        }

        self.phase = HoldPhase::Holding { press_time };
        self.backup_timer = Some(self.timers.schedule_at(press_time + duration_ms));
    }

    /// Decide the fate of a hold: advance if sustained, roll back if released
    fn resolve_hold(&mut self, ctx: &mut EngineContext, now: u64) {
        let HoldPhase::Holding { press_time } = self.phase else {
            return;
        };
        let Some((_, pitch, duration_ms)) = self.expected(ctx) else {
            return;
        };
        let deadline = press_time + duration_ms;

        let release = ctx
            .tracker
            .latest_event_for_note(&pitch, false)
            .and_then(|e| e.release_time);

        match release {
            // Released before the written duration: discard this note's
            // progress and require a fresh press
            Some(released_at) if released_at < deadline => self.rollback(ctx),
            Some(_) => self.complete(ctx),
            None if now >= deadline => self.complete(ctx),
            None => {}
        }
    }

    fn complete(&mut self, ctx: &mut EngineContext) {
        self.cancel_timers();
        self.silence_current(ctx);

        let Some((index, _, _)) = self.expected(ctx) else {
            return;
        };
        ctx.state.set_last_completed_note_index(index as i32);

        if index + 1 < ctx.state.melody().len() {
            self.await_note(ctx, index + 1);
        } else {
            self.finish(ctx);
        }
    }

    fn rollback(&mut self, ctx: &mut EngineContext) {
        self.cancel_timers();
        self.silence_current(ctx);

        let expected = ctx.state.expected_note_index();
        ctx.state
            .set_current_note_index((expected - 1).max(NO_INDEX));
        self.phase = HoldPhase::Awaiting;
        self.watermark = ctx.tracker.event_count();
    }

    /// Terminal transition: like stop, but session results stay readable
    fn finish(&mut self, ctx: &mut EngineContext) {
        self.cancel_timers();
        self.silence_current(ctx);
        self.phase = HoldPhase::Awaiting;
        ctx.state.set_playing(false);
        ctx.state.reset_position();
    }
}

impl Default for WaitForUserEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine for WaitForUserEngine {
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
        self.await_note(ctx, resume);
    }

    fn pause(&mut self, ctx: &mut EngineContext) {
        self.cancel_timers();

        // An interrupted hold never completed: treat it like an early release
        if matches!(self.phase, HoldPhase::Holding { .. }) {
            let expected = ctx.state.expected_note_index();
            ctx.state
                .set_current_note_index((expected - 1).max(NO_INDEX));
            self.phase = HoldPhase::Awaiting;
        }

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
        self.phase = HoldPhase::Awaiting;

        ctx.state.set_current_note_index(index);
        ctx.state
            .set_last_completed_note_index((index - 1).max(NO_INDEX));

        // Each seek owns the snap delay; a stale one must not linger
        let start_after = (delay_ms > 0).then(|| ctx.clock.now_ms() + delay_ms);
        ctx.state.set_start_after_ts(start_after);

        if len > 0 {
            let resume = ctx.state.resume_index();
            if resume < len as usize {
                self.await_note(ctx, resume);
            } else if ctx.state.is_playing() {
                self.finish(ctx);
            }
        }
    }

    fn tick(&mut self, ctx: &mut EngineContext) {
        if !ctx.state.is_playing() {
            return;
        }

        let now = ctx.clock.now_ms();

        // Scrub-then-play snapping: swallow input until the delayed start
        if let Some(start_at) = ctx.state.start_after_ts() {
            if now < start_at {
                self.watermark = ctx.tracker.event_count();
                return;
            }
            ctx.state.set_start_after_ts(None);
        }

        // Backup timers cover a stalled poll; resolution is shared with the
        // poll path below
        while let Some(fired) = self.timers.pop_due(now) {
            if self.backup_timer == Some(fired) {
                self.backup_timer = None;
                self.resolve_hold(ctx, now);
            }
        }

        match self.phase {
            HoldPhase::Awaiting => self.scan_for_press(ctx),
            HoldPhase::Holding { .. } => {
                // Presses recorded during a hold are not graded
                self.watermark = ctx.tracker.event_count();
                self.resolve_hold(ctx, now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingTrigger;
    use crate::input::UserInputTracker;
    use crate::melody::NoteEvent;
    use crate::sequencer::clock::{Clock, ManualClock};
    use crate::sequencer::state::PlaybackState;

    struct Fixture {
        state: PlaybackState,
        tracker: UserInputTracker,
        audio: RecordingTrigger,
        clock: ManualClock,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                state: PlaybackState::new(),
                tracker: UserInputTracker::new(),
                audio: RecordingTrigger::new(),
                clock: ManualClock::new(),
            }
        }

        fn ctx(&mut self) -> EngineContext<'_> {
            EngineContext {
                state: &mut self.state,
                tracker: &mut self.tracker,
                audio: &mut self.audio,
                clock: &self.clock,
            }
        }

        fn press(&mut self, note: &str) {
            let now = self.clock.now_ms();
            self.tracker.record_press(note, now);
        }

        fn release(&mut self, note: &str) {
            let now = self.clock.now_ms();
            self.tracker.record_release(note, now);
        }
    }

    fn melody() -> Melody {
        Melody::new(vec![NoteEvent::new("C4", 1.0), NoteEvent::new("D4", 1.0)])
    }

    // 60 BPM: one beat = 1000 ms
    fn engine() -> WaitForUserEngine {
        WaitForUserEngine::with_tempo(Tempo::new(60))
    }

    #[test]
    fn test_waits_for_press() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        assert_eq!(fx.state.expected_note_index(), 0);
        assert_eq!(fx.state.next_note_to_play(), Some("C4"));

        // Time alone never advances this engine
        fx.clock.advance(60_000);
        engine.tick(&mut fx.ctx());
        assert_eq!(fx.state.expected_note_index(), 0);
        assert_eq!(fx.state.current_note_index(), NO_INDEX);
        assert!(fx.audio.started().is_empty());
    }

    #[test]
    fn test_press_and_hold_advances() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        fx.press("C4");
        engine.tick(&mut fx.ctx());
        assert_eq!(fx.state.current_note_index(), 0);
        assert_eq!(fx.audio.started(), ["C4"]);

        // Held past the nominal duration
        fx.clock.advance(1000);
        engine.tick(&mut fx.ctx());
        assert_eq!(fx.state.last_completed_note_index(), 0);
        assert_eq!(fx.state.expected_note_index(), 1);
        assert_eq!(fx.state.next_note_to_play(), Some("D4"));
    }

    #[test]
    fn test_early_release_rolls_back() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        fx.press("C4");
        engine.tick(&mut fx.ctx());

        // Released at 300 ms, well short of the 1000 ms nominal duration
        fx.clock.advance(300);
        fx.release("C4");
        engine.tick(&mut fx.ctx());

        assert_eq!(fx.state.expected_note_index(), 0);
        assert_eq!(fx.state.current_note_index(), NO_INDEX);
        assert_eq!(fx.state.last_completed_note_index(), NO_INDEX);

        // A second full press-and-hold advances normally
        fx.clock.advance(200);
        fx.press("C4");
        engine.tick(&mut fx.ctx());
        fx.clock.advance(1000);
        engine.tick(&mut fx.ctx());
        assert_eq!(fx.state.last_completed_note_index(), 0);
        assert_eq!(fx.state.expected_note_index(), 1);
    }

    #[test]
    fn test_wrong_presses_logged_and_ignored() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        fx.press("D4");
        fx.release("D4");
        fx.clock.advance(100);
        fx.press("E4");
        fx.release("E4");
        engine.tick(&mut fx.ctx());

        assert_eq!(fx.state.expected_note_index(), 0);
        assert_eq!(fx.state.errors().len(), 2);
        assert_eq!(fx.state.errors()[0].actual_note.as_deref(), Some("D4"));
        assert_eq!(fx.state.errors()[1].actual_note.as_deref(), Some("E4"));

        // The correct press still advances exactly once
        fx.clock.advance(100);
        fx.press("C4");
        engine.tick(&mut fx.ctx());
        fx.clock.advance(1000);
        engine.tick(&mut fx.ctx());
        assert_eq!(fx.state.expected_note_index(), 1);
    }

    #[test]
    fn test_octave_exact_matching_required() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        fx.press("C5");
        engine.tick(&mut fx.ctx());

        // Wrong octave counts as a wrong note here
        assert_eq!(fx.state.expected_note_index(), 0);
        assert_eq!(fx.state.errors().len(), 1);
    }

    #[test]
    fn test_backup_timer_covers_stalled_poll() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        fx.press("C4");
        engine.tick(&mut fx.ctx());

        // No tick until long after the hold deadline
        fx.clock.advance(5000);
        engine.tick(&mut fx.ctx());
        assert_eq!(fx.state.last_completed_note_index(), 0);
        assert_eq!(fx.state.expected_note_index(), 1);
    }

    #[test]
    fn test_final_note_finishes_session() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        fx.press("C4");
        engine.tick(&mut fx.ctx());
        fx.clock.advance(1000);
        engine.tick(&mut fx.ctx());

        fx.press("D4");
        engine.tick(&mut fx.ctx());
        fx.clock.advance(1000);
        engine.tick(&mut fx.ctx());

        assert!(!fx.state.is_playing());
        assert_eq!(fx.state.current_note_index(), NO_INDEX);
        assert_eq!(fx.state.expected_note_index(), NO_INDEX);
        assert!(fx.audio.sounding().is_empty());
    }

    #[test]
    fn test_pause_during_hold_requires_fresh_press() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        fx.press("C4");
        engine.tick(&mut fx.ctx());
        fx.clock.advance(400);
        engine.pause(&mut fx.ctx());

        assert!(!fx.state.is_playing());
        assert_eq!(fx.state.current_note_index(), NO_INDEX);
        assert!(fx.audio.sounding().is_empty());

        // Resume still expects note 0; the old press is not re-examined
        fx.release("C4");
        engine.play(&mut fx.ctx(), None);
        assert_eq!(fx.state.expected_note_index(), 0);

        fx.clock.advance(100);
        fx.press("C4");
        engine.tick(&mut fx.ctx());
        fx.clock.advance(1000);
        engine.tick(&mut fx.ctx());
        assert_eq!(fx.state.last_completed_note_index(), 0);
    }

    #[test]
    fn test_seek_moves_expectation() {
        let mut fx = Fixture::new();
        let mut engine = engine();
        engine.play(&mut fx.ctx(), Some(&melody()));

        engine.seek(&mut fx.ctx(), 1, 0);
        assert_eq!(fx.state.current_note_index(), 1);
        assert_eq!(fx.state.last_completed_note_index(), 0);
        assert_eq!(fx.state.expected_note_index(), 1);

        fx.press("D4");
        engine.tick(&mut fx.ctx());
        fx.clock.advance(1000);
        engine.tick(&mut fx.ctx());
        assert!(!fx.state.is_playing());
    }

    #[test]
    fn test_presses_before_play_are_not_consumed() {
        let mut fx = Fixture::new();
        let mut engine = engine();

        // Stray press before the session starts
        fx.press("C4");
        fx.release("C4");

        engine.play(&mut fx.ctx(), Some(&melody()));
        engine.tick(&mut fx.ctx());

        // Restart wiped the log; nothing matched, nothing graded
        assert_eq!(fx.state.expected_note_index(), 0);
        assert_eq!(fx.state.current_note_index(), NO_INDEX);
        assert!(fx.state.errors().is_empty());
    }
}
