//! Interactive-mode integration tests: wait-for-user and grading
//!
//! Driven through the session surface with a manual clock, the way the UI
//! layer drives the real thing.

use mypiano_trainer::melody::{Melody, NoteEvent};
use mypiano_trainer::sequencer::{Clock, ManualClock, PlaybackMode, PracticeSession};
use mypiano_trainer::{ErrorKind, NullTrigger};
use std::sync::Arc;

const NO_INDEX: i32 = -1;

// 60 BPM: one beat = 1000 ms
fn session(clock: &Arc<ManualClock>, mode: PlaybackMode) -> PracticeSession {
    let clock = Arc::clone(clock) as Arc<dyn Clock>;
    let mut session = PracticeSession::with_clock(Box::new(NullTrigger), clock).with_tempo(60);
    session.set_mode(mode);
    session
}

fn two_notes() -> Melody {
    Melody::new(vec![NoteEvent::new("C4", 1.0), NoteEvent::new("D4", 1.0)])
}

/// Pump in 50 ms steps
fn run_for(session: &mut PracticeSession, clock: &ManualClock, total_ms: u64) {
    let mut elapsed = 0;
    while elapsed < total_ms {
        let step = 50.min(total_ms - elapsed);
        clock.advance(step);
        elapsed += step;
        session.tick();
    }
}

#[test]
fn wait_mode_early_release_discards_note_progress() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::WaitForUser);
    session.play(Some(&two_notes()));

    // Press C4 at t=0, release at t=300 (< 1000 ms nominal)
    session.record_press("C4");
    session.tick();
    assert_eq!(session.state().current_note_index(), 0);

    run_for(&mut session, &clock, 300);
    session.record_release("C4");
    session.tick();

    assert_eq!(session.state().current_note_index(), NO_INDEX);
    assert_eq!(session.state().expected_note_index(), 0);
    assert_eq!(session.state().last_completed_note_index(), NO_INDEX);

    // A second full press-and-hold advances normally
    run_for(&mut session, &clock, 100);
    session.record_press("C4");
    session.tick();
    run_for(&mut session, &clock, 1000);

    assert_eq!(session.state().last_completed_note_index(), 0);
    assert_eq!(session.state().expected_note_index(), 1);
}

#[test]
fn wait_mode_wrong_presses_log_then_correct_advances_once() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::WaitForUser);
    session.play(Some(&two_notes()));

    // Several wrong presses in a row
    for wrong in ["D4", "E4", "B3"] {
        session.record_press(wrong);
        session.record_release(wrong);
        clock.advance(80);
        session.tick();
    }

    let wrong_notes: Vec<_> = session
        .state()
        .errors()
        .iter()
        .filter(|e| e.kind == ErrorKind::WrongNote)
        .map(|e| e.actual_note.clone().unwrap())
        .collect();
    assert_eq!(wrong_notes, ["D4", "E4", "B3"]);
    assert_eq!(session.state().expected_note_index(), 0);

    // The correct press advances exactly once
    session.record_press("C4");
    session.tick();
    run_for(&mut session, &clock, 1000);
    assert_eq!(session.state().expected_note_index(), 1);
    assert_eq!(session.state().last_completed_note_index(), 0);
}

#[test]
fn wait_mode_full_melody_finishes() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::WaitForUser);
    session.play(Some(&two_notes()));

    for pitch in ["C4", "D4"] {
        session.record_press(pitch);
        session.tick();
        run_for(&mut session, &clock, 1000);
        session.record_release(pitch);
        session.tick();
    }

    assert!(!session.state().is_playing());
    assert_eq!(session.state().expected_note_index(), NO_INDEX);
    assert!(session.state().errors().is_empty());
}

#[test]
fn grading_missed_note_scenario() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::ErrorTracking);

    // Melody [{C4,1}] at 60 BPM, no key press in [0, 1000)
    session.play(Some(&Melody::new(vec![NoteEvent::new("C4", 1.0)])));
    run_for(&mut session, &clock, 1050);

    assert!(!session.state().is_playing());
    let errors = session.state().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::MissedNote);
    assert_eq!(errors[0].note_index, 0);
    assert_eq!(errors[0].expected_note, "C4");
}

#[test]
fn grading_clean_performance_has_no_errors() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::ErrorTracking);
    session.play(Some(&two_notes()));

    // Both notes pressed on time and held to length
    session.record_press("C4");
    run_for(&mut session, &clock, 950);
    session.record_release("C4");
    run_for(&mut session, &clock, 50);
    session.record_press("D4");
    run_for(&mut session, &clock, 950);
    session.record_release("D4");
    run_for(&mut session, &clock, 100);

    assert!(!session.state().is_playing());
    assert!(session.state().errors().is_empty());
}

#[test]
fn grading_records_but_never_blocks() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::ErrorTracking);
    session.play(Some(&two_notes()));

    // Wrong pitch during note 0, nothing during note 1
    session.record_press("G4");
    session.record_release("G4");
    run_for(&mut session, &clock, 2100);

    assert!(!session.state().is_playing());
    let kinds: Vec<_> = session.state().errors().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [ErrorKind::WrongNote, ErrorKind::MissedNote]);
}

#[test]
fn mode_switch_mid_session_is_safe() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::Normal);
    session.play(Some(&two_notes()));

    session.set_mode(PlaybackMode::ErrorTracking);
    assert!(!session.state().is_playing());

    // No stale autoplay timer survives the switch
    run_for(&mut session, &clock, 3000);
    assert_eq!(session.state().current_note_index(), NO_INDEX);

    // The new engine starts a fresh session
    session.play(Some(&two_notes()));
    run_for(&mut session, &clock, 2100);
    assert_eq!(session.state().errors().len(), 2);
}

#[test]
fn stop_wipes_errors_and_input_log() {
    let clock = Arc::new(ManualClock::new());
    let mut session = session(&clock, PlaybackMode::ErrorTracking);
    session.play(Some(&two_notes()));

    session.record_press("E4");
    session.record_release("E4");
    run_for(&mut session, &clock, 1100);
    assert!(!session.state().errors().is_empty());

    session.stop();
    assert!(session.state().errors().is_empty());
    assert_eq!(session.tracker().event_count(), 0);
    assert!(!session.state().is_playing());
}
