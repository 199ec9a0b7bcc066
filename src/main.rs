use mypiano_trainer::melody::{Melody, NoteEvent};
use mypiano_trainer::sequencer::{PlaybackMode, PracticeSession};
use mypiano_trainer::{ConsoleTrigger, create_command_channel};
use std::thread;
use std::time::Duration;

// Ringbuffer capacity constant
// Sized for worst-case MIDI burst scenarios:
// - MIDI can theoretically send ~1000 messages/second (31250 baud)
// - The control loop drains every 50ms, so <64 messages per pass
// - 512 capacity provides >500ms of headroom at max MIDI rate
const MIDI_RINGBUFFER_CAPACITY: usize = 512;

// Nominal input polling period for the sequencing engines
const POLL_INTERVAL_MS: u64 = 50;

const DEMO_TEMPO_BPM: u32 = 100;

fn demo_melody() -> Melody {
    // Ode to Joy, first phrase
    let notes = [
        ("E4", 1.0),
        ("E4", 1.0),
        ("F4", 1.0),
        ("G4", 1.0),
        ("G4", 1.0),
        ("F4", 1.0),
        ("E4", 1.0),
        ("D4", 1.0),
        ("C4", 1.0),
        ("C4", 1.0),
        ("D4", 1.0),
        ("E4", 1.0),
        ("E4", 1.5),
        ("D4", 0.5),
        ("D4", 2.0),
    ];
    Melody::new(
        notes
            .iter()
            .map(|(note, duration)| NoteEvent::new(*note, *duration))
            .collect(),
    )
}

fn main() {
    println!("=== MyPiano Trainer ===");
    println!("Headless practice sequencer\n");

    let mut mode = PlaybackMode::Normal;
    let mut melody_path: Option<String> = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--practice" => mode = PlaybackMode::WaitForUser,
            "--grade" => mode = PlaybackMode::ErrorTracking,
            path => melody_path = Some(path.to_string()),
        }
    }

    let melody = match melody_path {
        Some(path) => match Melody::from_json_file(&path) {
            Ok(melody) => {
                println!("Loaded melody from {} ({} notes)", path, melody.len());
                melody
            }
            Err(e) => {
                eprintln!("ERROR: could not load {}: {}", path, e);
                return;
            }
        },
        None => {
            println!("Using the bundled demo melody");
            demo_melody()
        }
    };

    // Command channel: MIDI callback thread → control loop
    let (command_tx, mut command_rx) = create_command_channel(MIDI_RINGBUFFER_CAPACITY);

    let midi = match mode {
        PlaybackMode::Normal => None,
        // Interactive modes take their key input from a MIDI keyboard
        _ => match mypiano_trainer::MidiInput::new(command_tx) {
            Ok(input) => {
                if !input.is_connected() {
                    println!("Interactive mode without a MIDI keyboard: nothing will advance.");
                }
                Some(input)
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return;
            }
        },
    };

    let mut session =
        PracticeSession::new(Box::new(ConsoleTrigger::new())).with_tempo(DEMO_TEMPO_BPM);
    session.set_mode(mode);

    match mode {
        PlaybackMode::Normal => println!("\nAutoplay at {} BPM...\n", DEMO_TEMPO_BPM),
        PlaybackMode::WaitForUser => println!("\nPlay each highlighted note on your keyboard.\n"),
        PlaybackMode::ErrorTracking => println!("\nPlay along; mistakes are graded.\n"),
    }

    session.play(Some(&melody));

    // Control loop - single-threaded cooperative scheduling
    while session.state().is_playing() {
        while let Some(cmd) = ringbuf::traits::Consumer::try_pop(&mut command_rx) {
            session.apply_command(cmd);
        }
        session.tick();
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }

    drop(midi);

    let errors = session.state().errors();
    if errors.is_empty() {
        println!("\n=== Session finished, no mistakes recorded ===");
    } else {
        println!("\n=== Session finished: {} mistake(s) ===", errors.len());
        for error in errors {
            match &error.actual_note {
                Some(actual) => println!(
                    "  note {} expected {} got {} ({:?})",
                    error.note_index, error.expected_note, actual, error.kind
                ),
                None => println!(
                    "  note {} expected {} ({:?})",
                    error.note_index, error.expected_note, error.kind
                ),
            }
        }
    }
}
