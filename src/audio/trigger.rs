// Audio trigger seam - Interface to the external synthesis engine
//
// The synthesizer itself (oscillators, filters, envelopes) lives behind this
// trait. Engines only ever start and stop named pitches.

use std::collections::HashSet;
use thiserror::Error;

/// Audio trigger errors
#[derive(Debug, Error)]
pub enum AudioTriggerError {
    #[error("voice trigger failed for {0}: {1}")]
    TriggerFailed(String, String),

    #[error("voice release failed for {0}: {1}")]
    ReleaseFailed(String, String),
}

/// Starts and stops synthesized voices by pitch name
///
/// Implementations must tolerate redundant calls: playing an
/// already-sounding pitch and stopping an already-stopped pitch are no-ops.
/// Engines catch and log failures; a failed release never blocks the
/// scheduling loop.
pub trait AudioTrigger {
    fn play_note(&mut self, pitch: &str) -> Result<(), AudioTriggerError>;
    fn stop_note(&mut self, pitch: &str) -> Result<(), AudioTriggerError>;
}

/// Prints triggered notes to stdout (headless demo backend)
#[derive(Debug, Default)]
pub struct ConsoleTrigger {
    sounding: HashSet<String>,
}

impl ConsoleTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioTrigger for ConsoleTrigger {
    fn play_note(&mut self, pitch: &str) -> Result<(), AudioTriggerError> {
        if self.sounding.insert(pitch.to_string()) {
            println!("  [note on ] {}", pitch);
        }
        Ok(())
    }

    fn stop_note(&mut self, pitch: &str) -> Result<(), AudioTriggerError> {
        if self.sounding.remove(pitch) {
            println!("  [note off] {}", pitch);
        }
        Ok(())
    }
}

/// Records every call for inspection (test double)
#[derive(Debug, Default)]
pub struct RecordingTrigger {
    started: Vec<String>,
    stopped: Vec<String>,
    sounding: HashSet<String>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pitches passed to `play_note`, in call order
    pub fn started(&self) -> &[String] {
        &self.started
    }

    /// Pitches passed to `stop_note`, in call order
    pub fn stopped(&self) -> &[String] {
        &self.stopped
    }

    /// Pitches started but not yet stopped
    pub fn sounding(&self) -> &HashSet<String> {
        &self.sounding
    }
}

impl AudioTrigger for RecordingTrigger {
    fn play_note(&mut self, pitch: &str) -> Result<(), AudioTriggerError> {
        self.started.push(pitch.to_string());
        self.sounding.insert(pitch.to_string());
        Ok(())
    }

    fn stop_note(&mut self, pitch: &str) -> Result<(), AudioTriggerError> {
        self.stopped.push(pitch.to_string());
        self.sounding.remove(pitch);
        Ok(())
    }
}

/// Discards all triggers (tests and silent runs)
#[derive(Debug, Default)]
pub struct NullTrigger;

impl AudioTrigger for NullTrigger {
    fn play_note(&mut self, _pitch: &str) -> Result<(), AudioTriggerError> {
        Ok(())
    }

    fn stop_note(&mut self, _pitch: &str) -> Result<(), AudioTriggerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_trigger_dedup() {
        let mut trigger = ConsoleTrigger::new();

        trigger.play_note("C4").unwrap();
        trigger.play_note("C4").unwrap();
        assert_eq!(trigger.sounding.len(), 1);

        trigger.stop_note("C4").unwrap();
        trigger.stop_note("C4").unwrap();
        assert!(trigger.sounding.is_empty());
    }
}
