// Audio module - Trigger interface to the external synthesis engine

pub mod trigger;

pub use trigger::{AudioTrigger, AudioTriggerError, ConsoleTrigger, NullTrigger, RecordingTrigger};
