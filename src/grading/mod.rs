// Grading module - Matching helpers and practice error records

pub mod error;
pub mod matcher;

pub use error::{ErrorKind, PracticeError};
pub use matcher::{DURATION_TOLERANCE_MS, TIMING_TOLERANCE_MS, duration_matches, timing_error_ms};
