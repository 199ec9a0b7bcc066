// Sequencer module - Playback state, clocks, timers, and the three engines

pub mod clock;
pub mod engine;
pub mod error_tracking;
pub mod normal;
pub mod router;
pub mod state;
pub mod tempo;
pub mod timer;
pub mod wait_for_user;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineContext, PlaybackEngine};
pub use error_tracking::ErrorTrackingEngine;
pub use normal::NormalEngine;
pub use router::{PlaybackMode, PracticeSession};
pub use state::{NO_INDEX, PlaybackState};
pub use tempo::{MAX_BPM, MIN_BPM, Tempo};
pub use timer::{TimerId, TimerQueue};
pub use wait_for_user::WaitForUserEngine;
