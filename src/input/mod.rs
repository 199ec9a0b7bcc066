// Input module - User key press/release tracking

pub mod tracker;

pub use tracker::{UserInputEvent, UserInputTracker};
