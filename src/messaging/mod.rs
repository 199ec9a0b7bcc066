// Messaging module - Commands and lock-free channels

pub mod channels;
pub mod command;

pub use channels::{CommandConsumer, CommandProducer, create_command_channel};
pub use command::Command;
