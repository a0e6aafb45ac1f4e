//! Event system for coordinator activity streaming
//!
//! Components emit [`CoordEvent`]s on the [`EventBus`]; the daemon's
//! [`EventLogger`] subscribes and appends them to a JSONL file.

pub mod bus;
pub mod logger;
pub mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use logger::EventLogger;
pub use types::{CoordEvent, EventLogEntry};
