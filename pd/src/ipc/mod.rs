//! Inter-Process Communication between the CLI and a running daemon
//!
//! Unix Domain Socket, one newline-terminated JSON request and one response
//! per connection.

use std::path::PathBuf;

pub mod client;
pub mod listener;
pub mod messages;

pub use client::DaemonClient;
pub use listener::{cleanup_socket, create_listener, create_listener_at, handle_connection, respond};
pub use messages::{DaemonMessage, DaemonResponse};

/// Largest request or response line accepted, in bytes
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Socket path for daemon IPC
pub fn get_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("pillard")
        .join("daemon.sock")
}
