//! Event Logger - persists coordinator events to a JSONL file
//!
//! Subscribes to the EventBus and appends every event, wrapped in an
//! [`EventLogEntry`], to a single `events.jsonl` for history and debugging.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use super::bus::EventBus;
use super::types::{CoordEvent, EventLogEntry};

/// Appends events to `<dir>/events.jsonl`
pub struct EventLogger {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl EventLogger {
    /// Create a logger writing into `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join("events.jsonl");
        debug!(?path, "EventLogger::new: creating logger");
        Self { path, writer: None }
    }

    /// Create a logger under the local data dir (`<data_local_dir>/pillard`)
    pub fn with_default_path() -> eyre::Result<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| eyre::eyre!("Could not determine local data directory"))?
            .join("pillard");
        fs::create_dir_all(&dir)?;
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a JSON line
    pub fn write_event(&mut self, event: &CoordEvent) -> eyre::Result<()> {
        debug!(event_type = event.event_type(), "EventLogger::write_event");

        if self.writer.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            self.writer = Some(BufWriter::new(file));
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        let entry = EventLogEntry::new(event.clone());
        let json = serde_json::to_string(&entry)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }

    /// Consume events from the bus until the channel closes
    ///
    /// Meant to be spawned as a background task.
    pub async fn run(mut self, event_bus: Arc<EventBus>) {
        let rx = event_bus.subscribe();
        drop(event_bus);
        self.run_with(rx).await;
    }

    async fn run_with(&mut self, mut rx: broadcast::Receiver<CoordEvent>) {
        debug!("EventLogger::run: starting event logger");
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = self.write_event(&event) {
                        error!(event_type = event.event_type(), error = %e, "EventLogger: failed to write event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "EventLogger: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("EventLogger: channel closed, shutting down");
                    break;
                }
            }
        }

        if let Some(mut writer) = self.writer.take()
            && let Err(e) = writer.flush()
        {
            warn!(error = %e, "EventLogger: failed to flush on shutdown");
        }
    }
}
