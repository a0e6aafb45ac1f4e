//! IPC listener for the daemon side

use std::path::PathBuf;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use super::messages::{DaemonMessage, DaemonResponse};
use super::{MAX_MESSAGE_SIZE, get_socket_path};
use crate::coordinator::Coordinator;

/// A client gets this long to send its request
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Create and bind a Unix Domain Socket listener for the daemon
///
/// Handles cleanup of stale socket files from previous runs.
pub fn create_listener() -> Result<(UnixListener, PathBuf)> {
    let socket_path = get_socket_path();
    create_listener_at(&socket_path)
}

/// Create a listener at a specific path
pub fn create_listener_at(socket_path: &PathBuf) -> Result<(UnixListener, PathBuf)> {
    debug!(?socket_path, "create_listener: creating IPC socket");

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }

    if socket_path.exists() {
        debug!(?socket_path, "create_listener: removing stale socket");
        std::fs::remove_file(socket_path).context("Failed to remove stale socket")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind IPC socket")?;
    debug!(?socket_path, "create_listener: socket bound successfully");

    Ok((listener, socket_path.clone()))
}

/// Remove the socket file on shutdown
pub fn cleanup_socket(socket_path: &PathBuf) {
    if socket_path.exists() {
        debug!(?socket_path, "cleanup_socket: removing socket file");
        if let Err(e) = std::fs::remove_file(socket_path) {
            warn!(?socket_path, error = %e, "Failed to remove socket file");
        }
    }
}

/// Read one request line
pub async fn read_message(stream: &mut UnixStream) -> Result<DaemonMessage> {
    let mut line = String::new();
    let bytes_read = {
        let mut reader = BufReader::new((&mut *stream).take(MAX_MESSAGE_SIZE as u64 + 1));
        tokio::time::timeout(READ_TIMEOUT, reader.read_line(&mut line))
            .await
            .context("Read timeout")?
            .context("Failed to read IPC message")?
    };

    if bytes_read > MAX_MESSAGE_SIZE {
        return Err(eyre::eyre!("Message too large: more than {} bytes", MAX_MESSAGE_SIZE));
    }

    if line.is_empty() {
        return Err(eyre::eyre!("Empty message received"));
    }

    let msg: DaemonMessage = serde_json::from_str(line.trim()).context("Failed to parse IPC message")?;
    debug!(?msg, "read_message: parsed message");

    Ok(msg)
}

/// Send a response on the stream, replacing it with an error if it is too large
pub async fn send_response(stream: &mut UnixStream, response: DaemonResponse) -> Result<()> {
    let mut response_json = serde_json::to_string(&response).context("Failed to serialize response")?;
    if response_json.len() > MAX_MESSAGE_SIZE {
        warn!(bytes = response_json.len(), "IPC response too large, sending error instead");
        let error = DaemonResponse::Error {
            message: format!("Response too large ({} bytes); use a smaller limit", response_json.len()),
        };
        response_json = serde_json::to_string(&error).context("Failed to serialize response")?;
    }
    stream
        .write_all(response_json.as_bytes())
        .await
        .context("Failed to write response")?;
    stream.write_all(b"\n").await.context("Failed to write newline")?;
    stream.flush().await.context("Failed to flush response")?;
    debug!("send_response: sent response");
    Ok(())
}

/// Answer a request from the coordinator's observability surface
///
/// The second value is true when the daemon should shut down.
pub fn respond(msg: DaemonMessage, coordinator: &Coordinator) -> (DaemonResponse, bool) {
    debug!(?msg, "respond: called");
    let response = match msg {
        DaemonMessage::Ping => DaemonResponse::Pong {
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        DaemonMessage::Status => DaemonResponse::Status {
            status: coordinator.system_status(),
            metrics: coordinator.aggregate_metrics(),
            current_cycle: coordinator.current_cycle(),
        },
        DaemonMessage::Cycles { limit } => {
            let history = coordinator.cycle_history();
            let skip = history.len().saturating_sub(limit);
            DaemonResponse::Cycles {
                cycles: history.into_iter().skip(skip).collect(),
            }
        }
        DaemonMessage::RepositoryActivity { limit } => DaemonResponse::RepositoryActivity {
            entries: coordinator.recent_repository_activity(limit),
        },
        DaemonMessage::Discussions { limit } => DaemonResponse::Discussions {
            messages: coordinator.recent_discussions(limit),
        },
        DaemonMessage::Activities { limit } => DaemonResponse::Activities {
            activities: coordinator.recent_activities(limit),
        },
        DaemonMessage::Shutdown => return (DaemonResponse::Ok, true),
    };
    (response, false)
}

/// Serve one connection; returns true if the client asked for shutdown
pub async fn handle_connection(mut stream: UnixStream, coordinator: &Coordinator) -> Result<bool> {
    let (response, shutdown) = match read_message(&mut stream).await {
        Ok(msg) => respond(msg, coordinator),
        Err(e) => {
            warn!(error = %e, "Bad IPC request");
            (
                DaemonResponse::Error {
                    message: e.to_string(),
                },
                false,
            )
        }
    };
    send_response(&mut stream, response).await?;
    Ok(shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::coordinator::Collaborators;
    use crate::events::EventBus;
    use crate::health::probe::mock::ScriptedProbe;
    use crate::ipc::client::DaemonClient;
    use crate::repo::mock::RecordingHost;
    use crate::store::MemoryStore;
    use crate::strategy::FixedStrategy;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn coordinator() -> Coordinator {
        let strategy = Arc::new(FixedStrategy::default());
        Coordinator::new(
            Config::default(),
            Collaborators {
                store: Arc::new(MemoryStore::new()),
                repo_host: Arc::new(RecordingHost::default()),
                probe: Arc::new(ScriptedProbe::all_healthy(&["hub", "ecosystem", "dao"])),
                detector: strategy.clone(),
                picker: strategy,
                sink: None,
            },
            Arc::new(EventBus::new(64)),
        )
    }

    #[tokio::test]
    async fn test_create_listener_creates_parent_dir() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("subdir").join("daemon.sock");

        let (_, path) = create_listener_at(&socket_path).unwrap();
        assert_eq!(path, socket_path);
        assert!(socket_path.exists());
    }

    #[tokio::test]
    async fn test_create_listener_removes_stale_socket() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("daemon.sock");
        std::fs::write(&socket_path, "stale").unwrap();

        assert!(create_listener_at(&socket_path).is_ok());
    }

    #[test]
    fn test_cleanup_socket() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("daemon.sock");
        std::fs::write(&socket_path, "test").unwrap();

        cleanup_socket(&socket_path);
        assert!(!socket_path.exists());
        // Missing file is fine
        cleanup_socket(&socket_path);
    }

    #[tokio::test]
    async fn test_respond_limits_cycles() {
        let coordinator = coordinator();
        for _ in 0..3 {
            coordinator.feedback().run_cycle().await;
        }

        let (response, shutdown) = respond(DaemonMessage::Cycles { limit: 2 }, &coordinator);
        assert!(!shutdown);
        match response {
            DaemonResponse::Cycles { cycles } => {
                let sequences: Vec<u64> = cycles.iter().map(|c| c.sequence_number).collect();
                assert_eq!(sequences, vec![2, 3]);
            }
            other => panic!("Unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_respond_shutdown() {
        let (response, shutdown) = respond(DaemonMessage::Shutdown, &coordinator());
        assert_eq!(response, DaemonResponse::Ok);
        assert!(shutdown);
    }

    #[tokio::test]
    async fn test_end_to_end_status() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("test.sock");
        let (listener, _) = create_listener_at(&socket_path).unwrap();

        let coordinator = coordinator();
        coordinator.coordination().run_tick().await;

        let server = async {
            let (stream, _) = listener.accept().await.unwrap();
            handle_connection(stream, &coordinator).await.unwrap()
        };
        let client = DaemonClient::with_socket_path(socket_path);
        let (shutdown, status) = tokio::join!(server, client.status());

        assert!(!shutdown);
        let (status, metrics, current) = status.unwrap();
        assert_eq!(status.health_score, 100);
        assert_eq!(metrics.total_cycles, 0);
        assert!(current.is_none());
    }

    #[tokio::test]
    async fn test_malformed_request_gets_error() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("test.sock");
        let (listener, _) = create_listener_at(&socket_path).unwrap();
        let coordinator = coordinator();

        let server = async {
            let (stream, _) = listener.accept().await.unwrap();
            handle_connection(stream, &coordinator).await.unwrap()
        };
        let client = async {
            let mut stream = UnixStream::connect(&socket_path).await.unwrap();
            stream.write_all(b"not json\n").await.unwrap();
            let mut line = String::new();
            BufReader::new(&mut stream).read_line(&mut line).await.unwrap();
            serde_json::from_str::<DaemonResponse>(line.trim()).unwrap()
        };
        let (shutdown, response) = tokio::join!(server, client);

        assert!(!shutdown);
        assert!(matches!(response, DaemonResponse::Error { .. }));
    }
}
