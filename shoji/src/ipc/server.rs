use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};

use shoji_ipc::{Command, Response, StateEvent};

use super::SOCKET_PATH;
use crate::event_emitter::EventEmitter;

type CommandSender = mpsc::Sender<(Command, mpsc::Sender<Response>)>;

/// Line-delimited JSON server on the daemon socket. Each line from a
/// client is one `Command`; the reply is one `Response` line. The
/// `subscribe` command instead switches the connection over to a
/// one-way stream of `StateEvent` lines.
pub struct IpcServer {
    cmd_tx: CommandSender,
    events: EventEmitter,
}

impl IpcServer {
    pub fn new(cmd_tx: CommandSender, events: EventEmitter) -> Self {
        Self { cmd_tx, events }
    }

    pub async fn run(&self) -> Result<()> {
        let listener = bind(Path::new(SOCKET_PATH))?;
        tracing::info!("Listening on {}", SOCKET_PATH);

        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    continue;
                }
            };
            let conn = Connection {
                cmd_tx: self.cmd_tx.clone(),
                events: self.events.clone(),
            };
            tokio::spawn(async move {
                if let Err(e) = conn.serve(stream).await {
                    tracing::debug!("Client connection ended: {:#}", e);
                }
            });
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(SOCKET_PATH);
    }
}

fn bind(path: &Path) -> Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove stale socket {}", path.display()))?;
    }
    UnixListener::bind(path).with_context(|| format!("Failed to bind {}", path.display()))
}

struct Connection {
    cmd_tx: CommandSender,
    events: EventEmitter,
}

impl Connection {
    async fn serve(self, stream: UnixStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Command>(line) {
                Ok(Command::Subscribe { snapshot, filter }) => {
                    return self.stream_events(&mut writer, snapshot, filter.or_all()).await;
                }
                Ok(cmd) => {
                    tracing::debug!("Received command: {:?}", cmd);
                    let response = self.dispatch(cmd).await;
                    write_line(&mut writer, &serde_json::to_string(&response)?).await?;
                }
                Err(e) => {
                    let response = Response::Error {
                        message: format!("Invalid command: {}", e),
                    };
                    write_line(&mut writer, &serde_json::to_string(&response)?).await?;
                }
            }
        }
        Ok(())
    }

    /// Round-trip one command through the state loop.
    async fn dispatch(&self, cmd: Command) -> Response {
        let (resp_tx, mut resp_rx) = mpsc::channel(1);
        if self.cmd_tx.send((cmd, resp_tx)).await.is_err() {
            return Response::Error {
                message: "Daemon is shutting down".to_string(),
            };
        }
        match resp_rx.recv().await {
            Some(response) => response,
            None => Response::Error {
                message: "Daemon dropped the request".to_string(),
            },
        }
    }

    async fn stream_events(
        &self,
        writer: &mut OwnedWriteHalf,
        want_snapshot: bool,
        filter: shoji_ipc::EventFilter,
    ) -> Result<()> {
        // Subscribe before querying the snapshot so no change slips
        // between the two.
        let mut rx = self.events.subscribe();

        if want_snapshot {
            let snapshot = self.compose_snapshot().await?;
            write_line(writer, &serde_json::to_string(&snapshot)?).await?;
        }

        loop {
            match rx.recv().await {
                Ok(event) if filter.matches(&event) => {
                    write_line(writer, &serde_json::to_string(&event)?).await?;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Subscriber fell {} events behind", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        Ok(())
    }

    /// The snapshot is assembled from the same queries any client
    /// could issue, so the state loop needs no snapshot path of its
    /// own.
    async fn compose_snapshot(&self) -> Result<StateEvent> {
        let desktops = match self.dispatch(Command::ListDesktops).await {
            Response::Desktops { desktops } => desktops,
            other => anyhow::bail!("Unexpected reply to desktop query: {:?}", other),
        };
        let state = match self.dispatch(Command::GetState).await {
            Response::State { state } => state,
            other => anyhow::bail!("Unexpected reply to state query: {:?}", other),
        };
        Ok(StateEvent::Snapshot {
            desktops,
            current_desktop: state.current_desktop,
            recent_desktop: state.recent_desktop,
            empty_desktops: state.empty_desktops,
        })
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, json: &str) -> Result<()> {
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoji_ipc::{DesktopInfo, EventFilter, StateInfo};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    /// Answers queries the way the state loop would.
    fn spawn_responder(mut cmd_rx: mpsc::Receiver<(Command, mpsc::Sender<Response>)>) {
        tokio::spawn(async move {
            while let Some((cmd, resp_tx)) = cmd_rx.recv().await {
                let response = match cmd {
                    Command::SwitchToDesktop { .. } => Response::Ok,
                    Command::ListDesktops => Response::Desktops {
                        desktops: vec![DesktopInfo {
                            number: 1,
                            name: "main".to_string(),
                            is_current: true,
                            is_empty: false,
                        }],
                    },
                    Command::GetState => Response::State {
                        state: StateInfo {
                            desktop_count: 1,
                            current_desktop: 1,
                            recent_desktop: Some(1),
                            empty_desktops: vec![],
                        },
                    },
                    _ => Response::Error {
                        message: "unhandled".to_string(),
                    },
                };
                let _ = resp_tx.send(response).await;
            }
        });
    }

    fn connection(
        events: &EventEmitter,
    ) -> (Connection, mpsc::Receiver<(Command, mpsc::Sender<Response>)>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        (
            Connection {
                cmd_tx,
                events: events.clone(),
            },
            cmd_rx,
        )
    }

    #[tokio::test]
    async fn test_command_roundtrip_over_socket() {
        let events = EventEmitter::new(16);
        let (conn, cmd_rx) = connection(&events);
        spawn_responder(cmd_rx);

        let (server_side, client_side) = UnixStream::pair().unwrap();
        tokio::spawn(conn.serve(server_side));

        let (read, mut write) = client_side.into_split();
        let mut lines = BufReader::new(read).lines();

        write
            .write_all(b"{\"type\":\"switch_to_desktop\",\"number\":2}\n")
            .await
            .unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert_eq!(response, Response::Ok);
    }

    #[tokio::test]
    async fn test_invalid_json_keeps_the_connection_usable() {
        let events = EventEmitter::new(16);
        let (conn, cmd_rx) = connection(&events);
        spawn_responder(cmd_rx);

        let (server_side, client_side) = UnixStream::pair().unwrap();
        tokio::spawn(conn.serve(server_side));

        let (read, mut write) = client_side.into_split();
        let mut lines = BufReader::new(read).lines();

        write.write_all(b"not json\n").await.unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert!(matches!(response, Response::Error { .. }));

        write
            .write_all(b"{\"type\":\"switch_to_desktop\",\"number\":1}\n")
            .await
            .unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert_eq!(response, Response::Ok);
    }

    #[tokio::test]
    async fn test_subscribe_sends_snapshot_then_filtered_events() {
        let events = EventEmitter::new(16);
        let (conn, cmd_rx) = connection(&events);
        spawn_responder(cmd_rx);

        let (server_side, client_side) = UnixStream::pair().unwrap();
        tokio::spawn(conn.serve(server_side));

        let (read, mut write) = client_side.into_split();
        let mut lines = BufReader::new(read).lines();

        let subscribe = serde_json::to_string(&Command::Subscribe {
            snapshot: true,
            filter: EventFilter {
                empty: true,
                ..Default::default()
            },
        })
        .unwrap();
        write.write_all(subscribe.as_bytes()).await.unwrap();
        write.write_all(b"\n").await.unwrap();

        let line = lines.next_line().await.unwrap().unwrap();
        let first: StateEvent = serde_json::from_str(&line).unwrap();
        match first {
            StateEvent::Snapshot {
                desktops,
                current_desktop,
                ..
            } => {
                assert_eq!(desktops.len(), 1);
                assert_eq!(current_desktop, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        // The broadcast subscription was live before the snapshot was
        // written, so these cannot be missed.
        events.emit_current_desktop_changed(2);
        events.emit_empty_desktops_updated(vec![1]);

        let line = lines.next_line().await.unwrap().unwrap();
        let event: StateEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(event, StateEvent::EmptyDesktopsUpdated { desktops: vec![1] });
    }
}
