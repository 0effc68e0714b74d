use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

use anyhow::{Context, Result};

use shoji_ipc::{Command, EventFilter, Response, StateEvent};

use super::SOCKET_PATH;

/// Blocking request/reply client for the daemon socket.
pub struct IpcClient {
    reader: BufReader<UnixStream>,
}

impl IpcClient {
    pub fn connect() -> Result<Self> {
        let stream = UnixStream::connect(SOCKET_PATH)
            .context("Failed to connect; is the shoji daemon running?")?;
        Ok(Self {
            reader: BufReader::new(stream),
        })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        let json = serde_json::to_string(cmd)?;
        let stream = self.reader.get_mut();
        stream.write_all(json.as_bytes())?;
        stream.write_all(b"\n")?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            anyhow::bail!("Daemon closed the connection");
        }
        serde_json::from_str(&line).context("Malformed response from daemon")
    }
}

/// Subscribe on the daemon socket and print each event as a JSON line
/// until the daemon goes away.
pub fn subscribe_and_print(snapshot: bool, filter: Option<EventFilter>) -> Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH)
        .context("Failed to connect; is the shoji daemon running?")?;

    let subscribe = Command::Subscribe {
        snapshot,
        filter: filter.unwrap_or_default(),
    };
    writeln!(stream, "{}", serde_json::to_string(&subscribe)?)?;

    for line in BufReader::new(stream).lines() {
        let line = line?;
        // Parse before echoing so broken framing surfaces here, not in
        // whatever consumes our stdout.
        let _: StateEvent =
            serde_json::from_str(&line).context("Malformed event from daemon")?;
        println!("{}", line);
    }
    Ok(())
}
