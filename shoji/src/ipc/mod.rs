mod client;
mod server;

pub use client::{subscribe_and_print, IpcClient};
pub use server::IpcServer;

/// Every client talks to this socket. Commands get a one-line reply;
/// a `subscribe` command turns the connection into an event stream.
pub(crate) const SOCKET_PATH: &str = "/tmp/shoji.sock";
