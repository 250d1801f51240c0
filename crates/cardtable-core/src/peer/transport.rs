//! WebSocket endpoint and connections on background threads.
//!
//! Threads never touch peer state. They report through a [`TransportEvent`]
//! channel that the owner drains, and take commands through a per-connection
//! channel.

use super::PeerError;
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, WebSocket};
use url::Url;

/// Poll interval for reads and for the accept loop.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Identifies a connection within one endpoint.
pub type ConnId = u64;

/// Something that happened on a background thread.
#[derive(Debug)]
pub enum TransportEvent {
    /// The endpoint is listening; `id` is what peers connect to.
    Open { id: String },
    /// A peer connected to us and the handshake completed.
    Incoming(Connection),
    /// Our outbound connection completed its handshake.
    Outgoing(Connection),
    /// A text frame arrived.
    Data { conn: ConnId, text: String },
    /// The connection closed, from either side.
    Closed { conn: ConnId },
    /// A failure on the endpoint or a connection.
    Error(PeerError),
}

/// Commands sent to a connection thread.
#[derive(Debug)]
enum WsCommand {
    Send(String),
    Close,
}

/// Handle to a live connection. Dropping it closes the connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnId,
    remote: String,
    cmd_tx: Sender<WsCommand>,
}

impl Connection {
    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Address of the other side.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Queue a text frame.
    pub fn send(&self, text: String) -> Result<(), PeerError> {
        self.cmd_tx
            .send(WsCommand::Send(text))
            .map_err(|_| PeerError::ConnectionClosed)
    }

    /// Ask the connection thread to close.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(WsCommand::Close);
    }
}

/// A listening endpoint.
///
/// Binding happens up front; the [`TransportEvent::Open`] event is posted by
/// the accept thread once it is running.
pub struct Endpoint {
    id: String,
    events: Sender<TransportEvent>,
    shutdown: Arc<AtomicBool>,
    next_conn: Arc<AtomicU64>,
    _thread: Option<JoinHandle<()>>,
}

impl Endpoint {
    /// Bind a listener and start accepting connections.
    pub fn bind(addr: &str, events: Sender<TransportEvent>) -> Result<Self, PeerError> {
        let bind_err = |source| PeerError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let id = listener.local_addr().map_err(bind_err)?.to_string();

        let shutdown = Arc::new(AtomicBool::new(false));
        let next_conn = Arc::new(AtomicU64::new(1));

        let handle = {
            let id = id.clone();
            let events = events.clone();
            let shutdown = shutdown.clone();
            let next_conn = next_conn.clone();
            thread::spawn(move || accept_loop(listener, id, events, shutdown, next_conn))
        };

        Ok(Self {
            id,
            events,
            shutdown,
            next_conn,
            _thread: Some(handle),
        })
    }

    /// The endpoint id (`host:port`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Open an outbound connection to another endpoint.
    ///
    /// Returns once the id is validated; the result arrives later as
    /// [`TransportEvent::Outgoing`] or [`TransportEvent::Error`].
    pub fn connect(&self, peer_id: &str) -> Result<(), PeerError> {
        let url = peer_url(peer_id)?;
        let peer_id = peer_id.to_string();
        let conn = self.next_conn.fetch_add(1, Ordering::Relaxed);
        let events = self.events.clone();

        thread::spawn(move || {
            log::info!("Connecting to peer {peer_id}");
            let stream = match TcpStream::connect(&peer_id) {
                Ok(stream) => stream,
                Err(source) => {
                    log::error!("Connection to {peer_id} failed: {source}");
                    let _ = events.send(TransportEvent::Error(PeerError::Connect {
                        peer: peer_id,
                        source,
                    }));
                    return;
                }
            };
            match tungstenite::client(url.as_str(), stream) {
                Ok((socket, response)) => {
                    log::info!("Connected to {peer_id}, status: {}", response.status());
                    let (cmd_tx, cmd_rx) = channel();
                    let connection = Connection {
                        id: conn,
                        remote: peer_id,
                        cmd_tx,
                    };
                    if events.send(TransportEvent::Outgoing(connection)).is_ok() {
                        run_connection(socket, conn, cmd_rx, events);
                    }
                }
                Err(e) => {
                    log::error!("Handshake with {peer_id} failed: {e}");
                    let _ = events.send(TransportEvent::Error(PeerError::Handshake {
                        peer: peer_id,
                        message: e.to_string(),
                    }));
                }
            }
        });
        Ok(())
    }

    /// Stop accepting connections.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// WebSocket URL for an endpoint id.
pub fn peer_url(peer_id: &str) -> Result<Url, PeerError> {
    let invalid = || PeerError::InvalidPeerId(peer_id.to_string());
    if peer_id.contains('/') {
        return Err(invalid());
    }
    // Ids always carry an explicit port.
    match peer_id.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
        _ => return Err(invalid()),
    }
    let url = Url::parse(&format!("ws://{peer_id}/")).map_err(|_| invalid())?;
    if url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

fn accept_loop(
    listener: TcpListener,
    id: String,
    events: Sender<TransportEvent>,
    shutdown: Arc<AtomicBool>,
    next_conn: Arc<AtomicU64>,
) {
    log::info!("Endpoint listening on {id}");
    if events.send(TransportEvent::Open { id: id.clone() }).is_err() {
        return;
    }

    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let conn = next_conn.fetch_add(1, Ordering::Relaxed);
                let events = events.clone();
                thread::spawn(move || {
                    // Accepted sockets may inherit non-blocking mode.
                    if let Err(e) = stream.set_nonblocking(false) {
                        log::error!("Failed to configure socket from {addr}: {e}");
                        return;
                    }
                    match tungstenite::accept(stream) {
                        Ok(socket) => {
                            log::info!("Accepted connection from {addr}");
                            let (cmd_tx, cmd_rx) = channel();
                            let connection = Connection {
                                id: conn,
                                remote: addr.to_string(),
                                cmd_tx,
                            };
                            if events.send(TransportEvent::Incoming(connection)).is_ok() {
                                run_connection(socket, conn, cmd_rx, events);
                            }
                        }
                        Err(e) => {
                            log::warn!("Handshake from {addr} failed: {e}");
                            let _ = events.send(TransportEvent::Error(PeerError::Handshake {
                                peer: addr.to_string(),
                                message: e.to_string(),
                            }));
                        }
                    }
                });
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                log::error!("Accept failed on {id}: {e}");
                if events
                    .send(TransportEvent::Error(PeerError::Bind {
                        addr: id.clone(),
                        source: e,
                    }))
                    .is_err()
                {
                    break;
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
    log::info!("Endpoint {id} closed");
}

/// Pump one connection until it closes or its owner goes away.
fn run_connection(
    mut socket: WebSocket<TcpStream>,
    conn: ConnId,
    cmd_rx: Receiver<WsCommand>,
    events: Sender<TransportEvent>,
) {
    if let Err(e) = socket.get_mut().set_read_timeout(Some(POLL_INTERVAL)) {
        log::error!("Failed to set read timeout: {e}");
    }

    'outer: loop {
        // Flush every queued command before blocking on a read.
        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(text)) => {
                    log::debug!("Sending {} bytes on connection {conn}", text.len());
                    if let Err(e) = socket.send(Message::Text(text)) {
                        log::error!("Send error on connection {conn}: {e}");
                        let _ = events.send(TransportEvent::Error(e.into()));
                        break 'outer;
                    }
                }
                Ok(WsCommand::Close) | Err(TryRecvError::Disconnected) => {
                    log::info!("Closing connection {conn}");
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    break 'outer;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                if events.send(TransportEvent::Data { conn, text }).is_err() {
                    let _ = socket.close(None);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                log::info!("Connection {conn} closed by peer");
                break;
            }
            // Pongs are queued by tungstenite and flushed on the next write.
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(tungstenite::Error::ConnectionClosed) => break,
            Err(e) => {
                log::error!("Read error on connection {conn}: {e}");
                let _ = events.send(TransportEvent::Error(e.into()));
                break;
            }
        }
    }

    let _ = events.send(TransportEvent::Closed { conn });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_url() {
        assert_eq!(
            peer_url("127.0.0.1:4000").unwrap().as_str(),
            "ws://127.0.0.1:4000/"
        );
        assert!(peer_url("localhost:9").is_ok());
        assert!(peer_url("").is_err());
        assert!(peer_url("127.0.0.1").is_err());
        assert!(peer_url("host:port").is_err());
        assert!(peer_url("a:1/b").is_err());
    }

    #[test]
    fn test_bind_reports_open() {
        let (tx, rx) = channel();
        let endpoint = Endpoint::bind("127.0.0.1:0", tx).unwrap();
        assert!(endpoint.id().starts_with("127.0.0.1:"));

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            TransportEvent::Open { id } => assert_eq!(id, endpoint.id()),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_bind_error() {
        let (tx, _rx) = channel();
        assert!(matches!(
            Endpoint::bind("not an address", tx),
            Err(PeerError::Bind { .. })
        ));
    }
}
