//! Direct peer-to-peer connection for mirroring the table.
//!
//! [`PeerStore`] owns one listening endpoint, at most one active connection,
//! one error slot, and the message subscribers. Network I/O runs on background
//! threads; state changes and callbacks only happen inside [`PeerStore::poll`],
//! on the caller's thread.

mod message;
mod transport;

pub use message::{CONNECTED, ConnectedPayload, PeerMessage, SHAPES};
pub use transport::{ConnId, Connection, Endpoint, TransportEvent, peer_url};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{Receiver, channel};
use thiserror::Error;

/// Peer connection errors.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to connect to {peer}: {source}")]
    Connect {
        peer: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Handshake with {peer} failed: {message}")]
    Handshake { peer: String, message: String },
    #[error("Transport error: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Invalid peer id: {0}")]
    InvalidPeerId(String),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Lifecycle changes reported by [`PeerStore::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// The endpoint is ready; peers can connect to this id.
    Open(String),
    /// A connection became active.
    Connected { remote: String },
    /// The active connection went away.
    Disconnected,
    /// An error was stored in the error slot.
    Error(String),
}

type Callback = Rc<dyn Fn(&PeerMessage)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: HashMap<String, Vec<(u64, Callback)>>,
}

impl Registry {
    fn add(&mut self, kind: &str, callback: Callback) -> u64 {
        self.next_id += 1;
        self.callbacks
            .entry(kind.to_string())
            .or_default()
            .push((self.next_id, callback));
        self.next_id
    }

    fn remove(&mut self, kind: &str, id: u64) {
        if let Some(list) = self.callbacks.get_mut(kind) {
            list.retain(|(cb_id, _)| *cb_id != id);
            if list.is_empty() {
                self.callbacks.remove(kind);
            }
        }
    }

    fn subscribers(&self, kind: &str) -> Vec<Callback> {
        self.callbacks
            .get(kind)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }
}

/// Handle returned by [`PeerStore::on_message`].
///
/// Dropping the handle keeps the subscription; call
/// [`Unsubscribe::unsubscribe`] to remove it.
#[must_use = "dropping the handle leaves the callback subscribed"]
pub struct Unsubscribe {
    registry: Weak<RefCell<Registry>>,
    kind: String,
    id: u64,
}

impl Unsubscribe {
    /// Remove exactly the callback this handle was returned for.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.kind, self.id);
        }
    }
}

/// Peer connection state.
pub struct PeerStore {
    listen_addr: String,
    endpoint: Option<Endpoint>,
    events: Option<Receiver<TransportEvent>>,
    peer_id: Option<String>,
    connection: Option<Connection>,
    error: Option<PeerError>,
    registry: Rc<RefCell<Registry>>,
}

impl PeerStore {
    /// Create a store that will listen on `listen_addr` once initialized.
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            endpoint: None,
            events: None,
            peer_id: None,
            connection: None,
            error: None,
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    /// Allocate the local endpoint.
    ///
    /// The id becomes available after the next [`poll`](Self::poll) reports
    /// [`PeerEvent::Open`]. Failures land in the error slot. Calling this
    /// again replaces the previous endpoint and connection.
    pub fn init_peer(&mut self) {
        self.disconnect();
        let (tx, rx) = channel();
        match Endpoint::bind(&self.listen_addr, tx) {
            Ok(endpoint) => {
                self.endpoint = Some(endpoint);
                self.events = Some(rx);
            }
            Err(e) => self.set_error(e),
        }
    }

    /// Open a connection to another endpoint.
    ///
    /// Does nothing until the local endpoint is open. When the connection
    /// opens it becomes the active connection and a `connected` message
    /// carrying our id is sent.
    pub fn connect_to_peer(&mut self, peer_id: &str) {
        let (Some(endpoint), true) = (&self.endpoint, self.peer_id.is_some()) else {
            log::info!("Cannot connect to {peer_id}: endpoint is not open");
            return;
        };
        if let Err(e) = endpoint.connect(peer_id) {
            self.set_error(e);
        }
    }

    /// Send a message on the active connection.
    ///
    /// Without a connection this does nothing.
    pub fn send_message(&mut self, message: &PeerMessage) {
        let Some(connection) = &self.connection else {
            log::debug!("Dropping `{}` message: no connection", message.kind);
            return;
        };
        let result = message.to_text().and_then(|text| connection.send(text));
        if let Err(e) = result {
            self.set_error(e);
        }
    }

    /// Subscribe to one message type.
    pub fn on_message<F>(&self, kind: &str, callback: F) -> Unsubscribe
    where
        F: Fn(&PeerMessage) + 'static,
    {
        let id = self.registry.borrow_mut().add(kind, Rc::new(callback));
        Unsubscribe {
            registry: Rc::downgrade(&self.registry),
            kind: kind.to_string(),
            id,
        }
    }

    /// Hang up the active connection. The endpoint keeps listening, so either
    /// side can connect again.
    pub fn close_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            log::info!("Closing connection to {}", connection.remote());
            connection.close();
        }
    }

    /// Close the connection and the endpoint and clear both.
    pub fn disconnect(&mut self) {
        self.close_connection();
        if let Some(endpoint) = self.endpoint.take() {
            log::info!("Closing endpoint {}", endpoint.id());
            endpoint.shutdown();
        }
        self.events = None;
        self.peer_id = None;
    }

    /// Drain transport events, update state, and dispatch messages.
    pub fn poll(&mut self) -> Vec<PeerEvent> {
        let pending: Vec<TransportEvent> = match &self.events {
            Some(rx) => rx.try_iter().collect(),
            None => return Vec::new(),
        };

        let mut out = Vec::new();
        for event in pending {
            match event {
                TransportEvent::Open { id } => {
                    log::info!("Peer endpoint open: {id}");
                    self.peer_id = Some(id.clone());
                    out.push(PeerEvent::Open(id));
                }
                TransportEvent::Incoming(connection) => {
                    log::info!("Peer {} connected to us", connection.remote());
                    out.push(PeerEvent::Connected {
                        remote: connection.remote().to_string(),
                    });
                    self.activate(connection);
                }
                TransportEvent::Outgoing(connection) => {
                    log::info!("Connected to peer {}", connection.remote());
                    out.push(PeerEvent::Connected {
                        remote: connection.remote().to_string(),
                    });
                    self.activate(connection);
                    if let Some(id) = self.peer_id.clone() {
                        self.send_message(&PeerMessage::connected(&id));
                    }
                }
                TransportEvent::Data { conn, text } => {
                    if self.active_conn() != Some(conn) {
                        log::debug!("Ignoring data from stale connection {conn}");
                        continue;
                    }
                    match PeerMessage::parse(&text) {
                        Ok(message) => self.dispatch(&message),
                        Err(e) => log::warn!("Dropping message: {e}"),
                    }
                }
                TransportEvent::Closed { conn } => {
                    if self.active_conn() == Some(conn) {
                        log::info!("Peer connection closed");
                        self.connection = None;
                        out.push(PeerEvent::Disconnected);
                    }
                }
                TransportEvent::Error(e) => {
                    out.push(PeerEvent::Error(e.to_string()));
                    self.set_error(e);
                }
            }
        }
        out
    }

    fn activate(&mut self, connection: Connection) {
        if let Some(previous) = self.connection.replace(connection) {
            log::info!("Replacing connection to {}", previous.remote());
            previous.close();
        }
    }

    fn active_conn(&self) -> Option<ConnId> {
        self.connection.as_ref().map(Connection::id)
    }

    fn dispatch(&self, message: &PeerMessage) {
        // Cloned out so callbacks may subscribe or unsubscribe.
        let subscribers = self.registry.borrow().subscribers(&message.kind);
        log::debug!(
            "Dispatching `{}` to {} subscriber(s)",
            message.kind,
            subscribers.len()
        );
        for callback in subscribers {
            callback(message);
        }
    }

    fn set_error(&mut self, error: PeerError) {
        log::error!("Peer error: {error}");
        self.error = Some(error);
    }

    /// Our endpoint id, once open.
    pub fn peer_id(&self) -> Option<&str> {
        self.peer_id.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.peer_id.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Address of the peer on the active connection.
    pub fn connection_peer(&self) -> Option<&str> {
        self.connection.as_ref().map(Connection::remote)
    }

    /// The most recent error.
    pub fn error(&self) -> Option<&PeerError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<PeerError> {
        self.error.take()
    }
}

impl Drop for PeerStore {
    fn drop(&mut self) {
        self.disconnect();
    }
}
