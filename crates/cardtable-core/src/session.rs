//! A running table session: the local table mirrored to one peer.

use crate::config::TableConfig;
use crate::peer::{
    CONNECTED, ConnectedPayload, PeerError, PeerEvent, PeerMessage, PeerStore, SHAPES, Unsubscribe,
};
use crate::shapes::Shape;
use crate::table::Tabletop;
use std::cell::RefCell;
use std::rc::Rc;

/// Things worth showing to the player after a [`Session::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Peer(PeerEvent),
    /// The peer announced its endpoint id.
    PeerAnnounced(String),
    /// A new shape snapshot arrived from the peer.
    RemoteShapes(usize),
}

/// Messages collected by subscriber callbacks until the next tick.
#[derive(Debug, Default)]
struct Inbox {
    remote_shapes: Option<Vec<Shape>>,
    announced: Vec<String>,
}

/// Local table plus peer connection.
pub struct Session {
    pub table: Tabletop,
    peer: PeerStore,
    inbox: Rc<RefCell<Inbox>>,
    subscriptions: Vec<Unsubscribe>,
    sent_revision: Option<u64>,
}

impl Session {
    /// Set up the table, deal from the configured deck, and open the endpoint.
    pub fn start(config: TableConfig) -> Self {
        let mut peer = PeerStore::new(config.listen_addr.clone());
        let mut table = Tabletop::new(config);
        table.load_deck(None);
        peer.init_peer();

        let inbox = Rc::new(RefCell::new(Inbox::default()));
        let subscriptions = vec![
            {
                let inbox = inbox.clone();
                peer.on_message(SHAPES, move |msg| match msg.payload_as::<Vec<Shape>>() {
                    Ok(shapes) => inbox.borrow_mut().remote_shapes = Some(shapes),
                    Err(e) => log::warn!("Ignoring shapes from peer: {e}"),
                })
            },
            {
                let inbox = inbox.clone();
                peer.on_message(CONNECTED, move |msg| match msg.payload_as::<ConnectedPayload>() {
                    Ok(payload) => inbox.borrow_mut().announced.push(payload.peer_id),
                    Err(e) => log::warn!("Ignoring connected announcement: {e}"),
                })
            },
        ];

        Self {
            table,
            peer,
            inbox,
            subscriptions,
            sent_revision: None,
        }
    }

    pub fn peer(&self) -> &PeerStore {
        &self.peer
    }

    /// Take the last connection error, e.g. a failed bind at start.
    pub fn take_peer_error(&mut self) -> Option<PeerError> {
        self.peer.take_error()
    }

    pub fn connect(&mut self, peer_id: &str) {
        self.peer.connect_to_peer(peer_id);
    }

    /// Hang up on the peer; our endpoint stays open for a reconnect.
    pub fn disconnect(&mut self) {
        self.peer.close_connection();
    }

    /// Pump the peer connection, apply what arrived, and send our shapes if
    /// they changed or a connection just opened.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let peer_events = self.peer.poll();
        let connected = peer_events
            .iter()
            .any(|e| matches!(e, PeerEvent::Connected { .. }));
        let mut events: Vec<SessionEvent> =
            peer_events.into_iter().map(SessionEvent::Peer).collect();

        let (remote_shapes, announced) = {
            let mut inbox = self.inbox.borrow_mut();
            (inbox.remote_shapes.take(), std::mem::take(&mut inbox.announced))
        };
        for id in announced {
            log::info!("Peer connected: {id}");
            events.push(SessionEvent::PeerAnnounced(id));
        }
        if let Some(shapes) = remote_shapes {
            events.push(SessionEvent::RemoteShapes(shapes.len()));
            self.table.canvas.set_remote_shapes(shapes);
        }

        let revision = self.table.canvas.revision();
        if self.peer.is_connected() && (connected || self.sent_revision != Some(revision)) {
            match PeerMessage::shapes(&self.table.canvas.shapes()) {
                Ok(message) => {
                    self.peer.send_message(&message);
                    self.sent_revision = Some(revision);
                }
                Err(e) => log::error!("Failed to encode shapes: {e}"),
            }
        }

        events
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.peer.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rectangle, ShapeTrait};
    use kurbo::Point;
    use std::time::{Duration, Instant};

    fn config() -> TableConfig {
        TableConfig {
            seed: Some(11),
            deck: Some("10 Plains".to_string()),
            ..Default::default()
        }
    }

    fn pump(
        sessions: &mut [&mut Session],
        mut done: impl FnMut(&[&mut Session]) -> bool,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            for session in sessions.iter_mut() {
                session.tick();
            }
            if done(sessions) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_start_deals_from_configured_deck() {
        let mut session = Session::start(config());
        assert_eq!(session.table.cards.hand().len(), 7);
        assert_eq!(session.table.cards.deck().len(), 3);
        assert!(pump(&mut [&mut session], |s| s[0].peer().is_open()));
    }

    #[test]
    fn test_shapes_mirror_to_peer() {
        let mut host = Session::start(config());
        let mut guest = Session::start(config());
        assert!(pump(&mut [&mut host, &mut guest], |s| {
            s[0].peer().is_open() && s[1].peer().is_open()
        }));

        let rect = Rectangle::new(Point::new(5.0, 5.0), 20.0, 20.0);
        let rect_id = rect.id();
        host.table.canvas.add_shape(Shape::Rectangle(rect));

        let host_id = host.peer().peer_id().unwrap().to_string();
        guest.connect(&host_id);

        // Host sends its snapshot as soon as the connection opens.
        assert!(pump(&mut [&mut host, &mut guest], |s| {
            s[1].table.canvas.remote_shapes().iter().any(|r| r.id() == rect_id)
        }));
        assert!(guest.table.canvas.document.is_empty());

        // Later edits go out on the next tick.
        let played = guest
            .table
            .play_from_hand(0, Point::new(0.0, 0.0))
            .unwrap()
            .unwrap();
        assert!(pump(&mut [&mut host, &mut guest], |s| {
            s[0].table.canvas.remote_shapes().iter().any(|r| r.id() == played)
        }));
    }

    #[test]
    fn test_reconnect_after_disconnect() {
        let mut host = Session::start(config());
        let mut guest = Session::start(config());
        assert!(pump(&mut [&mut host, &mut guest], |s| {
            s[0].peer().is_open() && s[1].peer().is_open()
        }));
        let host_id = host.peer().peer_id().unwrap().to_string();

        guest.connect(&host_id);
        assert!(pump(&mut [&mut host, &mut guest], |s| {
            s[0].peer().is_connected() && s[1].peer().is_connected()
        }));

        guest.disconnect();
        assert!(pump(&mut [&mut host, &mut guest], |s| {
            !s[0].peer().is_connected() && !s[1].peer().is_connected()
        }));
        assert!(guest.peer().is_open());

        guest.connect(&host_id);
        assert!(pump(&mut [&mut host, &mut guest], |s| {
            s[0].peer().is_connected() && s[1].peer().is_connected()
        }));
    }
}
