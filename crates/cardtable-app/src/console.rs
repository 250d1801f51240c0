//! Console front-end: reads commands from stdin and drives a session.

use crate::commands::{Command, CommandRegistry};
use cardtable_core::{Modifiers, PeerEvent, PointerEvent, Session, SessionEvent};
use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::thread;
use std::time::Duration;

/// How long the loop waits for input before pumping the peer again.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Read stdin lines on a background thread.
///
/// The channel closes when stdin reaches end of file.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read stdin: {e}");
                    break;
                }
            }
        }
    });
    rx
}

/// A session plus where its output goes.
pub struct Console<W: Write> {
    session: Session,
    out: W,
    pending_connect: Option<String>,
}

impl<W: Write> Console<W> {
    pub fn new(session: Session, out: W) -> Self {
        Self {
            session,
            out,
            pending_connect: None,
        }
    }

    /// Connect to `peer_id` as soon as our endpoint is open.
    pub fn connect_when_open(&mut self, peer_id: String) {
        self.pending_connect = Some(peer_id);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until `quit` or until the input channel closes.
    pub fn run(&mut self, lines: Receiver<String>) -> io::Result<()> {
        writeln!(self.out, "Type `help` for commands.")?;
        loop {
            self.tick()?;

            match lines.recv_timeout(TICK_INTERVAL) {
                Ok(line) => {
                    if self.execute_line(&line)?.is_break() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::info!("Leaving the table");
        Ok(())
    }

    /// Pump the session once and print what happened.
    pub fn tick(&mut self) -> io::Result<()> {
        let events = self.session.tick();
        self.report(&events)?;
        if self.session.peer().is_open() {
            if let Some(peer_id) = self.pending_connect.take() {
                connect(&mut self.out, &mut self.session, &peer_id)?;
            }
        }
        Ok(())
    }

    /// Parse and run one input line. Blank lines are ignored.
    pub fn execute_line(&mut self, line: &str) -> io::Result<ControlFlow<()>> {
        if line.trim().is_empty() {
            return Ok(ControlFlow::Continue(()));
        }
        match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                Ok(ControlFlow::Continue(()))
            }
        }
    }

    /// Print what happened during a tick.
    pub fn report(&mut self, events: &[SessionEvent]) -> io::Result<()> {
        for event in events {
            match event {
                SessionEvent::Peer(PeerEvent::Open(id)) => {
                    writeln!(self.out, "Table open. Your id: {id}")?;
                }
                SessionEvent::Peer(PeerEvent::Connected { remote }) => {
                    writeln!(self.out, "Connected to {remote}")?;
                }
                SessionEvent::Peer(PeerEvent::Disconnected) => {
                    writeln!(self.out, "Disconnected")?;
                }
                SessionEvent::Peer(PeerEvent::Error(message)) => {
                    writeln!(self.out, "Connection error: {message}")?;
                }
                SessionEvent::PeerAnnounced(id) => {
                    writeln!(self.out, "Peer {id} joined")?;
                }
                // Snapshots arrive on every remote edit.
                SessionEvent::RemoteShapes(count) => {
                    log::debug!("Peer table has {count} shapes");
                }
            }
        }
        Ok(())
    }

    /// Run one command.
    pub fn execute(&mut self, command: Command) -> io::Result<ControlFlow<()>> {
        let out = &mut self.out;
        let session = &mut self.session;

        match command {
            Command::Help => CommandRegistry::write_help(out)?,
            Command::Id => match session.peer().peer_id() {
                Some(id) => writeln!(out, "{id}")?,
                None => writeln!(out, "Table is not open yet")?,
            },
            Command::Connect(id) => connect(out, session, &id)?,
            Command::Disconnect => {
                if session.peer().is_connected() {
                    session.disconnect();
                    writeln!(out, "Disconnected")?;
                } else {
                    writeln!(out, "Not connected")?;
                }
            }
            Command::Draw => match session.table.draw() {
                Ok(card_id) => {
                    let src = session
                        .table
                        .cards
                        .card(card_id)
                        .map_or("", |card| card.src.as_str());
                    writeln!(out, "Drew {src}")?;
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::Mulligan => {
                session.table.mulligan();
                write_hand(out, session)?;
            }
            Command::Hand => write_hand(out, session)?,
            Command::Play { index, position } => {
                match session.table.play_from_hand(index, position) {
                    Some(Ok(id)) => writeln!(out, "Played card as shape {id}")?,
                    Some(Err(e)) => writeln!(out, "{e}")?,
                    None => writeln!(out, "No card {index} in hand")?,
                }
            }
            Command::SetMode(mode) => session.table.canvas.set_mode(mode),
            Command::SetKind(kind) => session.table.canvas.set_create_kind(kind),
            Command::PointerDown(position) => {
                session
                    .table
                    .canvas
                    .handle_pointer(PointerEvent::Down { position });
            }
            Command::PointerMove(position) => {
                session
                    .table
                    .canvas
                    .handle_pointer(PointerEvent::Move { position });
            }
            Command::PointerUp(position) => {
                session
                    .table
                    .canvas
                    .handle_pointer(PointerEvent::Up { position });
                let selected = session.table.canvas.selection.len();
                if selected > 0 {
                    writeln!(out, "{selected} selected")?;
                }
            }
            Command::Type(text) => {
                if !session.table.canvas.set_editing_text(&text) {
                    writeln!(out, "Not editing text")?;
                }
            }
            Command::Done => session.table.canvas.finish_text_editing(),
            Command::Wheel {
                position,
                delta,
                zoom,
            } => {
                let modifiers = if zoom {
                    Modifiers::ctrl()
                } else {
                    Modifiers::default()
                };
                session.table.canvas.handle_pointer(PointerEvent::Wheel {
                    position,
                    delta,
                    modifiers,
                });
            }
            Command::Rotate(degrees) => {
                if !session.table.canvas.rotate_selected(degrees) {
                    writeln!(out, "Nothing selected")?;
                }
            }
            Command::Flip => {
                if !session.table.canvas.flip_selected() {
                    writeln!(out, "Nothing selected")?;
                }
            }
            Command::ToHand => match session.table.send_selected_to_hand() {
                Ok(count) => writeln!(out, "Returned {count} cards to hand")?,
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::ToDeck => match session.table.send_selected_to_deck() {
                Ok(count) => writeln!(out, "Put {count} cards on the deck")?,
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::Shapes => write_shapes(out, session)?,
            Command::Status => write_status(out, session)?,
            Command::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }
}

fn connect<W: Write>(out: &mut W, session: &mut Session, peer_id: &str) -> io::Result<()> {
    if !session.peer().is_open() {
        return writeln!(out, "Table is not open yet");
    }
    session.connect(peer_id);
    match session.take_peer_error() {
        Some(e) => writeln!(out, "{e}"),
        None => writeln!(out, "Connecting to {peer_id}..."),
    }
}

fn write_hand<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    let hand = session.table.cards.hand();
    if hand.is_empty() {
        return writeln!(out, "Hand is empty");
    }
    for (index, card) in hand.iter().enumerate() {
        writeln!(out, "  {index:2} {}", card.src)?;
    }
    Ok(())
}

fn write_shapes<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    let canvas = &session.table.canvas;
    writeln!(out, "Local ({}):", canvas.document.len())?;
    for shape in canvas.document.shapes_ordered() {
        let bounds = shape.bounds();
        let marker = if canvas.is_selected(shape.id()) { "*" } else { " " };
        writeln!(
            out,
            " {marker} {:9} {} at ({:.0}, {:.0}) {:.0}x{:.0}",
            shape.kind().name(),
            shape.id(),
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height()
        )?;
    }
    let remote = canvas.remote_shapes();
    writeln!(out, "Remote ({}):", remote.len())?;
    for shape in remote {
        writeln!(out, "   {:9} {}", shape.kind().name(), shape.id())?;
    }
    Ok(())
}

fn write_status<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    let peer = session.peer();
    let cards = &session.table.cards;
    let canvas = &session.table.canvas;
    writeln!(out, "Id:          {}", peer.peer_id().unwrap_or("-"))?;
    writeln!(out, "Connected:   {}", peer.connection_peer().unwrap_or("-"))?;
    if let Some(e) = peer.error() {
        writeln!(out, "Last error:  {e}")?;
    }
    writeln!(
        out,
        "Cards:       deck {}, hand {}, battlefield {}",
        cards.deck().len(),
        cards.hand().len(),
        cards.battlefield().len()
    )?;
    writeln!(
        out,
        "Canvas:      {} mode, {} kind, zoom {:.0}%",
        canvas.mode(),
        canvas.create_kind(),
        canvas.camera.zoom * 100.0
    )
}
