//! Cardtable Application
//!
//! Console front-end: command-line arguments, the command language, and the
//! loop that drives a table session from stdin.

mod cli;
mod commands;
mod console;

pub use cli::Cli;
pub use commands::{Command, CommandError, CommandHelp, CommandRegistry};
pub use console::{Console, spawn_stdin_reader};

use cardtable_core::{ConfigError, PeerError, Session};
use std::io;
use std::path::PathBuf;

/// Fatal application errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to read deck list {}: {source}", .path.display())]
    DeckFile { path: PathBuf, source: io::Error },
    #[error("Failed to open table: {0}")]
    Peer(#[from] PeerError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Start a session from the arguments and run the console until quit.
pub fn run(cli: Cli) -> Result<(), AppError> {
    let config = cli.table_config()?;
    let mut session = Session::start(config);
    if let Some(e) = session.take_peer_error() {
        return Err(e.into());
    }
    log::info!(
        "Table ready: {} cards in deck, {} in hand",
        session.table.cards.deck().len(),
        session.table.cards.hand().len()
    );

    let mut console = Console::new(session, io::stdout());
    if let Some(peer_id) = &cli.connect {
        console.connect_when_open(peer_id.clone());
    }
    console.run(spawn_stdin_reader())?;
    Ok(())
}
