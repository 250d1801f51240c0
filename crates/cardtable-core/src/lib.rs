//! Cardtable Core Library
//!
//! Data structures and logic for a shared card-game table: camera math,
//! shapes, the canvas interaction state machine, card zones, and the peer
//! connection used to mirror the table to another player.

pub mod camera;
pub mod canvas;
pub mod cards;
pub mod config;
pub mod decklist;
pub mod input;
pub mod peer;
pub mod session;
pub mod shapes;
pub mod table;
pub mod tools;

pub use camera::Camera;
pub use canvas::{Canvas, CanvasDocument};
pub use cards::{Card, CardAction, CardError, CardId, CardZones, Zone};
pub use config::{ConfigError, TableConfig};
pub use input::{Modifiers, PointerEvent};
pub use peer::{PeerError, PeerEvent, PeerMessage, PeerStore, Unsubscribe};
pub use session::{Session, SessionEvent};
pub use shapes::{Shape, ShapeId, ShapeKind};
pub use table::Tabletop;
pub use tools::{Mode, ToolManager, ToolState};
