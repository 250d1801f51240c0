//! Console command parsing and help text.

use cardtable_core::{Mode, ShapeKind};
use kurbo::{Point, Vec2};
use std::io::{self, Write};
use std::str::FromStr;

/// Degrees applied by `rotate left|right`.
pub const ROTATE_STEP: f64 = 90.0;

/// Actions the console can perform on the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the command list.
    Help,
    /// Print our endpoint id.
    Id,
    /// Connect to another player's endpoint.
    Connect(String),
    /// Drop the current connection.
    Disconnect,
    /// Draw the top card of the deck.
    Draw,
    /// Shuffle the hand back and deal a new one.
    Mulligan,
    /// List the cards in hand.
    Hand,
    /// Play the nth card of the hand at a screen position.
    Play { index: usize, position: Point },
    /// Switch interaction mode.
    SetMode(Mode),
    /// Choose the shape drawn in create mode.
    SetKind(ShapeKind),
    /// Pointer pressed at a screen position.
    PointerDown(Point),
    /// Pointer moved to a screen position.
    PointerMove(Point),
    /// Pointer released at a screen position.
    PointerUp(Point),
    /// Replace the content of the text being edited.
    Type(String),
    /// Stop editing text.
    Done,
    /// Wheel scroll; pans, or zooms when `zoom` is set.
    Wheel {
        position: Point,
        delta: Vec2,
        zoom: bool,
    },
    /// Rotate the selection by the given degrees.
    Rotate(f64),
    /// Flip the selected cards.
    Flip,
    /// Return the selected cards to the hand.
    ToHand,
    /// Return the selected cards to the top of the deck.
    ToDeck,
    /// List local and remote shapes.
    Shapes,
    /// Print connection and zone counts.
    Status,
    /// Leave the table.
    Quit,
}

/// Why a command line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));
        let name = name.to_ascii_lowercase();
        let args: Vec<&str> = rest.split_whitespace().collect();
        let usage = || CommandError::Usage(usage_of(&name));

        let command = match name.as_str() {
            "help" | "?" => Command::Help,
            "id" => Command::Id,
            "connect" => match args.as_slice() {
                [id] => Command::Connect((*id).to_string()),
                _ => return Err(usage()),
            },
            "disconnect" => Command::Disconnect,
            "draw" => Command::Draw,
            "mulligan" => Command::Mulligan,
            "hand" => Command::Hand,
            "play" => match args.as_slice() {
                [index, x, y] => Command::Play {
                    index: index.parse().map_err(|_| {
                        CommandError::InvalidArgument(format!("not a hand index: {index}"))
                    })?,
                    position: point(x, y)?,
                },
                _ => return Err(usage()),
            },
            "mode" => match args.as_slice() {
                [mode] => Command::SetMode(mode.parse().map_err(CommandError::InvalidArgument)?),
                _ => return Err(usage()),
            },
            "kind" => match args.as_slice() {
                [kind] => Command::SetKind(kind.parse().map_err(CommandError::InvalidArgument)?),
                _ => return Err(usage()),
            },
            "down" | "move" | "up" => {
                let [x, y] = args.as_slice() else {
                    return Err(usage());
                };
                let position = point(x, y)?;
                match name.as_str() {
                    "down" => Command::PointerDown(position),
                    "move" => Command::PointerMove(position),
                    _ => Command::PointerUp(position),
                }
            }
            // Text is taken verbatim, spaces included.
            "type" => Command::Type(rest.to_string()),
            "done" => Command::Done,
            "wheel" => match args.as_slice() {
                [x, y, dx, dy, modifier @ ..] if modifier.len() <= 1 => {
                    let zoom = match modifier {
                        [] => false,
                        [m] if m.eq_ignore_ascii_case("ctrl") => true,
                        _ => return Err(usage()),
                    };
                    Command::Wheel {
                        position: point(x, y)?,
                        delta: Vec2::new(number(dx)?, number(dy)?),
                        zoom,
                    }
                }
                _ => return Err(usage()),
            },
            "rotate" => match args.as_slice() {
                [dir] if dir.eq_ignore_ascii_case("left") => Command::Rotate(-ROTATE_STEP),
                [dir] if dir.eq_ignore_ascii_case("right") => Command::Rotate(ROTATE_STEP),
                _ => return Err(usage()),
            },
            "flip" => Command::Flip,
            "to-hand" => Command::ToHand,
            "to-deck" => Command::ToDeck,
            "shapes" => Command::Shapes,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(name.to_string())),
        };
        Ok(command)
    }
}

fn number(s: &str) -> Result<f64, CommandError> {
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| CommandError::InvalidArgument(format!("not a number: {s}")))
}

fn point(x: &str, y: &str) -> Result<Point, CommandError> {
    Ok(Point::new(number(x)?, number(y)?))
}

fn usage_of(name: &str) -> &'static str {
    CommandRegistry::all()
        .iter()
        .find(|help| help.usage.split_whitespace().next() == Some(name))
        .map_or("help", |help| help.usage)
}

/// Usage line and description for one command.
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub usage: &'static str,
    pub description: &'static str,
}

impl CommandHelp {
    pub const fn new(usage: &'static str, description: &'static str) -> Self {
        Self { usage, description }
    }
}

/// Registry of all console commands.
pub struct CommandRegistry;

impl CommandRegistry {
    /// Get all registered commands.
    pub fn all() -> &'static [CommandHelp] {
        const COMMANDS: &[CommandHelp] = &[
            CommandHelp::new("help", "Show this list"),
            CommandHelp::new("id", "Show the id other players connect to"),
            CommandHelp::new("connect <id>", "Connect to another player's table"),
            CommandHelp::new("disconnect", "Close the current connection"),
            CommandHelp::new("draw", "Draw the top card of the deck"),
            CommandHelp::new("mulligan", "Shuffle the hand into the deck and deal again"),
            CommandHelp::new("hand", "List the cards in hand"),
            CommandHelp::new("play <n> <x> <y>", "Play hand card n at a screen position"),
            CommandHelp::new("mode select|create", "Switch interaction mode"),
            CommandHelp::new(
                "kind rectangle|circle|arrow|text|image",
                "Shape drawn in create mode",
            ),
            CommandHelp::new("down <x> <y>", "Press the pointer"),
            CommandHelp::new("move <x> <y>", "Move the pointer"),
            CommandHelp::new("up <x> <y>", "Release the pointer"),
            CommandHelp::new("type <text>", "Set the text being edited"),
            CommandHelp::new("done", "Finish editing text"),
            CommandHelp::new("wheel <x> <y> <dx> <dy> [ctrl]", "Pan, or zoom with ctrl"),
            CommandHelp::new("rotate left|right", "Rotate the selection by 90 degrees"),
            CommandHelp::new("flip", "Flip the selected cards face down or up"),
            CommandHelp::new("to-hand", "Return the selected cards to the hand"),
            CommandHelp::new("to-deck", "Put the selected cards on top of the deck"),
            CommandHelp::new("shapes", "List local and remote shapes"),
            CommandHelp::new("status", "Show connection and card counts"),
            CommandHelp::new("quit", "Leave the table"),
        ];
        COMMANDS
    }

    /// Write the command list.
    pub fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
        writeln!(out, "\n=== Commands ===")?;
        for help in Self::all() {
            writeln!(out, "  {:40} {}", help.usage, help.description)?;
        }
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("draw").unwrap(), Command::Draw);
        assert_eq!(parse("  Mulligan ").unwrap(), Command::Mulligan);
        assert_eq!(parse("to-hand").unwrap(), Command::ToHand);
        assert_eq!(parse("to-deck").unwrap(), Command::ToDeck);
        assert_eq!(parse("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_connect_requires_id() {
        assert_eq!(
            parse("connect 127.0.0.1:4000").unwrap(),
            Command::Connect("127.0.0.1:4000".to_string())
        );
        assert_eq!(
            parse("connect"),
            Err(CommandError::Usage("connect <id>"))
        );
    }

    #[test]
    fn test_play() {
        assert_eq!(
            parse("play 2 10 -5.5").unwrap(),
            Command::Play {
                index: 2,
                position: Point::new(10.0, -5.5)
            }
        );
        assert!(matches!(
            parse("play first 1 1"),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(matches!(parse("play 1 1"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_mode_and_kind() {
        assert_eq!(parse("mode create").unwrap(), Command::SetMode(Mode::Create));
        assert_eq!(
            parse("kind circle").unwrap(),
            Command::SetKind(ShapeKind::Circle)
        );
        assert!(matches!(
            parse("kind hexagon"),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pointer_commands() {
        assert_eq!(
            parse("down 1 2").unwrap(),
            Command::PointerDown(Point::new(1.0, 2.0))
        );
        assert_eq!(
            parse("move 3 4").unwrap(),
            Command::PointerMove(Point::new(3.0, 4.0))
        );
        assert_eq!(
            parse("up 5 6").unwrap(),
            Command::PointerUp(Point::new(5.0, 6.0))
        );
        assert_eq!(parse("down 1"), Err(CommandError::Usage("down <x> <y>")));
    }

    #[test]
    fn test_type_keeps_spaces() {
        assert_eq!(
            parse("type Hello  table").unwrap(),
            Command::Type("Hello  table".to_string())
        );
        assert_eq!(parse("type").unwrap(), Command::Type(String::new()));
    }

    #[test]
    fn test_wheel() {
        assert_eq!(
            parse("wheel 100 100 0 -50 ctrl").unwrap(),
            Command::Wheel {
                position: Point::new(100.0, 100.0),
                delta: Vec2::new(0.0, -50.0),
                zoom: true,
            }
        );
        assert_eq!(
            parse("wheel 0 0 5 5").unwrap(),
            Command::Wheel {
                position: Point::ZERO,
                delta: Vec2::new(5.0, 5.0),
                zoom: false,
            }
        );
        assert!(matches!(parse("wheel 0 0 5 5 alt"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        for line in ["down NaN 1", "move 1 inf", "wheel 0 0 0 -infinity ctrl", "play 0 nan 0"] {
            assert!(
                matches!(parse(line), Err(CommandError::InvalidArgument(_))),
                "accepted {line}"
            );
        }
    }

    #[test]
    fn test_rotate() {
        assert_eq!(parse("rotate left").unwrap(), Command::Rotate(-ROTATE_STEP));
        assert_eq!(parse("rotate right").unwrap(), Command::Rotate(ROTATE_STEP));
        assert!(parse("rotate up").is_err());
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            parse("shuffle"),
            Err(CommandError::Unknown("shuffle".to_string()))
        );
    }

    #[test]
    fn test_every_command_has_help() {
        for help in CommandRegistry::all() {
            assert!(!help.description.is_empty());
        }
        assert_eq!(usage_of("play"), "play <n> <x> <y>");
        assert_eq!(usage_of("wheel"), "wheel <x> <y> <dx> <dy> [ctrl]");
    }
}
