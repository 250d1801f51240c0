//! Command-line arguments.

use crate::AppError;
use cardtable_core::TableConfig;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cardtable", about = "Shared card table over a direct peer connection")]
pub struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long, env = "CARDTABLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on for the other player.
    #[arg(long, env = "CARDTABLE_LISTEN")]
    pub listen: Option<String>,

    /// Id of another player's table to connect to once ours is open.
    #[arg(long)]
    pub connect: Option<String>,

    /// Deck list file, one `count name` per line.
    #[arg(long)]
    pub deck: Option<PathBuf>,

    /// Shuffle seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Build the table config: file (or defaults) first, then flags.
    pub fn table_config(&self) -> Result<TableConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => TableConfig::load(path)?,
            None => TableConfig::default(),
        };
        if let Some(listen) = &self.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(path) = &self.deck {
            let list = fs::read_to_string(path).map_err(|source| AppError::DeckFile {
                path: path.clone(),
                source,
            })?;
            config.deck = Some(list);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["cardtable"]);
        assert_eq!(cli.table_config().unwrap(), TableConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let config = write_temp(r#"{"listen_addr": "0.0.0.0:5000", "seed": 1}"#);
        let deck = write_temp("4 Island\n");
        let cli = Cli::parse_from([
            "cardtable",
            "--config",
            config.path().to_str().unwrap(),
            "--deck",
            deck.path().to_str().unwrap(),
            "--seed",
            "9",
        ]);

        let table = cli.table_config().unwrap();
        assert_eq!(table.listen_addr, "0.0.0.0:5000");
        assert_eq!(table.seed, Some(9));
        assert_eq!(table.deck.as_deref(), Some("4 Island\n"));
    }

    #[test]
    fn test_missing_deck_file() {
        let cli = Cli::parse_from(["cardtable", "--deck", "/nonexistent/deck.txt"]);
        assert!(matches!(
            cli.table_config(),
            Err(AppError::DeckFile { .. })
        ));
    }

    #[test]
    fn test_bad_config_file() {
        let config = write_temp("not json");
        let cli = Cli::parse_from(["cardtable", "--config", config.path().to_str().unwrap()]);
        assert!(matches!(cli.table_config(), Err(AppError::Config(_))));
    }
}
