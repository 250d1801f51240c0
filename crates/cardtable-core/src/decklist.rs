//! Deck-list parsing.
//!
//! A deck list has one `count name` entry per line, optionally followed by a
//! `// comment`. Lines that don't start with a count are ignored.

use crate::cards::Card;
use url::form_urlencoded;

/// Placeholder in an image URL template that is replaced by the card name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Image URL used when no template is configured.
pub const DEFAULT_IMAGE_URL_TEMPLATE: &str =
    "https://api.scryfall.com/cards/named?exact={name}&format=image&version=normal";

/// Deck used when none is provided.
pub const DEFAULT_DECK: &str = "\
3 Ambitious Farmhand
4 Reckoner Bankbuster
2 Elspeth Resplendent
2 March of Otherworldly Light
4 The Restoration of Eiganjo
4 Roadside Reliquary
1 Eiganjo, Seat of the Empire
16 Plains
4 Ossification
4 Wedding Announcement
2 Destroy Evil
4 The Wandering Emperor
4 Lay Down Arms
3 The Eternal Wanderer
3 Mirrex
3 Depopulate
2 Fateful Absence
3 Farewell
4 Sunset Revelry
3 Loran of the Third Path";

/// Most copies a single line may ask for.
pub const MAX_COPIES: usize = 250;

/// One line of a deck list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub count: usize,
    pub name: String,
}

/// Parse a single line. Returns `None` for blank or malformed lines and for
/// counts above [`MAX_COPIES`].
pub fn parse_line(line: &str) -> Option<DeckEntry> {
    let line = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let line = line.trim();
    let split = line.find(char::is_whitespace)?;
    let (count, name) = line.split_at(split);
    let count = count.parse::<usize>().ok()?;
    if count > MAX_COPIES {
        log::warn!("Skipping deck line with {count} copies: {line}");
        return None;
    }
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(DeckEntry {
        count,
        name: name.to_string(),
    })
}

/// Parse a whole deck list into entries, skipping anything unparseable.
pub fn parse(text: &str) -> Vec<DeckEntry> {
    text.lines().filter_map(parse_line).collect()
}

/// Expand a deck list into card names, one per copy.
pub fn card_names(text: &str) -> Vec<String> {
    parse(text)
        .into_iter()
        .flat_map(|entry| std::iter::repeat_n(entry.name, entry.count))
        .collect()
}

/// Build the image URL for a card name.
pub fn image_url(template: &str, name: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    template.replace(NAME_PLACEHOLDER, &encoded)
}

/// Build a deck of cards with fresh ids from a deck list.
pub fn build_deck(text: &str, image_url_template: &str) -> Vec<Card> {
    let deck: Vec<Card> = card_names(text)
        .iter()
        .map(|name| Card::new(image_url(image_url_template, name)))
        .collect();
    log::info!("Built deck of {} cards", deck.len());
    deck
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("4 Lay Down Arms"),
            Some(DeckEntry {
                count: 4,
                name: "Lay Down Arms".to_string()
            })
        );
        assert_eq!(
            parse_line("1 Eiganjo, Seat of the Empire // land"),
            Some(DeckEntry {
                count: 1,
                name: "Eiganjo, Seat of the Empire".to_string()
            })
        );
    }

    #[test]
    fn test_malformed_lines_skipped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("Deck"), None);
        assert_eq!(parse_line("x3 Plains"), None);
        assert_eq!(parse_line("3"), None);
        assert_eq!(parse_line("3 // only a comment"), None);
    }

    #[test]
    fn test_oversized_count_rejected() {
        assert_eq!(parse_line("1000000000000 Plains"), None);
        assert_eq!(parse_line("251 Plains"), None);
        assert_eq!(parse_line("250 Plains").map(|e| e.count), Some(MAX_COPIES));
        assert_eq!(card_names("1000000000000 Plains\n2 Island").len(), 2);
    }

    #[test]
    fn test_card_names_expands_counts() {
        let names = card_names("2 Plains\n\nSideboard\n1 Mirrex\n");
        assert_eq!(names, vec!["Plains", "Plains", "Mirrex"]);
    }

    #[test]
    fn test_default_deck_size() {
        assert_eq!(card_names(DEFAULT_DECK).len(), 75);
    }

    #[test]
    fn test_image_url_encodes_name() {
        let url = image_url("https://img.example/?n={name}", "Eiganjo, Seat");
        assert_eq!(url, "https://img.example/?n=Eiganjo%2C+Seat");
    }

    #[test]
    fn test_build_deck_unique_ids() {
        let deck = build_deck("3 Plains", "{name}.jpg");
        assert_eq!(deck.len(), 3);
        assert_eq!(deck[0].src, "Plains.jpg");
        assert_ne!(deck[0].id, deck[1].id);
    }
}
