//! Card zones: deck, hand, and battlefield bookkeeping.
//!
//! All moves go through [`CardZones::apply`], which removes a card from one
//! zone before inserting it into another, so a card id is never in two zones.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for cards.
pub type CardId = Uuid;

/// Cards dealt by [`CardAction::InitializeDeck`] and [`CardAction::Mulligan`].
pub const DEFAULT_OPENING_HAND: usize = 7;

/// A single physical card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Image URL of the card face.
    pub src: String,
}

impl Card {
    /// Create a card with a fresh id.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: src.into(),
        }
    }
}

/// The zone a card currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Deck,
    Hand,
    Battlefield,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Zone::Deck => "deck",
            Zone::Hand => "hand",
            Zone::Battlefield => "battlefield",
        })
    }
}

/// Errors from card zone actions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("Deck is empty")]
    DeckEmpty,

    #[error("Card {id} is not in the {zone}")]
    NotInZone { id: CardId, zone: Zone },
}

/// Actions understood by the card reducer.
#[derive(Debug, Clone)]
pub enum CardAction {
    /// Replace all zones with a shuffled deck and deal an opening hand.
    InitializeDeck(Vec<Card>),
    /// Move the top card of the deck into the hand.
    DrawCard,
    /// Shuffle the hand back into the deck and deal a new opening hand.
    Mulligan,
    /// Return battlefield cards to the hand.
    SendToHand(Vec<CardId>),
    /// Return battlefield cards to the top of the deck.
    SendToDeck(Vec<CardId>),
    /// Move cards from the hand onto the battlefield.
    RemoveFromHand(Vec<CardId>),
}

/// Deck, hand, and battlefield.
///
/// The top of the deck is the end of the vector.
#[derive(Debug, Clone)]
pub struct CardZones {
    deck: Vec<Card>,
    hand: Vec<Card>,
    battlefield: Vec<Card>,
    opening_hand: usize,
    rng: ChaCha8Rng,
}

impl Default for CardZones {
    fn default() -> Self {
        Self::new()
    }
}

impl CardZones {
    /// Empty zones shuffled from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Empty zones with a deterministic shuffle order.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            deck: Vec::new(),
            hand: Vec::new(),
            battlefield: Vec::new(),
            opening_hand: DEFAULT_OPENING_HAND,
            rng,
        }
    }

    /// Set how many cards are dealt on initialize and mulligan.
    pub fn with_opening_hand(mut self, count: usize) -> Self {
        self.opening_hand = count;
        self
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn battlefield(&self) -> &[Card] {
        &self.battlefield
    }

    /// Find which zone holds a card.
    pub fn zone_of(&self, id: CardId) -> Option<Zone> {
        [Zone::Deck, Zone::Hand, Zone::Battlefield]
            .into_iter()
            .find(|&zone| self.zone(zone).iter().any(|c| c.id == id))
    }

    /// Look up a card in any zone.
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.deck
            .iter()
            .chain(&self.hand)
            .chain(&self.battlefield)
            .find(|c| c.id == id)
    }

    /// Apply an action.
    ///
    /// Actions naming several cards are all-or-nothing: if any id is missing
    /// from the source zone nothing moves.
    pub fn apply(&mut self, action: CardAction) -> Result<(), CardError> {
        match action {
            CardAction::InitializeDeck(cards) => {
                self.deck = cards;
                self.hand.clear();
                self.battlefield.clear();
                self.deck.shuffle(&mut self.rng);
                self.deal_opening_hand();
            }
            CardAction::DrawCard => {
                let card = self.deck.pop().ok_or(CardError::DeckEmpty)?;
                log::debug!("Drew card {}", card.id);
                self.hand.push(card);
            }
            CardAction::Mulligan => {
                self.deck.append(&mut self.hand);
                self.deck.shuffle(&mut self.rng);
                self.deal_opening_hand();
            }
            CardAction::SendToHand(ids) => {
                let cards = self.take(Zone::Battlefield, &ids)?;
                self.hand.extend(cards);
            }
            CardAction::SendToDeck(ids) => {
                let cards = self.take(Zone::Battlefield, &ids)?;
                self.deck.extend(cards);
            }
            CardAction::RemoveFromHand(ids) => {
                let cards = self.take(Zone::Hand, &ids)?;
                self.battlefield.extend(cards);
            }
        }
        Ok(())
    }

    fn deal_opening_hand(&mut self) {
        let count = self.opening_hand.min(self.deck.len());
        let split = self.deck.len() - count;
        let dealt = self.deck.split_off(split);
        self.hand.extend(dealt.into_iter().rev());
    }

    fn zone(&self, zone: Zone) -> &Vec<Card> {
        match zone {
            Zone::Deck => &self.deck,
            Zone::Hand => &self.hand,
            Zone::Battlefield => &self.battlefield,
        }
    }

    fn zone_mut(&mut self, zone: Zone) -> &mut Vec<Card> {
        match zone {
            Zone::Deck => &mut self.deck,
            Zone::Hand => &mut self.hand,
            Zone::Battlefield => &mut self.battlefield,
        }
    }

    /// Remove the given cards from a zone, in the order requested.
    fn take(&mut self, zone: Zone, ids: &[CardId]) -> Result<Vec<Card>, CardError> {
        let source = self.zone_mut(zone);
        if let Some(&id) = ids.iter().find(|id| !source.iter().any(|c| c.id == **id)) {
            return Err(CardError::NotInZone { id, zone });
        }
        let mut taken = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(index) = source.iter().position(|c| c.id == *id) {
                taken.push(source.remove(index));
            }
        }
        Ok(taken)
    }
}
