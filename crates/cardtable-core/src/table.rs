//! The table: canvas plus card zones.
//!
//! Keeps battlefield cards and their image shapes in step. Playing a card
//! moves it out of the hand and drops an image shape; sending image shapes
//! back removes them from the canvas and returns their cards.

use crate::canvas::Canvas;
use crate::cards::{CardAction, CardError, CardId, CardZones, Zone};
use crate::config::TableConfig;
use crate::decklist;
use crate::shapes::{Image, Shape, ShapeId};
use kurbo::Point;

/// Canvas and cards for one player.
#[derive(Debug, Clone)]
pub struct Tabletop {
    pub canvas: Canvas,
    pub cards: CardZones,
    config: TableConfig,
}

impl Tabletop {
    /// Create an empty table from configuration.
    pub fn new(config: TableConfig) -> Self {
        let cards = match config.seed {
            Some(seed) => CardZones::with_seed(seed),
            None => CardZones::new(),
        }
        .with_opening_hand(config.opening_hand);
        let mut canvas = Canvas::new();
        canvas.text_font_size = config.text_font_size;
        Self {
            canvas,
            cards,
            config,
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Build a deck from a deck list (the configured or built-in one when
    /// `None`), shuffle it, and deal the opening hand.
    ///
    /// Card images already on the canvas are removed.
    pub fn load_deck(&mut self, list: Option<&str>) -> usize {
        let list = list
            .or(self.config.deck.as_deref())
            .unwrap_or(decklist::DEFAULT_DECK);
        let deck = decklist::build_deck(list, &self.config.image_url_template);
        let count = deck.len();

        let card_shapes: Vec<ShapeId> = self
            .canvas
            .document
            .shapes_ordered()
            .filter(|s| s.card_id().is_some())
            .map(Shape::id)
            .collect();
        for id in card_shapes {
            self.canvas.remove_shape(id);
        }

        if let Err(err) = self.cards.apply(CardAction::InitializeDeck(deck)) {
            log::error!("Failed to initialize deck: {err}");
        }
        count
    }

    pub fn draw(&mut self) -> Result<CardId, CardError> {
        self.cards.apply(CardAction::DrawCard)?;
        self.cards
            .hand()
            .last()
            .map(|c| c.id)
            .ok_or(CardError::DeckEmpty)
    }

    pub fn mulligan(&mut self) {
        if let Err(err) = self.cards.apply(CardAction::Mulligan) {
            log::error!("Failed to mulligan: {err}");
        }
    }

    /// Move a card from the hand onto the table at a screen position.
    pub fn play_card(&mut self, card_id: CardId, screen: Point) -> Result<ShapeId, CardError> {
        self.cards.apply(CardAction::RemoveFromHand(vec![card_id]))?;
        let card = self
            .cards
            .card(card_id)
            .cloned()
            .ok_or(CardError::NotInZone {
                id: card_id,
                zone: Zone::Battlefield,
            })?;
        let world = self.canvas.camera.screen_to_world(screen);
        let image = Image::for_card(&card, world, self.config.card_width, self.config.card_height);
        let id = self.canvas.add_shape(Shape::Image(image));
        log::debug!("Played card {card_id} as shape {id}");
        Ok(id)
    }

    /// Play the n-th card of the hand (zero-based).
    pub fn play_from_hand(
        &mut self,
        index: usize,
        screen: Point,
    ) -> Option<Result<ShapeId, CardError>> {
        let card_id = self.cards.hand().get(index)?.id;
        Some(self.play_card(card_id, screen))
    }

    /// Send selected card images back to the hand. Returns how many cards moved.
    pub fn send_selected_to_hand(&mut self) -> Result<usize, CardError> {
        self.send_selected(CardAction::SendToHand)
    }

    /// Send selected card images back to the top of the deck.
    pub fn send_selected_to_deck(&mut self) -> Result<usize, CardError> {
        self.send_selected(CardAction::SendToDeck)
    }

    /// Remove the selected shapes. Card images give their cards back via
    /// `action`; other shapes are simply removed.
    fn send_selected(&mut self, action: fn(Vec<CardId>) -> CardAction) -> Result<usize, CardError> {
        let card_ids: Vec<CardId> = self
            .canvas
            .selection
            .iter()
            .filter_map(|id| self.canvas.document.get_shape(*id))
            .filter_map(Shape::card_id)
            .collect();
        self.cards.apply(action(card_ids.clone()))?;
        self.canvas.take_selected();
        Ok(card_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rectangle, ShapeTrait};

    fn table() -> Tabletop {
        let mut table = Tabletop::new(TableConfig {
            seed: Some(7),
            ..Default::default()
        });
        table.load_deck(Some("20 Plains"));
        table
    }

    #[test]
    fn test_load_deck_deals_hand() {
        let table = table();
        assert_eq!(table.cards.hand().len(), 7);
        assert_eq!(table.cards.deck().len(), 13);
        assert!(table.cards.deck()[0].src.contains("Plains"));
    }

    #[test]
    fn test_load_default_deck() {
        let mut table = Tabletop::new(TableConfig::default());
        assert_eq!(table.load_deck(None), 75);
    }

    #[test]
    fn test_play_card_creates_image() {
        let mut table = table();
        table.canvas.camera.zoom = 2.0;
        let card = table.cards.hand()[0].clone();

        let shape_id = table.play_card(card.id, Point::new(100.0, 60.0)).unwrap();
        assert_eq!(table.cards.zone_of(card.id), Some(Zone::Battlefield));
        let shape = table.canvas.document.get_shape(shape_id).unwrap();
        let image = shape.as_image().unwrap();
        assert_eq!(image.card_id, Some(card.id));
        assert_eq!(image.src, card.src);
        assert_eq!(image.position, Point::new(50.0, 30.0));
        assert!((image.width - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_play_card_not_in_hand() {
        let mut table = table();
        let in_deck = table.cards.deck()[0].id;
        assert!(table.play_card(in_deck, Point::ZERO).is_err());
        assert!(table.canvas.document.is_empty());
    }

    #[test]
    fn test_send_back_to_hand_and_deck() {
        let mut table = table();
        let a = table.play_from_hand(0, Point::new(0.0, 0.0)).unwrap().unwrap();
        let b = table.play_from_hand(0, Point::new(200.0, 0.0)).unwrap().unwrap();
        let card_b = table.canvas.document.get_shape(b).and_then(Shape::card_id).unwrap();
        let marker = Rectangle::new(Point::new(400.0, 0.0), 10.0, 10.0);
        let marker_id = marker.id();
        table.canvas.add_shape(Shape::Rectangle(marker));
        assert_eq!(table.cards.hand().len(), 5);

        table.canvas.selection = vec![a, marker_id];
        assert_eq!(table.send_selected_to_hand().unwrap(), 1);
        assert_eq!(table.cards.hand().len(), 6);
        assert!(table.canvas.document.get_shape(marker_id).is_none());

        table.canvas.select(b);
        assert_eq!(table.send_selected_to_deck().unwrap(), 1);
        assert_eq!(table.cards.deck().last().map(|c| c.id), Some(card_b));
        assert!(table.canvas.document.is_empty());
        assert!(table.cards.battlefield().is_empty());
    }

    #[test]
    fn test_draw_and_mulligan() {
        let mut table = table();
        let drawn = table.draw().unwrap();
        assert_eq!(table.cards.zone_of(drawn), Some(Zone::Hand));
        table.mulligan();
        assert_eq!(table.cards.hand().len(), 7);
        assert_eq!(table.cards.deck().len(), 13);
    }
}
