use crate::card::{Card, CardDetails, CardId, DeckList, EMPTY_CARD_NAME, EMPTY_CARD_TAGS};
use crate::game::state::GameError;
use crate::rng::GameRng;
use std::sync::Arc;

/// Size every deck is padded up to unless the caller asks otherwise
pub const DEFAULT_DECK_SIZE: usize = 40;

/// Deck - ordered stack of cards, top at index 0
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Deck { cards: Vec::new() }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Deck { cards }
    }

    /// Expand a deck list into physical copies and pad with filler up to
    /// `target_size`. Lists larger than the target are kept whole.
    pub fn from_list(list: &DeckList, target_size: usize) -> Self {
        let mut cards = Vec::with_capacity(target_size.max(list.card_count()));
        let mut next_id = 0u32;

        for (name, entry) in list.iter() {
            let name: Arc<str> = Arc::from(name);
            let details = entry.details();
            for _ in 0..entry.quantity {
                cards.push(Card::new(CardId(next_id), name.clone(), details.clone()));
                next_id += 1;
            }
        }

        if cards.len() < target_size {
            let name: Arc<str> = Arc::from(EMPTY_CARD_NAME);
            let details = Arc::new(CardDetails {
                tags: EMPTY_CARD_TAGS.iter().map(|t| t.to_string()).collect(),
                free_card: None,
            });
            while cards.len() < target_size {
                cards.push(Card::new(CardId(next_id), name.clone(), details.clone()));
                next_id += 1;
            }
        }

        Deck { cards }
    }

    /// Remove and return the top card
    pub fn draw(&mut self) -> Result<Card, GameError> {
        if self.cards.is_empty() {
            Err(GameError::EmptyDeck)
        } else {
            Ok(self.cards.remove(0))
        }
    }

    /// Draw `count` cards, failing without touching the deck if it is too small
    pub fn draw_many(&mut self, count: usize) -> Result<Vec<Card>, GameError> {
        if count > self.cards.len() {
            return Err(GameError::EmptyDeck);
        }
        Ok(self.cards.drain(0..count).collect())
    }

    /// Put cards under the deck, preserving their order
    pub fn add_to_bottom(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    /// Remove the first card (from the top) matching a name or tag
    pub fn remove_matching(&mut self, targets: &[String]) -> Option<Card> {
        let idx = self.cards.iter().position(|c| c.matches_any(targets))?;
        Some(self.cards.remove(idx))
    }

    pub fn shuffle(&mut self, rng: &mut GameRng) {
        rng.shuffle(&mut self.cards);
    }

    /// Order-preserving independent copy
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Independent copy, shuffled with `rng`; the blueprint stays untouched
    pub fn shuffled_copy(&self, rng: &mut GameRng) -> Self {
        let mut copy = self.deep_copy();
        copy.shuffle(rng);
        copy
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
