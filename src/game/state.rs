use crate::card::{Card, CardId, FreeCardSpec};
use crate::game::deck::Deck;
use thiserror::Error;

/// Faults raised by zone operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Cannot draw from an empty deck")]
    EmptyDeck,
    #[error("Cannot draw a hand of {requested} from a deck of {available}")]
    HandTooLarge { requested: usize, available: usize },
}

/// Zones of one branch of one trial.
///
/// A card lives in exactly one of deck, hand, banished, graveyard or the
/// played log. Every move filters the source zone by [`CardId`].
#[derive(Debug, Clone, Default)]
pub struct GameState {
    deck: Deck,
    hand: Vec<Card>,
    banished: Vec<Card>,
    graveyard: Vec<Card>,
    played: Vec<Card>,
}

impl GameState {
    pub fn new(deck: Deck) -> Self {
        GameState {
            deck,
            ..Default::default()
        }
    }

    /// Build a state and draw the opening hand
    pub fn with_hand(deck: Deck, hand_size: usize) -> Result<Self, GameError> {
        if hand_size > deck.len() {
            return Err(GameError::HandTooLarge {
                requested: hand_size,
                available: deck.len(),
            });
        }
        let mut state = GameState::new(deck);
        state.draw_into_hand(hand_size)?;
        Ok(state)
    }

    /// Build a state from an explicit hand; the hand's cards must not also be in `deck`
    pub fn from_parts(deck: Deck, hand: Vec<Card>) -> Self {
        GameState {
            deck,
            hand,
            ..Default::default()
        }
    }

    /// Draw the top card into hand
    pub fn draw(&mut self) -> Result<&Card, GameError> {
        let card = self.deck.draw()?;
        self.hand.push(card);
        Ok(&self.hand[self.hand.len() - 1])
    }

    /// Draw `count` cards into hand; nothing moves if the deck is too small
    pub fn draw_into_hand(&mut self, count: usize) -> Result<(), GameError> {
        let cards = self.deck.draw_many(count)?;
        self.hand.extend(cards);
        Ok(())
    }

    pub fn add_to_hand(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.hand.extend(cards);
    }

    /// Move a card from hand to the played log.
    /// Returns false (and logs) if the card is not in hand.
    pub fn play_card(&mut self, card: &Card) -> bool {
        match self.hand.iter().position(|c| c.id() == card.id()) {
            Some(idx) => {
                let played = self.hand.remove(idx);
                self.played.push(played);
                true
            }
            None => {
                log::error!("Tried to play {} {} which is not in hand", card, card.id());
                false
            }
        }
    }

    /// Move the given cards from hand to the graveyard
    pub fn discard_from_hand(&mut self, ids: &[CardId]) -> usize {
        let moved = take_by_id(&mut self.hand, ids);
        let count = moved.len();
        self.graveyard.extend(moved);
        count
    }

    /// Move the given cards from hand to the banish pile
    pub fn banish_from_hand(&mut self, ids: &[CardId]) -> usize {
        let moved = take_by_id(&mut self.hand, ids);
        let count = moved.len();
        self.banished.extend(moved);
        count
    }

    /// Banish `count` cards from the top of the deck
    pub fn banish_from_deck(&mut self, count: usize) -> Result<(), GameError> {
        let cards = self.deck.draw_many(count)?;
        self.banished.extend(cards);
        Ok(())
    }

    /// Banish the first deck card matching one of `targets`
    pub fn banish_matching_from_deck(&mut self, targets: &[String]) -> bool {
        match self.deck.remove_matching(targets) {
            Some(card) => {
                self.banished.push(card);
                true
            }
            None => false,
        }
    }

    /// Send the whole hand to the graveyard
    pub fn discard_hand(&mut self) {
        self.graveyard.append(&mut self.hand);
    }

    /// Fully independent copy for a new search branch
    pub fn deep_copy(&self) -> Self {
        GameState {
            deck: self.deck.deep_copy(),
            hand: self.hand.clone(),
            banished: self.banished.clone(),
            graveyard: self.graveyard.clone(),
            played: self.played.clone(),
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn banished(&self) -> &[Card] {
        &self.banished
    }

    pub fn graveyard(&self) -> &[Card] {
        &self.graveyard
    }

    pub fn played(&self) -> &[Card] {
        &self.played
    }

    pub fn hand_contains(&self, id: CardId) -> bool {
        self.hand.iter().any(|c| c.id() == id)
    }

    /// Specs of every free card already played in this branch
    pub fn free_cards_played(&self) -> impl Iterator<Item = &FreeCardSpec> {
        self.played.iter().filter_map(|c| c.free_card())
    }
}

fn take_by_id(zone: &mut Vec<Card>, ids: &[CardId]) -> Vec<Card> {
    let mut taken = Vec::with_capacity(ids.len());
    let mut kept = Vec::with_capacity(zone.len());
    for card in zone.drain(..) {
        if ids.contains(&card.id()) {
            taken.push(card);
        } else {
            kept.push(card);
        }
    }
    *zone = kept;
    taken
}
