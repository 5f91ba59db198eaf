pub mod deck;
pub mod state;

pub use deck::{Deck, DEFAULT_DECK_SIZE};
pub use state::{GameError, GameState};
