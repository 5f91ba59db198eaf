pub mod deck_list;
pub mod types;

pub use deck_list::{DeckEntry, DeckList, DeckListError};
pub use types::{
    Card, CardDetails, CardId, Cost, CostKind, CostValue, Excavate, FreeCardSpec, Restriction,
    EMPTY_CARD_NAME, EMPTY_CARD_TAGS,
};
