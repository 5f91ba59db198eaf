use crate::card::types::{CardDetails, FreeCardSpec, EMPTY_CARD_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckListError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid deck list: {0}")]
    Invalid(String),
}

/// One line of a deck list: how many copies, plus the metadata every copy carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub quantity: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub free_card: Option<FreeCardSpec>,
}

impl DeckEntry {
    pub fn new(quantity: u32) -> Self {
        DeckEntry {
            quantity,
            ..Default::default()
        }
    }

    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn free(mut self, spec: FreeCardSpec) -> Self {
        self.free_card = Some(spec);
        self
    }

    /// Shared details handed to every copy built from this entry
    pub fn details(&self) -> Arc<CardDetails> {
        Arc::new(CardDetails {
            tags: self.tags.clone(),
            free_card: self.free_card.clone(),
        })
    }
}

/// Deck blueprint: card name -> entry. Ordered so expansion is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckList {
    entries: BTreeMap<String, DeckEntry>,
}

impl DeckList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a deck list from a JSON file of the form
    /// `{ "Card Name": { "quantity": 3, "tags": [...], "free_card": {...} } }`
    pub fn from_file(path: &str) -> Result<Self, DeckListError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DeckListError> {
        let list: DeckList = serde_json::from_str(content)?;
        list.validate()?;
        Ok(list)
    }

    pub fn insert(&mut self, name: &str, entry: DeckEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    /// Builder-style insert, handy for tests and benches
    pub fn with(mut self, name: &str, entry: DeckEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&DeckEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeckEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Total number of real (non-filler) cards
    pub fn card_count(&self) -> usize {
        self.entries.values().map(|e| e.quantity as usize).sum()
    }

    pub fn validate(&self) -> Result<(), DeckListError> {
        if self.card_count() == 0 {
            return Err(DeckListError::Invalid("No cards in deck list".to_string()));
        }
        if self.entries.contains_key(EMPTY_CARD_NAME) {
            return Err(DeckListError::Invalid(format!(
                "'{}' is reserved for deck filler",
                EMPTY_CARD_NAME
            )));
        }
        Ok(())
    }
}
