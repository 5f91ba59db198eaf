use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Name given to the filler cards that pad a deck up to its target size
pub const EMPTY_CARD_NAME: &str = "Empty Card";

/// Tags carried by every filler card
pub const EMPTY_CARD_TAGS: &[&str] = &["Empty", "Blank", "Non Engine"];

/// Identity of one physical copy inside a deck.
/// Copies sharing a name are told apart by this, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a cost or post-condition asks the player to give up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    BanishFromDeck,
    BanishFromHand,
    Discard,
    /// Accepted for completeness; there is no life total to pay from
    PayLife,
}

/// Either a plain number of cards or a list of names/tags one of which must be paid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CostValue {
    Count(u32),
    Names(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    pub kind: CostKind,
    pub value: CostValue,
}

impl Cost {
    pub fn new(kind: CostKind, value: CostValue) -> Self {
        Cost { kind, value }
    }

    pub fn count(kind: CostKind, n: u32) -> Self {
        Cost::new(kind, CostValue::Count(n))
    }

    pub fn named<S: Into<String>>(kind: CostKind, names: impl IntoIterator<Item = S>) -> Self {
        Cost::new(kind, CostValue::Names(names.into_iter().map(Into::into).collect()))
    }
}

/// Play restrictions printed on a free card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    /// Not enforced: summoning is outside the simulation
    NoSpecialSummon,
    /// No other free card may be played after this one
    NoMoreDraws,
    /// Only playable as the first card of the turn
    NoPreviousDraws,
}

/// Look at `count` cards from the top of the deck and keep `pick` of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excavate {
    pub count: u32,
    pub pick: u32,
}

/// Effect of a card that draws extra cards when played
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeCardSpec {
    #[serde(default)]
    pub draw_count: u32,
    #[serde(default)]
    pub once_per_turn: bool,
    #[serde(default)]
    pub cost: Option<Cost>,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
    #[serde(default)]
    pub post_condition: Option<Cost>,
    #[serde(default)]
    pub excavate: Option<Excavate>,
}

impl FreeCardSpec {
    pub fn has_restriction(&self, restriction: Restriction) -> bool {
        self.restrictions.contains(&restriction)
    }
}

/// Per-name metadata shared by every copy of a card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub tags: Vec<String>,
    pub free_card: Option<FreeCardSpec>,
}

/// One physical card. Cloning is cheap: name and details are shared.
#[derive(Debug, Clone)]
pub struct Card {
    id: CardId,
    name: Arc<str>,
    details: Arc<CardDetails>,
}

impl Card {
    pub fn new(id: CardId, name: Arc<str>, details: Arc<CardDetails>) -> Self {
        Card { id, name, details }
    }

    /// A card with no tags and no effect
    pub fn plain(id: u32, name: &str) -> Self {
        Card::new(CardId(id), Arc::from(name), Arc::new(CardDetails::default()))
    }

    pub fn with_tags(id: u32, name: &str, tags: &[&str]) -> Self {
        let details = CardDetails {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            free_card: None,
        };
        Card::new(CardId(id), Arc::from(name), Arc::new(details))
    }

    pub fn with_free_card(id: u32, name: &str, spec: FreeCardSpec) -> Self {
        let details = CardDetails {
            tags: Vec::new(),
            free_card: Some(spec),
        };
        Card::new(CardId(id), Arc::from(name), Arc::new(details))
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.details.tags
    }

    pub fn details(&self) -> &Arc<CardDetails> {
        &self.details
    }

    pub fn free_card(&self) -> Option<&FreeCardSpec> {
        self.details.free_card.as_ref()
    }

    pub fn is_free_card(&self) -> bool {
        self.details.free_card.is_some()
    }

    /// Name or any tag equals `target` exactly
    pub fn matches(&self, target: &str) -> bool {
        &*self.name == target || self.details.tags.iter().any(|t| t == target)
    }

    /// Matches any of the given names or tags
    pub fn matches_any(&self, targets: &[String]) -> bool {
        targets.iter().any(|t| self.matches(t))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
