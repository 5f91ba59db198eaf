use crate::card::{Card, CardId};
use crate::condition::ConditionError;
use crate::game::GameState;
use std::fmt;
use std::str::FromStr;

/// How a leaf compares its card count against its quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    AtLeast,
    Exactly,
    AtMost,
}

impl Operator {
    /// Parse the grammar's quantity suffix: `+`, nothing, or `-`
    pub fn from_suffix(suffix: &str) -> Result<Self, ConditionError> {
        match suffix {
            "+" => Ok(Operator::AtLeast),
            "" => Ok(Operator::Exactly),
            "-" => Ok(Operator::AtMost),
            other => Err(ConditionError::UnknownOperator(other.to_string())),
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Operator::AtLeast => "+",
            Operator::Exactly => "",
            Operator::AtMost => "-",
        }
    }

    pub fn compare(&self, count: usize, quantity: u32) -> bool {
        let quantity = quantity as usize;
        match self {
            Operator::AtLeast => count >= quantity,
            Operator::Exactly => count == quantity,
            Operator::AtMost => count <= quantity,
        }
    }
}

impl FromStr for Operator {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">=" => Ok(Operator::AtLeast),
            "=" | "==" => Ok(Operator::Exactly),
            "<=" => Ok(Operator::AtMost),
            other => Err(ConditionError::UnknownOperator(other.to_string())),
        }
    }
}

/// Zone a leaf counts cards in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Location {
    #[default]
    Hand,
    Deck,
}

impl Location {
    /// Case-insensitive; anything unrecognised degrades to Hand
    pub fn parse_lenient(name: &str) -> Self {
        if name.eq_ignore_ascii_case("hand") {
            Location::Hand
        } else if name.eq_ignore_ascii_case("deck") {
            Location::Deck
        } else {
            log::warn!("Unknown condition location '{}', counting in Hand instead", name);
            Location::Hand
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Hand => write!(f, "Hand"),
            Location::Deck => write!(f, "Deck"),
        }
    }
}

/// Leaf: "at least / exactly / at most N cards named or tagged X in Hand/Deck"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardCondition {
    pub target: String,
    pub quantity: u32,
    pub operator: Operator,
    pub location: Location,
    success_count: u64,
}

impl CardCondition {
    pub fn new(target: &str, quantity: u32, operator: Operator, location: Location) -> Self {
        CardCondition {
            target: target.to_string(),
            quantity,
            operator,
            location,
            success_count: 0,
        }
    }

    pub fn count(&self, hand: &[Card], deck: &[Card]) -> usize {
        let zone = match self.location {
            Location::Hand => hand,
            Location::Deck => deck,
        };
        zone.iter().filter(|c| c.matches(&self.target)).count()
    }

    pub fn is_met(&self, hand: &[Card], deck: &[Card]) -> bool {
        self.operator.compare(self.count(hand, deck), self.quantity)
    }
}

/// Interior node holding two or more children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundCondition {
    children: Vec<Condition>,
    success_count: u64,
}

impl CompoundCondition {
    pub fn new(children: Vec<Condition>) -> Self {
        CompoundCondition {
            children,
            success_count: 0,
        }
    }

    pub fn children(&self) -> &[Condition] {
        &self.children
    }
}

/// Boolean success condition over a game state.
///
/// Every node carries its own success counter, bumped by [`Condition::evaluate`].
/// Counters are local to one tree, so parallel workers each take a
/// [`Condition::fresh`] copy and [`Condition::merge`] afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Card(CardCondition),
    And(CompoundCondition),
    Or(CompoundCondition),
}

impl Condition {
    pub fn card(target: &str, quantity: u32, operator: Operator, location: Location) -> Self {
        Condition::Card(CardCondition::new(target, quantity, operator, location))
    }

    /// `quantity+ target` in hand
    pub fn at_least(quantity: u32, target: &str) -> Self {
        Condition::card(target, quantity, Operator::AtLeast, Location::Hand)
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Condition::And(CompoundCondition::new(children))
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Condition::Or(CompoundCondition::new(children))
    }

    /// Evaluate and count: every node is visited (no short circuit) and each
    /// node that passes bumps its own success counter by one.
    pub fn evaluate(&mut self, state: &GameState) -> bool {
        self.evaluate_cards(state.hand(), state.deck().cards())
    }

    fn evaluate_cards(&mut self, hand: &[Card], deck: &[Card]) -> bool {
        let passed = match self {
            Condition::Card(leaf) => {
                let passed = leaf.is_met(hand, deck);
                if passed {
                    leaf.success_count += 1;
                }
                return passed;
            }
            Condition::And(node) => {
                let mut all = true;
                for child in node.children.iter_mut() {
                    all &= child.evaluate_cards(hand, deck);
                }
                all
            }
            Condition::Or(node) => {
                let mut any = false;
                for child in node.children.iter_mut() {
                    any |= child.evaluate_cards(hand, deck);
                }
                any
            }
        };
        if passed {
            if let Condition::And(node) | Condition::Or(node) = self {
                node.success_count += 1;
            }
        }
        passed
    }

    /// Side-effect free check, used while searching
    pub fn is_satisfied(&self, state: &GameState) -> bool {
        self.is_met(state.hand(), state.deck().cards())
    }

    pub fn is_met(&self, hand: &[Card], deck: &[Card]) -> bool {
        match self {
            Condition::Card(leaf) => leaf.is_met(hand, deck),
            Condition::And(node) => node.children.iter().all(|c| c.is_met(hand, deck)),
            Condition::Or(node) => node.children.iter().any(|c| c.is_met(hand, deck)),
        }
    }

    /// Number of leaves currently satisfied
    pub fn satisfied_leaves(&self, hand: &[Card], deck: &[Card]) -> usize {
        match self {
            Condition::Card(leaf) => usize::from(leaf.is_met(hand, deck)),
            Condition::And(node) | Condition::Or(node) => node
                .children
                .iter()
                .map(|c| c.satisfied_leaves(hand, deck))
                .sum(),
        }
    }

    /// Card instances from `hand` that the condition needs to hold on to.
    ///
    /// Leaves claim the first `quantity` matches in scan order, or nothing if
    /// there are not enough. Later siblings never see cards already claimed.
    pub fn required_cards(&self, hand: &[Card]) -> Vec<Card> {
        match self {
            Condition::Card(leaf) => {
                if leaf.location != Location::Hand {
                    return Vec::new();
                }
                let wanted = leaf.quantity as usize;
                let claimed: Vec<Card> = hand
                    .iter()
                    .filter(|c| c.matches(&leaf.target))
                    .take(wanted)
                    .cloned()
                    .collect();
                if claimed.len() < wanted {
                    Vec::new()
                } else {
                    claimed
                }
            }
            Condition::And(node) | Condition::Or(node) => {
                let mut reserved: Vec<Card> = Vec::new();
                for child in &node.children {
                    let taken: Vec<CardId> = reserved.iter().map(|c| c.id()).collect();
                    let pool: Vec<Card> = hand
                        .iter()
                        .filter(|c| !taken.contains(&c.id()))
                        .cloned()
                        .collect();
                    reserved.extend(child.required_cards(&pool));
                }
                reserved
            }
        }
    }

    pub fn success_count(&self) -> u64 {
        match self {
            Condition::Card(leaf) => leaf.success_count,
            Condition::And(node) | Condition::Or(node) => node.success_count,
        }
    }

    pub fn children(&self) -> &[Condition] {
        match self {
            Condition::Card(_) => &[],
            Condition::And(node) | Condition::Or(node) => &node.children,
        }
    }

    /// Sum another tree's counters into this one, node by node
    pub fn merge(&mut self, other: &Condition) -> Result<(), ConditionError> {
        match (self, other) {
            (Condition::Card(a), Condition::Card(b)) => {
                if a.target != b.target
                    || a.quantity != b.quantity
                    || a.operator != b.operator
                    || a.location != b.location
                {
                    return Err(ConditionError::ShapeMismatch(format!(
                        "leaf '{}' in {} vs '{}' in {}",
                        a.target, a.location, b.target, b.location
                    )));
                }
                a.success_count += b.success_count;
                Ok(())
            }
            (Condition::And(a), Condition::And(b)) | (Condition::Or(a), Condition::Or(b)) => {
                if a.children.len() != b.children.len() {
                    return Err(ConditionError::ShapeMismatch(format!(
                        "{} children vs {}",
                        a.children.len(),
                        b.children.len()
                    )));
                }
                a.success_count += b.success_count;
                for (mine, theirs) in a.children.iter_mut().zip(&b.children) {
                    mine.merge(theirs)?;
                }
                Ok(())
            }
            (mine, theirs) => Err(ConditionError::ShapeMismatch(format!(
                "'{}' vs '{}'",
                mine, theirs
            ))),
        }
    }

    /// Zero every counter in the tree
    pub fn reset(&mut self) {
        match self {
            Condition::Card(leaf) => leaf.success_count = 0,
            Condition::And(node) | Condition::Or(node) => {
                node.success_count = 0;
                node.children.iter_mut().for_each(Condition::reset);
            }
        }
    }

    /// Same tree with zeroed counters, for another worker
    pub fn fresh(&self) -> Condition {
        let mut copy = self.clone();
        copy.reset();
        copy
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Card(_) => write!(f, "{}", self),
            _ => write!(f, "({})", self),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Card(leaf) => {
                write!(f, "{}{} {}", leaf.quantity, leaf.operator.suffix(), leaf.target)?;
                if leaf.location != Location::Hand {
                    write!(f, " IN {}", leaf.location)?;
                }
                Ok(())
            }
            Condition::And(node) | Condition::Or(node) => {
                let joiner = if matches!(self, Condition::And(_)) { " AND " } else { " OR " };
                for (i, child) in node.children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    child.fmt_child(f)?;
                }
                Ok(())
            }
        }
    }
}
