//! Resolution of free cards: cards that draw extra cards when played.
//!
//! A candidate first has to pass [`is_usable`]. [`resolve`] then plays it,
//! pays its cost, draws, excavates and finally applies its post-condition.

use crate::card::{Card, CardId, Cost, CostKind, CostValue, Restriction};
use crate::condition::Condition;
use crate::game::{GameError, GameState};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} has no free-card effect")]
    NotAFreeCard(String),
    #[error("{0} is not in hand")]
    NotInHand(String),
    #[error("Cannot pay the cost of {0}")]
    CostUnpayable(String),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// What a resolved free card did to the branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Cards drawn by the effect
    pub drawn: Vec<CardId>,
    /// Excavated cards kept in hand
    pub excavated: Vec<CardId>,
    /// The post-condition could not be met and the whole hand was discarded
    pub hand_discarded: bool,
}

/// Whether `card` can be played from hand in the current state
pub fn is_usable(card: &Card, state: &GameState) -> bool {
    let Some(spec) = card.free_card() else {
        return false;
    };
    if !state.hand_contains(card.id()) {
        return false;
    }
    if spec.once_per_turn && state.played().iter().any(|c| c.name() == card.name()) {
        return false;
    }
    if state.deck().len() < spec.draw_count as usize {
        return false;
    }
    if state
        .free_cards_played()
        .any(|s| s.has_restriction(Restriction::NoMoreDraws))
    {
        return false;
    }
    if spec.has_restriction(Restriction::NoPreviousDraws) && !state.played().is_empty() {
        return false;
    }
    match &spec.cost {
        Some(cost) => can_pay(cost, card, state, spec.draw_count as usize),
        None => true,
    }
}

fn can_pay(cost: &Cost, card: &Card, state: &GameState, draw_count: usize) -> bool {
    let others = || state.hand().iter().filter(|c| c.id() != card.id());
    match (cost.kind, &cost.value) {
        (CostKind::PayLife, _) => true,
        (CostKind::BanishFromDeck, CostValue::Count(n)) => {
            state.deck().len() >= *n as usize + draw_count
        }
        (CostKind::BanishFromDeck, CostValue::Names(names)) => {
            state.deck().len() > draw_count
                && state.deck().cards().iter().any(|c| c.matches_any(names))
        }
        (CostKind::BanishFromHand | CostKind::Discard, CostValue::Count(n)) => {
            others().count() >= *n as usize
        }
        (CostKind::BanishFromHand | CostKind::Discard, CostValue::Names(names)) => {
            others().any(|c| c.matches_any(names))
        }
    }
}

/// Play `card` and apply its whole effect to `state`.
///
/// Hand costs are paid with cards that `condition` does not need. An error
/// means the branch is dead; the caller should throw `state` away.
pub fn resolve(
    card: &Card,
    state: &mut GameState,
    condition: &Condition,
) -> Result<Resolution, ResolveError> {
    let spec = card
        .free_card()
        .ok_or_else(|| ResolveError::NotAFreeCard(card.name().to_string()))?;
    if !state.play_card(card) {
        return Err(ResolveError::NotInHand(card.name().to_string()));
    }

    if let Some(cost) = &spec.cost {
        let reserved = reserved_ids(condition, state);
        pay(cost, state, &reserved, card)?;
    }

    let mut resolution = Resolution::default();

    let before = state.hand().len();
    state.draw_into_hand(spec.draw_count as usize)?;
    resolution.drawn = state.hand()[before..].iter().map(|c| c.id()).collect();

    if let Some(excavate) = spec.excavate {
        resolution.excavated = excavate_cards(
            state,
            condition,
            excavate.count as usize,
            excavate.pick as usize,
        )?;
    }

    if let Some(post) = &spec.post_condition {
        let reserved = reserved_ids(condition, state);
        if let Err(e) = pay(post, state, &reserved, card) {
            log::debug!("{} post-condition failed ({}), discarding hand", card, e);
            state.discard_hand();
            resolution.hand_discarded = true;
        }
    }

    Ok(resolution)
}

fn reserved_ids(condition: &Condition, state: &GameState) -> Vec<CardId> {
    condition
        .required_cards(state.hand())
        .iter()
        .map(|c| c.id())
        .collect()
}

fn pay(
    cost: &Cost,
    state: &mut GameState,
    reserved: &[CardId],
    source: &Card,
) -> Result<(), ResolveError> {
    let unpayable = || ResolveError::CostUnpayable(source.name().to_string());

    match cost.kind {
        CostKind::PayLife => {
            log::debug!("{} asks for life points, which are not tracked", source);
            Ok(())
        }
        CostKind::BanishFromDeck => match &cost.value {
            CostValue::Count(n) => Ok(state.banish_from_deck(*n as usize)?),
            CostValue::Names(names) => {
                if state.banish_matching_from_deck(names) {
                    Ok(())
                } else {
                    Err(unpayable())
                }
            }
        },
        CostKind::BanishFromHand | CostKind::Discard => {
            let mut eligible = state
                .hand()
                .iter()
                .filter(|c| !reserved.contains(&c.id()));
            let chosen: Vec<CardId> = match &cost.value {
                CostValue::Count(n) => {
                    let n = *n as usize;
                    let ids: Vec<CardId> = eligible.take(n).map(|c| c.id()).collect();
                    if ids.len() < n {
                        return Err(unpayable());
                    }
                    ids
                }
                CostValue::Names(names) => match eligible.find(|c| c.matches_any(names)) {
                    Some(c) => vec![c.id()],
                    None => return Err(unpayable()),
                },
            };
            if cost.kind == CostKind::Discard {
                state.discard_from_hand(&chosen);
            } else {
                state.banish_from_hand(&chosen);
            }
            Ok(())
        }
    }
}

/// Look at the top `count` cards, keep the `pick` that add the most satisfied
/// leaves to the current hand, and put the rest on the bottom.
fn excavate_cards(
    state: &mut GameState,
    condition: &Condition,
    count: usize,
    pick: usize,
) -> Result<Vec<CardId>, ResolveError> {
    let count = count.min(state.deck().len());
    let revealed = state.deck_mut().draw_many(count)?;

    let deck = state.deck().cards();
    let baseline = condition.satisfied_leaves(state.hand(), deck) as i64;
    let mut scratch: Vec<Card> = state.hand().to_vec();
    let mut scored: Vec<(i64, Card)> = revealed
        .into_iter()
        .map(|card| {
            scratch.push(card.clone());
            let score = condition.satisfied_leaves(&scratch, deck) as i64 - baseline;
            scratch.pop();
            (score, card)
        })
        .collect();

    // Stable: ties keep excavation order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let rest = scored.split_off(pick.min(scored.len()));
    let kept: Vec<Card> = scored.into_iter().map(|(_, card)| card).collect();
    let kept_ids = kept.iter().map(|c| c.id()).collect();

    state.add_to_hand(kept);
    state.deck_mut().add_to_bottom(rest.into_iter().map(|(_, card)| card));
    Ok(kept_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Excavate, FreeCardSpec};
    use crate::game::Deck;

    fn filler_deck(n: u32) -> Deck {
        Deck::from_cards((0..n).map(|i| Card::plain(1000 + i, "Filler")).collect())
    }

    fn pot_of_desires(id: u32) -> Card {
        Card::with_free_card(
            id,
            "Pot of Desires",
            FreeCardSpec {
                draw_count: 2,
                once_per_turn: true,
                cost: Some(Cost::count(CostKind::BanishFromDeck, 10)),
                ..Default::default()
            },
        )
    }

    fn simple_draw(id: u32, name: &str, restrictions: Vec<Restriction>) -> Card {
        Card::with_free_card(
            id,
            name,
            FreeCardSpec {
                draw_count: 1,
                restrictions,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_non_free_card_is_never_usable() {
        let card = Card::plain(0, "Combo Piece");
        let state = GameState::from_parts(filler_deck(10), vec![card.clone()]);
        assert!(!is_usable(&card, &state));
    }

    #[test]
    fn test_deck_cost_needs_enough_cards() {
        let pot = pot_of_desires(0);
        let small = GameState::from_parts(filler_deck(11), vec![pot.clone()]);
        assert!(!is_usable(&pot, &small), "10 banished + 2 drawn needs 12 cards");

        let enough = GameState::from_parts(filler_deck(12), vec![pot.clone()]);
        assert!(is_usable(&pot, &enough));
    }

    #[test]
    fn test_named_deck_cost_leaves_room_for_the_draw() {
        let seeker = Card::with_free_card(
            0,
            "Seeker",
            FreeCardSpec {
                draw_count: 2,
                cost: Some(Cost::named(CostKind::BanishFromDeck, ["Filler"])),
                ..Default::default()
            },
        );
        let tight = Deck::from_cards(vec![Card::plain(10, "Filler"), Card::plain(11, "Combo Piece")]);
        let state = GameState::from_parts(tight, vec![seeker.clone()]);
        assert!(!is_usable(&seeker, &state), "1 banished + 2 drawn needs 3 cards");

        let roomy = Deck::from_cards(vec![
            Card::plain(10, "Filler"),
            Card::plain(11, "Combo Piece"),
            Card::plain(12, "Brick"),
        ]);
        let mut state = GameState::from_parts(roomy, vec![seeker.clone()]);
        assert!(is_usable(&seeker, &state));
        resolve(&seeker, &mut state, &Condition::at_least(1, "Combo Piece")).expect("resolves");
        assert_eq!(state.banished()[0].id(), CardId(10));
        assert_eq!(state.hand().len(), 2);
    }

    #[test]
    fn test_once_per_turn() {
        let first = pot_of_desires(0);
        let second = pot_of_desires(1);
        let mut state = GameState::from_parts(filler_deck(35), vec![first.clone(), second.clone()]);
        let condition = Condition::at_least(1, "Missing");

        resolve(&first, &mut state, &condition).expect("first copy resolves");
        assert!(!is_usable(&second, &state));
    }

    #[test]
    fn test_no_more_draws_blocks_later_cards() {
        let locker = simple_draw(0, "Locker", vec![Restriction::NoMoreDraws]);
        let other = simple_draw(1, "Other", vec![]);
        let mut state = GameState::from_parts(filler_deck(10), vec![locker.clone(), other.clone()]);
        let condition = Condition::at_least(1, "Missing");

        assert!(is_usable(&other, &state));
        resolve(&locker, &mut state, &condition).expect("resolves");
        assert!(!is_usable(&other, &state));
    }

    #[test]
    fn test_no_previous_draws_only_first() {
        let opener = simple_draw(0, "Opener", vec![]);
        let first_only = simple_draw(1, "First Only", vec![Restriction::NoPreviousDraws]);
        let mut state =
            GameState::from_parts(filler_deck(10), vec![opener.clone(), first_only.clone()]);
        let condition = Condition::at_least(1, "Missing");

        assert!(is_usable(&first_only, &state));
        resolve(&opener, &mut state, &condition).expect("resolves");
        assert!(!is_usable(&first_only, &state));
    }

    #[test]
    fn test_resolve_pays_deck_cost_and_draws() {
        let pot = pot_of_desires(0);
        let mut state = GameState::from_parts(filler_deck(35), vec![pot.clone()]);
        let condition = Condition::at_least(1, "Missing");

        let resolution = resolve(&pot, &mut state, &condition).expect("resolves");
        assert_eq!(resolution.drawn.len(), 2);
        assert_eq!(state.banished().len(), 10);
        assert_eq!(state.deck().len(), 23);
        assert_eq!(state.hand().len(), 2);
        assert_eq!(state.played()[0].id(), pot.id());
    }

    #[test]
    fn test_hand_cost_skips_reserved_cards() {
        let discarder = Card::with_free_card(
            0,
            "Discarder",
            FreeCardSpec {
                draw_count: 1,
                cost: Some(Cost::count(CostKind::Discard, 1)),
                ..Default::default()
            },
        );
        let needed = Card::plain(1, "Combo Piece");
        let spare = Card::plain(2, "Brick");
        let mut state = GameState::from_parts(
            filler_deck(10),
            vec![discarder.clone(), needed.clone(), spare.clone()],
        );
        let condition = Condition::at_least(1, "Combo Piece");

        resolve(&discarder, &mut state, &condition).expect("resolves");
        assert_eq!(state.graveyard().len(), 1);
        assert_eq!(state.graveyard()[0].id(), spare.id());
        assert!(state.hand_contains(needed.id()));
    }

    #[test]
    fn test_hand_cost_fails_when_only_reserved_cards_remain() {
        let banisher = Card::with_free_card(
            0,
            "Banisher",
            FreeCardSpec {
                draw_count: 1,
                cost: Some(Cost::named(CostKind::BanishFromHand, ["Combo Piece"])),
                ..Default::default()
            },
        );
        let needed = Card::plain(1, "Combo Piece");
        let mut state = GameState::from_parts(filler_deck(10), vec![banisher.clone(), needed]);
        let condition = Condition::at_least(1, "Combo Piece");

        assert!(is_usable(&banisher, &state), "the gate ignores reservations");
        assert_eq!(
            resolve(&banisher, &mut state, &condition),
            Err(ResolveError::CostUnpayable("Banisher".to_string()))
        );
    }

    #[test]
    fn test_pay_life_is_free() {
        let card = Card::with_free_card(
            0,
            "Life Payer",
            FreeCardSpec {
                draw_count: 1,
                cost: Some(Cost::count(CostKind::PayLife, 2000)),
                ..Default::default()
            },
        );
        let mut state = GameState::from_parts(filler_deck(3), vec![card.clone()]);
        assert!(is_usable(&card, &state));
        resolve(&card, &mut state, &Condition::at_least(1, "Missing")).expect("resolves");
        assert_eq!(state.hand().len(), 1);
    }

    #[test]
    fn test_excavate_keeps_most_useful_card() {
        let digger = Card::with_free_card(
            0,
            "Digger",
            FreeCardSpec {
                excavate: Some(Excavate { count: 3, pick: 1 }),
                ..Default::default()
            },
        );
        let deck = Deck::from_cards(vec![
            Card::plain(10, "Brick"),
            Card::plain(11, "Combo Piece"),
            Card::plain(12, "Other Brick"),
            Card::plain(13, "Bottom"),
        ]);
        let mut state = GameState::from_parts(deck, vec![digger.clone()]);
        let condition = Condition::at_least(1, "Combo Piece");

        let resolution = resolve(&digger, &mut state, &condition).expect("resolves");
        assert_eq!(resolution.excavated, vec![CardId(11)]);
        assert!(condition.is_satisfied(&state));

        let order: Vec<_> = state.deck().cards().iter().map(|c| c.id().0).collect();
        assert_eq!(order, vec![13, 10, 12], "unpicked cards go to the bottom in order");
    }

    #[test]
    fn test_excavate_ties_keep_reveal_order() {
        let digger = Card::with_free_card(
            0,
            "Digger",
            FreeCardSpec {
                excavate: Some(Excavate { count: 3, pick: 2 }),
                ..Default::default()
            },
        );
        let deck = Deck::from_cards(vec![
            Card::plain(10, "A"),
            Card::plain(11, "B"),
            Card::plain(12, "C"),
        ]);
        let mut state = GameState::from_parts(deck, vec![digger.clone()]);

        let resolution =
            resolve(&digger, &mut state, &Condition::at_least(1, "Missing")).expect("resolves");
        assert_eq!(resolution.excavated, vec![CardId(10), CardId(11)]);
        assert_eq!(state.deck().cards()[0].id(), CardId(12));
    }

    #[test]
    fn test_failed_post_condition_discards_hand() {
        let risky = Card::with_free_card(
            0,
            "Risky Draw",
            FreeCardSpec {
                draw_count: 2,
                post_condition: Some(Cost::named(CostKind::Discard, ["Trap"])),
                ..Default::default()
            },
        );
        let mut state =
            GameState::from_parts(filler_deck(10), vec![risky.clone(), Card::plain(1, "Keep")]);

        let resolution =
            resolve(&risky, &mut state, &Condition::at_least(1, "Missing")).expect("resolves");
        assert!(resolution.hand_discarded);
        assert!(state.hand().is_empty());
        assert_eq!(state.graveyard().len(), 3);
    }

    #[test]
    fn test_met_post_condition_keeps_hand() {
        let risky = Card::with_free_card(
            0,
            "Risky Draw",
            FreeCardSpec {
                draw_count: 1,
                post_condition: Some(Cost::named(CostKind::Discard, ["Trap"])),
                ..Default::default()
            },
        );
        let trap = Card::with_tags(1, "Some Trap", &["Trap"]);
        let mut state = GameState::from_parts(filler_deck(10), vec![risky.clone(), trap.clone()]);

        let resolution =
            resolve(&risky, &mut state, &Condition::at_least(1, "Missing")).expect("resolves");
        assert!(!resolution.hand_discarded);
        assert_eq!(state.hand().len(), 1);
        assert_eq!(state.graveyard()[0].id(), trap.id());
    }

    #[test]
    fn test_resolving_card_not_in_hand() {
        let pot = pot_of_desires(0);
        let mut state = GameState::from_parts(filler_deck(20), vec![]);
        assert_eq!(
            resolve(&pot, &mut state, &Condition::at_least(1, "Missing")),
            Err(ResolveError::NotInHand("Pot of Desires".to_string()))
        );
    }
}
