use crate::card::Card;
use crate::condition::{Condition, ConditionError};
use crate::game::{Deck, GameError, GameState};
use crate::rng::GameRng;
use crate::simulation::config::SimulationConfig;
use crate::simulation::free_card::{is_usable, resolve, Resolution};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Trial setup failed: {0}")]
    Game(#[from] GameError),
    #[error(transparent)]
    Condition(#[from] ConditionError),
}

/// One attempted line of free-card plays
#[derive(Debug, Clone)]
pub struct BranchRecord {
    /// Free cards played along this line, in order
    pub played: Vec<Card>,
    pub success: bool,
    /// Effect of the last card played; `None` for the opening hand and for
    /// cards that failed to resolve
    pub resolution: Option<Resolution>,
}

/// Result of a single trial
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub seed: u64,
    pub success: bool,
    pub initial_hand: Vec<Card>,
    /// Winning branch state, or the opening state when nothing won
    pub terminal: GameState,
    /// Every branch tried, the opening hand first
    pub branches: Vec<BranchRecord>,
    /// Gave up after hitting the branch limit
    pub truncated: bool,
}

impl TrialOutcome {
    /// Won, and needed at least one free card to do it
    pub fn won_with_free_cards(&self) -> bool {
        self.success && !self.terminal.played().is_empty()
    }
}

/// Outcome of searching one opening state
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub winner: Option<GameState>,
    pub branches: Vec<BranchRecord>,
    pub truncated: bool,
}

/// Run one trial: shuffle a copy of `deck`, draw a hand, search for a win,
/// then count the condition once against the terminal state.
pub fn run_trial(
    deck: &Deck,
    condition: &mut Condition,
    config: &SimulationConfig,
    seed: u64,
) -> Result<TrialOutcome, SimulationError> {
    let mut rng = GameRng::new(Some(seed));
    let initial = GameState::with_hand(deck.shuffled_copy(&mut rng), config.hand_size)?;
    let initial_hand = initial.hand().to_vec();

    let SearchResult {
        winner,
        branches,
        truncated,
    } = search(&initial, condition, config.max_branches);

    let success = winner.is_some();
    let terminal = winner.unwrap_or(initial);
    condition.evaluate(&terminal);

    Ok(TrialOutcome {
        seed,
        success,
        initial_hand,
        terminal,
        branches,
        truncated,
    })
}

/// Depth-first search for any sequence of free-card plays that satisfies
/// `condition`. The first winning branch ends the search.
///
/// Branches are forked with [`GameState::deep_copy`] and kept on an explicit
/// stack. A played card leaves the hand, so each path can use a card at most
/// once and the search always terminates; `max_branches` caps its width.
pub fn search(initial: &GameState, condition: &Condition, max_branches: usize) -> SearchResult {
    let opening_wins = condition.is_satisfied(initial);
    let mut branches = vec![BranchRecord {
        played: Vec::new(),
        success: opening_wins,
        resolution: None,
    }];
    if opening_wins {
        return SearchResult {
            winner: Some(initial.deep_copy()),
            branches,
            truncated: false,
        };
    }

    let mut stack = vec![initial.deep_copy()];
    while let Some(branch) = stack.pop() {
        let mut children = Vec::new();

        for card in candidates(&branch) {
            if branches.len() >= max_branches {
                log::warn!(
                    "Search stopped after {} branches without a win",
                    branches.len()
                );
                return SearchResult {
                    winner: None,
                    branches,
                    truncated: true,
                };
            }

            let mut played = branch.played().to_vec();
            played.push(card.clone());

            let mut child = branch.deep_copy();
            let resolution = match resolve(&card, &mut child, condition) {
                Ok(resolution) => resolution,
                Err(e) => {
                    log::debug!("Dropping branch that plays {}: {}", card, e);
                    branches.push(BranchRecord {
                        played,
                        success: false,
                        resolution: None,
                    });
                    continue;
                }
            };

            let success = condition.is_satisfied(&child);
            let dead_end = resolution.hand_discarded;
            branches.push(BranchRecord {
                played,
                success,
                resolution: Some(resolution),
            });
            if success {
                return SearchResult {
                    winner: Some(child),
                    branches,
                    truncated: false,
                };
            }
            // A discarded hand has nothing left to play
            if !dead_end {
                children.push(child);
            }
        }

        // First candidate is expanded first
        stack.extend(children.into_iter().rev());
    }

    SearchResult {
        winner: None,
        branches,
        truncated: false,
    }
}

/// Usable free cards in hand, one per name: copies resolve identically
fn candidates(state: &GameState) -> Vec<Card> {
    let mut seen: Vec<&str> = Vec::new();
    let mut out = Vec::new();
    for card in state.hand() {
        if seen.contains(&card.name()) || !is_usable(card, state) {
            continue;
        }
        seen.push(card.name());
        out.push(card.clone());
    }
    out
}
