use crate::condition::Condition;
use crate::game::Deck;
use crate::simulation::config::SimulationConfig;
use crate::simulation::report::{Report, ReportBuilder};
use crate::simulation::search::{run_trial, SimulationError};
use std::ops::Range;

/// Run trials `range` sequentially against one condition tree.
///
/// Trial `i` is seeded with `base_seed + i`, so splitting a range across
/// workers (each with its own [`Condition::fresh`] tree) and merging the
/// reports gives the same result as one call over the whole range.
pub fn run_batch(
    deck: &Deck,
    condition: &mut Condition,
    config: &SimulationConfig,
    base_seed: u64,
    range: Range<u64>,
) -> Result<Report, SimulationError> {
    let mut builder = ReportBuilder::new(deck);
    for i in range {
        let outcome = run_trial(deck, condition, config, base_seed.wrapping_add(i))?;
        builder.record(&outcome);
    }
    Ok(builder.finish(condition))
}

/// Split `0..trials` into contiguous chunks of at most `chunk_size`
pub fn chunk_ranges(trials: u64, chunk_size: u64) -> Vec<Range<u64>> {
    let chunk_size = chunk_size.max(1);
    (0..trials)
        .step_by(chunk_size as usize)
        .map(|start| start..(start + chunk_size).min(trials))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{DeckEntry, DeckList};

    #[test]
    fn test_chunk_ranges() {
        assert_eq!(chunk_ranges(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(chunk_ranges(3, 0), vec![0..1, 1..2, 2..3]);
        assert!(chunk_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_run_batch_counts_every_trial() {
        let list = DeckList::new().with("Combo Piece", DeckEntry::new(20));
        let deck = Deck::from_list(&list, 40);
        let mut condition = Condition::at_least(1, "Combo Piece");
        let config = SimulationConfig::default();

        let report = run_batch(&deck, &mut condition, &config, 42, 0..200).expect("batch runs");
        assert_eq!(report.trials, 200);
        assert!(report.successes > 150, "20 of 40 should almost always show up");
        let stats = report.condition.expect("condition stats");
        assert_eq!(stats.success_count, report.successes);
    }

    #[test]
    fn test_same_seed_same_report() {
        let list = DeckList::new().with("Combo Piece", DeckEntry::new(3));
        let deck = Deck::from_list(&list, 40);
        let template = Condition::at_least(1, "Combo Piece");
        let config = SimulationConfig::default();

        let a = run_batch(&deck, &mut template.fresh(), &config, 9, 0..300).expect("batch runs");
        let b = run_batch(&deck, &mut template.fresh(), &config, 9, 0..300).expect("batch runs");
        assert_eq!(a, b);
    }
}
