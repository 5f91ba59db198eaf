//! Aggregate statistics over a batch of trials.
//!
//! A [`Report`] is plain data: it serializes, crosses worker boundaries and
//! merges by summation, so a run split into chunks reports exactly what a
//! single pass over the same trials would.

use crate::card::{Card, CardId};
use crate::condition::Condition;
use crate::game::Deck;
use crate::simulation::search::TrialOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Reports come from different conditions: '{0}' vs '{1}'")]
    ConditionMismatch(String, String),
}

/// Statistics for one card name or tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    /// Copies in the opening hand -> number of trials
    pub hand_histogram: BTreeMap<usize, u64>,
    /// Copies that reached a winning hand through a free card
    pub drawn_by_effect: u64,
}

impl CardStats {
    /// Trials whose opening hand held at least `copies`
    pub fn trials_with_at_least(&self, copies: usize) -> u64 {
        self.hand_histogram
            .range(copies..)
            .map(|(_, trials)| trials)
            .sum()
    }

    fn merge(&mut self, other: &CardStats) {
        for (copies, trials) in &other.hand_histogram {
            *self.hand_histogram.entry(*copies).or_insert(0) += trials;
        }
        self.drawn_by_effect += other.drawn_by_effect;
    }
}

/// How a free card figured in winning trials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeCardStats {
    /// Played on the branch that won
    pub used_to_win: u64,
    /// Still sitting in a winning hand
    pub unused_in_winning_hand: u64,
}

/// Success tally of one condition node, shaped like the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionStats {
    pub label: String,
    pub success_count: u64,
    pub children: Vec<ConditionStats>,
}

impl ConditionStats {
    /// Snapshot the counters accumulated on a tree
    pub fn from_condition(condition: &Condition) -> Self {
        ConditionStats {
            label: condition.to_string(),
            success_count: condition.success_count(),
            children: condition.children().iter().map(Self::from_condition).collect(),
        }
    }

    pub fn success_rate(&self, trials: u64) -> f64 {
        if trials == 0 {
            0.0
        } else {
            self.success_count as f64 / trials as f64
        }
    }

    fn merge(&mut self, other: &ConditionStats) -> Result<(), MergeError> {
        if self.label != other.label || self.children.len() != other.children.len() {
            return Err(MergeError::ConditionMismatch(
                self.label.clone(),
                other.label.clone(),
            ));
        }
        self.success_count += other.success_count;
        for (mine, theirs) in self.children.iter_mut().zip(&other.children) {
            mine.merge(theirs)?;
        }
        Ok(())
    }
}

/// Statistics for a batch of trials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub trials: u64,
    pub successes: u64,
    /// Wins that still held a playable-looking free card
    pub won_with_unused_free_card: u64,
    /// Trials whose search hit the branch limit
    pub truncated_searches: u64,
    pub cards: BTreeMap<String, CardStats>,
    pub tags: BTreeMap<String, CardStats>,
    pub free_cards: BTreeMap<String, FreeCardStats>,
    /// Banished cards across winning branches, by name
    pub banished: BTreeMap<String, u64>,
    /// Graveyard cards across winning branches, by name
    pub graveyard: BTreeMap<String, u64>,
    pub condition: Option<ConditionStats>,
}

impl Report {
    pub fn success_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.successes as f64 / self.trials as f64
        }
    }

    /// Case-insensitive lookup of a card name, falling back to tags
    pub fn card(&self, name: &str) -> Option<&CardStats> {
        self.cards
            .iter()
            .chain(self.tags.iter())
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, stats)| stats)
    }

    /// Fold another report over a disjoint set of trials into this one
    pub fn merge(&mut self, other: &Report) -> Result<(), MergeError> {
        if let Some(theirs) = &other.condition {
            match self.condition.as_mut() {
                Some(mine) => mine.merge(theirs)?,
                None => self.condition = Some(theirs.clone()),
            }
        }

        self.trials += other.trials;
        self.successes += other.successes;
        self.won_with_unused_free_card += other.won_with_unused_free_card;
        self.truncated_searches += other.truncated_searches;

        for (name, stats) in &other.cards {
            self.cards.entry(name.clone()).or_default().merge(stats);
        }
        for (tag, stats) in &other.tags {
            self.tags.entry(tag.clone()).or_default().merge(stats);
        }
        for (name, stats) in &other.free_cards {
            let entry = self.free_cards.entry(name.clone()).or_default();
            entry.used_to_win += stats.used_to_win;
            entry.unused_in_winning_hand += stats.unused_in_winning_hand;
        }
        add_counts(&mut self.banished, &other.banished);
        add_counts(&mut self.graveyard, &other.graveyard);
        Ok(())
    }
}

fn add_counts(into: &mut BTreeMap<String, u64>, from: &BTreeMap<String, u64>) {
    for (name, count) in from {
        *into.entry(name.clone()).or_insert(0) += count;
    }
}

fn tally<'a>(into: &mut BTreeMap<String, u64>, cards: impl IntoIterator<Item = &'a Card>) {
    for card in cards {
        *into.entry(card.name().to_string()).or_insert(0) += 1;
    }
}

/// Folds trial outcomes into a [`Report`]
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    report: Report,
    names: Vec<String>,
    tags: Vec<String>,
}

impl ReportBuilder {
    /// Track every name and tag present in `deck`
    pub fn new(deck: &Deck) -> Self {
        let mut names: Vec<String> = deck.cards().iter().map(|c| c.name().to_string()).collect();
        names.sort();
        names.dedup();
        let mut tags: Vec<String> = deck
            .cards()
            .iter()
            .flat_map(|c| c.tags().iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();

        ReportBuilder {
            report: Report::default(),
            names,
            tags,
        }
    }

    pub fn record(&mut self, outcome: &TrialOutcome) {
        let report = &mut self.report;
        report.trials += 1;
        if outcome.truncated {
            report.truncated_searches += 1;
        }

        for name in &self.names {
            let copies = outcome.initial_hand.iter().filter(|c| c.name() == name.as_str()).count();
            let stats = report.cards.entry(name.clone()).or_default();
            *stats.hand_histogram.entry(copies).or_insert(0) += 1;
        }
        for tag in &self.tags {
            let copies = outcome
                .initial_hand
                .iter()
                .filter(|c| c.tags().iter().any(|t| t == tag))
                .count();
            let stats = report.tags.entry(tag.clone()).or_default();
            *stats.hand_histogram.entry(copies).or_insert(0) += 1;
        }

        if !outcome.success {
            return;
        }
        report.successes += 1;
        let terminal = &outcome.terminal;

        if outcome.won_with_free_cards() {
            let opening: Vec<CardId> = outcome.initial_hand.iter().map(|c| c.id()).collect();
            for card in terminal.hand().iter().filter(|c| !opening.contains(&c.id())) {
                report.cards.entry(card.name().to_string()).or_default().drawn_by_effect += 1;
                for tag in card.tags() {
                    report.tags.entry(tag.clone()).or_default().drawn_by_effect += 1;
                }
            }
            for card in terminal.played() {
                report
                    .free_cards
                    .entry(card.name().to_string())
                    .or_default()
                    .used_to_win += 1;
            }
        }

        let mut unused = false;
        for card in terminal.hand().iter().filter(|c| c.is_free_card()) {
            unused = true;
            report
                .free_cards
                .entry(card.name().to_string())
                .or_default()
                .unused_in_winning_hand += 1;
        }
        if unused {
            report.won_with_unused_free_card += 1;
        }

        tally(&mut report.banished, terminal.banished());
        tally(&mut report.graveyard, terminal.graveyard());
    }

    /// Close the report, reading per-node counts off `condition`
    pub fn finish(mut self, condition: &Condition) -> Report {
        self.report.condition = Some(ConditionStats::from_condition(condition));
        self.report
    }
}
