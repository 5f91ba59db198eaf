use chrono::Local;
use clap::{Parser, Subcommand};
use combo_odds::card::DeckList;
use combo_odds::condition::{parse_condition, Condition};
use combo_odds::game::Deck;
use combo_odds::rng::random_seed;
use combo_odds::simulation::{
    chunk_ranges, run_batch, ConditionStats, Report, SimulationConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::error::Error;
use std::time::Instant;

/// Trials handed to one worker at a time
const CHUNK_SIZE: u64 = 500;

#[derive(Parser)]
#[command(name = "combo-odds")]
#[command(about = "Opening hand combo probability simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings that override the config file
#[derive(clap::Args, Clone)]
struct TrialArgs {
    /// Number of trials to simulate
    #[arg(short = 'n', long)]
    trials: Option<u64>,

    /// Cards in the opening hand
    #[arg(long)]
    hand_size: Option<usize>,

    /// Pad the deck with blank cards up to this size
    #[arg(long)]
    deck_size: Option<usize>,

    /// Seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Branches a single trial may explore
    #[arg(long)]
    max_branches: Option<usize>,

    /// JSON file with simulation settings
    #[arg(long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate opening hands against one or more conditions
    Run {
        /// Deck list JSON file
        deck: String,

        /// Success condition, e.g. "2+ Combo Piece AND 1 Extender"
        #[arg(short, long = "condition", required = true)]
        conditions: Vec<String>,

        #[command(flatten)]
        trial: TrialArgs,

        /// Write results as JSON to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Print opening hand statistics for every card
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compare two deck lists against the same condition
    Compare {
        /// First deck list
        deck1: String,

        /// Second deck list
        deck2: String,

        /// Success condition
        #[arg(short, long)]
        condition: String,

        #[command(flatten)]
        trial: TrialArgs,
    },
}

#[derive(Serialize)]
struct RunOutput<'a> {
    generated_at: String,
    deck: &'a str,
    seed: u64,
    config: &'a SimulationConfig,
    results: Vec<ConditionOutput<'a>>,
}

#[derive(Serialize)]
struct ConditionOutput<'a> {
    condition: String,
    success_rate: f64,
    report: &'a Report,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            deck,
            conditions,
            trial,
            output,
            verbose,
        } => {
            run_simulation(&deck, &conditions, &trial, output.as_deref(), verbose);
        }
        Commands::Compare {
            deck1,
            deck2,
            condition,
            trial,
        } => {
            compare_decks(&deck1, &deck2, &condition, &trial);
        }
    }
}

fn load_config(args: &TrialArgs) -> SimulationConfig {
    let mut config = match &args.config {
        Some(path) => match SimulationConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ Failed to load config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };

    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if let Some(hand_size) = args.hand_size {
        config.hand_size = hand_size;
    }
    if let Some(deck_size) = args.deck_size {
        config.deck_size = deck_size;
    }
    if let Some(max_branches) = args.max_branches {
        config.max_branches = max_branches;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    if let Err(e) = config.validate() {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
    config
}

fn load_deck(path: &str, config: &SimulationConfig) -> Deck {
    match DeckList::from_file(path) {
        Ok(list) => {
            let deck = Deck::from_list(&list, config.deck_size);
            eprintln!(
                "✓ Loaded {} ({} cards, {} after padding)",
                path,
                list.card_count(),
                deck.len()
            );
            if deck.len() < config.hand_size {
                eprintln!(
                    "✗ Deck has {} cards but the hand needs {}",
                    deck.len(),
                    config.hand_size
                );
                std::process::exit(1);
            }
            deck
        }
        Err(e) => {
            eprintln!("✗ Failed to load deck list '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

fn load_condition(text: &str) -> Condition {
    match parse_condition(text) {
        Ok(condition) => condition,
        Err(e) => {
            eprintln!("✗ Invalid condition '{}': {}", text, e);
            std::process::exit(1);
        }
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} trials ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Run every trial in parallel chunks, each with its own condition tree,
/// and fold the chunk reports back together in trial order.
fn simulate(
    deck: &Deck,
    condition: &Condition,
    config: &SimulationConfig,
    base_seed: u64,
) -> Result<Report, Box<dyn Error>> {
    let bar = progress_bar(config.trials);

    let reports = chunk_ranges(config.trials, CHUNK_SIZE)
        .into_par_iter()
        .map(|range| {
            let len = range.end - range.start;
            let report = run_batch(deck, &mut condition.fresh(), config, base_seed, range);
            bar.inc(len);
            report
        })
        .collect::<Result<Vec<_>, _>>()?;
    bar.finish_and_clear();

    let mut total = Report::default();
    for report in &reports {
        total.merge(report)?;
    }
    Ok(total)
}

fn run_simulation(
    deck_file: &str,
    conditions: &[String],
    args: &TrialArgs,
    output: Option<&str>,
    verbose: bool,
) {
    let config = load_config(args);
    let deck = load_deck(deck_file, &config);
    let conditions: Vec<Condition> = conditions.iter().map(|c| load_condition(c)).collect();
    let base_seed = config.seed.unwrap_or_else(random_seed);

    println!("\n=== Combo Odds Simulator ===\n");
    println!("Deck: {} ({} cards)", deck_file, deck.len());
    println!("Hand size: {}", config.hand_size);
    println!("Trials: {}", config.trials);
    println!("Seed: {}", base_seed);
    println!();

    let mut reports = Vec::with_capacity(conditions.len());
    for condition in &conditions {
        let start = Instant::now();
        let report = match simulate(&deck, condition, &config, base_seed) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("✗ Simulation failed: {}", e);
                std::process::exit(1);
            }
        };
        let elapsed = start.elapsed();

        print_report(condition, &report, verbose);
        println!(
            "\nCompleted in {:.2?} ({:.0} trials/sec)\n",
            elapsed,
            report.trials as f64 / elapsed.as_secs_f64()
        );
        reports.push(report);
    }

    if let Some(path) = output {
        let out = RunOutput {
            generated_at: Local::now().to_rfc3339(),
            deck: deck_file,
            seed: base_seed,
            config: &config,
            results: conditions
                .iter()
                .zip(&reports)
                .map(|(condition, report)| ConditionOutput {
                    condition: condition.to_string(),
                    success_rate: report.success_rate(),
                    report,
                })
                .collect(),
        };
        match write_json(path, &out) {
            Ok(()) => println!("Results saved to: {}", path),
            Err(e) => eprintln!("✗ Failed to save results: {}", e),
        }
    }
}

fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn print_report(condition: &Condition, report: &Report, verbose: bool) {
    println!("=== Results ===\n");
    println!("Condition: {}", condition);
    println!(
        "Success rate: {:.2}% ({}/{})",
        report.success_rate() * 100.0,
        report.successes,
        report.trials
    );

    if let Some(stats) = &report.condition {
        if !stats.children.is_empty() {
            println!("\nBreakdown:");
            print_condition_stats(stats, report.trials, 1);
        }
    }

    if !report.free_cards.is_empty() {
        println!("\nFree cards in winning hands:");
        for (name, stats) in &report.free_cards {
            println!(
                "  {:30} used {:6} ({:5.1}%)  unused {:6}",
                name,
                stats.used_to_win,
                pct(stats.used_to_win, report.successes),
                stats.unused_in_winning_hand
            );
        }
        println!(
            "Wins holding an unused free card: {} ({:.1}%)",
            report.won_with_unused_free_card,
            pct(report.won_with_unused_free_card, report.successes)
        );
    }

    if report.truncated_searches > 0 {
        println!(
            "\n⚠ {} trials hit the branch limit and were counted as losses",
            report.truncated_searches
        );
    }

    if verbose {
        println!("\nOpening hands (trials with at least 1 / 2 / 3 copies):");
        for (name, stats) in report.cards.iter().chain(report.tags.iter()) {
            println!(
                "  {:30} {:5.1}% {:5.1}% {:5.1}%  drawn by effects: {}",
                name,
                pct(stats.trials_with_at_least(1), report.trials),
                pct(stats.trials_with_at_least(2), report.trials),
                pct(stats.trials_with_at_least(3), report.trials),
                stats.drawn_by_effect
            );
        }
        if !report.banished.is_empty() {
            println!("\nBanished on winning lines:");
            for (name, count) in &report.banished {
                println!("  {:30} {}", name, count);
            }
        }
    }
}

fn print_condition_stats(stats: &ConditionStats, trials: u64, depth: usize) {
    for child in &stats.children {
        let rate = child.success_rate(trials) * 100.0;
        let bar = "█".repeat((rate / 4.0) as usize);
        println!(
            "{}{:5.1}% {} {}",
            "  ".repeat(depth),
            rate,
            child.label,
            bar
        );
        print_condition_stats(child, trials, depth + 1);
    }
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn compare_decks(deck1_file: &str, deck2_file: &str, condition: &str, args: &TrialArgs) {
    let config = load_config(args);
    let deck1 = load_deck(deck1_file, &config);
    let deck2 = load_deck(deck2_file, &config);
    let condition = load_condition(condition);
    let base_seed = config.seed.unwrap_or_else(random_seed);

    println!("\n=== Deck Comparison ===\n");
    println!("Condition: {}", condition);
    println!("Trials per deck: {}", config.trials);
    println!("Seed: {}\n", base_seed);

    let mut rates = Vec::with_capacity(2);
    for (file, deck) in [(deck1_file, &deck1), (deck2_file, &deck2)] {
        match simulate(deck, &condition, &config, base_seed) {
            Ok(report) => {
                println!(
                    "  {:30} {:6.2}% ({}/{})",
                    file,
                    report.success_rate() * 100.0,
                    report.successes,
                    report.trials
                );
                rates.push(report.success_rate());
            }
            Err(e) => {
                eprintln!("✗ Simulation failed for '{}': {}", file, e);
                std::process::exit(1);
            }
        }
    }

    let diff = (rates[1] - rates[0]) * 100.0;
    println!("\nDifference: {:+.2} percentage points", diff);
    if diff > 0.0 {
        println!("✓ {} is more consistent", deck2_file);
    } else if diff < 0.0 {
        println!("✓ {} is more consistent", deck1_file);
    } else {
        println!("Both decks perform the same");
    }
}
