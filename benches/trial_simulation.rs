use combo_odds::card::{Cost, CostKind, DeckEntry, DeckList, FreeCardSpec};
use combo_odds::condition::parse_condition;
use combo_odds::game::Deck;
use combo_odds::simulation::{run_batch, run_trial, SimulationConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn engine_deck() -> Deck {
    let list = DeckList::new()
        .with("Combo Piece", DeckEntry::new(3).tagged(&["Starter"]))
        .with("Extender", DeckEntry::new(6).tagged(&["Engine"]))
        .with(
            "Pot of Desires",
            DeckEntry::new(2).free(FreeCardSpec {
                draw_count: 2,
                once_per_turn: true,
                cost: Some(Cost::count(CostKind::BanishFromDeck, 10)),
                ..Default::default()
            }),
        )
        .with(
            "Upstart Goblin",
            DeckEntry::new(3).free(FreeCardSpec {
                draw_count: 1,
                cost: Some(Cost::count(CostKind::PayLife, 1000)),
                ..Default::default()
            }),
        );
    Deck::from_list(&list, 40)
}

fn benchmark_single_trial(c: &mut Criterion) {
    let deck = engine_deck();
    let config = SimulationConfig::default();
    let condition = parse_condition("1+ Starter AND 1+ Engine").expect("valid condition");

    c.bench_function("single_trial_seed_12345", |b| {
        b.iter(|| {
            let mut condition = condition.fresh();
            run_trial(black_box(&deck), &mut condition, &config, black_box(12345))
        })
    });
}

fn benchmark_batch(c: &mut Criterion) {
    let deck = engine_deck();
    let config = SimulationConfig::default();
    let condition = parse_condition("2+ Combo Piece OR (1 Starter AND 2+ Engine)")
        .expect("valid condition");

    c.bench_function("1000_trials", |b| {
        b.iter(|| {
            let mut condition = condition.fresh();
            run_batch(black_box(&deck), &mut condition, &config, 0, 0..1000)
        })
    });
}

fn benchmark_condition_parsing(c: &mut Criterion) {
    c.bench_function("parse_condition", |b| {
        b.iter(|| parse_condition(black_box("2+ Combo Piece AND (1 Extender OR 0- Garnet IN Deck)")))
    });
}

criterion_group!(benches, benchmark_single_trial, benchmark_batch, benchmark_condition_parsing);
criterion_main!(benches);
