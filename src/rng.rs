use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded random source for reproducible trials.
///
/// Every trial owns one of these, built from `base_seed + trial_index`, so the
/// outcome of a trial never depends on which worker ran it.
#[derive(Clone, Debug)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new GameRng with an optional seed.
    /// If seed is None, a random seed is drawn from the thread rng.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(random_seed);
        GameRng {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this generator was built from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in [0, 1)
    pub fn random(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Uniform integer in [0, max)
    pub fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.random_range(i + 1);
            items.swap(i, j);
        }
    }
}

/// Fresh entropy for runs where the caller gave no seed
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}
