use crate::{
    casino::{RandomSource, Rules, Seed},
    feed::ActivityFeed,
    Engine, ValidatedConfig,
};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::Level;
use wager_types::casino::WagerRound;

/// Creates a deterministic engine seed for testing
pub fn create_test_seed() -> Seed {
    let mut rng = StdRng::seed_from_u64(0);
    let mut seed = Seed::default();
    rng.fill_bytes(&mut seed);
    seed
}

/// Random source that replays a fixed script of words, cycling when it
/// runs out.
#[derive(Clone, Debug)]
pub struct FixedRandom {
    words: Vec<u64>,
    next: usize,
}

impl FixedRandom {
    pub fn from_words(words: Vec<u64>) -> Self {
        assert!(!words.is_empty(), "script must not be empty");
        Self { words, next: 0 }
    }

    /// Script whose [crate::casino::sample_uniform] draws are `units`
    /// (each in `[0, 1)`), truncated to 53 bits.
    pub fn from_units(units: &[f64]) -> Self {
        let words = units
            .iter()
            .map(|u| {
                assert!((0.0..1.0).contains(u), "unit {u} out of range");
                ((u * (1u64 << 53) as f64) as u64) << 11
            })
            .collect();
        Self::from_words(words)
    }
}

impl RandomSource for FixedRandom {
    fn next_u64(&mut self) -> u64 {
        let word = self.words[self.next % self.words.len()];
        self.next += 1;
        word
    }
}

/// Feed that keeps every published round.
#[derive(Clone, Debug, Default)]
pub struct RecordingFeed {
    rounds: Arc<Mutex<Vec<WagerRound>>>,
}

impl RecordingFeed {
    pub fn rounds(&self) -> Vec<WagerRound> {
        self.rounds.lock().unwrap().clone()
    }
}

impl ActivityFeed for RecordingFeed {
    fn publish(&mut self, round: &WagerRound) {
        self.rounds.lock().unwrap().push(round.clone());
    }
}

/// Creates a validated config with the test seed and default tables
pub fn create_test_config(starting_balance: u64) -> ValidatedConfig {
    ValidatedConfig {
        starting_balance,
        seed: create_test_seed(),
        log_level: Level::DEBUG,
        rules: Rules::default(),
    }
}

/// Creates an engine wired to a [RecordingFeed]
pub fn create_test_engine(config: ValidatedConfig) -> (Engine, RecordingFeed) {
    let feed = RecordingFeed::default();
    let engine = Engine::new(config).with_feed(feed.clone());
    (engine, feed)
}
