//! Sampling primitives shared by every game.
//!
//! Games never read the raw `u64` stream. Every draw goes through
//! [sample_uniform] or [sample_weighted] (directly or through the helpers
//! built on them), so swapping the [RandomSource] changes nothing else.

use super::GameError;

/// Source of uniformly distributed 64-bit words.
pub trait RandomSource {
    fn next_u64(&mut self) -> u64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

/// 2^53, the number of distinct doubles produced by [sample_uniform].
const UNIFORM_STEPS: f64 = (1u64 << 53) as f64;

/// Uniform sample in `[0, 1)` built from the top 53 bits of one word.
pub fn sample_uniform(rng: &mut impl RandomSource) -> f64 {
    (rng.next_u64() >> 11) as f64 / UNIFORM_STEPS
}

/// Draws an index from `entries`, weighted by `weight_of`.
///
/// `u = sample_uniform() × total` is compared against running cumulative
/// weights and the first entry whose cumulative weight is `≥ u` wins.
/// Zero-weight entries are skipped, so they are never returned. Fails with
/// [GameError::InvalidDistribution] when the table is empty, sums to zero,
/// or overflows.
pub fn sample_weighted<T>(
    rng: &mut impl RandomSource,
    entries: &[T],
    weight_of: impl Fn(&T) -> u64,
) -> Result<usize, GameError> {
    let total = total_weight(entries, &weight_of)?;
    let target = sample_uniform(rng) * total as f64;

    let mut cumulative = 0u64;
    let mut last_positive = 0;
    for (idx, entry) in entries.iter().enumerate() {
        let weight = weight_of(entry);
        if weight == 0 {
            continue;
        }
        cumulative += weight;
        last_positive = idx;
        if cumulative as f64 >= target {
            return Ok(idx);
        }
    }

    // Unreachable unless float rounding pushes `target` past the total.
    Ok(last_positive)
}

/// Sum of weights, rejecting empty, zero-total or overflowing tables.
pub fn total_weight<T>(entries: &[T], weight_of: impl Fn(&T) -> u64) -> Result<u64, GameError> {
    let total = entries
        .iter()
        .try_fold(0u64, |acc, entry| acc.checked_add(weight_of(entry)))
        .ok_or(GameError::InvalidDistribution)?;
    if total == 0 {
        return Err(GameError::InvalidDistribution);
    }
    Ok(total)
}

/// Uniform index in `[0, len)`.
pub fn sample_index(rng: &mut impl RandomSource, len: usize) -> Result<usize, GameError> {
    if len == 0 {
        return Err(GameError::InvalidDistribution);
    }
    let idx = (sample_uniform(rng) * len as f64) as usize;
    Ok(idx.min(len - 1))
}

/// Fisher-Yates shuffle in place.
pub fn shuffle<T>(rng: &mut impl RandomSource, slice: &mut [T]) {
    for i in (1..slice.len()).rev() {
        // `i + 1` is never zero.
        let j = sample_index(rng, i + 1).unwrap_or(0);
        slice.swap(i, j);
    }
}

/// `count` distinct values from `0..len`, sorted ascending.
pub fn sample_distinct(
    rng: &mut impl RandomSource,
    count: usize,
    len: u8,
) -> Result<Vec<u8>, GameError> {
    if count > len as usize {
        return Err(GameError::InvalidDistribution);
    }
    let mut pool: Vec<u8> = (0..len).collect();
    // Partial Fisher-Yates: only the first `count` positions are settled.
    for i in 0..count {
        let j = i + sample_index(rng, pool.len() - i)?;
        pool.swap(i, j);
    }
    pool.truncate(count);
    pool.sort_unstable();
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casino::GameRng;
    use crate::mocks::{create_test_seed, FixedRandom};

    #[test]
    fn test_uniform_range() {
        let seed = create_test_seed();
        let mut rng = GameRng::new(&seed, 1, 0);
        for _ in 0..10_000 {
            let u = sample_uniform(&mut rng);
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_uniform_exact_units() {
        let mut rng = FixedRandom::from_units(&[0.0, 0.5, 0.25]);
        assert_eq!(sample_uniform(&mut rng), 0.0);
        assert_eq!(sample_uniform(&mut rng), 0.5);
        assert_eq!(sample_uniform(&mut rng), 0.25);
    }

    #[test]
    fn test_weighted_boundaries() {
        let weights = [60u64, 30, 9, 1];
        // u × 100 lands exactly on a cumulative boundary: first match wins.
        let mut rng = FixedRandom::from_units(&[0.6, 0.6000001, 0.99, 0.995]);
        assert_eq!(sample_weighted(&mut rng, &weights, |w| *w).unwrap(), 0);
        assert_eq!(sample_weighted(&mut rng, &weights, |w| *w).unwrap(), 1);
        assert_eq!(sample_weighted(&mut rng, &weights, |w| *w).unwrap(), 2);
        assert_eq!(sample_weighted(&mut rng, &weights, |w| *w).unwrap(), 3);
    }

    #[test]
    fn test_weighted_skips_zero_weight() {
        let weights = [0u64, 5, 0, 5, 0];
        let mut rng = FixedRandom::from_units(&[0.0, 0.5, 0.75, 0.9999]);
        for _ in 0..4 {
            let idx = sample_weighted(&mut rng, &weights, |w| *w).unwrap();
            assert!(idx == 1 || idx == 3);
        }
    }

    #[test]
    fn test_weighted_rejects_bad_tables() {
        let mut rng = FixedRandom::from_units(&[0.5]);
        let empty: [u64; 0] = [];
        assert_eq!(
            sample_weighted(&mut rng, &empty, |w| *w),
            Err(GameError::InvalidDistribution)
        );
        assert_eq!(
            sample_weighted(&mut rng, &[0u64, 0], |w| *w),
            Err(GameError::InvalidDistribution)
        );
        assert_eq!(
            sample_weighted(&mut rng, &[u64::MAX, 1], |w| *w),
            Err(GameError::InvalidDistribution)
        );
    }

    #[test]
    fn test_weighted_convergence() {
        let seed = create_test_seed();
        let mut rng = GameRng::new(&seed, 7, 0);
        let weights = [60u64, 30, 9, 1];
        let mut counts = [0u64; 4];
        let draws = 1_000_000;
        for _ in 0..draws {
            counts[sample_weighted(&mut rng, &weights, |w| *w).unwrap()] += 1;
        }
        for (count, weight) in counts.iter().zip(weights) {
            let observed = *count as f64 / draws as f64 * 100.0;
            assert!(
                (observed - weight as f64).abs() < 0.5,
                "weight {weight}: observed {observed:.3}%"
            );
        }
    }

    #[test]
    fn test_sample_index_bounds() {
        let mut rng = FixedRandom::from_units(&[0.0, 0.999_999]);
        assert_eq!(sample_index(&mut rng, 10).unwrap(), 0);
        assert_eq!(sample_index(&mut rng, 10).unwrap(), 9);
        assert_eq!(
            sample_index(&mut rng, 0),
            Err(GameError::InvalidDistribution)
        );
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let seed = create_test_seed();
        let mut rng = GameRng::new(&seed, 1, 0);
        let mut deck: Vec<u8> = (0..52).collect();
        shuffle(&mut rng, &mut deck);

        let mut seen = [false; 52];
        for card in &deck {
            assert!(!seen[*card as usize], "duplicate card: {card}");
            seen[*card as usize] = true;
        }
        assert_ne!(deck, (0..52).collect::<Vec<u8>>());
    }

    #[test]
    fn test_sample_distinct() {
        let seed = create_test_seed();
        for session in 0..50 {
            let mut rng = GameRng::new(&seed, session, 0);
            let cells = sample_distinct(&mut rng, 5, 25).unwrap();
            assert_eq!(cells.len(), 5);
            assert!(cells.windows(2).all(|w| w[0] < w[1]));
            assert!(cells.iter().all(|c| *c < 25));
        }

        let mut rng = GameRng::new(&seed, 0, 0);
        assert_eq!(sample_distinct(&mut rng, 25, 25).unwrap().len(), 25);
        assert_eq!(
            sample_distinct(&mut rng, 26, 25),
            Err(GameError::InvalidDistribution)
        );
    }
}
