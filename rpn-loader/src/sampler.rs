//! Subsampling of anchor pools.

use crate::common::*;
use rand::seq::index;

/// Chooses `k` entries out of a pool of anchor indices.
pub trait SampleSource {
    /// Return `min(k, pool.len())` entries of `pool` in pool order.
    fn uniform_sample(&mut self, pool: &[usize], k: usize) -> Vec<usize>;
}

/// Keeps the first entries of the pool. It is used in debug-deterministic mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstN;

impl SampleSource for FirstN {
    fn uniform_sample(&mut self, pool: &[usize], k: usize) -> Vec<usize> {
        pool.iter().take(k).cloned().collect()
    }
}

/// Draws a uniform random subset of the pool.
#[derive(Debug, Clone)]
pub struct RandomSource<R>
where
    R: Rng,
{
    rng: R,
}

impl RandomSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seed_from_u64(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R> RandomSource<R>
where
    R: Rng,
{
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R> SampleSource for RandomSource<R>
where
    R: Rng,
{
    fn uniform_sample(&mut self, pool: &[usize], k: usize) -> Vec<usize> {
        if k >= pool.len() {
            return pool.to_vec();
        }

        let mut picked = index::sample(&mut self.rng, pool.len(), k).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|position| pool[position]).collect()
    }
}

impl<S> SampleSource for &mut S
where
    S: SampleSource + ?Sized,
{
    fn uniform_sample(&mut self, pool: &[usize], k: usize) -> Vec<usize> {
        (**self).uniform_sample(pool, k)
    }
}
