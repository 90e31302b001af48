use crate::error::Result;
use crate::Generator;
use async_trait::async_trait;
use keyspan_core::{base62, Context, ShortCode};
use parking_lot::Mutex;
use rand::Rng;
use typed_builder::TypedBuilder;

pub const DEFAULT_RANDOM_LENGTH: usize = 7;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomSettings {
    /// Number of symbols per code, between 1 and 32.
    #[builder(default = DEFAULT_RANDOM_LENGTH)]
    pub length: usize,
}

impl Default for RandomSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Draws codes uniformly at random from the base62 alphabet.
///
/// Needs no coordination, at the price of possible collisions. Those are not
/// detected here and show up as conflicts when the link is stored.
pub struct RandomGenerator<R> {
    rng: Mutex<R>,
    length: usize,
}

impl<R: Rng + Send + 'static> RandomGenerator<R> {
    /// # Panics
    ///
    /// Panics if `settings.length` is not between 1 and 32.
    pub fn new(rng: R, settings: RandomSettings) -> Self {
        assert!(
            (1..=32).contains(&settings.length),
            "random code length must be between 1 and 32"
        );
        Self {
            rng: Mutex::new(rng),
            length: settings.length,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn draw(&self) -> ShortCode {
        let mut rng = self.rng.lock();
        let code: String = (0..self.length)
            .map(|_| char::from(base62::ALPHABET[rng.random_range(0..base62::ALPHABET.len())]))
            .collect();
        ShortCode::new_unchecked(code)
    }
}

#[async_trait]
impl<R: Rng + Send + 'static> Generator for RandomGenerator<R> {
    async fn next_code(&self, _ctx: &Context) -> Result<ShortCode> {
        Ok(self.draw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn seeded(seed: u64) -> RandomGenerator<StdRng> {
        RandomGenerator::new(StdRng::seed_from_u64(seed), RandomSettings::default())
    }

    #[tokio::test]
    async fn codes_have_configured_length() {
        let generator = RandomGenerator::new(
            StdRng::seed_from_u64(1),
            RandomSettings::builder().length(12).build(),
        );
        let code = generator.next_code(&Context::new()).await.unwrap();

        assert_eq!(code.as_str().len(), 12);
        assert!(ShortCode::new(code.as_str()).is_ok());
    }

    #[tokio::test]
    async fn same_seed_same_codes() {
        let a = seeded(42);
        let b = seeded(42);
        let ctx = Context::new();

        for _ in 0..50 {
            assert_eq!(
                a.next_code(&ctx).await.unwrap(),
                b.next_code(&ctx).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn different_seeds_diverge() {
        let ctx = Context::new();
        let a = seeded(1).next_code(&ctx).await.unwrap();
        let b = seeded(2).next_code(&ctx).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn ignores_cancellation() {
        let ctx = Context::new();
        ctx.cancel();
        assert!(seeded(7).next_code(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn rarely_repeats() {
        let generator = seeded(9);
        let ctx = Context::new();

        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            seen.insert(generator.next_code(&ctx).await.unwrap());
        }
        assert_eq!(seen.len(), 1_000);
    }

    #[test]
    #[should_panic(expected = "random code length")]
    fn zero_length_is_rejected() {
        RandomGenerator::new(
            StdRng::seed_from_u64(0),
            RandomSettings::builder().length(0).build(),
        );
    }
}
