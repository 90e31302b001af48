//! Short code generators.
//!
//! [`IntervalAllocator`] is the distributed generator: it claims exclusive
//! ranges of integers through a [`Counter`](keyspan_core::Counter) and
//! serves codes from them locally. [`RandomGenerator`] is a single-node
//! fallback that draws random codes.

pub mod error;
pub mod interval;
pub mod random;

use async_trait::async_trait;
use keyspan_core::{Context, ShortCode};
use std::sync::Arc;

pub use error::{GeneratorError, Result};
pub use interval::{Interval, IntervalAllocator, IntervalSettings};
pub use random::{RandomGenerator, RandomSettings};

/// Source of fresh short codes.
///
/// Implementations do not touch link storage. A code returned here has
/// never been returned before by any generator sharing the same
/// coordination backend, unless the implementation says otherwise.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn next_code(&self, ctx: &Context) -> Result<ShortCode>;
}

#[async_trait]
impl<T: Generator + ?Sized> Generator for Arc<T> {
    async fn next_code(&self, ctx: &Context) -> Result<ShortCode> {
        (**self).next_code(ctx).await
    }
}
