use crate::error::{GeneratorError, Result};
use crate::Generator;
use async_trait::async_trait;
use keyspan_core::{base62, Context, CoordinationError, Counter, ShortCode};
use tokio::sync::Mutex;
use tracing::{info, trace, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_INTERVAL_SIZE: u64 = 100_000;

#[derive(Debug, Clone, TypedBuilder)]
pub struct IntervalSettings {
    /// Number of codes in every claimed interval. Must be the same on every
    /// node sharing a counter.
    #[builder(default = DEFAULT_INTERVAL_SIZE)]
    pub size: u64,
}

impl Default for IntervalSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A claimed range of integers, `low..=high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub low: u64,
    pub high: u64,
}

impl Interval {
    /// The interval owned by counter value `value`.
    pub fn for_counter(value: u64, size: u64) -> Result<Self> {
        let overflow = || GeneratorError::IntervalOverflow { value, size };

        let offset = value
            .checked_sub(1)
            .ok_or_else(|| {
                CoordinationError::InvalidData("counter returned zero".to_string())
            })?
            .checked_mul(size)
            .ok_or_else(overflow)?;
        let low = offset.checked_add(1).ok_or_else(overflow)?;
        let high = value.checked_mul(size).ok_or_else(overflow)?;
        // One past `high` must stay representable for the cursor.
        high.checked_add(1).ok_or_else(overflow)?;

        Ok(Self { low, high })
    }
}

#[derive(Debug, Default)]
struct Cursor {
    next: u64,
    end: u64,
    claimed: Option<Interval>,
}

impl Cursor {
    fn is_exhausted(&self) -> bool {
        self.next == self.end
    }
}

/// Hands out codes from intervals claimed through a shared [`Counter`].
///
/// One allocator runs per node. Claiming an interval costs one counter
/// round trip; every code after that is served locally until the interval
/// runs out. A failed claim leaves the allocator untouched, so the next
/// call simply tries again. Values are never reused, even when the caller
/// fails to use a code it was given.
pub struct IntervalAllocator<C> {
    counter: C,
    size: u64,
    cursor: Mutex<Cursor>,
}

impl<C: Counter> IntervalAllocator<C> {
    /// Creates an allocator that claims its first interval on first use.
    ///
    /// # Panics
    ///
    /// Panics if `settings.size` is zero.
    pub fn new(counter: C, settings: IntervalSettings) -> Self {
        assert!(settings.size > 0, "interval size must be positive");
        Self {
            counter,
            size: settings.size,
            cursor: Mutex::new(Cursor::default()),
        }
    }

    /// Creates an allocator and claims its first interval right away.
    pub async fn start(counter: C, settings: IntervalSettings, ctx: &Context) -> Result<Self> {
        let allocator = Self::new(counter, settings);
        {
            let mut cursor = ctx.run(allocator.cursor.lock()).await?;
            allocator.refill(ctx, &mut cursor).await?;
        }
        Ok(allocator)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    /// The interval currently being served, if one has been claimed.
    pub async fn current_interval(&self) -> Option<Interval> {
        self.cursor.lock().await.claimed
    }

    async fn refill(&self, ctx: &Context, cursor: &mut Cursor) -> Result<()> {
        let value = self.counter.next_value(ctx).await.map_err(|e| match e {
            CoordinationError::Cancelled => GeneratorError::Cancelled,
            other => GeneratorError::Coordination(other),
        })?;
        let interval = Interval::for_counter(value, self.size)?;

        cursor.next = interval.low;
        cursor.end = interval.high + 1;
        cursor.claimed = Some(interval);

        info!(
            counter = value,
            low = interval.low,
            high = interval.high,
            "claimed interval"
        );
        Ok(())
    }
}

#[async_trait]
impl<C: Counter> Generator for IntervalAllocator<C> {
    async fn next_code(&self, ctx: &Context) -> Result<ShortCode> {
        let mut cursor = ctx.run(self.cursor.lock()).await?;

        if cursor.is_exhausted() {
            if let Err(e) = self.refill(ctx, &mut cursor).await {
                warn!(error = %e, "failed to claim interval");
                return Err(e);
            }
        }

        let value = cursor.next;
        cursor.next += 1;
        drop(cursor);

        trace!(value, "allocated value");
        Ok(ShortCode::new_unchecked(base62::encode(value)))
    }
}
