#![forbid(unsafe_code)]

//! Online estimators of a "typical" column width.
//!
//! Every accepted log call reports the combined width of its left column.
//! A [`RunningAggregate`] folds that stream into one representative width
//! that later calls pad towards, so unrelated call sites line up.
//!
//! | Strategy | Behaviour |
//! |----------|-----------|
//! | [`MatchLongest`] | widest seen so far, capped; never shrinks |
//! | [`Constant`] | fixed width (`0` disables alignment) |
//! | [`SlidingPercentile`] | p-th percentile of the last N widths |
//!
//! # Example
//! ```
//! use logsugar::aggregate::{RunningAggregate, SlidingPercentile};
//!
//! let mut p50 = SlidingPercentile::new(5, 0.5).unwrap();
//! for w in [1, 2, 3, 4, 5] {
//!     p50.add(w);
//! }
//! assert_eq!(p50.get(), 3);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, SugarError};

/// A stateful estimator over a stream of widths.
pub trait RunningAggregate: fmt::Debug + Send {
    /// Observe `value` and return the updated representative.
    fn add(&mut self, value: usize) -> usize;

    /// Current representative, without observing anything.
    fn get(&self) -> usize;
}

// ============================================================================
// MatchLongest
// ============================================================================

/// Tracks the longest width seen, capped at `maximum`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLongest {
    maximum: usize,
    running: usize,
}

impl MatchLongest {
    #[must_use]
    pub const fn new(maximum: usize) -> Self {
        Self {
            maximum,
            running: 0,
        }
    }
}

impl RunningAggregate for MatchLongest {
    fn add(&mut self, value: usize) -> usize {
        self.running = self.running.max(value).min(self.maximum);
        self.running
    }

    fn get(&self) -> usize {
        self.running
    }
}

// ============================================================================
// Constant
// ============================================================================

/// Ignores its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub usize);

impl RunningAggregate for Constant {
    fn add(&mut self, _value: usize) -> usize {
        self.0
    }

    fn get(&self) -> usize {
        self.0
    }
}

// ============================================================================
// SlidingPercentile
// ============================================================================

/// Sorted multiset with O(log n) insert, remove and extreme lookup.
#[derive(Debug, Clone, Default)]
struct Multiset {
    counts: BTreeMap<usize, usize>,
    len: usize,
}

impl Multiset {
    fn insert(&mut self, value: usize) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.len += 1;
    }

    /// Remove one copy of `value`; false if absent.
    fn remove(&mut self, value: usize) -> bool {
        let Some(count) = self.counts.get_mut(&value) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&value);
        }
        self.len -= 1;
        true
    }

    fn max(&self) -> Option<usize> {
        self.counts.last_key_value().map(|(&v, _)| v)
    }

    fn min(&self) -> Option<usize> {
        self.counts.first_key_value().map(|(&v, _)| v)
    }

    fn pop_max(&mut self) -> Option<usize> {
        let v = self.max()?;
        self.remove(v);
        Some(v)
    }

    fn pop_min(&mut self) -> Option<usize> {
        let v = self.min()?;
        self.remove(v);
        Some(v)
    }

    fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    fn to_sorted_vec(&self) -> Vec<usize> {
        self.counts
            .iter()
            .flat_map(|(&v, &n)| std::iter::repeat_n(v, n))
            .collect()
    }
}

/// The `percentile`-th width over a sliding window of the last
/// `window_size` observations.
///
/// The window is partitioned into `low` (values at or below the estimate)
/// and `high` (values above it). After every update `low` holds exactly
/// `round(len * percentile)` values, clamped to `0..=len`, and the
/// representative is `max(low)`, falling back to `min(high)`.
///
/// A value equal to the current `max(low)` joins `low`.
#[derive(Debug, Clone)]
pub struct SlidingPercentile {
    window_size: usize,
    percentile: f64,
    order: VecDeque<usize>,
    low: Multiset,
    high: Multiset,
}

impl SlidingPercentile {
    /// Create a tracker.
    ///
    /// # Errors
    ///
    /// [`SugarError::InvalidConfiguration`] when `window_size` is zero or
    /// `percentile` lies outside `(0, 1]`.
    pub fn new(window_size: usize, percentile: f64) -> Result<Self> {
        if window_size == 0 {
            return Err(SugarError::invalid("window_size", "must be at least 1"));
        }
        if !(percentile > 0.0 && percentile <= 1.0) {
            return Err(SugarError::invalid(
                "percentile",
                format!("{percentile} is outside (0, 1]"),
            ));
        }
        Ok(Self {
            window_size,
            percentile,
            order: VecDeque::with_capacity(window_size + 1),
            low: Multiset::default(),
            high: Multiset::default(),
        })
    }

    /// The p95 of the last 100 widths.
    #[must_use]
    pub fn p95() -> Self {
        Self {
            window_size: 100,
            percentile: 0.95,
            order: VecDeque::with_capacity(101),
            low: Multiset::default(),
            high: Multiset::default(),
        }
    }

    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    #[must_use]
    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Number of observations currently in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn target_low_len(&self) -> usize {
        let n = self.order.len();
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let target = (n as f64 * self.percentile).round() as usize;
        target.min(n)
    }

    fn rebalance(&mut self) {
        // A value forced into an empty `low` may exceed `min(high)`.
        while let (Some(lo), Some(hi)) = (self.low.max(), self.high.min()) {
            if lo <= hi {
                break;
            }
            self.low.remove(lo);
            self.high.remove(hi);
            self.low.insert(hi);
            self.high.insert(lo);
        }

        let target = self.target_low_len();
        while self.low.len() > target {
            match self.low.pop_max() {
                Some(v) => self.high.insert(v),
                None => break,
            }
        }
        while self.low.len() < target {
            match self.high.pop_min() {
                Some(v) => self.low.insert(v),
                None => break,
            }
        }
    }
}

impl RunningAggregate for SlidingPercentile {
    fn add(&mut self, value: usize) -> usize {
        self.order.push_back(value);
        if self.order.len() > self.window_size
            && let Some(oldest) = self.order.pop_front()
            && !self.low.remove(oldest)
        {
            self.high.remove(oldest);
        }

        match self.low.max() {
            Some(max_low) if value > max_low => self.high.insert(value),
            _ => self.low.insert(value),
        }

        self.rebalance();
        self.get()
    }

    fn get(&self) -> usize {
        self.low.max().or_else(|| self.high.min()).unwrap_or(0)
    }
}

// ============================================================================
// SharedAggregate
// ============================================================================

/// A [`RunningAggregate`] shared between concurrent callers.
///
/// `add` runs under a mutex so partition sizes never race. Cloning shares
/// the same estimator.
#[derive(Clone)]
pub struct SharedAggregate {
    inner: Arc<Mutex<Box<dyn RunningAggregate>>>,
}

impl SharedAggregate {
    pub fn new(aggregate: impl RunningAggregate + 'static) -> Self {
        Self::from_boxed(Box::new(aggregate))
    }

    #[must_use]
    pub fn from_boxed(aggregate: Box<dyn RunningAggregate>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(aggregate)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn RunningAggregate>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Observe `value` and return the updated representative.
    pub fn add(&self, value: usize) -> usize {
        self.lock().add(value)
    }

    /// Current representative.
    #[must_use]
    pub fn get(&self) -> usize {
        self.lock().get()
    }
}

impl Default for SharedAggregate {
    fn default() -> Self {
        Self::new(MatchLongest::new(crate::config::DEFAULT_MAX_LEFT_SECTION_WIDTH))
    }
}

impl fmt::Debug for SharedAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedAggregate").field(&*self.lock()).finish()
    }
}
