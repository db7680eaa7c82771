//! Goodall family: matches on rare values weigh more than matches on common ones

use super::{mean, Frequencies, IndexKind, SimilarityIndex};
use ahash::AHashMap;
use parking_lot::RwLock;
use tabdist_core::{ColumnStatistics, Result, Token};
use tracing::trace;

/// Which side of the frequency distribution a Goodall tail sum covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tail {
    /// Values at most as frequent as the matched one
    Lower,
    /// Values at least as frequent as the matched one
    Upper,
}

/// Memoised match score `1 - Σ f(f-1) / (N(N-1))` over one tail of a column's
/// frequency distribution, keyed by the matched value's frequency.
///
/// Columns with `N <= 2` score every match as 1.
#[derive(Debug)]
pub(crate) struct TailSums {
    tail: Tail,
    cache: RwLock<AHashMap<u64, f64>>,
}

impl TailSums {
    pub fn new(tail: Tail) -> Self {
        Self {
            tail,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    pub fn score(&self, stats: &ColumnStatistics, occurrence: u64) -> f64 {
        if let Some(&cached) = self.cache.read().get(&occurrence) {
            return cached;
        }
        let total = stats.total();
        let score = if total > 2 {
            let sum: f64 = stats
                .occurrences()
                .values()
                .filter(|&&f| match self.tail {
                    Tail::Lower => f <= occurrence,
                    Tail::Upper => f >= occurrence,
                })
                .map(|&f| (f * (f - 1)) as f64)
                .sum();
            let n = total as f64;
            1.0 - sum / n / (n - 1.0)
        } else {
            1.0
        };
        trace!(occurrence, score, "goodall cache miss");
        self.cache.write().insert(occurrence, score);
        score
    }
}

fn tail_similarity(freqs: &Frequencies, tails: &[TailSums], a: &[Token], b: &[Token]) -> Result<f64> {
    let mut sum = 0.0;
    for (column, tail) in freqs.columns_of(a, b)?.zip(tails) {
        let column = column?;
        if column.matched {
            sum += tail.score(column.stats, column.fx);
        }
    }
    Ok(mean(sum, a.len()))
}

/// Goodall with the lower frequency tail.
/// Range [0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug)]
pub struct Goodall1 {
    freqs: Frequencies,
    tails: Vec<TailSums>,
}

impl Goodall1 {
    pub fn new(freqs: Frequencies) -> Self {
        let tails = (0..freqs.width()).map(|_| TailSums::new(Tail::Lower)).collect();
        Self { freqs, tails }
    }
}

impl SimilarityIndex for Goodall1 {
    fn kind(&self) -> IndexKind {
        IndexKind::Goodall1
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        tail_similarity(&self.freqs, &self.tails, a, b)
    }
}

/// Goodall with the upper frequency tail.
/// Range [0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug)]
pub struct Goodall2 {
    freqs: Frequencies,
    tails: Vec<TailSums>,
}

impl Goodall2 {
    pub fn new(freqs: Frequencies) -> Self {
        let tails = (0..freqs.width()).map(|_| TailSums::new(Tail::Upper)).collect();
        Self { freqs, tails }
    }
}

impl SimilarityIndex for Goodall2 {
    fn kind(&self) -> IndexKind {
        IndexKind::Goodall2
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        tail_similarity(&self.freqs, &self.tails, a, b)
    }
}

/// A match scores `1 - p2(x)`.
/// Range [0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct Goodall3 {
    freqs: Frequencies,
}

impl Goodall3 {
    pub fn new(freqs: Frequencies) -> Self {
        Self { freqs }
    }
}

impl SimilarityIndex for Goodall3 {
    fn kind(&self) -> IndexKind {
        IndexKind::Goodall3
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut sum = 0.0;
        for column in self.freqs.columns_of(a, b)? {
            let column = column?;
            if column.matched {
                sum += 1.0 - column.stats.p2(column.fx);
            }
        }
        Ok(mean(sum, a.len()))
    }
}

/// A match scores `p2(x)`.
/// Range [0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct Goodall4 {
    freqs: Frequencies,
}

impl Goodall4 {
    pub fn new(freqs: Frequencies) -> Self {
        Self { freqs }
    }
}

impl SimilarityIndex for Goodall4 {
    fn kind(&self) -> IndexKind {
        IndexKind::Goodall4
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut sum = 0.0;
        for column in self.freqs.columns_of(a, b)? {
            let column = column?;
            if column.matched {
                sum += column.stats.p2(column.fx);
            }
        }
        Ok(mean(sum, a.len()))
    }
}
