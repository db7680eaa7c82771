//! Column statistics
//!
//! One full pass over a record source yields, per column, the occurrence count of
//! every distinct non-absent token, the number of non-absent tokens and, for numeric
//! tokens, min/max/sum. Statistics are immutable once built; changed data needs a
//! fresh pass.

use crate::record::{scan, RecordSource};
use crate::{Error, Result, Token};
use ahash::AHashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ColumnStatistics {
    occurrences: AHashMap<Token, u64>,
    /// Distinct tokens in first-encountered order
    first_seen: Vec<Token>,
    total: u64,
    numeric_count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one token; absent tokens are ignored
    pub fn observe(&mut self, token: &Token) {
        if token.is_absent() {
            return;
        }
        self.total += 1;
        match self.occurrences.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.occurrences.insert(token.clone(), 1);
                self.first_seen.push(token.clone());
            }
        }
        if let Some(x) = token.as_f64() {
            self.numeric_count += 1;
            self.sum += x;
            self.min = Some(self.min.map_or(x, |m| m.min(x)));
            self.max = Some(self.max.map_or(x, |m| m.max(x)));
        }
    }

    /// Build statistics for a single column with one full pass
    pub fn collect<S: RecordSource + ?Sized>(source: &mut S, column: usize) -> Result<Self> {
        let width = source.width();
        if column >= width {
            return Err(Error::ColumnOutOfRange { column, width });
        }
        let mut stats = Self::new();
        let records = scan(source, |record| {
            let token = record.tokens.get(column).ok_or(Error::InvalidWidth {
                expected: width,
                actual: record.tokens.len(),
            })?;
            stats.observe(token);
            Ok(())
        })?;
        debug!(column, records, distinct = stats.cardinality(), "collected column statistics");
        Ok(stats)
    }

    /// Build statistics for every column with one full pass
    pub fn collect_all<S: RecordSource + ?Sized>(source: &mut S) -> Result<Vec<Self>> {
        let width = source.width();
        let mut columns = vec![Self::new(); width];
        let records = scan(source, |record| {
            if record.tokens.len() != width {
                return Err(Error::InvalidWidth {
                    expected: width,
                    actual: record.tokens.len(),
                });
            }
            for (stats, token) in columns.iter_mut().zip(&record.tokens) {
                stats.observe(token);
            }
            Ok(())
        })?;
        debug!(width, records, "collected statistics for all columns");
        Ok(columns)
    }

    /// Occurrence count of `token`, `None` if it was never observed
    #[inline]
    pub fn occurrence(&self, token: &Token) -> Option<u64> {
        self.occurrences.get(token).copied()
    }

    /// Number of non-absent tokens
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct observed values
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.occurrences.len()
    }

    pub fn occurrences(&self) -> &AHashMap<Token, u64> {
        &self.occurrences
    }

    /// Distinct values with their counts in first-encountered order
    pub fn iter_ordered(&self) -> impl Iterator<Item = (&Token, u64)> + '_ {
        self.first_seen
            .iter()
            .map(move |t| (t, self.occurrences.get(t).copied().unwrap_or(0)))
    }

    #[inline]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// `max - min` over numeric tokens, 0 when none were seen
    pub fn range(&self) -> f64 {
        match (self.min, self.max) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        }
    }

    /// Arithmetic mean of numeric tokens
    pub fn mean(&self) -> Option<f64> {
        (self.numeric_count > 0).then(|| self.sum / self.numeric_count as f64)
    }

    /// Sample probability `occurrence / total`; 1 for an empty column
    pub fn probability(&self, occurrence: u64) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            occurrence as f64 / self.total as f64
        }
    }

    /// Probability of drawing the value twice without replacement:
    /// `f(f-1) / (N(N-1))`, with the limiting values 1 and 0 for `N <= 1`
    pub fn p2(&self, occurrence: u64) -> f64 {
        match (self.total, occurrence) {
            (0, _) | (1, 1) => 1.0,
            (1, _) => 0.0,
            (n, f) => {
                let (n, f) = (n as f64, f as f64);
                f * (f - 1.0) / n / (n - 1.0)
            }
        }
    }
}
