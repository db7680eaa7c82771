//! Indices that score a match as 1 and weight mismatches by frequency

use super::{mean, Frequencies, IndexKind, SimilarityIndex};
use tabdist_core::{Result, Token};

/// Eskin mismatch score for a column with `cardinality` distinct values, in [2/3, 1)
#[inline]
pub(crate) fn eskin_mismatch(cardinality: usize) -> f64 {
    let squared = (cardinality * cardinality) as f64;
    squared / (squared + 2.0)
}

/// `1 / (1 + ln f1 * ln f2)`
#[inline]
pub(crate) fn iof_mismatch(f1: u64, f2: u64) -> f64 {
    1.0 / (1.0 + (f1 as f64).ln() * (f2 as f64).ln())
}

/// `1 / (1 + ln(N/f1) * ln(N/f2))`
#[inline]
pub(crate) fn of_mismatch(total: u64, f1: u64, f2: u64) -> f64 {
    let n = total as f64;
    1.0 / (1.0 + (n / f1 as f64).ln() * (n / f2 as f64).ln())
}

/// Share of agreeing columns. Range [0, 1]; the distance `1 - s` is the normalised
/// Hamming distance, which does satisfy the triangle inequality.
#[derive(Debug, Clone)]
pub struct Overlap {
    freqs: Frequencies,
}

impl Overlap {
    pub fn new(freqs: Frequencies) -> Self {
        Self { freqs }
    }
}

impl SimilarityIndex for Overlap {
    fn kind(&self) -> IndexKind {
        IndexKind::Overlap
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        self.freqs.check_pair(a, b)?;
        let agreeing = a.iter().zip(b).filter(|(x, y)| x == y).count();
        Ok(mean(agreeing as f64, a.len()))
    }
}

/// Mismatches in high-cardinality columns count as nearly a match.
/// Range [2/3, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct Eskin {
    freqs: Frequencies,
    mismatch: Vec<f64>,
}

impl Eskin {
    pub fn new(freqs: Frequencies) -> Self {
        let mismatch = freqs
            .columns()
            .iter()
            .map(|s| eskin_mismatch(s.cardinality()))
            .collect();
        Self { freqs, mismatch }
    }
}

impl SimilarityIndex for Eskin {
    fn kind(&self) -> IndexKind {
        IndexKind::Eskin
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        self.freqs.check_pair(a, b)?;
        let sum: f64 = a
            .iter()
            .zip(b)
            .zip(&self.mismatch)
            .map(|((x, y), &mismatch)| if x == y { 1.0 } else { mismatch })
            .sum();
        Ok(mean(sum, a.len()))
    }
}

/// Mismatches between frequent values are penalised less.
/// Range (0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct InverseOccurrenceFrequency {
    freqs: Frequencies,
}

impl InverseOccurrenceFrequency {
    pub fn new(freqs: Frequencies) -> Self {
        Self { freqs }
    }
}

impl SimilarityIndex for InverseOccurrenceFrequency {
    fn kind(&self) -> IndexKind {
        IndexKind::InverseOccurrenceFrequency
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut sum = 0.0;
        for column in self.freqs.columns_of(a, b)? {
            let column = column?;
            sum += if column.matched {
                1.0
            } else {
                iof_mismatch(column.fx, column.fy)
            };
        }
        Ok(mean(sum, a.len()))
    }
}

/// Mismatches between rare values are penalised less.
/// Range (0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct OccurrenceFrequency {
    freqs: Frequencies,
}

impl OccurrenceFrequency {
    pub fn new(freqs: Frequencies) -> Self {
        Self { freqs }
    }
}

impl SimilarityIndex for OccurrenceFrequency {
    fn kind(&self) -> IndexKind {
        IndexKind::OccurrenceFrequency
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut sum = 0.0;
        for column in self.freqs.columns_of(a, b)? {
            let column = column?;
            sum += if column.matched {
                1.0
            } else {
                of_mismatch(column.total(), column.fx, column.fy)
            };
        }
        Ok(mean(sum, a.len()))
    }
}
