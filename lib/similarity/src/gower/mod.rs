//! Gower generalized distance
//!
//! Each column has its own [`TokenSimilarity`] producing a `(numerator, denominator)`
//! pair. The composite similarity is `Σ w·numerator / Σ w·denominator` with weights
//! normalised to sum to 1, and the distance is one minus that. A column where either
//! token is absent contributes nothing.

mod columns;

pub use columns::{FrequencyTokenIndex, JaccardBinary, NormalizedManhattan, TokenEskin, TokenOverlap};

use crate::distance::{check_lengths, DistanceFunction};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabdist_core::{ColumnStatistics, Error, RecordSource, Result, Token};
use tracing::{debug, warn};

/// One column's share of the Gower sums
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub numerator: f64,
    pub denominator: f64,
}

impl Contribution {
    /// A column that does not take part in the comparison
    pub const SKIPPED: Contribution = Contribution {
        numerator: 0.0,
        denominator: 0.0,
    };

    #[inline]
    #[must_use]
    pub fn new(numerator: f64, denominator: f64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// Similarity of two tokens of one column
pub trait TokenSimilarity: Send + Sync {
    fn kind(&self) -> GowerIndexKind;

    /// Both tokens are present; absent ones are filtered by the composite
    fn contribution(&self, x: &Token, y: &Token) -> Result<Contribution>;
}

/// Built-in per-column indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GowerIndexKind {
    NormalizedManhattan,
    JaccardBinary,
    Overlap,
    Eskin,
    Goodall1,
    Goodall2,
    Goodall3,
    Goodall4,
    InverseOccurrenceFrequency,
    OccurrenceFrequency,
}

impl GowerIndexKind {
    pub fn name(self) -> &'static str {
        match self {
            GowerIndexKind::NormalizedManhattan => "normalized_manhattan",
            GowerIndexKind::JaccardBinary => "jaccard_binary",
            GowerIndexKind::Overlap => "overlap",
            GowerIndexKind::Eskin => "eskin",
            GowerIndexKind::Goodall1 => "goodall1",
            GowerIndexKind::Goodall2 => "goodall2",
            GowerIndexKind::Goodall3 => "goodall3",
            GowerIndexKind::Goodall4 => "goodall4",
            GowerIndexKind::InverseOccurrenceFrequency => "inverse_occurrence_frequency",
            GowerIndexKind::OccurrenceFrequency => "occurrence_frequency",
        }
    }

    /// Build the index for `column` from that column's statistics
    pub fn from_statistics(self, column: usize, stats: &ColumnStatistics) -> Result<Box<dyn TokenSimilarity>> {
        let index: Box<dyn TokenSimilarity> = match self {
            GowerIndexKind::NormalizedManhattan => {
                Box::new(NormalizedManhattan::from_statistics(column, stats))
            }
            GowerIndexKind::JaccardBinary => Box::new(JaccardBinary::new(column)),
            GowerIndexKind::Overlap => Box::new(TokenOverlap),
            GowerIndexKind::Eskin => Box::new(TokenEskin::from_statistics(stats)),
            kind => Box::new(FrequencyTokenIndex::new(kind, column, stats.clone())?),
        };
        Ok(index)
    }

    /// Build the index for `column` with one full pass over `source`
    pub fn produce<S: RecordSource + ?Sized>(self, source: &mut S, column: usize) -> Result<Box<dyn TokenSimilarity>> {
        let stats = ColumnStatistics::collect(source, column)?;
        self.from_statistics(column, &stats)
    }
}

impl fmt::Display for GowerIndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weighted composite of per-column similarities.
///
/// Distance `1 - Σ w·num / Σ w·den`, in [0, 1]. The triangle inequality is not
/// guaranteed once categorical or Jaccard columns take part.
pub struct GowerDistance {
    columns: Vec<Box<dyn TokenSimilarity>>,
    weights: Vec<f64>,
}

impl GowerDistance {
    /// `weights` may be any non-negative values with a positive sum; they are
    /// normalised to sum to 1
    pub fn new(columns: Vec<Box<dyn TokenSimilarity>>, weights: &[f64]) -> Result<Self> {
        if weights.len() != columns.len() {
            return Err(Error::WeightCountMismatch {
                expected: columns.len(),
                actual: weights.len(),
            });
        }
        let weights = normalize_weights(weights)?;
        debug!(columns = columns.len(), "built gower distance");
        Ok(Self { columns, weights })
    }

    /// Gather statistics with one pass and build every column's index
    pub fn produce<S: RecordSource + ?Sized>(
        source: &mut S,
        kinds: &[GowerIndexKind],
        weights: &[f64],
    ) -> Result<Self> {
        if kinds.len() != source.width() {
            return Err(Error::InvalidWidth {
                expected: source.width(),
                actual: kinds.len(),
            });
        }
        let stats = ColumnStatistics::collect_all(source)?;
        let columns = kinds
            .iter()
            .zip(&stats)
            .enumerate()
            .map(|(column, (kind, stats))| kind.from_statistics(column, stats))
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns, weights)
    }

    /// Normalised weights, summing to 1
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn kinds(&self) -> Vec<GowerIndexKind> {
        self.columns.iter().map(|c| c.kind()).collect()
    }

    /// Composite similarity in [0, 1]
    pub fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        check_lengths(a, b)?;
        if a.len() != self.columns.len() {
            return Err(Error::InvalidWidth {
                expected: self.columns.len(),
                actual: a.len(),
            });
        }
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (((x, y), index), weight) in a.iter().zip(b).zip(&self.columns).zip(&self.weights) {
            let out = if x.is_absent() || y.is_absent() {
                Contribution::SKIPPED
            } else {
                index.contribution(x, y)?
            };
            numerator += weight * out.numerator;
            denominator += weight * out.denominator;
        }
        if denominator != 0.0 {
            Ok(numerator / denominator)
        } else if numerator == 0.0 {
            Ok(1.0)
        } else {
            warn!(numerator, "gower denominator is zero with a non-zero numerator");
            Ok(0.0)
        }
    }
}

impl DistanceFunction for GowerDistance {
    fn name(&self) -> &str {
        "gower"
    }

    fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        Ok(1.0 - self.similarity(a, b)?)
    }
}

/// Reject negative or all-zero weights and scale the rest to sum to 1
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<f64>> {
    if let Some(column) = weights.iter().position(|w| !(*w >= 0.0)) {
        return Err(Error::NegativeWeight(column));
    }
    let sum: f64 = weights.iter().sum();
    if sum == 0.0 {
        return Err(Error::ZeroTotalWeight);
    }
    Ok(weights.iter().map(|w| w / sum).collect())
}
