//! Per-column similarity indices for the Gower composite

use super::{Contribution, GowerIndexKind, TokenSimilarity};
use crate::index::{eskin_mismatch, iof_mismatch, occurrence, of_mismatch, Tail, TailSums};
use tabdist_core::{ColumnStatistics, Error, Result, Token};

/// `(max(0, 1 - |x - y| / range), 1)`; a constant column always scores `(1, 1)`.
/// Values outside the observed range are clamped so the score stays in [0, 1].
#[derive(Debug, Clone)]
pub struct NormalizedManhattan {
    column: usize,
    range: f64,
}

impl NormalizedManhattan {
    pub fn new(column: usize, range: f64) -> Self {
        Self { column, range }
    }

    pub fn from_statistics(column: usize, stats: &ColumnStatistics) -> Self {
        Self::new(column, stats.range())
    }

    fn numeric(&self, token: &Token) -> Result<f64> {
        token.as_f64().ok_or(Error::NonNumeric {
            column: self.column,
            found: token.token_type(),
        })
    }
}

impl TokenSimilarity for NormalizedManhattan {
    fn kind(&self) -> GowerIndexKind {
        GowerIndexKind::NormalizedManhattan
    }

    fn contribution(&self, x: &Token, y: &Token) -> Result<Contribution> {
        let (x, y) = (self.numeric(x)?, self.numeric(y)?);
        if self.range == 0.0 {
            return Ok(Contribution::new(1.0, 1.0));
        }
        Ok(Contribution::new((1.0 - (x - y).abs() / self.range).max(0.0), 1.0))
    }
}

/// `(x AND y, x OR y)`: two negatives say nothing about similarity
#[derive(Debug, Clone, Copy)]
pub struct JaccardBinary {
    column: usize,
}

impl JaccardBinary {
    pub fn new(column: usize) -> Self {
        Self { column }
    }

    fn flag(&self, token: &Token) -> Result<bool> {
        token.as_bool().ok_or(Error::NonBinary {
            column: self.column,
            found: token.token_type(),
        })
    }
}

impl TokenSimilarity for JaccardBinary {
    fn kind(&self) -> GowerIndexKind {
        GowerIndexKind::JaccardBinary
    }

    fn contribution(&self, x: &Token, y: &Token) -> Result<Contribution> {
        let (x, y) = (self.flag(x)?, self.flag(y)?);
        Ok(Contribution::new(
            f64::from(u8::from(x && y)),
            f64::from(u8::from(x || y)),
        ))
    }
}

/// `(1, 1)` on a match, `(0, 1)` otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlap;

impl TokenSimilarity for TokenOverlap {
    fn kind(&self) -> GowerIndexKind {
        GowerIndexKind::Overlap
    }

    fn contribution(&self, x: &Token, y: &Token) -> Result<Contribution> {
        Ok(Contribution::new(if x == y { 1.0 } else { 0.0 }, 1.0))
    }
}

/// Eskin with its mismatch score stretched from [2/3, 1] onto [0, 1]
#[derive(Debug, Clone, Copy)]
pub struct TokenEskin {
    mismatch: f64,
}

impl TokenEskin {
    pub fn from_statistics(stats: &ColumnStatistics) -> Self {
        Self {
            mismatch: (eskin_mismatch(stats.cardinality()) - 2.0 / 3.0) * 3.0,
        }
    }
}

impl TokenSimilarity for TokenEskin {
    fn kind(&self) -> GowerIndexKind {
        GowerIndexKind::Eskin
    }

    fn contribution(&self, x: &Token, y: &Token) -> Result<Contribution> {
        Ok(Contribution::new(if x == y { 1.0 } else { self.mismatch }, 1.0))
    }
}

/// Frequency-weighted categorical scores: the Goodall family and the two
/// occurrence-frequency indices
#[derive(Debug)]
pub struct FrequencyTokenIndex {
    kind: GowerIndexKind,
    column: usize,
    stats: ColumnStatistics,
    tails: Option<TailSums>,
}

impl FrequencyTokenIndex {
    /// `kind` must be one of the frequency-weighted kinds
    pub fn new(kind: GowerIndexKind, column: usize, stats: ColumnStatistics) -> Result<Self> {
        let tails = match kind {
            GowerIndexKind::Goodall1 => Some(TailSums::new(Tail::Lower)),
            GowerIndexKind::Goodall2 => Some(TailSums::new(Tail::Upper)),
            GowerIndexKind::Goodall3
            | GowerIndexKind::Goodall4
            | GowerIndexKind::InverseOccurrenceFrequency
            | GowerIndexKind::OccurrenceFrequency => None,
            other => return Err(Error::UnknownIndex(format!("{} is not frequency based", other))),
        };
        Ok(Self {
            kind,
            column,
            stats,
            tails,
        })
    }
}

impl TokenSimilarity for FrequencyTokenIndex {
    fn kind(&self) -> GowerIndexKind {
        self.kind
    }

    fn contribution(&self, x: &Token, y: &Token) -> Result<Contribution> {
        let fx = occurrence(&self.stats, self.column, x)?;
        let fy = occurrence(&self.stats, self.column, y)?;
        let matched = x == y;
        let score = match (self.kind, &self.tails) {
            (_, Some(tails)) if matched => tails.score(&self.stats, fx),
            (GowerIndexKind::Goodall3, _) if matched => 1.0 - self.stats.p2(fx),
            (GowerIndexKind::Goodall4, _) if matched => self.stats.p2(fx),
            (GowerIndexKind::InverseOccurrenceFrequency, _) if !matched => iof_mismatch(fx, fy),
            (GowerIndexKind::OccurrenceFrequency, _) if !matched => {
                of_mismatch(self.stats.total(), fx, fy)
            }
            (GowerIndexKind::InverseOccurrenceFrequency | GowerIndexKind::OccurrenceFrequency, _) => 1.0,
            _ => 0.0,
        };
        Ok(Contribution::new(score, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorical(values: &[&str]) -> ColumnStatistics {
        let mut stats = ColumnStatistics::new();
        for v in values {
            stats.observe(&Token::categorical(*v));
        }
        stats
    }

    fn c(v: &str) -> Token {
        Token::categorical(v)
    }

    #[test]
    fn test_normalized_manhattan() {
        let index = NormalizedManhattan::new(0, 4.0);
        let out = index.contribution(&Token::Integer(2), &Token::Integer(5)).unwrap();
        assert_eq!(out, Contribution::new(0.25, 1.0));
        let flat = NormalizedManhattan::new(0, 0.0);
        assert_eq!(
            flat.contribution(&Token::float(1.0), &Token::float(1.0)).unwrap(),
            Contribution::new(1.0, 1.0)
        );
        assert!(matches!(
            index.contribution(&c("a"), &Token::Integer(1)),
            Err(Error::NonNumeric { column: 0, .. })
        ));
    }

    #[test]
    fn test_normalized_manhattan_clamps_outside_observed_range() {
        let index = NormalizedManhattan::new(0, 4.0);
        let out = index.contribution(&Token::Integer(0), &Token::Integer(10)).unwrap();
        assert_eq!(out, Contribution::new(0.0, 1.0));
        let out = index.contribution(&Token::float(-1.0), &Token::float(3.0)).unwrap();
        assert_eq!(out, Contribution::new(0.0, 1.0));
    }

    #[test]
    fn test_jaccard_binary() {
        let index = JaccardBinary::new(3);
        let t = Token::Binary(true);
        let f = Token::BinaryDigital(false);
        assert_eq!(index.contribution(&t, &t).unwrap(), Contribution::new(1.0, 1.0));
        assert_eq!(index.contribution(&t, &f).unwrap(), Contribution::new(0.0, 1.0));
        assert_eq!(index.contribution(&f, &f).unwrap(), Contribution::new(0.0, 0.0));
        assert!(matches!(
            index.contribution(&t, &Token::Integer(1)),
            Err(Error::NonBinary { column: 3, .. })
        ));
    }

    #[test]
    fn test_token_eskin_rescaled() {
        // cardinality 2: 4/6 maps to 0
        let index = TokenEskin::from_statistics(&categorical(&["a", "b"]));
        assert!(index.contribution(&c("a"), &c("b")).unwrap().numerator.abs() < 1e-12);
        assert_eq!(index.contribution(&c("a"), &c("a")).unwrap().numerator, 1.0);
    }

    #[test]
    fn test_frequency_token_indices() {
        let stats = categorical(&["a", "a", "a", "b", "b", "c"]);
        let build = |kind| FrequencyTokenIndex::new(kind, 0, stats.clone()).unwrap();

        let g1 = build(GowerIndexKind::Goodall1);
        assert!((g1.contribution(&c("a"), &c("a")).unwrap().numerator - 22.0 / 30.0).abs() < 1e-12);
        assert_eq!(g1.contribution(&c("a"), &c("b")).unwrap(), Contribution::new(0.0, 1.0));

        let g2 = build(GowerIndexKind::Goodall2);
        assert!((g2.contribution(&c("c"), &c("c")).unwrap().numerator - 22.0 / 30.0).abs() < 1e-12);

        let g3 = build(GowerIndexKind::Goodall3).contribution(&c("b"), &c("b")).unwrap();
        let g4 = build(GowerIndexKind::Goodall4).contribution(&c("b"), &c("b")).unwrap();
        assert!((g3.numerator + g4.numerator - 1.0).abs() < 1e-12);

        let iof = build(GowerIndexKind::InverseOccurrenceFrequency);
        let out = iof.contribution(&c("a"), &c("b")).unwrap();
        assert!((out.numerator - 1.0 / (1.0 + 3f64.ln() * 2f64.ln())).abs() < 1e-12);
        assert_eq!(iof.contribution(&c("c"), &c("c")).unwrap().numerator, 1.0);

        let of = build(GowerIndexKind::OccurrenceFrequency);
        let out = of.contribution(&c("a"), &c("c")).unwrap();
        assert!((out.numerator - 1.0 / (1.0 + 2f64.ln() * 6f64.ln())).abs() < 1e-12);

        assert!(matches!(
            g1.contribution(&c("zzz"), &c("a")),
            Err(Error::UnobservedToken { column: 0, .. })
        ));
        assert!(matches!(
            FrequencyTokenIndex::new(GowerIndexKind::Overlap, 0, stats.clone()),
            Err(Error::UnknownIndex(_))
        ));
    }
}
