//! Categorical similarity indices
//!
//! An index scores agreement between two categorical token vectors using per-column
//! frequency statistics captured at construction. Scores are folded column by column
//! and averaged, except where an index defines its own normaliser.
//!
//! Every index rejects `Absent` tokens and values that were not observed while the
//! statistics were gathered. Two zero-width vectors are fully similar.

mod frequency;
mod goodall;
mod probabilistic;

pub use frequency::{Eskin, InverseOccurrenceFrequency, OccurrenceFrequency, Overlap};
pub use goodall::{Goodall1, Goodall2, Goodall3, Goodall4};
pub use probabilistic::{Anderberg, Burnaby, Gambaryan, Lin, Smirnov};

pub(crate) use frequency::{eskin_mismatch, iof_mismatch, of_mismatch};
pub(crate) use goodall::{Tail, TailSums};

use crate::distance::{check_lengths, DistanceFunction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tabdist_core::{ColumnStatistics, Error, RecordSource, Result, Token};

/// Similarity between two categorical token vectors
pub trait SimilarityIndex: Send + Sync {
    fn kind(&self) -> IndexKind;

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64>;
}

/// Built-in similarity indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Overlap,
    Goodall1,
    Goodall2,
    Goodall3,
    Goodall4,
    Eskin,
    Anderberg,
    Burnaby,
    Gambaryan,
    InverseOccurrenceFrequency,
    OccurrenceFrequency,
    Lin,
    Smirnov,
}

impl IndexKind {
    pub const ALL: [IndexKind; 13] = [
        IndexKind::Overlap,
        IndexKind::Goodall1,
        IndexKind::Goodall2,
        IndexKind::Goodall3,
        IndexKind::Goodall4,
        IndexKind::Eskin,
        IndexKind::Anderberg,
        IndexKind::Burnaby,
        IndexKind::Gambaryan,
        IndexKind::InverseOccurrenceFrequency,
        IndexKind::OccurrenceFrequency,
        IndexKind::Lin,
        IndexKind::Smirnov,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndexKind::Overlap => "overlap",
            IndexKind::Goodall1 => "goodall1",
            IndexKind::Goodall2 => "goodall2",
            IndexKind::Goodall3 => "goodall3",
            IndexKind::Goodall4 => "goodall4",
            IndexKind::Eskin => "eskin",
            IndexKind::Anderberg => "anderberg",
            IndexKind::Burnaby => "burnaby",
            IndexKind::Gambaryan => "gambaryan",
            IndexKind::InverseOccurrenceFrequency => "inverse_occurrence_frequency",
            IndexKind::OccurrenceFrequency => "occurrence_frequency",
            IndexKind::Lin => "lin",
            IndexKind::Smirnov => "smirnov",
        }
    }

    /// Construct the index over the given statistics
    pub fn build(self, freqs: Frequencies) -> Box<dyn SimilarityIndex> {
        match self {
            IndexKind::Overlap => Box::new(Overlap::new(freqs)),
            IndexKind::Goodall1 => Box::new(Goodall1::new(freqs)),
            IndexKind::Goodall2 => Box::new(Goodall2::new(freqs)),
            IndexKind::Goodall3 => Box::new(Goodall3::new(freqs)),
            IndexKind::Goodall4 => Box::new(Goodall4::new(freqs)),
            IndexKind::Eskin => Box::new(Eskin::new(freqs)),
            IndexKind::Anderberg => Box::new(Anderberg::new(freqs)),
            IndexKind::Burnaby => Box::new(Burnaby::new(freqs)),
            IndexKind::Gambaryan => Box::new(Gambaryan::new(freqs)),
            IndexKind::InverseOccurrenceFrequency => Box::new(InverseOccurrenceFrequency::new(freqs)),
            IndexKind::OccurrenceFrequency => Box::new(OccurrenceFrequency::new(freqs)),
            IndexKind::Lin => Box::new(Lin::new(freqs)),
            IndexKind::Smirnov => Box::new(Smirnov::new(freqs)),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-column occurrence statistics shared by an index and its clones
#[derive(Debug, Clone)]
pub struct Frequencies {
    columns: Arc<Vec<ColumnStatistics>>,
}

impl Frequencies {
    pub fn new(columns: Vec<ColumnStatistics>) -> Self {
        Self {
            columns: Arc::new(columns),
        }
    }

    /// Gather statistics for every column with one full pass
    pub fn collect<S: RecordSource + ?Sized>(source: &mut S) -> Result<Self> {
        Ok(Self::new(ColumnStatistics::collect_all(source)?))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnStatistics] {
        &self.columns
    }

    /// Check widths and reject `Absent` tokens
    pub(crate) fn check_pair(&self, a: &[Token], b: &[Token]) -> Result<()> {
        check_lengths(a, b)?;
        if a.len() != self.width() {
            return Err(Error::InvalidWidth {
                expected: self.width(),
                actual: a.len(),
            });
        }
        match a.iter().zip(b).position(|(x, y)| x.is_absent() || y.is_absent()) {
            Some(column) => Err(Error::AbsentToken(column)),
            None => Ok(()),
        }
    }

    /// Validate a pair and walk it column by column with the occurrence counts of
    /// both tokens looked up
    pub(crate) fn columns_of<'a>(
        &'a self,
        a: &'a [Token],
        b: &'a [Token],
    ) -> Result<impl Iterator<Item = Result<Column<'a>>> + 'a> {
        self.check_pair(a, b)?;
        Ok(a.iter()
            .zip(b)
            .zip(self.columns.iter())
            .enumerate()
            .map(|(index, ((x, y), stats))| -> Result<Column<'a>> {
                Ok(Column {
                    matched: x == y,
                    fx: occurrence(stats, index, x)?,
                    fy: occurrence(stats, index, y)?,
                    stats,
                })
            }))
    }
}

/// One column of a validated pair
pub(crate) struct Column<'a> {
    pub matched: bool,
    /// Occurrence count of the left token
    pub fx: u64,
    /// Occurrence count of the right token
    pub fy: u64,
    pub stats: &'a ColumnStatistics,
}

impl Column<'_> {
    #[inline]
    pub fn px(&self) -> f64 {
        self.stats.probability(self.fx)
    }

    #[inline]
    pub fn py(&self) -> f64 {
        self.stats.probability(self.fy)
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.stats.total()
    }
}

pub(crate) fn occurrence(stats: &ColumnStatistics, column: usize, token: &Token) -> Result<u64> {
    if token.is_absent() {
        return Err(Error::AbsentToken(column));
    }
    stats.occurrence(token).ok_or_else(|| Error::UnobservedToken {
        column,
        token: token.to_string(),
    })
}

/// Average of per-column scores; 1 for zero width
#[inline]
pub(crate) fn mean(sum: f64, width: usize) -> f64 {
    if width == 0 {
        1.0
    } else {
        sum / width as f64
    }
}

/// Distance `1 - similarity` over a similarity index.
///
/// Takes the wrapped index's range, flipped. Only Overlap yields a true metric; for the
/// other indices the triangle inequality is not guaranteed.
pub struct DissimilarityFunction {
    index: Box<dyn SimilarityIndex>,
}

impl DissimilarityFunction {
    pub fn new(index: Box<dyn SimilarityIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &dyn SimilarityIndex {
        self.index.as_ref()
    }
}

impl DistanceFunction for DissimilarityFunction {
    fn name(&self) -> &str {
        self.index.kind().name()
    }

    fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        Ok(1.0 - self.index.similarity(a, b)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tabdist_core::MemorySource;

    /// Two categorical columns:
    /// column 0 is a:3 b:2 c:1 (N = 6), column 1 is x:5 y:1 (N = 6)
    pub(crate) fn frequencies() -> Frequencies {
        let rows = [
            ("a", "x"),
            ("a", "x"),
            ("a", "x"),
            ("b", "x"),
            ("b", "x"),
            ("c", "y"),
        ]
        .iter()
        .map(|(p, q)| vec![Token::categorical(*p), Token::categorical(*q)])
        .collect();
        let mut src = MemorySource::new(2, rows).unwrap();
        Frequencies::collect(&mut src).unwrap()
    }

    pub(crate) fn pair(p: &str, q: &str) -> Vec<Token> {
        vec![Token::categorical(p), Token::categorical(q)]
    }

    #[test]
    fn test_every_index_identity_is_bounded() {
        let freqs = frequencies();
        for kind in IndexKind::ALL {
            let index = kind.build(freqs.clone());
            assert_eq!(index.kind(), kind);
            for v in [pair("a", "x"), pair("c", "y"), pair("b", "x")] {
                let s = index.similarity(&v, &v).unwrap();
                assert!(s.is_finite(), "{} produced {}", kind, s);
                assert!((-1e-12..=1.0 + 1e-12).contains(&s), "{} produced {}", kind, s);
            }
        }
    }

    #[test]
    fn test_every_dissimilarity_bounded_on_skewed_column() {
        let rows = ["a", "a", "b"].iter().map(|v| vec![Token::categorical(*v)]).collect();
        let mut src = MemorySource::new(1, rows).unwrap();
        let freqs = Frequencies::collect(&mut src).unwrap();
        let values = [vec![Token::categorical("a")], vec![Token::categorical("b")]];
        for kind in IndexKind::ALL {
            let distance = DissimilarityFunction::new(kind.build(freqs.clone()));
            for u in &values {
                for v in &values {
                    let d = distance.distance(u, v).unwrap();
                    assert!(d.is_finite(), "{} produced {}", kind, d);
                    assert!((-1e-12..=1.0 + 1e-12).contains(&d), "{} produced {}", kind, d);
                }
            }
        }
    }

    #[test]
    fn test_every_index_symmetric() {
        let freqs = frequencies();
        let a = pair("a", "x");
        let b = pair("c", "x");
        let c = pair("b", "y");
        for kind in IndexKind::ALL {
            let index = kind.build(freqs.clone());
            for (u, v) in [(&a, &b), (&a, &c), (&b, &c)] {
                let uv = index.similarity(u, v).unwrap();
                let vu = index.similarity(v, u).unwrap();
                assert!((uv - vu).abs() < 1e-12, "{} is not symmetric", kind);
            }
        }
    }

    #[test]
    fn test_zero_width_is_fully_similar() {
        let freqs = Frequencies::new(Vec::new());
        for kind in IndexKind::ALL {
            assert_eq!(kind.build(freqs.clone()).similarity(&[], &[]).unwrap(), 1.0);
        }
    }

    #[test]
    fn test_absent_and_unobserved_tokens_rejected() {
        let freqs = frequencies();
        let absent = vec![Token::categorical("a"), Token::Absent];
        let unseen = pair("zzz", "x");
        for kind in IndexKind::ALL {
            let index = kind.build(freqs.clone());
            assert!(matches!(
                index.similarity(&absent, &pair("a", "x")),
                Err(Error::AbsentToken(1))
            ));
            if kind != IndexKind::Overlap && kind != IndexKind::Eskin {
                assert!(matches!(
                    index.similarity(&unseen, &pair("a", "x")),
                    Err(Error::UnobservedToken { column: 0, .. })
                ));
            }
        }
    }

    #[test]
    fn test_width_checks() {
        let index = IndexKind::Overlap.build(frequencies());
        let short = vec![Token::categorical("a")];
        assert!(matches!(
            index.similarity(&short, &pair("a", "x")),
            Err(Error::LengthMismatch { left: 1, right: 2 })
        ));
        assert!(matches!(
            index.similarity(&short, &short),
            Err(Error::InvalidWidth { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_dissimilarity_function() {
        let distance = DissimilarityFunction::new(IndexKind::Overlap.build(frequencies()));
        assert_eq!(distance.name(), "overlap");
        assert_eq!(distance.distance(&pair("a", "x"), &pair("a", "y")).unwrap(), 0.5);
        assert_eq!(distance.distance(&pair("a", "x"), &pair("a", "x")).unwrap(), 0.0);
    }

    #[test]
    fn test_index_kind_serde() {
        let kind: IndexKind = serde_json::from_str(r#""inverse_occurrence_frequency""#).unwrap();
        assert_eq!(kind, IndexKind::InverseOccurrenceFrequency);
        for kind in IndexKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }
}
