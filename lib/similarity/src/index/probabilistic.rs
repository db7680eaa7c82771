//! Indices built on sample probabilities with their own normalisers

use super::{mean, Frequencies, IndexKind, SimilarityIndex};
use std::f64::consts::LN_2;
use tabdist_core::{Result, Token};

/// Ratio of inverse-probability weighted matches to all weighted columns.
///
/// Each column weighs `2 / (N(N+1))`; a match divides it by `p(x)^2`, a mismatch by
/// `2 p(x) p(y)`. Range [0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct Anderberg {
    freqs: Frequencies,
}

impl Anderberg {
    pub fn new(freqs: Frequencies) -> Self {
        Self { freqs }
    }
}

impl SimilarityIndex for Anderberg {
    fn kind(&self) -> IndexKind {
        IndexKind::Anderberg
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut matched = 0.0;
        let mut mismatched = 0.0;
        for column in self.freqs.columns_of(a, b)? {
            let column = column?;
            let n = column.total() as f64;
            let weight = 2.0 / n / (n + 1.0);
            let px = column.px();
            if column.matched {
                matched += weight / (px * px);
            } else {
                mismatched += weight / (2.0 * px * column.py());
            }
        }
        let total = matched + mismatched;
        Ok(if total == 0.0 { 1.0 } else { matched / total })
    }
}

/// Log-odds weighting of mismatches against the column's `2 Σ ln(1 - p(x))`.
///
/// Range (0, 1]: a mismatch scores `L / (L + ln(p(x) p(y) / ((1 - p(x)) (1 - p(y)))))`
/// with `L < 0`, reaching 1 when `p(x) + p(y) = 1`. The triangle inequality is not
/// guaranteed.
#[derive(Debug, Clone)]
pub struct Burnaby {
    freqs: Frequencies,
    log_sums: Vec<f64>,
}

impl Burnaby {
    pub fn new(freqs: Frequencies) -> Self {
        let log_sums = freqs
            .columns()
            .iter()
            .map(|stats| {
                2.0 * stats
                    .occurrences()
                    .values()
                    .map(|&f| (1.0 - stats.probability(f)).ln())
                    .sum::<f64>()
            })
            .collect();
        Self { freqs, log_sums }
    }
}

impl SimilarityIndex for Burnaby {
    fn kind(&self) -> IndexKind {
        IndexKind::Burnaby
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut sum = 0.0;
        for (column, &log_sum) in self.freqs.columns_of(a, b)?.zip(&self.log_sums) {
            let column = column?;
            if column.matched {
                sum += 1.0;
                continue;
            }
            let (px, py) = (column.px(), column.py());
            // distinct observed values give p(x) + p(y) <= 1, so the log-odds term is <= 0
            // while log_sum < 0: the denominator is strictly negative
            sum += log_sum / (log_sum + (px * py / (1.0 - px) / (1.0 - py)).ln());
        }
        Ok(mean(sum, a.len()))
    }
}

/// Binary entropy of matched values, normalised by the total cardinality of all
/// columns. Not 1 on identical vectors: frequent matches carry little information.
/// Range [0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct Gambaryan {
    freqs: Frequencies,
    denominator: f64,
}

impl Gambaryan {
    pub fn new(freqs: Frequencies) -> Self {
        let denominator = freqs.columns().iter().map(|s| s.cardinality() as f64).sum();
        Self { freqs, denominator }
    }
}

impl SimilarityIndex for Gambaryan {
    fn kind(&self) -> IndexKind {
        IndexKind::Gambaryan
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut sum = 0.0;
        for column in self.freqs.columns_of(a, b)? {
            let column = column?;
            let p = column.px();
            if column.matched && p != 1.0 {
                sum -= (p * p.ln() + (1.0 - p) * (1.0 - p).ln()) / LN_2;
            }
        }
        Ok(if self.denominator == 0.0 {
            1.0
        } else {
            sum / self.denominator
        })
    }
}

/// Information-theoretic ratio of log probabilities.
///
/// A match adds `2 ln p(x)` to both sums; a mismatch adds `2 ln(p(x) + p(y))` to the
/// numerator and `ln p(x) + ln p(y)` to the denominator. A zero denominator, which
/// only happens when every match is on a column's single value, scores 1.
/// Range [0, 1]. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct Lin {
    freqs: Frequencies,
}

impl Lin {
    pub fn new(freqs: Frequencies) -> Self {
        Self { freqs }
    }
}

impl SimilarityIndex for Lin {
    fn kind(&self) -> IndexKind {
        IndexKind::Lin
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for column in self.freqs.columns_of(a, b)? {
            let column = column?;
            let px = column.px();
            if column.matched {
                let summand = 2.0 * px.ln();
                numerator += summand;
                denominator += summand;
            } else {
                let py = column.py();
                numerator += 2.0 * (px + py).ln();
                denominator += px.ln() + py.ln();
            }
        }
        Ok(if denominator == 0.0 {
            1.0
        } else {
            numerator / denominator
        })
    }
}

/// Probabilistic index over the whole frequency distribution of each column.
///
/// Each column's sum is divided by `2N`, and the result is averaged over the columns.
/// Range [0, 1]: a match on a single occurrence next to one value holding the rest of
/// the column reaches `2N`. The triangle inequality is not guaranteed.
#[derive(Debug, Clone)]
pub struct Smirnov {
    freqs: Frequencies,
    /// Per column `Σ f / (N - f)`, skipping a value that fills the column
    odds_sums: Vec<f64>,
}

impl Smirnov {
    pub fn new(freqs: Frequencies) -> Self {
        let odds_sums = freqs
            .columns()
            .iter()
            .map(|stats| {
                stats
                    .occurrences()
                    .values()
                    .map(|&f| odds(f, stats.total()))
                    .sum()
            })
            .collect();
        Self { freqs, odds_sums }
    }
}

/// `f / (N - f)`, 0 when the value fills the column
#[inline]
fn odds(occurrence: u64, total: u64) -> f64 {
    if occurrence == total {
        0.0
    } else {
        occurrence as f64 / (total - occurrence) as f64
    }
}

impl SimilarityIndex for Smirnov {
    fn kind(&self) -> IndexKind {
        IndexKind::Smirnov
    }

    fn similarity(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut sum = 0.0;
        for (column, &odds_sum) in self.freqs.columns_of(a, b)?.zip(&self.odds_sums) {
            let column = column?;
            let total = column.total();
            let numerator = if column.matched {
                if column.fx == total {
                    2.0
                } else {
                    let own = odds(column.fx, total);
                    2.0 + 1.0 / own + odds_sum - own
                }
            } else {
                odds_sum - odds(column.fx, total) - odds(column.fy, total)
            };
            // observed tokens imply total >= 1
            sum += numerator / (2.0 * total as f64);
        }
        Ok(mean(sum, a.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::{frequencies, pair};
    use crate::index::DissimilarityFunction;
    use crate::DistanceFunction;
    use tabdist_core::{ColumnStatistics, MemorySource};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_anderberg() {
        let index = Anderberg::new(frequencies());
        assert!(close(index.similarity(&pair("a", "x"), &pair("a", "x")).unwrap(), 1.0));
        assert_eq!(index.similarity(&pair("a", "x"), &pair("b", "y")).unwrap(), 0.0);

        // column 0 matches on a (p = 1/2), column 1 mismatches x/y (p = 5/6, 1/6)
        let w = 2.0 / 6.0 / 7.0;
        let matched = w / 0.25;
        let mismatched = w / (2.0 * (5.0 / 6.0) * (1.0 / 6.0));
        let s = index.similarity(&pair("a", "x"), &pair("a", "y")).unwrap();
        assert!(close(s, matched / (matched + mismatched)));
    }

    #[test]
    fn test_burnaby() {
        let index = Burnaby::new(frequencies());
        let log_sum = 2.0 * ((0.5f64).ln() + (2.0f64 / 3.0).ln() + (5.0f64 / 6.0).ln());
        let (pa, pb) = (0.5f64, 1.0f64 / 3.0);
        let mismatch = log_sum / (log_sum + (pa * pb / (1.0 - pa) / (1.0 - pb)).ln());
        let s = index.similarity(&pair("a", "x"), &pair("b", "x")).unwrap();
        assert!(close(s, (mismatch + 1.0) / 2.0));
        assert_eq!(index.similarity(&pair("c", "y"), &pair("c", "y")).unwrap(), 1.0);
    }

    #[test]
    fn test_burnaby_two_value_column_mismatch() {
        // p(a) + p(b) = 1 zeroes the log-odds term, leaving L / L
        let mut src = MemorySource::from_rows(vec![
            vec![Token::categorical("a")],
            vec![Token::categorical("a")],
            vec![Token::categorical("b")],
        ])
        .unwrap();
        let index = Burnaby::new(Frequencies::collect(&mut src).unwrap());
        let s = index
            .similarity(&[Token::categorical("a")], &[Token::categorical("b")])
            .unwrap();
        assert!(close(s, 1.0));
    }

    #[test]
    fn test_burnaby_mismatches_stay_in_unit_range() {
        let values = ["a", "b", "c", "d", "d", "d", "d"];
        let mut src = MemorySource::from_rows(
            values.iter().map(|v| vec![Token::categorical(*v)]).collect(),
        )
        .unwrap();
        let index = Burnaby::new(Frequencies::collect(&mut src).unwrap());
        for x in ["a", "b", "c", "d"] {
            for y in ["a", "b", "c", "d"] {
                let s = index
                    .similarity(&[Token::categorical(x)], &[Token::categorical(y)])
                    .unwrap();
                assert!(s.is_finite() && s > 0.0 && s <= 1.0 + 1e-12, "{} {} -> {}", x, y, s);
            }
        }
    }

    #[test]
    fn test_gambaryan() {
        let index = Gambaryan::new(frequencies());
        // p(a) = 1/2 has one bit of entropy; total cardinality is 3 + 2
        let s = index.similarity(&pair("a", "x"), &pair("a", "y")).unwrap();
        assert!(close(s, 1.0 / 5.0));
        assert_eq!(index.similarity(&pair("a", "x"), &pair("b", "y")).unwrap(), 0.0);
    }

    #[test]
    fn test_gambaryan_constant_column() {
        let mut src = MemorySource::from_rows(vec![
            vec![Token::categorical("k")],
            vec![Token::categorical("k")],
        ])
        .unwrap();
        let index = Gambaryan::new(Frequencies::collect(&mut src).unwrap());
        let v = vec![Token::categorical("k")];
        assert_eq!(index.similarity(&v, &v).unwrap(), 0.0);
    }

    #[test]
    fn test_lin() {
        let index = Lin::new(frequencies());
        assert!(close(index.similarity(&pair("b", "y"), &pair("b", "y")).unwrap(), 1.0));

        let (pa, pc) = (0.5f64, 1.0f64 / 6.0);
        let px = 5.0f64 / 6.0;
        let numerator = 2.0 * (pa + pc).ln() + 2.0 * px.ln();
        let denominator = pa.ln() + pc.ln() + 2.0 * px.ln();
        let s = index.similarity(&pair("a", "x"), &pair("c", "x")).unwrap();
        assert!(close(s, numerator / denominator));
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn test_lin_single_value_columns() {
        let stats = {
            let mut s = ColumnStatistics::new();
            s.observe(&Token::categorical("k"));
            s
        };
        let index = Lin::new(Frequencies::new(vec![stats]));
        let v = vec![Token::categorical("k")];
        assert_eq!(index.similarity(&v, &v).unwrap(), 1.0);
    }

    #[test]
    fn test_smirnov() {
        let index = Smirnov::new(frequencies());
        // column 0 odds: 3/3 + 2/4 + 1/5, column 1 odds: 5/1 + 1/5; both columns have N = 6
        let sums = [1.7, 5.2];
        let scale = 2.0 * 6.0;

        let s = index.similarity(&pair("a", "x"), &pair("a", "x")).unwrap();
        let expected = (2.0 + 1.0 + sums[0] - 1.0) / scale + (2.0 + 0.2 + sums[1] - 5.0) / scale;
        assert!(close(s, expected / 2.0));

        let s = index.similarity(&pair("a", "x"), &pair("c", "x")).unwrap();
        let expected = (sums[0] - 1.0 - 0.2) / scale + (2.0 + 0.2 + sums[1] - 5.0) / scale;
        assert!(close(s, expected / 2.0));

        // a single y beside five x reaches the upper bound
        let s = index.similarity(&pair("c", "y"), &pair("c", "y")).unwrap();
        let expected = (2.0 + 5.0 + sums[0] - 0.2) / scale + 1.0;
        assert!(close(s, expected / 2.0));
    }

    #[test]
    fn test_smirnov_skewed_column_stays_in_unit_range() {
        let mut src = MemorySource::from_rows(vec![
            vec![Token::categorical("a")],
            vec![Token::categorical("a")],
            vec![Token::categorical("b")],
        ])
        .unwrap();
        let index = Smirnov::new(Frequencies::collect(&mut src).unwrap());
        let (a, b) = (vec![Token::categorical("a")], vec![Token::categorical("b")]);

        // odds: a = 2/1, b = 1/2; a match on a scores (2 + 1/2 + 5/2 - 2) / 6
        assert!(close(index.similarity(&a, &a).unwrap(), 0.5));
        assert!(close(index.similarity(&b, &b).unwrap(), 1.0));
        assert!(close(index.similarity(&a, &b).unwrap(), 0.0));

        let distance = DissimilarityFunction::new(Box::new(index));
        for (u, v) in [(&a, &a), (&a, &b), (&b, &b)] {
            let d = distance.distance(u, v).unwrap();
            assert!((-1e-12..=1.0 + 1e-12).contains(&d), "distance {}", d);
        }
    }
}
