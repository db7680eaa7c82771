//! Metric family for continuous data
//!
//! Every metric takes two numeric token vectors, builds the vector of absolute
//! coordinate differences and reduces it. [`NormalizedMetric`] scales each difference
//! by its column range before reducing.

use crate::distance::{check_lengths, DistanceFunction};
use serde::{Deserialize, Serialize};
use tabdist_core::{ColumnStatistics, Error, RecordSource, Result, Token};
use tracing::debug;

/// Reduction of an absolute-difference vector to a single distance
pub trait Metric: Send + Sync {
    fn name(&self) -> &'static str;

    fn reduce(&self, differences: &[f64]) -> f64;
}

/// Built-in metrics, as they appear in configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Euclidean,
    Manhattan,
    Chebyshev,
    /// p-norm with the given exponent
    Minkowski(f64),
}

impl MetricKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Euclidean => "euclidean",
            MetricKind::Manhattan => "manhattan",
            MetricKind::Chebyshev => "chebyshev",
            MetricKind::Minkowski(_) => "minkowski",
        }
    }

    pub fn build(&self) -> Result<Box<dyn Metric>> {
        let metric: Box<dyn Metric> = match *self {
            MetricKind::Euclidean => Box::new(Euclidean),
            MetricKind::Manhattan => Box::new(Manhattan),
            MetricKind::Chebyshev => Box::new(Chebyshev),
            MetricKind::Minkowski(p) => Box::new(Minkowski::new(p)?),
        };
        Ok(metric)
    }
}

/// L2 norm
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    fn name(&self) -> &'static str {
        "euclidean"
    }

    fn reduce(&self, differences: &[f64]) -> f64 {
        differences.iter().map(|d| d * d).sum::<f64>().sqrt()
    }
}

/// L1 norm
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Metric for Manhattan {
    fn name(&self) -> &'static str {
        "manhattan"
    }

    fn reduce(&self, differences: &[f64]) -> f64 {
        differences.iter().sum()
    }
}

/// L-infinity norm
#[derive(Debug, Clone, Copy, Default)]
pub struct Chebyshev;

impl Metric for Chebyshev {
    fn name(&self) -> &'static str {
        "chebyshev"
    }

    fn reduce(&self, differences: &[f64]) -> f64 {
        differences.iter().copied().fold(0.0, f64::max)
    }
}

/// Lp norm for a finite `p >= 1`
#[derive(Debug, Clone, Copy)]
pub struct Minkowski {
    p: f64,
}

impl Minkowski {
    /// Below 1 the triangle inequality no longer holds, so such exponents are rejected
    pub fn new(p: f64) -> Result<Self> {
        if !(p >= 1.0 && p.is_finite()) {
            return Err(Error::InvalidExponent(p));
        }
        Ok(Self { p })
    }

    #[inline]
    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Metric for Minkowski {
    fn name(&self) -> &'static str {
        "minkowski"
    }

    fn reduce(&self, differences: &[f64]) -> f64 {
        differences
            .iter()
            .map(|d| d.powf(self.p))
            .sum::<f64>()
            .powf(1.0 / self.p)
    }
}

/// `|a_i - b_i|` for every column; both tokens must be numeric
pub fn absolute_differences(a: &[Token], b: &[Token]) -> Result<Vec<f64>> {
    check_lengths(a, b)?;
    a.iter()
        .zip(b)
        .enumerate()
        .map(|(column, (x, y))| Ok((numeric(x, column)? - numeric(y, column)?).abs()))
        .collect()
}

#[inline]
fn numeric(token: &Token, column: usize) -> Result<f64> {
    token.as_f64().ok_or(Error::NonNumeric {
        column,
        found: token.token_type(),
    })
}

macro_rules! metric_distance {
    ($($metric:ty),+ $(,)?) => {
        $(
            impl DistanceFunction for $metric {
                fn name(&self) -> &str {
                    Metric::name(self)
                }

                fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
                    Ok(self.reduce(&absolute_differences(a, b)?))
                }
            }
        )+
    };
}

metric_distance!(Euclidean, Manhattan, Chebyshev, Minkowski);

/// Distance function over a boxed metric, as handed out by the registries
pub struct MetricDistance {
    metric: Box<dyn Metric>,
}

impl MetricDistance {
    pub fn new(metric: Box<dyn Metric>) -> Self {
        Self { metric }
    }
}

impl DistanceFunction for MetricDistance {
    fn name(&self) -> &str {
        self.metric.name()
    }

    fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        Ok(self.metric.reduce(&absolute_differences(a, b)?))
    }
}

/// Decorates a metric with per-column range normalisation.
///
/// Ranges come from one full pass; a constant column gets range 1.
pub struct NormalizedMetric {
    metric: Box<dyn Metric>,
    ranges: Vec<f64>,
    name: String,
}

impl NormalizedMetric {
    /// Gather column ranges from `source` and wrap `metric`
    pub fn from_source<S: RecordSource + ?Sized>(metric: Box<dyn Metric>, source: &mut S) -> Result<Self> {
        let stats = ColumnStatistics::collect_all(source)?;
        Ok(Self::from_statistics(metric, &stats))
    }

    pub fn from_statistics(metric: Box<dyn Metric>, stats: &[ColumnStatistics]) -> Self {
        let ranges: Vec<f64> = stats
            .iter()
            .map(|s| match s.range() {
                r if r == 0.0 => 1.0,
                r => r,
            })
            .collect();
        let name = format!("normalized_{}", metric.name());
        debug!(metric = metric.name(), columns = ranges.len(), "built normalized metric");
        Self { metric, ranges, name }
    }

    pub fn ranges(&self) -> &[f64] {
        &self.ranges
    }
}

impl DistanceFunction for NormalizedMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        let mut differences = absolute_differences(a, b)?;
        if differences.len() != self.ranges.len() {
            return Err(Error::InvalidWidth {
                expected: self.ranges.len(),
                actual: differences.len(),
            });
        }
        for (d, range) in differences.iter_mut().zip(&self.ranges) {
            *d /= range;
        }
        Ok(self.metric.reduce(&differences))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabdist_core::MemorySource;

    fn floats(values: &[f64]) -> Vec<Token> {
        values.iter().copied().map(Token::float).collect()
    }

    #[test]
    fn test_basic_metrics() {
        let a = floats(&[0.0, 0.0]);
        let b = floats(&[3.0, -4.0]);
        assert!((Euclidean.distance(&a, &b).unwrap() - 5.0).abs() < 1e-12);
        assert!((Manhattan.distance(&a, &b).unwrap() - 7.0).abs() < 1e-12);
        assert!((Chebyshev.distance(&a, &b).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity_and_symmetry() {
        let a = vec![Token::Integer(3), Token::float(1.5)];
        let b = vec![Token::Integer(-2), Token::float(4.0)];
        let metrics: Vec<Box<dyn DistanceFunction>> = vec![
            Box::new(Euclidean),
            Box::new(Manhattan),
            Box::new(Chebyshev),
            Box::new(Minkowski::new(3.0).unwrap()),
        ];
        for m in &metrics {
            assert_eq!(m.distance(&a, &a).unwrap(), 0.0);
            assert_eq!(m.distance(&a, &b).unwrap(), m.distance(&b, &a).unwrap());
        }
    }

    #[test]
    fn test_minkowski_special_cases() {
        let a = floats(&[1.0, 2.0, 3.0]);
        let b = floats(&[4.0, 0.0, 3.5]);
        let p2 = Minkowski::new(2.0).unwrap().distance(&a, &b).unwrap();
        let p1 = Minkowski::new(1.0).unwrap().distance(&a, &b).unwrap();
        assert!((p2 - Euclidean.distance(&a, &b).unwrap()).abs() < 1e-9);
        assert!((p1 - Manhattan.distance(&a, &b).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_minkowski_rejects_small_exponent() {
        assert!(matches!(Minkowski::new(0.5), Err(Error::InvalidExponent(_))));
        assert!(matches!(Minkowski::new(f64::NAN), Err(Error::InvalidExponent(_))));
        assert!(matches!(
            MetricKind::Minkowski(0.0).build(),
            Err(Error::InvalidExponent(_))
        ));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let a = vec![Token::float(1.0), Token::categorical("x")];
        let b = vec![Token::float(2.0), Token::categorical("y")];
        assert!(matches!(
            Euclidean.distance(&a, &b),
            Err(Error::NonNumeric { column: 1, .. })
        ));
        assert!(matches!(
            Manhattan.distance(&a[..1], &b),
            Err(Error::LengthMismatch { left: 1, right: 2 })
        ));
    }

    #[test]
    fn test_normalized_metric() {
        let mut src = MemorySource::from_rows(vec![
            vec![Token::float(0.0), Token::Integer(100), Token::Integer(7)],
            vec![Token::float(2.0), Token::Integer(300), Token::Integer(7)],
        ])
        .unwrap();
        let metric = NormalizedMetric::from_source(Box::new(Manhattan), &mut src).unwrap();
        assert_eq!(metric.ranges(), &[2.0, 200.0, 1.0]);
        assert_eq!(metric.name(), "normalized_manhattan");

        let a = vec![Token::float(0.0), Token::Integer(100), Token::Integer(7)];
        let b = vec![Token::float(1.0), Token::Integer(300), Token::Integer(7)];
        assert!((metric.distance(&a, &b).unwrap() - 1.5).abs() < 1e-12);
        assert!(matches!(
            metric.distance(&a[..2], &b[..2]),
            Err(Error::InvalidWidth { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_boxed_metric_distance() {
        let metric = MetricDistance::new(MetricKind::Minkowski(1.0).build().unwrap());
        let a = floats(&[1.0, 1.0]);
        let b = floats(&[2.0, 3.0]);
        assert_eq!(metric.name(), "minkowski");
        assert!((metric.distance(&a, &b).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_metric_kind_serde() {
        let kind: MetricKind = serde_json::from_str(r#"{"minkowski": 3.0}"#).unwrap();
        assert_eq!(kind, MetricKind::Minkowski(3.0));
        let kind: MetricKind = serde_json::from_str(r#""chebyshev""#).unwrap();
        assert_eq!(kind.name(), "chebyshev");
    }
}
