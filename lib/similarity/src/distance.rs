//! Distance functions over token vectors
//!
//! Every engine in this crate is exposed through [`DistanceFunction`]. Construction
//! gathers whatever statistics the engine needs; evaluation is pure and may run from
//! many threads at once.

use rayon::prelude::*;
use tabdist_core::{Error, Mask, Result, Token};
use tracing::debug;

/// Distance between two equal-length token vectors
pub trait DistanceFunction: Send + Sync {
    /// Short identifier used in logs and schemas
    fn name(&self) -> &str;

    fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64>;

    /// Project both vectors through `mask` and delegate to [`distance`](Self::distance)
    fn distance_masked(&self, a: &[Token], b: &[Token], mask: &Mask) -> Result<f64> {
        let a = mask.project(a)?;
        let b = mask.project(b)?;
        self.distance(&a, &b)
    }
}

impl<D: DistanceFunction + ?Sized> DistanceFunction for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        (**self).distance(a, b)
    }

    fn distance_masked(&self, a: &[Token], b: &[Token], mask: &Mask) -> Result<f64> {
        (**self).distance_masked(a, b, mask)
    }
}

/// A distance function bound to a fixed column mask.
///
/// Takes full-width vectors and hands the masked projection to the wrapped function,
/// which was built on statistics of the masked columns only.
pub struct MaskedDistance<D> {
    inner: D,
    mask: Mask,
}

impl<D: DistanceFunction> MaskedDistance<D> {
    pub fn new(inner: D, mask: Mask) -> Self {
        Self { inner, mask }
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: DistanceFunction> DistanceFunction for MaskedDistance<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
        self.inner.distance_masked(a, b, &self.mask)
    }
}

/// Fail unless both vectors have the same length
#[inline]
pub(crate) fn check_lengths(a: &[Token], b: &[Token]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Symmetric matrix of distances between every pair of `rows`.
///
/// The upper triangle (diagonal included) is evaluated in parallel and mirrored. The
/// first failing pair aborts the whole computation.
pub fn pairwise_distances<D, R>(distance: &D, rows: &[R]) -> Result<Vec<Vec<f64>>>
where
    D: DistanceFunction + ?Sized,
    R: AsRef<[Token]> + Sync,
{
    let n = rows.len();
    let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect();

    let values: Vec<((usize, usize), f64)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            distance
                .distance(rows[i].as_ref(), rows[j].as_ref())
                .map(|d| ((i, j), d))
        })
        .collect::<Result<_>>()?;

    let mut matrix = vec![vec![0.0; n]; n];
    for ((i, j), d) in values {
        matrix[i][j] = d;
        matrix[j][i] = d;
    }
    debug!(rows = n, engine = distance.name(), "computed pairwise distances");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts differing positions
    struct Hamming;

    impl DistanceFunction for Hamming {
        fn name(&self) -> &str {
            "hamming"
        }

        fn distance(&self, a: &[Token], b: &[Token]) -> Result<f64> {
            check_lengths(a, b)?;
            Ok(a.iter().zip(b).filter(|(x, y)| x != y).count() as f64)
        }
    }

    fn rows() -> Vec<Vec<Token>> {
        vec![
            vec![Token::Integer(1), Token::categorical("a")],
            vec![Token::Integer(1), Token::categorical("b")],
            vec![Token::Integer(2), Token::categorical("b")],
        ]
    }

    #[test]
    fn test_distance_masked_projects() {
        let rows = rows();
        let mask = Mask::new(vec![0], 2).unwrap();
        assert_eq!(Hamming.distance(&rows[0], &rows[1]).unwrap(), 1.0);
        assert_eq!(Hamming.distance_masked(&rows[0], &rows[1], &mask).unwrap(), 0.0);
    }

    #[test]
    fn test_masked_distance_wrapper() {
        let rows = rows();
        let masked = MaskedDistance::new(Hamming, Mask::new(vec![1], 2).unwrap());
        assert_eq!(masked.distance(&rows[1], &rows[2]).unwrap(), 0.0);
        assert_eq!(masked.name(), "hamming");
        assert!(matches!(
            masked.distance(&rows[0][..1], &rows[1]),
            Err(Error::InvalidWidth { .. })
        ));
    }

    #[test]
    fn test_pairwise_distances_symmetric() {
        let matrix = pairwise_distances(&Hamming, &rows()).unwrap();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[0][2], 2.0);
        assert_eq!(matrix[2][0], 2.0);
        assert_eq!(matrix[1][1], 0.0);
    }

    #[test]
    fn test_pairwise_distances_propagates_errors() {
        let ragged = vec![vec![Token::Integer(1)], vec![Token::Integer(1), Token::Integer(2)]];
        assert!(matches!(
            pairwise_distances(&Hamming, &ragged),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_pairwise_distances_boxed_and_empty() {
        let boxed: Box<dyn DistanceFunction> = Box::new(Hamming);
        let empty: Vec<Vec<Token>> = Vec::new();
        assert!(pairwise_distances(&boxed, &empty).unwrap().is_empty());
    }
}
