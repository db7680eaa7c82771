//! Column masks
//!
//! A mask is a strictly increasing list of column indices into a record. Projecting a
//! token vector through a mask drops the excluded columns so that statistics and
//! distance functions never see them.

use crate::{Error, Result, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    indices: Vec<usize>,
    width: usize,
}

impl Mask {
    /// Create a mask over records of `width` columns
    pub fn new(indices: Vec<usize>, width: usize) -> Result<Self> {
        if let Some(&last) = indices.last() {
            if last >= width {
                return Err(Error::InvalidMask(format!(
                    "index {} out of bounds for record width {}",
                    last, width
                )));
            }
        }
        if indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidMask(
                "indices must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { indices, width })
    }

    /// Mask keeping every column
    pub fn identity(width: usize) -> Self {
        Self {
            indices: (0..width).collect(),
            width,
        }
    }

    /// Mask keeping the columns whose flag is set
    pub fn from_flags(flags: &[bool]) -> Self {
        Self {
            indices: flags
                .iter()
                .enumerate()
                .filter_map(|(i, &keep)| keep.then_some(i))
                .collect(),
            width: flags.len(),
        }
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Width of the records this mask applies to
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of kept columns
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.indices.len() == self.width
    }

    /// Re-index a token vector, keeping only masked columns
    pub fn project(&self, tokens: &[Token]) -> Result<Vec<Token>> {
        if tokens.len() != self.width {
            return Err(Error::InvalidWidth {
                expected: self.width,
                actual: tokens.len(),
            });
        }
        Ok(self.indices.iter().map(|&i| tokens[i].clone()).collect())
    }
}
