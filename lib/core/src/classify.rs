//! Column type inference
//!
//! Raw cells are classified one by one and each column's type is the fold of its
//! cell types under the lattice's closest common ancestor. Empty cells only mark the
//! column as having omissions.

use crate::lattice::{TokenType, TypeLattice};
use crate::record::{scan, RecordSource};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Inferred properties of one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFeatures {
    /// `None` until a non-missing cell is seen
    pub token_type: Option<TokenType>,
    pub has_omissions: bool,
}

impl ColumnFeatures {
    /// Fold one observed cell type into the column
    pub fn observe(&mut self, observed: TokenType, lattice: &TypeLattice) {
        if observed == TokenType::Missing {
            self.has_omissions = true;
            return;
        }
        self.token_type = Some(match self.token_type {
            Some(current) => lattice.closest_common_ancestor(current, observed),
            None => observed,
        });
    }

    /// Resolved type, `Missing` for a column with no values
    pub fn resolved_type(&self) -> TokenType {
        self.token_type.unwrap_or(TokenType::Missing)
    }
}

/// Primitive classifier for a raw text cell; `None` is a missing cell
pub fn classify(raw: Option<&str>) -> TokenType {
    let Some(s) = raw else {
        return TokenType::Missing;
    };
    if s == "0" || s == "1" {
        TokenType::BinaryDigital
    } else if is_integer(s) {
        TokenType::Integer
    } else if is_decimal(s) {
        TokenType::Float
    } else if matches!(s, "t" | "f" | "true" | "false" | "T" | "F" | "True" | "False") {
        TokenType::Binary
    } else {
        TokenType::CategoricalString
    }
}

fn strip_sign(s: &str) -> &str {
    s.strip_prefix(['+', '-']).unwrap_or(s)
}

fn is_integer(s: &str) -> bool {
    let digits = strip_sign(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Optional sign, digits with at most one decimal point, at least one digit
fn is_decimal(s: &str) -> bool {
    let body = strip_sign(s);
    let mut digits = 0usize;
    let mut dots = 0usize;
    for b in body.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// Infer column features from raw text rows.
///
/// The width is the longest row; shorter rows count as omissions in the missing tail.
pub fn infer_raw_columns<R, C>(rows: &[R]) -> Vec<ColumnFeatures>
where
    R: AsRef<[Option<C>]>,
    C: AsRef<str>,
{
    let lattice = TypeLattice::standard();
    let width = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
    let mut features = vec![ColumnFeatures::default(); width];
    for row in rows {
        let cells = row.as_ref();
        for (i, column) in features.iter_mut().enumerate() {
            let cell: Option<&str> = cells.get(i).and_then(Option::as_ref).map(|c| c.as_ref());
            column.observe(classify(cell), lattice);
        }
    }
    features
}

/// Infer column features from the tokens of a typed source with one full pass
pub fn infer_source_columns<S: RecordSource + ?Sized>(source: &mut S) -> Result<Vec<ColumnFeatures>> {
    let lattice = TypeLattice::standard();
    let mut features = vec![ColumnFeatures::default(); source.width()];
    scan(source, |record| {
        for (column, token) in features.iter_mut().zip(&record.tokens) {
            column.observe(token.token_type(), lattice);
        }
        Ok(())
    })?;
    Ok(features)
}
