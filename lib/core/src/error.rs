use thiserror::Error;

use crate::lattice::TokenType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No more records in source")]
    NoMoreRecords,

    #[error("Invalid record width: expected {expected}, got {actual}")]
    InvalidWidth { expected: usize, actual: usize },

    #[error("Vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Numeric token expected at column {column}, got {found}")]
    NonNumeric { column: usize, found: TokenType },

    #[error("Binary token expected at column {column}, got {found}")]
    NonBinary { column: usize, found: TokenType },

    #[error("Absent token at column {0}")]
    AbsentToken(usize),

    #[error("Token '{token}' at column {column} was not seen while collecting statistics")]
    UnobservedToken { column: usize, token: String },

    #[error("Column {column} out of range for {width} collected columns")]
    ColumnOutOfRange { column: usize, width: usize },

    #[error("Weight at column {0} is negative")]
    NegativeWeight(usize),

    #[error("Total weight cannot be zero")]
    ZeroTotalWeight,

    #[error("Expected {expected} weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },

    #[error("Minkowski exponent must be at least 1, got {0}")]
    InvalidExponent(f64),

    #[error("Invalid mask: {0}")]
    InvalidMask(String),

    #[error("Invalid type lattice: {0}")]
    InvalidLattice(String),

    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Token type {token_type} is not supported by {what}")]
    UnsupportedTokenType { token_type: TokenType, what: String },

    #[error("Invalid JSON value at column {column}: {reason}")]
    InvalidValue { column: usize, reason: String },
}
