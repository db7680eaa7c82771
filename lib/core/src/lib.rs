//! # tabdist Core
//!
//! Core data model for the tabdist distance engine.
//!
//! This crate provides everything below the distance functions:
//!
//! - [`TokenType`] / [`TypeLattice`] - Value types and their generalization lattice
//! - [`Token`] / [`Record`] - Typed attribute values and fixed-width token vectors
//! - [`RecordSource`] - Resettable record streams, with [`MaskedSource`] and
//!   [`SubstitutingSource`] wrappers
//! - [`ColumnStatistics`] - Per-column frequency and range statistics from one pass
//! - [`Substitutor`] - Missing-value substitution strategies
//!
//! ## Example
//!
//! ```rust
//! use tabdist_core::{ColumnStatistics, MemorySource, Token};
//!
//! let mut source = MemorySource::from_rows(vec![
//!     vec![Token::Integer(2), Token::categorical("a")],
//!     vec![Token::Integer(6), Token::categorical("a")],
//!     vec![Token::Absent, Token::categorical("b")],
//! ])
//! .unwrap();
//!
//! let stats = ColumnStatistics::collect_all(&mut source).unwrap();
//! assert_eq!(stats[0].range(), 4.0);
//! assert_eq!(stats[1].occurrence(&Token::categorical("a")), Some(2));
//! ```

pub mod classify;
pub mod error;
pub mod lattice;
pub mod mask;
pub mod record;
pub mod stats;
pub mod substitute;
pub mod token;

pub use classify::{classify, infer_raw_columns, infer_source_columns, ColumnFeatures};
pub use error::{Error, Result};
pub use lattice::{TokenType, TypeLattice, TypeSet};
pub use mask::Mask;
pub use record::{read_all, scan, MaskedSource, MemorySource, Record, RecordSource};
pub use stats::ColumnStatistics;
pub use substitute::{
    ExpectedValueSubstitutor, MostCommonValueSubstitutor, SubstitutingSource, SubstitutionKind,
    Substitutor,
};
pub use token::Token;
