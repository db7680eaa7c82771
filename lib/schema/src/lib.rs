//! # tabdist Schema
//!
//! Declarative configuration for tabular distance engines.
//!
//! ## Overview
//!
//! A [`DistanceSchema`] lists every column of the records with its token type, whether
//! it takes part in the comparison, how its missing values are filled, and (for Gower)
//! its weight and per-column index. [`Engine::build`] checks the schema against a set of
//! [`Registries`](tabdist_similarity::Registries), gathers the statistics it needs from
//! the record source, and hands back a ready distance function.
//!
//! ## Schema Definition
//!
//! ```rust
//! use tabdist_core::{MemorySource, SubstitutionKind, Token};
//! use tabdist_schema::{ColumnConfig, DistanceSchema, Engine, EngineConfig};
//! use tabdist_similarity::Registries;
//!
//! let schema = DistanceSchema::new(
//!     vec![
//!         ColumnConfig::float(0.7).with_title("price"),
//!         ColumnConfig::categorical(0.3)
//!             .with_title("category")
//!             .with_substitution(SubstitutionKind::MostCommonValue),
//!     ],
//!     EngineConfig::Gower,
//! );
//!
//! let source = MemorySource::from_rows(vec![
//!     vec![Token::float(10.0), Token::categorical("book")],
//!     vec![Token::float(30.0), Token::Absent],
//! ])
//! .unwrap();
//!
//! let mut engine = Engine::build(&schema, source, &Registries::standard()).unwrap();
//! let matrix = engine.pairwise().unwrap();
//! assert!((matrix[0][1] - 0.7).abs() < 1e-12);
//! ```
//!
//! ## Build Flow
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   Source    │────>│ Substitution │────>│    Mask     │
//! │  (records)  │     │ (fill nulls) │     │ (in_use)    │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                                                 │
//!                                          ┌──────┴──────┐
//!                                          │  Distance   │
//!                                          │   engine    │
//!                                          └─────────────┘
//! ```

pub mod build;
pub mod records;
pub mod schema;

// Re-export main types
pub use build::Engine;
pub use schema::{ColumnConfig, DistanceSchema, EngineConfig, SchemaError};
