//! # tabdist
//!
//! Pairwise dissimilarity for heterogeneous tabular records.
//!
//! tabdist compares records whose columns mix integers, floats, booleans and
//! categorical strings, some of them missing. It infers column types, fills missing
//! values, and computes distances with metrics, frequency-aware categorical
//! similarity indices, or a weighted Gower composite.
//!
//! ## Quick Start
//!
//! ### From the Command Line
//!
//! ```bash
//! tabdist --records rows.json --schema schema.json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use tabdist::prelude::*;
//!
//! let schema = DistanceSchema::from_json(r#"{
//!     "engine": {"kind": "gower"},
//!     "columns": [
//!         {"title": "age", "type": "integer", "substitution": "expected_value"},
//!         {"title": "city", "type": "categorical_string", "index": "goodall3"}
//!     ]
//! }"#).unwrap();
//!
//! let source = schema
//!     .records_from_json(r#"[[31, "Oslo"], [null, "Rome"], [45, "Oslo"]]"#)
//!     .unwrap();
//! let mut engine = Engine::build(&schema, source, &Registries::standard()).unwrap();
//! let matrix = engine.pairwise().unwrap();
//! assert_eq!(matrix.len(), 3);
//! ```
//!
//! ## Crate Structure
//!
//! tabdist is composed of several crates:
//!
//! - [`tabdist-core`](https://docs.rs/tabdist-core) - Tokens, type lattice, record sources, statistics, substitution
//! - [`tabdist-similarity`](https://docs.rs/tabdist-similarity) - Metrics, similarity indices, Gower distance, registries
//! - [`tabdist-schema`](https://docs.rs/tabdist-schema) - Declarative engine configuration and building
//!
//! ## Features
//!
//! - **Type inference**: classify raw cells and infer column types over a lattice
//! - **Substitution**: expected value and most common value fill-ins
//! - **Metrics**: Euclidean, Manhattan, Chebyshev, Minkowski, range-normalized
//! - **Categorical indices**: Overlap, Goodall 1-4, Eskin, Anderberg, Burnaby,
//!   Gambaryan, IOF, OF, Lin, Smirnov
//! - **Gower distance**: weighted per-column composite tolerant of missing values

// Re-export core types
pub use tabdist_core::{
    infer_raw_columns, infer_source_columns, ColumnFeatures, ColumnStatistics, Error, Mask,
    MaskedSource, MemorySource, Record, RecordSource, Result, SubstitutingSource,
    SubstitutionKind, Token, TokenType, TypeLattice,
};

// Re-export similarity
pub use tabdist_similarity::{
    pairwise_distances, DissimilarityFunction, DistanceFunction, Frequencies, GowerDistance,
    GowerIndexKind, IndexKind, MaskedDistance, MetricKind, NormalizedMetric, Registries,
};

// Re-export schema
pub use tabdist_schema::{ColumnConfig, DistanceSchema, Engine, EngineConfig, SchemaError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ColumnConfig, ColumnStatistics, DistanceFunction, DistanceSchema, Engine, EngineConfig,
        Error, GowerIndexKind, IndexKind, Mask, MemorySource, MetricKind, Record, RecordSource,
        Registries, Result, SchemaError, SubstitutionKind, Token, TokenType,
    };
}
