//! # tabdist Similarity
//!
//! Distance engines for heterogeneous tabular records.
//!
//! This crate turns token vectors from `tabdist-core` into distances:
//!
//! ## Features
//!
//! - **Metrics**: Euclidean, Manhattan, Chebyshev and Minkowski over numeric columns,
//!   optionally range-normalised per column
//! - **Similarity indices**: thirteen frequency-aware categorical indices (Overlap,
//!   Goodall 1-4, Eskin, Anderberg, Burnaby, Gambaryan, IOF, OF, Lin, Smirnov)
//! - **Gower distance**: a weighted composite of independently typed per-column indices
//! - **Registries**: kind-to-constructor tables, so callers choose which engines exist
//!
//! ## Example
//!
//! ```rust
//! use tabdist_core::{MemorySource, Token};
//! use tabdist_similarity::{DistanceFunction, DissimilarityFunction, Frequencies, IndexKind};
//!
//! let mut source = MemorySource::from_rows(vec![
//!     vec![Token::categorical("x")],
//!     vec![Token::categorical("x")],
//!     vec![Token::categorical("y")],
//! ])
//! .unwrap();
//!
//! let freqs = Frequencies::collect(&mut source).unwrap();
//! let distance = DissimilarityFunction::new(IndexKind::Overlap.build(freqs));
//! let x = vec![Token::categorical("x")];
//! let y = vec![Token::categorical("y")];
//! assert_eq!(distance.distance(&x, &y).unwrap(), 1.0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │   Record    │────>│  Statistics │────>│  Registries      │
//! │   Source    │     │  (one pass) │     │ (kind → engine)  │
//! └─────────────┘     └─────────────┘     └──────────────────┘
//!                                                  │
//!                                         ┌──────────────────┐
//!                                         │ DistanceFunction │
//!                                         │ (pure, parallel) │
//!                                         └──────────────────┘
//! ```

pub mod distance;
pub mod gower;
pub mod index;
pub mod metric;
pub mod registry;

// Re-export main types for convenience
pub use distance::{pairwise_distances, DistanceFunction, MaskedDistance};
pub use gower::{normalize_weights, Contribution, GowerDistance, GowerIndexKind, TokenSimilarity};
pub use index::{DissimilarityFunction, Frequencies, IndexKind, SimilarityIndex};
pub use metric::{
    absolute_differences, Chebyshev, Euclidean, Manhattan, Metric, MetricDistance, MetricKind, Minkowski,
    NormalizedMetric,
};
pub use registry::Registries;
