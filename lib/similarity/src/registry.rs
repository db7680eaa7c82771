//! Registries of available engines
//!
//! A registry maps a kind to the closure that constructs it. Registries are plain
//! values handed to whoever builds engines, so a caller (or a test) can work with a
//! reduced set. [`Registries::standard`] holds every built-in.

use crate::gower::{GowerIndexKind, TokenSimilarity};
use crate::index::{Frequencies, IndexKind, SimilarityIndex};
use crate::metric::{Metric, MetricKind};
use ahash::AHashMap;
use std::sync::Arc;
use tabdist_core::{
    ColumnStatistics, Error, RecordSource, Result, SubstitutionKind, Substitutor, TokenType,
};
use tracing::debug;

pub type MetricConstructor = Arc<dyn Fn(&MetricKind) -> Result<Box<dyn Metric>> + Send + Sync>;
pub type IndexConstructor = Arc<dyn Fn(Frequencies) -> Box<dyn SimilarityIndex> + Send + Sync>;
pub type TokenSimilarityConstructor =
    Arc<dyn Fn(usize, &ColumnStatistics) -> Result<Box<dyn TokenSimilarity>> + Send + Sync>;
pub type SubstitutorConstructor =
    Arc<dyn Fn(&mut dyn RecordSource, usize, TokenType) -> Result<Box<dyn Substitutor>> + Send + Sync>;

/// Per-type ordered registrations; the first one is the type's default
type ByType<K, C> = AHashMap<TokenType, Vec<(K, C)>>;

/// Every constructible engine, keyed by kind
#[derive(Clone, Default)]
pub struct Registries {
    metrics: Vec<(&'static str, MetricConstructor)>,
    indices: Vec<(IndexKind, IndexConstructor)>,
    gower: ByType<GowerIndexKind, TokenSimilarityConstructor>,
    substitutions: ByType<SubstitutionKind, SubstitutorConstructor>,
}

impl Registries {
    /// Registries with nothing registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registries holding every built-in engine
    pub fn standard() -> Self {
        use GowerIndexKind as G;
        use TokenType as T;

        let mut registries = Self::empty();
        for kind in [
            MetricKind::Euclidean,
            MetricKind::Manhattan,
            MetricKind::Chebyshev,
            MetricKind::Minkowski(2.0),
        ] {
            registries.register_metric(kind.name(), Arc::new(|kind: &MetricKind| kind.build()));
        }
        for kind in IndexKind::ALL {
            registries.register_index(kind, Arc::new(move |freqs| kind.build(freqs)));
        }

        let numeric = [G::NormalizedManhattan];
        let binary = [G::JaccardBinary, G::Overlap];
        let categorical = [
            G::Overlap,
            G::Eskin,
            G::Goodall1,
            G::Goodall2,
            G::Goodall3,
            G::Goodall4,
            G::InverseOccurrenceFrequency,
            G::OccurrenceFrequency,
        ];
        for (token_type, kinds) in [
            (T::Integer, &numeric[..]),
            (T::Float, &numeric[..]),
            (T::Binary, &binary[..]),
            (T::BinaryDigital, &binary[..]),
            (T::CategoricalString, &categorical[..]),
        ] {
            for &kind in kinds {
                registries.register_token_similarity(
                    token_type,
                    kind,
                    Arc::new(move |column: usize, stats: &ColumnStatistics| {
                        kind.from_statistics(column, stats)
                    }),
                );
            }
        }

        let numeric = [SubstitutionKind::ExpectedValue, SubstitutionKind::MostCommonValue];
        let other = [SubstitutionKind::MostCommonValue];
        for (token_type, kinds) in [
            (T::Integer, &numeric[..]),
            (T::Float, &numeric[..]),
            (T::Binary, &other[..]),
            (T::BinaryDigital, &other[..]),
            (T::CategoricalString, &other[..]),
        ] {
            for &kind in kinds {
                registries.register_substitution(
                    token_type,
                    kind,
                    Arc::new(move |source: &mut dyn RecordSource, column: usize, token_type: TokenType| {
                        kind.produce(source, column, token_type)
                    }),
                );
            }
        }
        debug!(
            metrics = registries.metrics.len(),
            indices = registries.indices.len(),
            "built standard registries"
        );
        registries
    }

    /// Register a metric under `name`, replacing any previous registration
    pub fn register_metric(&mut self, name: &'static str, constructor: MetricConstructor) {
        replace_or_push(&mut self.metrics, name, constructor);
    }

    pub fn register_index(&mut self, kind: IndexKind, constructor: IndexConstructor) {
        replace_or_push(&mut self.indices, kind, constructor);
    }

    pub fn register_token_similarity(
        &mut self,
        token_type: TokenType,
        kind: GowerIndexKind,
        constructor: TokenSimilarityConstructor,
    ) {
        replace_or_push(self.gower.entry(token_type).or_default(), kind, constructor);
    }

    pub fn register_substitution(
        &mut self,
        token_type: TokenType,
        kind: SubstitutionKind,
        constructor: SubstitutorConstructor,
    ) {
        replace_or_push(self.substitutions.entry(token_type).or_default(), kind, constructor);
    }

    pub fn metric_names(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|(name, _)| *name).collect()
    }

    pub fn index_kinds(&self) -> Vec<IndexKind> {
        self.indices.iter().map(|(kind, _)| *kind).collect()
    }

    /// Gower kinds registered for `token_type`, default first
    pub fn token_similarity_kinds(&self, token_type: TokenType) -> Vec<GowerIndexKind> {
        kinds(&self.gower, token_type)
    }

    /// Substitution kinds registered for `token_type`, default first
    pub fn substitution_kinds(&self, token_type: TokenType) -> Vec<SubstitutionKind> {
        kinds(&self.substitutions, token_type)
    }

    pub fn metric(&self, kind: &MetricKind) -> Result<Box<dyn Metric>> {
        let constructor = lookup(&self.metrics, &kind.name())
            .ok_or_else(|| Error::UnknownIndex(kind.name().to_string()))?;
        constructor(kind)
    }

    /// Similarity index of `kind` over the given statistics
    pub fn similarity_index(&self, kind: IndexKind, freqs: Frequencies) -> Result<Box<dyn SimilarityIndex>> {
        let constructor = lookup(&self.indices, &kind).ok_or_else(|| Error::UnknownIndex(kind.to_string()))?;
        Ok(constructor(freqs))
    }

    /// Per-column Gower index for a column of `token_type`; `None` picks the default
    pub fn token_similarity_from_statistics(
        &self,
        token_type: TokenType,
        kind: Option<GowerIndexKind>,
        column: usize,
        stats: &ColumnStatistics,
    ) -> Result<Box<dyn TokenSimilarity>> {
        let (kind, constructor) = select(&self.gower, token_type, kind, |k| k.name())?;
        debug!(column, %token_type, index = kind.name(), "building gower column index");
        constructor(column, stats)
    }

    /// Per-column Gower index built with one full pass over `source`
    pub fn token_similarity<S: RecordSource + ?Sized>(
        &self,
        token_type: TokenType,
        kind: Option<GowerIndexKind>,
        source: &mut S,
        column: usize,
    ) -> Result<Box<dyn TokenSimilarity>> {
        select(&self.gower, token_type, kind, |k| k.name())?;
        let stats = ColumnStatistics::collect(source, column)?;
        self.token_similarity_from_statistics(token_type, kind, column, &stats)
    }

    /// Substitutor for a column of `token_type`; `None` picks the default
    pub fn produce_substitutor(
        &self,
        token_type: TokenType,
        kind: Option<SubstitutionKind>,
        source: &mut dyn RecordSource,
        column: usize,
    ) -> Result<Box<dyn Substitutor>> {
        let (kind, constructor) = select(&self.substitutions, token_type, kind, |k| k.name())?;
        debug!(column, %token_type, substitution = kind.name(), "producing substitutor");
        constructor(source, column, token_type)
    }
}

fn replace_or_push<K: PartialEq, C>(entries: &mut Vec<(K, C)>, key: K, constructor: C) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = constructor,
        None => entries.push((key, constructor)),
    }
}

fn lookup<'a, K: PartialEq, C>(entries: &'a [(K, C)], key: &K) -> Option<&'a C> {
    entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
}

fn kinds<K: Copy, C>(map: &ByType<K, C>, token_type: TokenType) -> Vec<K> {
    map.get(&token_type)
        .map(|entries| entries.iter().map(|(k, _)| *k).collect())
        .unwrap_or_default()
}

fn select<'a, K: Copy + PartialEq, C>(
    map: &'a ByType<K, C>,
    token_type: TokenType,
    kind: Option<K>,
    name: impl Fn(K) -> &'static str,
) -> Result<(K, &'a C)> {
    let entries = map.get(&token_type).map(Vec::as_slice).unwrap_or_default();
    let found = match kind {
        Some(kind) => entries.iter().find(|(k, _)| *k == kind),
        None => entries.first(),
    };
    found.map(|(k, c)| (*k, c)).ok_or_else(|| Error::UnsupportedTokenType {
        token_type,
        what: kind.map_or_else(|| "any registered engine".to_string(), |k| name(k).to_string()),
    })
}
