//! Engine construction
//!
//! Turns a validated [`DistanceSchema`] and a record source into a ready distance
//! function. Every statistics pass runs over the substituted records, projected
//! through the schema's mask.

use crate::schema::{DistanceSchema, EngineConfig, SchemaError};
use tabdist_core::{
    read_all, ColumnStatistics, Mask, MaskedSource, RecordSource, SubstitutingSource, Substitutor,
};
use tabdist_similarity::{
    pairwise_distances, DissimilarityFunction, DistanceFunction, Frequencies, GowerDistance,
    MaskedDistance, MetricDistance, NormalizedMetric, Registries,
};
use tracing::{debug, info};

/// A distance function together with the substituting source it was built from
pub struct Engine<S> {
    source: SubstitutingSource<S>,
    distance: Box<dyn DistanceFunction>,
    mask: Mask,
}

impl<S: RecordSource> Engine<S> {
    /// Build the engine described by `schema`.
    ///
    /// The schema is validated (and its weights normalized) on a copy; `source` must
    /// have exactly one column per schema column.
    pub fn build(schema: &DistanceSchema, mut source: S, registries: &Registries) -> Result<Self, SchemaError> {
        let mut schema = schema.clone();
        schema.validate_and_normalize(registries)?;
        if source.width() != schema.width() {
            return Err(SchemaError::WidthMismatch {
                expected: schema.width(),
                actual: source.width(),
            });
        }

        let substitutors = produce_substitutors(&schema, &mut source, registries)?;
        let mut source = SubstitutingSource::new(source, substitutors)?;
        let mask = schema.mask();
        let inner = build_distance(&schema, &mut source, &mask, registries)?;

        let distance: Box<dyn DistanceFunction> = if mask.is_identity() {
            inner
        } else {
            Box::new(MaskedDistance::new(inner, mask.clone()))
        };
        info!(
            engine = distance.name(),
            columns = schema.width(),
            used = mask.len(),
            "distance engine ready"
        );
        Ok(Self {
            source,
            distance,
            mask,
        })
    }

    /// Distance over full-width records; unused columns are ignored
    pub fn distance(&self) -> &dyn DistanceFunction {
        self.distance.as_ref()
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Source yielding records with absent tokens filled in
    pub fn source_mut(&mut self) -> &mut SubstitutingSource<S> {
        &mut self.source
    }

    /// Symmetric distance matrix over every substituted record of one full pass
    pub fn pairwise(&mut self) -> Result<Vec<Vec<f64>>, SchemaError> {
        let records = read_all(&mut self.source)?;
        Ok(pairwise_distances(self.distance.as_ref(), &records)?)
    }

    pub fn into_parts(self) -> (SubstitutingSource<S>, Box<dyn DistanceFunction>) {
        (self.source, self.distance)
    }
}

fn produce_substitutors<S: RecordSource>(
    schema: &DistanceSchema,
    source: &mut S,
    registries: &Registries,
) -> Result<Vec<Box<dyn Substitutor>>, SchemaError> {
    let mut substitutors = Vec::new();
    for (column, config) in schema.columns.iter().enumerate() {
        if let Some(kind) = config.substitution {
            substitutors.push(registries.produce_substitutor(config.token_type, Some(kind), source, column)?);
        }
    }
    debug!(count = substitutors.len(), "produced substitutors");
    Ok(substitutors)
}

fn build_distance<S: RecordSource>(
    schema: &DistanceSchema,
    source: &mut S,
    mask: &Mask,
    registries: &Registries,
) -> Result<Box<dyn DistanceFunction>, SchemaError> {
    let mut masked = MaskedSource::new(source, mask.clone())?;
    let distance: Box<dyn DistanceFunction> = match &schema.engine {
        EngineConfig::Metric { metric, normalized } => {
            let metric = registries.metric(metric)?;
            if *normalized {
                Box::new(NormalizedMetric::from_source(metric, &mut masked)?)
            } else {
                Box::new(MetricDistance::new(metric))
            }
        }
        EngineConfig::Similarity { index } => {
            let freqs = Frequencies::collect(&mut masked)?;
            Box::new(DissimilarityFunction::new(registries.similarity_index(*index, freqs)?))
        }
        EngineConfig::Gower => {
            let stats = ColumnStatistics::collect_all(&mut masked)?;
            let mut columns = Vec::with_capacity(stats.len());
            let mut weights = Vec::with_capacity(stats.len());
            for ((column, config), stats) in schema.used().zip(&stats) {
                columns.push(registries.token_similarity_from_statistics(
                    config.token_type,
                    config.index,
                    column,
                    stats,
                )?);
                weights.push(config.weight);
            }
            Box::new(GowerDistance::new(columns, &weights)?)
        }
    };
    Ok(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnConfig;
    use tabdist_core::{MemorySource, SubstitutionKind, Token};
    use tabdist_similarity::{GowerIndexKind, IndexKind, MetricKind};

    fn c(v: &str) -> Token {
        Token::categorical(v)
    }

    fn mixed() -> MemorySource {
        MemorySource::from_rows(vec![
            vec![Token::Integer(10), c("red"), Token::float(1.0)],
            vec![Token::Integer(20), c("red"), Token::float(2.0)],
            vec![Token::Absent, c("blue"), Token::float(3.0)],
            vec![Token::Integer(30), Token::Absent, Token::float(4.0)],
        ])
        .unwrap()
    }

    fn gower_columns() -> Vec<ColumnConfig> {
        vec![
            ColumnConfig::integer(1.0).with_substitution(SubstitutionKind::ExpectedValue),
            ColumnConfig::categorical(1.0).with_substitution(SubstitutionKind::MostCommonValue),
            ColumnConfig::float(1.0).unused(),
        ]
    }

    #[test]
    fn test_build_gower_with_substitution_and_mask() {
        let schema = DistanceSchema::new(gower_columns(), EngineConfig::Gower);
        let mut engine = Engine::build(&schema, mixed(), &Registries::standard()).unwrap();
        assert_eq!(engine.mask().indices(), &[0, 1]);
        assert_eq!(engine.distance().name(), "gower");

        let records = read_all(engine.source_mut()).unwrap();
        assert_eq!(records[2].tokens[0], Token::Integer(20));
        assert_eq!(records[3].tokens[1], c("red"));

        // range 20: (1 - 10/20 + 1) / 2, third column ignored
        let d = engine.distance().distance(&records[0].tokens, &records[1].tokens).unwrap();
        assert!((d - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_matrix() {
        let schema = DistanceSchema::new(gower_columns(), EngineConfig::Gower);
        let mut engine = Engine::build(&schema, mixed(), &Registries::standard()).unwrap();
        let matrix = engine.pairwise().unwrap();
        assert_eq!(matrix.len(), 4);
        for i in 0..4 {
            assert_eq!(matrix[i][i], 0.0);
            for j in 0..4 {
                assert_eq!(matrix[i][j], matrix[j][i]);
            }
        }
    }

    #[test]
    fn test_build_normalized_metric() {
        let schema = DistanceSchema::new(
            vec![
                ColumnConfig::integer(1.0).unused(),
                ColumnConfig::categorical(1.0).unused(),
                ColumnConfig::float(1.0),
            ],
            EngineConfig::Metric {
                metric: MetricKind::Manhattan,
                normalized: true,
            },
        );
        let mut engine = Engine::build(&schema, mixed(), &Registries::standard()).unwrap();
        let records = read_all(engine.source_mut()).unwrap();
        let d = engine.distance().distance(&records[0].tokens, &records[3].tokens).unwrap();
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_build_similarity_index() {
        let schema = DistanceSchema::new(
            vec![
                ColumnConfig::integer(1.0).unused(),
                ColumnConfig::categorical(1.0).with_substitution(SubstitutionKind::MostCommonValue),
                ColumnConfig::float(1.0).unused(),
            ],
            EngineConfig::Similarity {
                index: IndexKind::Overlap,
            },
        );
        let mut engine = Engine::build(&schema, mixed(), &Registries::standard()).unwrap();
        let records = read_all(engine.source_mut()).unwrap();
        let d = engine.distance().distance(&records[0].tokens, &records[2].tokens).unwrap();
        assert_eq!(d, 1.0);
        let d = engine.distance().distance(&records[0].tokens, &records[3].tokens).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_single_column_gower_is_not_masked() {
        let schema = DistanceSchema::new(
            vec![ColumnConfig::categorical(1.0).with_index(GowerIndexKind::Eskin)],
            EngineConfig::Gower,
        );
        let source = MemorySource::from_rows(vec![vec![c("a")], vec![c("b")]]).unwrap();
        let engine = Engine::build(&schema, source, &Registries::standard()).unwrap();
        assert!(engine.mask().is_identity());
        let d = engine.distance().distance(&[c("a")], &[c("b")]).unwrap();
        // eskin mismatch for cardinality 2 maps onto 0
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch() {
        let schema = DistanceSchema::new(vec![ColumnConfig::float(1.0)], EngineConfig::Gower);
        assert!(matches!(
            Engine::build(&schema, mixed(), &Registries::standard()),
            Err(SchemaError::WidthMismatch { expected: 1, actual: 3 })
        ));
    }

    #[test]
    fn test_absent_without_substitution_is_skipped_by_gower() {
        let schema = DistanceSchema::new(
            vec![
                ColumnConfig::integer(1.0),
                ColumnConfig::categorical(1.0),
                ColumnConfig::float(1.0).unused(),
            ],
            EngineConfig::Gower,
        );
        let mut engine = Engine::build(&schema, mixed(), &Registries::standard()).unwrap();
        let records = read_all(engine.source_mut()).unwrap();
        assert!(records[2].tokens[0].is_absent());
        // only the categorical column compares: red vs blue
        let d = engine.distance().distance(&records[0].tokens, &records[2].tokens).unwrap();
        assert_eq!(d, 1.0);
    }
}
