//! Distance schema definitions
//!
//! Defines the declarative configuration of a distance engine: the type of every
//! column, which columns take part, how missing values are filled, and which engine
//! compares the records.

use serde::{Deserialize, Serialize};
use tabdist_core::{Mask, SubstitutionKind, TokenType};
use tabdist_similarity::{GowerIndexKind, IndexKind, MetricKind, Registries};

/// Distance schema version 1
///
/// One entry per record column, in column order, plus the engine that compares
/// records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistanceSchema {
    /// Schema version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    /// Column configurations in record order
    pub columns: Vec<ColumnConfig>,

    pub engine: EngineConfig,
}

fn default_version() -> u32 {
    1
}

impl DistanceSchema {
    /// Create a new schema with the given columns
    pub fn new(columns: Vec<ColumnConfig>, engine: EngineConfig) -> Self {
        Self {
            version: 1,
            columns,
            engine,
        }
    }

    /// Parse a schema from JSON
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the schema against the available engines
    /// - Checks that used weights are non-negative with a positive total
    /// - Checks that every substitution and Gower index is registered for its column type
    /// - Normalizes used weights to sum to 1.0
    pub fn validate_and_normalize(&mut self, registries: &Registries) -> Result<(), SchemaError> {
        if self.version != 1 {
            return Err(SchemaError::UnsupportedVersion(self.version));
        }
        if self.columns.is_empty() {
            return Err(SchemaError::EmptySchema);
        }
        if !self.columns.iter().any(|c| c.in_use) {
            return Err(SchemaError::NoColumnsInUse);
        }

        for (i, config) in self.columns.iter().enumerate() {
            if !config.token_type.is_supported() {
                return Err(SchemaError::UnsupportedType {
                    column: config.label(i),
                    token_type: config.token_type,
                });
            }
            if let Some(kind) = config.substitution {
                if !registries.substitution_kinds(config.token_type).contains(&kind) {
                    return Err(SchemaError::UnsupportedSubstitution {
                        column: config.label(i),
                        kind,
                        token_type: config.token_type,
                    });
                }
            }
        }

        self.validate_engine(registries)?;

        for (i, config) in self.columns.iter().enumerate() {
            if config.in_use && !(config.weight >= 0.0) {
                return Err(SchemaError::NegativeWeight(config.label(i)));
            }
        }

        let weight_sum: f64 = self.used().map(|(_, c)| c.weight).sum();
        if weight_sum <= 0.0 {
            return Err(SchemaError::ZeroTotalWeight);
        }

        // Normalize weights to sum to 1.0
        if (weight_sum - 1.0).abs() > 1e-9 {
            for config in self.columns.iter_mut().filter(|c| c.in_use) {
                config.weight /= weight_sum;
            }
        }

        Ok(())
    }

    fn validate_engine(&self, registries: &Registries) -> Result<(), SchemaError> {
        match &self.engine {
            EngineConfig::Metric { metric, .. } => {
                if !registries.metric_names().contains(&metric.name()) {
                    return Err(SchemaError::UnknownEngine(metric.name().to_string()));
                }
                metric.build()?;
                if let Some((i, config)) = self.used().find(|(_, c)| !c.token_type.is_numeric()) {
                    return Err(SchemaError::UnsupportedType {
                        column: config.label(i),
                        token_type: config.token_type,
                    });
                }
            }
            EngineConfig::Similarity { index } => {
                if !registries.index_kinds().contains(index) {
                    return Err(SchemaError::UnknownEngine(index.name().to_string()));
                }
            }
            EngineConfig::Gower => {
                for (i, config) in self.used() {
                    let registered = registries.token_similarity_kinds(config.token_type);
                    match config.index {
                        Some(kind) if !registered.contains(&kind) => {
                            return Err(SchemaError::UnsupportedIndex {
                                column: config.label(i),
                                kind,
                                token_type: config.token_type,
                            });
                        }
                        None if registered.is_empty() => {
                            return Err(SchemaError::NoIndexForType {
                                column: config.label(i),
                                token_type: config.token_type,
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of columns a record must have
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Mask of the columns in use
    pub fn mask(&self) -> Mask {
        let flags: Vec<bool> = self.columns.iter().map(|c| c.in_use).collect();
        Mask::from_flags(&flags)
    }

    /// Column types in record order
    pub fn token_types(&self) -> Vec<TokenType> {
        self.columns.iter().map(|c| c.token_type).collect()
    }

    /// Columns in use, with their record index
    pub fn used(&self) -> impl Iterator<Item = (usize, &ColumnConfig)> {
        self.columns.iter().enumerate().filter(|(_, c)| c.in_use)
    }
}

/// Engine comparing the (masked, substituted) records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineConfig {
    /// Metric over numeric columns, optionally range-normalized per column
    Metric {
        metric: MetricKind,
        #[serde(default)]
        normalized: bool,
    },
    /// Categorical similarity index, reported as `1 - similarity`
    Similarity { index: IndexKind },
    /// Weighted Gower composite of per-column indices
    Gower,
}

/// Configuration for a single column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnConfig {
    /// Display name of the column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Unused columns are masked out before any statistics are gathered
    #[serde(default = "default_in_use")]
    pub in_use: bool,

    /// How absent tokens of this column are filled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<SubstitutionKind>,

    /// Weight of this column in the Gower composite
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Gower index for this column; the type's first registered index when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<GowerIndexKind>,
}

fn default_in_use() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

impl ColumnConfig {
    /// Create a used column of the given type with weight 1
    pub fn new(token_type: TokenType) -> Self {
        Self {
            title: None,
            token_type,
            in_use: true,
            substitution: None,
            weight: 1.0,
            index: None,
        }
    }

    pub fn integer(weight: f64) -> Self {
        Self::new(TokenType::Integer).with_weight(weight)
    }

    pub fn float(weight: f64) -> Self {
        Self::new(TokenType::Float).with_weight(weight)
    }

    pub fn categorical(weight: f64) -> Self {
        Self::new(TokenType::CategoricalString).with_weight(weight)
    }

    pub fn binary(weight: f64) -> Self {
        Self::new(TokenType::Binary).with_weight(weight)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_substitution(mut self, kind: SubstitutionKind) -> Self {
        self.substitution = Some(kind);
        self
    }

    pub fn with_index(mut self, kind: GowerIndexKind) -> Self {
        self.index = Some(kind);
        self
    }

    /// Exclude the column from comparison
    pub fn unused(mut self) -> Self {
        self.in_use = false;
        self
    }

    /// Title, or `#index` for untitled columns
    pub fn label(&self, index: usize) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("#{}", index),
        }
    }
}

/// Errors that can occur during schema validation and engine building
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema cannot be empty")]
    EmptySchema,

    #[error("Schema version {0} is not supported")]
    UnsupportedVersion(u32),

    #[error("At least one column must be in use")]
    NoColumnsInUse,

    #[error("Column '{0}' has negative weight")]
    NegativeWeight(String),

    #[error("Total weight of used columns cannot be zero")]
    ZeroTotalWeight,

    #[error("Column '{column}' has type {token_type}, which the engine cannot compare")]
    UnsupportedType { column: String, token_type: TokenType },

    #[error("Substitution {kind:?} is not registered for column '{column}' of type {token_type}")]
    UnsupportedSubstitution {
        column: String,
        kind: SubstitutionKind,
        token_type: TokenType,
    },

    #[error("Gower index {kind} is not registered for column '{column}' of type {token_type}")]
    UnsupportedIndex {
        column: String,
        kind: GowerIndexKind,
        token_type: TokenType,
    },

    #[error("No Gower index is registered for column '{column}' of type {token_type}")]
    NoIndexForType { column: String, token_type: TokenType },

    #[error("Engine '{0}' is not registered")]
    UnknownEngine(String),

    #[error("Schema describes {expected} columns but records have {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] tabdist_core::Error),
}
