//! Missing-value substitution
//!
//! A substitutor computes one fill-in value per column from a full pass and is then
//! applied to every record at ingestion time, before any distance function sees it.

use crate::lattice::TokenType;
use crate::record::{Record, RecordSource};
use crate::stats::ColumnStatistics;
use crate::{Error, Result, Token};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Available substitution strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionKind {
    /// Arithmetic mean, rounded for integer columns
    ExpectedValue,
    /// Value with the highest occurrence count
    MostCommonValue,
}

impl SubstitutionKind {
    pub fn name(self) -> &'static str {
        match self {
            SubstitutionKind::ExpectedValue => "expected_value",
            SubstitutionKind::MostCommonValue => "most_common_value",
        }
    }

    /// Build the substitutor for `column` with one full pass over `source`
    pub fn produce<S: RecordSource + ?Sized>(
        self,
        source: &mut S,
        column: usize,
        token_type: TokenType,
    ) -> Result<Box<dyn Substitutor>> {
        match self {
            SubstitutionKind::ExpectedValue => match token_type {
                TokenType::Integer => Ok(Box::new(ExpectedValueSubstitutor::integer(source, column)?)),
                TokenType::Float => Ok(Box::new(ExpectedValueSubstitutor::float(source, column)?)),
                other => Err(Error::UnsupportedTokenType {
                    token_type: other,
                    what: self.name().to_string(),
                }),
            },
            SubstitutionKind::MostCommonValue => {
                Ok(Box::new(MostCommonValueSubstitutor::produce(source, column)?))
            }
        }
    }
}

/// Fills an absent token of one column
pub trait Substitutor: Send + Sync {
    /// Column this substitutor fills
    fn column(&self) -> usize;

    /// Value for the absent token. `partial` has every column left of this one
    /// already resolved.
    fn substitute(&self, partial: &Record) -> Token;
}

/// Mean of the observed values
#[derive(Debug, Clone)]
pub struct ExpectedValueSubstitutor {
    column: usize,
    value: Token,
}

impl ExpectedValueSubstitutor {
    /// Mean of an integer column, rounded half up (`-2.5` becomes `-2`); 0 for an empty column
    pub fn integer<S: RecordSource + ?Sized>(source: &mut S, column: usize) -> Result<Self> {
        let stats = numeric_statistics(source, column)?;
        let value = Token::Integer(stats.mean().map_or(0, |m| (m + 0.5).floor() as i64));
        debug!(column, %value, "expected value substitutor ready");
        Ok(Self { column, value })
    }

    /// Mean of a float column; 0.0 for an empty column
    pub fn float<S: RecordSource + ?Sized>(source: &mut S, column: usize) -> Result<Self> {
        let stats = numeric_statistics(source, column)?;
        let value = Token::float(stats.mean().unwrap_or(0.0));
        debug!(column, %value, "expected value substitutor ready");
        Ok(Self { column, value })
    }

    pub fn value(&self) -> &Token {
        &self.value
    }
}

impl Substitutor for ExpectedValueSubstitutor {
    fn column(&self) -> usize {
        self.column
    }

    fn substitute(&self, _partial: &Record) -> Token {
        self.value.clone()
    }
}

fn numeric_statistics<S: RecordSource + ?Sized>(source: &mut S, column: usize) -> Result<ColumnStatistics> {
    let stats = ColumnStatistics::collect(source, column)?;
    if let Some((token, _)) = stats.iter_ordered().find(|(t, _)| t.as_f64().is_none()) {
        return Err(Error::NonNumeric {
            column,
            found: token.token_type(),
        });
    }
    Ok(stats)
}

/// Most frequent observed value; ties go to the value seen first
#[derive(Debug, Clone)]
pub struct MostCommonValueSubstitutor {
    column: usize,
    value: Token,
}

impl MostCommonValueSubstitutor {
    /// One pass over `column`; an all-absent column substitutes `Absent`
    pub fn produce<S: RecordSource + ?Sized>(source: &mut S, column: usize) -> Result<Self> {
        let stats = ColumnStatistics::collect(source, column)?;
        Ok(Self::from_statistics(column, &stats))
    }

    pub fn from_statistics(column: usize, stats: &ColumnStatistics) -> Self {
        let mut best: Option<(&Token, u64)> = None;
        for (token, count) in stats.iter_ordered() {
            if best.map_or(true, |(_, max)| count > max) {
                best = Some((token, count));
            }
        }
        let value = best.map_or(Token::Absent, |(t, _)| t.clone());
        debug!(column, %value, "most common value substitutor ready");
        Self { column, value }
    }

    pub fn value(&self) -> &Token {
        &self.value
    }
}

impl Substitutor for MostCommonValueSubstitutor {
    fn column(&self) -> usize {
        self.column
    }

    fn substitute(&self, _partial: &Record) -> Token {
        self.value.clone()
    }
}

/// Source that fills absent tokens of a wrapped source, left to right
pub struct SubstitutingSource<S> {
    inner: S,
    substitutors: Vec<Option<Box<dyn Substitutor>>>,
}

impl<S: RecordSource> SubstitutingSource<S> {
    /// `substitutors` are placed by their own column; columns without one keep `Absent`
    pub fn new(inner: S, substitutors: Vec<Box<dyn Substitutor>>) -> Result<Self> {
        let width = inner.width();
        let mut slots: Vec<Option<Box<dyn Substitutor>>> = (0..width).map(|_| None).collect();
        for substitutor in substitutors {
            let column = substitutor.column();
            let slot = slots
                .get_mut(column)
                .ok_or(Error::ColumnOutOfRange { column, width })?;
            *slot = Some(substitutor);
        }
        Ok(Self {
            inner,
            substitutors: slots,
        })
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn fill(&self, mut record: Record) -> Record {
        for column in 0..record.tokens.len() {
            if !record.tokens[column].is_absent() {
                continue;
            }
            if let Some(Some(substitutor)) = self.substitutors.get(column) {
                let value = substitutor.substitute(&record);
                record.tokens[column] = value;
            }
        }
        record
    }
}

impl<S: RecordSource> RecordSource for SubstitutingSource<S> {
    fn width(&self) -> usize {
        self.inner.width()
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }

    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn next_record(&mut self) -> Result<Record> {
        let record = self.inner.next_record()?;
        if record.has_absent() {
            Ok(self.fill(record))
        } else {
            Ok(record)
        }
    }
}
