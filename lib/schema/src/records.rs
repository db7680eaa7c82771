//! Typed records from JSON
//!
//! Records arrive as a JSON array of rows, each row an array of scalars or `null`, one
//! per schema column. Cells are converted with the column's declared type.

use crate::schema::{DistanceSchema, SchemaError};
use serde_json::Value;
use tabdist_core::{MemorySource, Token};
use tracing::debug;

impl DistanceSchema {
    /// Parse `json` into an in-memory source typed by this schema's columns
    pub fn records_from_json(&self, json: &str) -> Result<MemorySource, SchemaError> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(json)?;
        self.records_from_rows(&rows)
    }

    pub fn records_from_rows(&self, rows: &[Vec<Value>]) -> Result<MemorySource, SchemaError> {
        let types = self.token_types();
        let mut tokens = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != types.len() {
                return Err(SchemaError::WidthMismatch {
                    expected: types.len(),
                    actual: row.len(),
                });
            }
            let record = row
                .iter()
                .zip(&types)
                .enumerate()
                .map(|(column, (value, &token_type))| Token::from_json(value, token_type, column))
                .collect::<tabdist_core::Result<Vec<_>>>()?;
            tokens.push(record);
        }
        debug!(rows = tokens.len(), columns = types.len(), "loaded records");
        Ok(MemorySource::new(types.len(), tokens)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{ColumnConfig, DistanceSchema, EngineConfig, SchemaError};
    use tabdist_core::{read_all, Error, Token};

    fn schema() -> DistanceSchema {
        DistanceSchema::new(
            vec![
                ColumnConfig::integer(1.0),
                ColumnConfig::categorical(1.0),
                ColumnConfig::binary(1.0),
            ],
            EngineConfig::Gower,
        )
    }

    #[test]
    fn test_records_from_json() {
        let mut source = schema()
            .records_from_json(r#"[[1, "a", true], [null, "b", false], [3, null, null]]"#)
            .unwrap();
        let records = read_all(&mut source).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].tokens,
            vec![Token::Integer(1), Token::categorical("a"), Token::Binary(true)]
        );
        assert!(records[1].tokens[0].is_absent());
        assert_eq!(records[2].ordinal, 2);
    }

    #[test]
    fn test_bad_rows_rejected() {
        assert!(matches!(
            schema().records_from_json(r#"[[1, "a"]]"#),
            Err(SchemaError::WidthMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            schema().records_from_json(r#"[["x", "a", true]]"#),
            Err(SchemaError::Core(Error::InvalidValue { column: 0, .. }))
        ));
        assert!(matches!(
            schema().records_from_json("{"),
            Err(SchemaError::Json(_))
        ));
    }
}
