//! Records and record sources
//!
//! A record source is a resettable, forward-only stream of fixed-width token vectors.
//! Every statistics pass calls `reset()` and then drains the source; passes are not
//! reentrant, which `&mut self` enforces.

use crate::{Error, Mask, Result, Token};

/// A token vector with its position in the current pass
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub tokens: Vec<Token>,
    /// Sequential index assigned on each forward pass
    pub ordinal: u64,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn new(tokens: Vec<Token>, ordinal: u64) -> Self {
        Self { tokens, ordinal }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn has_absent(&self) -> bool {
        self.tokens.iter().any(Token::is_absent)
    }
}

impl AsRef<[Token]> for Record {
    fn as_ref(&self) -> &[Token] {
        &self.tokens
    }
}

/// Resettable forward-only stream of records
pub trait RecordSource {
    /// Number of tokens in every record
    fn width(&self) -> usize;

    /// Rewind to the first record
    fn reset(&mut self) -> Result<()>;

    fn has_next(&self) -> bool;

    /// Next record, or `Error::NoMoreRecords` once drained
    fn next_record(&mut self) -> Result<Record>;
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn next_record(&mut self) -> Result<Record> {
        (**self).next_record()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn next_record(&mut self) -> Result<Record> {
        (**self).next_record()
    }
}

/// Run one full pass: reset, then hand every record to `visit`.
///
/// Leaves the source positioned at end-of-stream. Returns the number of records seen.
pub fn scan<S, F>(source: &mut S, mut visit: F) -> Result<u64>
where
    S: RecordSource + ?Sized,
    F: FnMut(&Record) -> Result<()>,
{
    source.reset()?;
    let mut seen = 0u64;
    while source.has_next() {
        let record = source.next_record()?;
        visit(&record)?;
        seen += 1;
    }
    Ok(seen)
}

/// Collect every record of one full pass
pub fn read_all<S: RecordSource + ?Sized>(source: &mut S) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    scan(source, |record| {
        records.push(record.clone());
        Ok(())
    })?;
    Ok(records)
}

/// In-memory source over owned rows
#[derive(Debug, Clone)]
pub struct MemorySource {
    rows: Vec<Vec<Token>>,
    width: usize,
    cursor: usize,
}

impl MemorySource {
    /// Create a source; every row must have `width` tokens
    pub fn new(width: usize, rows: Vec<Vec<Token>>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|row| row.len() != width) {
            return Err(Error::InvalidWidth {
                expected: width,
                actual: bad.len(),
            });
        }
        Ok(Self {
            rows,
            width,
            cursor: 0,
        })
    }

    /// Create a source taking the width from the first row
    pub fn from_rows(rows: Vec<Vec<Token>>) -> Result<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        Self::new(width, rows)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Token>] {
        &self.rows
    }
}

impl RecordSource for MemorySource {
    fn width(&self) -> usize {
        self.width
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.cursor < self.rows.len()
    }

    fn next_record(&mut self) -> Result<Record> {
        let row = self.rows.get(self.cursor).ok_or(Error::NoMoreRecords)?;
        let record = Record::new(row.clone(), self.cursor as u64);
        self.cursor += 1;
        Ok(record)
    }
}

/// Source that projects every record of a wrapped source through a mask
#[derive(Debug)]
pub struct MaskedSource<S> {
    inner: S,
    mask: Mask,
}

impl<S: RecordSource> MaskedSource<S> {
    pub fn new(inner: S, mask: Mask) -> Result<Self> {
        if mask.width() != inner.width() {
            return Err(Error::InvalidWidth {
                expected: inner.width(),
                actual: mask.width(),
            });
        }
        Ok(Self { inner, mask })
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RecordSource> RecordSource for MaskedSource<S> {
    fn width(&self) -> usize {
        self.mask.len()
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }

    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn next_record(&mut self) -> Result<Record> {
        let record = self.inner.next_record()?;
        Ok(Record::new(self.mask.project(&record.tokens)?, record.ordinal))
    }
}
