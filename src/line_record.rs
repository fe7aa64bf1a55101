use std::cmp::Ordering;
use std::ops::Range;

use crate::error::SortError;
use crate::key::KeyExtractor;

/// A line and the byte range of its sort key within the line.
#[derive(Debug)]
pub(crate) struct LineRecord {
    line: String,
    key: Range<usize>,
}

impl LineRecord {
    /// `line` must not contain the line terminator. `line_number` is 1-based and only used for
    /// error reporting.
    pub(crate) fn new(line: String, line_number: u64, extractor: &KeyExtractor) -> Result<LineRecord, SortError> {
        let key = extractor.key_range(&line, line_number)?;
        Ok(
            LineRecord {
                line,
                key,
            }
        )
    }

    pub(crate) fn key(&self) -> &str {
        &self.line[self.key.clone()]
    }

    pub(crate) fn line(&self) -> &str {
        &self.line
    }
}

impl Eq for LineRecord {}

impl PartialEq<Self> for LineRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl PartialOrd<Self> for LineRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LineRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}
