use std::cmp::Ordering;
use std::ops::Range;

use crate::delimiter::Delimiter;
use crate::error::SortError;
use crate::line_record::LineRecord;

/// Extracts the sort key of a line: the field at `column_index` (0-based) after splitting the
/// line on the delimiter.
///
/// # Examples
/// ```
/// use column_merge_sort::delimiter::Delimiter;
/// use column_merge_sort::key::KeyExtractor;
///
/// let extractor = KeyExtractor::new(Delimiter::literal(","), 1);
/// assert_eq!(extractor.extract("x,y,z", 1).unwrap(), "y");
/// assert!(extractor.extract("x", 2).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct KeyExtractor {
    delimiter: Delimiter,
    column_index: usize,
}

impl KeyExtractor {
    pub fn new(delimiter: Delimiter, column_index: usize) -> KeyExtractor {
        KeyExtractor {
            delimiter,
            column_index,
        }
    }

    /// Return the key of `record`. `line_number` identifies the record in the error.
    pub fn extract<'a>(&self, record: &'a str, line_number: u64) -> Result<&'a str, SortError> {
        let range = self.key_range(record, line_number)?;
        Ok(&record[range])
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    pub(crate) fn key_range(&self, record: &str, line_number: u64) -> Result<Range<usize>, SortError> {
        self.delimiter
            .field_range(record, self.column_index)
            .map_err(
                |fields| SortError::MalformedRecord {
                    line_number,
                    column_index: self.column_index,
                    fields,
                    line: record.to_string(),
                }
            )
    }
}

/// Current head of a run during the merge. An exhausted run sorts after every record so it never
/// wins the selection.
#[derive(Debug)]
pub(crate) enum Head {
    Record(LineRecord),
    Exhausted,
}

impl Eq for Head {}

impl PartialEq<Self> for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Head::Exhausted, Head::Exhausted) => Ordering::Equal,
            (Head::Exhausted, Head::Record(_)) => Ordering::Greater,
            (Head::Record(_), Head::Exhausted) => Ordering::Less,
            (Head::Record(a), Head::Record(b)) => a.cmp(b),
        }
    }
}
