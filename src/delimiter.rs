use std::fmt::{Display, Formatter};
use std::ops::Range;

use regex::Regex;

use crate::error::SortError;

/// Column delimiter of a line record.
///
/// # Examples
/// ```
/// use column_merge_sort::delimiter::Delimiter;
///
/// // split on a literal comma
/// let csv = Delimiter::literal(",");
/// // split on any run of blanks
/// let blanks = Delimiter::pattern(r"[ \t]+").unwrap();
/// ```
#[derive(Clone, Debug)]
pub enum Delimiter {
    /// Split on an exact string. Characters with a meaning in regular expressions are taken as is.
    Literal(String),
    /// Split on every non-empty match of a regular expression.
    ///
    /// Zero-width matches never split a line. A pattern matching the empty string is rejected, but
    /// a pattern that only matches empty in context, such as `\b` or `^`, is accepted and leaves
    /// every line as a single field.
    Pattern(Regex),
}

impl Delimiter {
    /// Create a literal delimiter
    pub fn literal(s: &str) -> Delimiter {
        Delimiter::Literal(s.to_string())
    }

    /// Create a delimiter from a regular expression
    pub fn pattern(expression: &str) -> Result<Delimiter, anyhow::Error> {
        Ok(Delimiter::Pattern(Regex::new(expression)?))
    }

    pub(crate) fn validate(&self) -> Result<(), SortError> {
        match self {
            Delimiter::Literal(s) => {
                if s.is_empty() {
                    return Err(SortError::Configuration("delimiter must not be empty".to_string()));
                }
            }
            Delimiter::Pattern(r) => {
                if r.is_match("") {
                    return Err(
                        SortError::Configuration(format!("delimiter pattern {} matches the empty string", r.as_str()))
                    );
                }
            }
        }
        Ok(())
    }

    /// Byte range of field `column_index` within `line`. On failure returns the number of fields
    /// found in the line.
    pub(crate) fn field_range(&self, line: &str, column_index: usize) -> Result<Range<usize>, usize> {
        match self {
            Delimiter::Literal(s) => {
                let separators = line.match_indices(s.as_str())
                    .map(|(start, m)| (start, start + m.len()));
                nth_field(line.len(), separators, column_index)
            }
            Delimiter::Pattern(r) => {
                let separators = r.find_iter(line)
                    .filter(|m| !m.is_empty())
                    .map(|m| (m.start(), m.end()));
                nth_field(line.len(), separators, column_index)
            }
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::literal("\t")
    }
}

impl Display for Delimiter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Delimiter::Literal(s) => write!(f, "{:?}", s),
            Delimiter::Pattern(r) => write!(f, "/{}/", r.as_str()),
        }
    }
}

fn nth_field<I>(len: usize, separators: I, column_index: usize) -> Result<Range<usize>, usize>
    where I: Iterator<Item=(usize, usize)> {
    let mut start = 0;
    let mut field = 0;
    for (separator_start, separator_end) in separators {
        if field == column_index {
            return Ok(start..separator_start);
        }
        start = separator_end;
        field += 1;
    }
    if field == column_index {
        Ok(start..len)
    } else {
        Err(field + 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::delimiter::Delimiter;

    fn field<'a>(delimiter: &Delimiter, line: &'a str, column_index: usize) -> Result<&'a str, usize> {
        delimiter.field_range(line, column_index).map(|range| &line[range])
    }

    #[test]
    fn test_literal_fields() {
        let tab = Delimiter::default();
        assert_eq!(field(&tab, "a\tb\tc", 0), Ok("a"));
        assert_eq!(field(&tab, "a\tb\tc", 1), Ok("b"));
        assert_eq!(field(&tab, "a\tb\tc", 2), Ok("c"));
        assert_eq!(field(&tab, "a\tb\tc", 3), Err(3));
    }

    #[test]
    fn test_literal_multi_char() {
        let delimiter = Delimiter::literal("::");
        assert_eq!(field(&delimiter, "x::y:z::w", 1), Ok("y:z"));
        assert_eq!(field(&delimiter, "x::y:z::w", 2), Ok("w"));
    }

    #[test]
    fn test_literal_is_not_a_pattern() {
        let delimiter = Delimiter::literal(".");
        assert_eq!(field(&delimiter, "1.5|2", 1), Ok("5|2"));
    }

    #[test]
    fn test_trailing_and_empty_fields_retained() {
        let tab = Delimiter::default();
        assert_eq!(field(&tab, "a\t", 1), Ok(""));
        assert_eq!(field(&tab, "\t\t", 2), Ok(""));
        assert_eq!(field(&tab, "", 0), Ok(""));
        assert_eq!(field(&tab, "", 1), Err(1));
    }

    #[test]
    fn test_pattern_fields() -> Result<(), anyhow::Error> {
        let blanks = Delimiter::pattern(r"[ \t]+")?;
        assert_eq!(field(&blanks, "a  \t b c", 1), Ok("b"));
        assert_eq!(field(&blanks, "a  \t b c", 2), Ok("c"));
        assert_eq!(field(&blanks, "a  \t b c", 3), Err(3));
        Ok(())
    }

    #[test]
    fn test_validate() -> Result<(), anyhow::Error> {
        assert!(Delimiter::literal("").validate().is_err());
        assert!(Delimiter::pattern("x*")?.validate().is_err());
        assert!(Delimiter::pattern(",")?.validate().is_ok());
        assert!(Delimiter::literal(",").validate().is_ok());
        Ok(())
    }

    #[test]
    fn test_zero_width_matches_do_not_split() -> Result<(), anyhow::Error> {
        let boundary = Delimiter::pattern(r"\b")?;
        assert!(boundary.validate().is_ok());
        assert_eq!(field(&boundary, "ab cd", 0), Ok("ab cd"));
        assert_eq!(field(&boundary, "ab cd", 1), Err(1));
        Ok(())
    }
}
