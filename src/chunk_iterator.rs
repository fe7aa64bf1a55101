use std::cmp::{max, min};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::SortError;
use crate::key::KeyExtractor;
use crate::line_record::LineRecord;

/// Contiguous lines of the input, at most `chunk_lines` of them
#[derive(Debug)]
pub(crate) struct Chunk {
    first_line: u64,
    records: Vec<LineRecord>,
}

impl Chunk {
    pub(crate) fn first_line(&self) -> u64 {
        self.first_line
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn into_records(self) -> Vec<LineRecord> {
        self.records
    }
}

/// Reads the input in windows of at most `chunk_lines` records. Never yields an empty chunk and
/// stops after the first error.
pub(crate) struct ChunkIterator {
    path: PathBuf,
    reader: BufReader<File>,
    extractor: KeyExtractor,
    chunk_lines: usize,
    line_number: u64,
    line_capacity: usize,
    records_capacity: usize,
    done: bool,
}

impl ChunkIterator {
    pub(crate) fn new(path: &PathBuf, chunk_lines: usize, buffer_size: usize, extractor: KeyExtractor) -> Result<ChunkIterator, SortError> {
        let file = File::open(path)
            .map_err(|e| SortError::InputRead { path: path.clone(), line_number: 0, source: e })?;

        Ok(
            ChunkIterator {
                path: path.clone(),
                reader: BufReader::with_capacity(buffer_size, file),
                extractor,
                chunk_lines,
                line_number: 0,
                line_capacity: 1,
                records_capacity: min(chunk_lines, 1024),
                done: false,
            }
        )
    }

    fn read_chunk(&mut self) -> Result<Option<Chunk>, SortError> {
        let mut records = Vec::with_capacity(self.records_capacity);
        let first_line = self.line_number + 1;
        let mut line = String::with_capacity(self.line_capacity);
        while records.len() < self.chunk_lines {
            let bytes = self.reader.read_line(&mut line)
                .map_err(
                    |e| SortError::InputRead {
                        path: self.path.clone(),
                        line_number: self.line_number + 1,
                        source: e,
                    }
                )?;
            if bytes == 0 {
                break;
            }
            self.line_number += 1;
            trim_endl(&mut line);
            self.line_capacity = max(line.len(), self.line_capacity);
            records.push(LineRecord::new(line, self.line_number, &self.extractor)?);
            line = String::with_capacity(self.line_capacity);
        }

        self.records_capacity = max(records.len(), self.records_capacity);
        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Chunk { first_line, records }))
        }
    }
}

impl Iterator for ChunkIterator {
    type Item = Result<Chunk, SortError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.read_chunk();
        match result {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Strip a trailing "\n" or "\r\n"
pub(crate) fn trim_endl(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use tempfile::NamedTempFile;

    use crate::chunk_iterator::{ChunkIterator, trim_endl};
    use crate::delimiter::Delimiter;
    use crate::error::SortError;
    use crate::key::KeyExtractor;

    fn input_file(content: &str) -> Result<NamedTempFile, anyhow::Error> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("{}\tvalue-{}\n", n - i, i)).collect()
    }

    fn chunk_sizes(path: &PathBuf, chunk_lines: usize) -> Result<Vec<usize>, anyhow::Error> {
        let extractor = KeyExtractor::new(Delimiter::default(), 1);
        let mut sizes = Vec::new();
        for chunk in ChunkIterator::new(path, chunk_lines, 64, extractor)? {
            sizes.push(chunk?.len());
        }
        Ok(sizes)
    }

    #[test]
    fn test_empty_file() -> Result<(), anyhow::Error> {
        let file = input_file("")?;
        assert!(chunk_sizes(&file.path().to_path_buf(), 10)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_exact_multiple() -> Result<(), anyhow::Error> {
        let file = input_file(&lines(30))?;
        assert_eq!(chunk_sizes(&file.path().to_path_buf(), 10)?, vec![10, 10, 10]);
        Ok(())
    }

    #[test]
    fn test_partial_last_chunk() -> Result<(), anyhow::Error> {
        let file = input_file(&lines(33))?;
        assert_eq!(chunk_sizes(&file.path().to_path_buf(), 10)?, vec![10, 10, 10, 3]);
        Ok(())
    }

    #[test]
    fn test_chunk_larger_than_file() -> Result<(), anyhow::Error> {
        let file = input_file(&lines(7))?;
        assert_eq!(chunk_sizes(&file.path().to_path_buf(), 1000)?, vec![7]);
        Ok(())
    }

    #[test]
    fn test_first_line_numbers() -> Result<(), anyhow::Error> {
        let file = input_file(&lines(25))?;
        let extractor = KeyExtractor::new(Delimiter::default(), 0);
        let first_lines: Vec<u64> = ChunkIterator::new(&file.path().to_path_buf(), 10, 64, extractor)?
            .map(|chunk| chunk.map(|c| c.first_line()))
            .collect::<Result<_, _>>()?;
        assert_eq!(first_lines, vec![1, 11, 21]);
        Ok(())
    }

    #[test]
    fn test_missing_final_newline_and_crlf() -> Result<(), anyhow::Error> {
        let file = input_file("b\t1\r\na\t2")?;
        let extractor = KeyExtractor::new(Delimiter::default(), 1);
        let mut iterator = ChunkIterator::new(&file.path().to_path_buf(), 10, 64, extractor)?;
        let records = iterator.next().unwrap()?.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line(), "b\t1");
        assert_eq!(records[0].key(), "1");
        assert_eq!(records[1].line(), "a\t2");
        assert!(iterator.next().is_none());
        Ok(())
    }

    #[test]
    fn test_malformed_line_reports_line_number() -> Result<(), anyhow::Error> {
        let file = input_file("a\t1\nb\t2\nbroken\nc\t3\n")?;
        let extractor = KeyExtractor::new(Delimiter::default(), 1);
        let mut iterator = ChunkIterator::new(&file.path().to_path_buf(), 2, 64, extractor)?;
        assert!(iterator.next().unwrap().is_ok());
        match iterator.next() {
            Some(Err(SortError::MalformedRecord { line_number, .. })) => assert_eq!(line_number, 3),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(iterator.next().is_none());
        Ok(())
    }

    #[test]
    fn test_trim_endl() {
        let mut line = "abc\r\n".to_string();
        trim_endl(&mut line);
        assert_eq!(line, "abc");
        let mut line = "abc\r".to_string();
        trim_endl(&mut line);
        assert_eq!(line, "abc\r");
    }
}
