use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::error::SortError;
use crate::key::{Head, KeyExtractor};
use crate::line_record::LineRecord;
use crate::sorted_run::SortedRun;

/// Forward-only reader over one run
#[derive(Debug)]
pub(crate) struct RunReader {
    run: SortedRun,
    reader: BufReader<File>,
    extractor: KeyExtractor,
    line_number: u64,
}

impl RunReader {
    pub(crate) fn open(run: SortedRun, buffer_size: usize, extractor: &KeyExtractor) -> Result<RunReader, SortError> {
        let file = File::open(run.path())
            .map_err(|e| SortError::RunRead { run_index: run.index(), source: e })?;
        Ok(
            RunReader {
                run,
                reader: BufReader::with_capacity(buffer_size, file),
                extractor: extractor.clone(),
                line_number: 0,
            }
        )
    }

    /// Read the next record, [Head::Exhausted] at the end of the run
    pub(crate) fn next_head(&mut self) -> Result<Head, SortError> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)
            .map_err(|e| SortError::RunRead { run_index: self.run.index(), source: e })?;
        if bytes == 0 {
            return Ok(Head::Exhausted);
        }
        self.line_number += 1;
        // runs are written with a bare '\n', anything before it belongs to the record
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(Head::Record(LineRecord::new(line, self.line_number, &self.extractor)?))
    }

    /// Close the run and remove its file
    pub(crate) fn close(self) {
        let RunReader { run, reader, .. } = self;
        drop(reader);
        match std::fs::remove_file(run.path()) {
            Ok(()) => {
                log::debug!("Run {} exhausted, removed {}", run.index(), run.path().display());
            }
            Err(e) => {
                // the run directory is removed when the sort finishes
                log::warn!("Failed to remove run {}: {}, error: {}", run.index(), run.path().display(), e);
            }
        }
    }
}
