use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::SortError;
use crate::key::{Head, KeyExtractor};
use crate::run_reader::RunReader;
use crate::sorted_run::SortedRun;

/// Merged records between two polls of the cancellation flag
const CANCELLATION_INTERVAL: u64 = 1024;

/// Head of a run paired with the run's slot in the reader arena. Ties between equal keys go to the
/// earlier run.
#[derive(Debug)]
struct RunHead {
    head: Head,
    slot: usize,
}

impl Eq for RunHead {}

impl PartialEq<Self> for RunHead {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for RunHead {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RunHead {
    fn cmp(&self, other: &Self) -> Ordering {
        self.head.cmp(&other.head)
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

/// k-way merge of sorted runs into a single output stream
pub(crate) struct RunMerger<'a> {
    config: &'a Config,
    output: PathBuf,
}

impl<'a> RunMerger<'a> {
    pub(crate) fn new(config: &'a Config) -> RunMerger<'a> {
        RunMerger {
            config,
            output: config.output().clone(),
        }
    }

    /// Merge `runs`, given in creation order, into `writer` and return the number of records
    /// written. Each run file is removed as soon as it has been read to the end.
    pub(crate) fn merge<W: Write>(&self, runs: Vec<SortedRun>, writer: &mut W) -> Result<u64, SortError> {
        log::info!("Merging {} sorted runs", runs.len());
        let merged = if runs.len() == 1 {
            self.copy_single(runs, writer)?
        } else {
            self.merge_heads(runs, writer)?
        };
        writer.flush().map_err(|e| self.write_error(e))?;
        log::info!("Finished merging sorted runs, merged length: {} lines", merged);
        Ok(merged)
    }

    fn copy_single<W: Write>(&self, mut runs: Vec<SortedRun>, writer: &mut W) -> Result<u64, SortError> {
        let run = runs.remove(0);
        let file = File::open(run.path())
            .map_err(|e| SortError::RunRead { run_index: run.index(), source: e })?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size(), file);
        std::io::copy(&mut reader, writer)
            .map_err(|e| SortError::RunRead { run_index: run.index(), source: e })?;
        drop(reader);
        if let Err(e) = std::fs::remove_file(run.path()) {
            log::warn!("Failed to remove run {}: {}, error: {}", run.index(), run.path().display(), e);
        }
        Ok(run.records() as u64)
    }

    fn merge_heads<W: Write>(&self, runs: Vec<SortedRun>, writer: &mut W) -> Result<u64, SortError> {
        let extractor: &KeyExtractor = self.config.extractor();
        let mut readers: Vec<Option<RunReader>> = Vec::with_capacity(runs.len());
        let mut heads: BinaryHeap<Reverse<RunHead>> = BinaryHeap::with_capacity(runs.len());

        for run in runs {
            let slot = readers.len();
            let mut reader = RunReader::open(run, self.config.buffer_size(), extractor)?;
            match reader.next_head()? {
                Head::Exhausted => {
                    reader.close();
                    readers.push(None);
                }
                head => {
                    heads.push(Reverse(RunHead { head, slot }));
                    readers.push(Some(reader));
                }
            }
        }

        let mut merged: u64 = 0;
        while let Some(Reverse(RunHead { head, slot })) = heads.pop() {
            let Head::Record(record) = head else {
                continue;
            };
            writer.write_all(record.line().as_bytes()).map_err(|e| self.write_error(e))?;
            writer.write_all(b"\n").map_err(|e| self.write_error(e))?;
            merged += 1;

            if merged % CANCELLATION_INTERVAL == 0 && self.config.cancelled() {
                log::info!("Merge cancelled after {} records", merged);
                return Err(SortError::Cancelled);
            }

            let next = match readers[slot].as_mut() {
                Some(reader) => reader.next_head()?,
                None => continue,
            };
            match next {
                Head::Exhausted => {
                    if let Some(reader) = readers[slot].take() {
                        reader.close();
                    }
                }
                head => heads.push(Reverse(RunHead { head, slot })),
            }
        }
        Ok(merged)
    }

    fn write_error(&self, e: std::io::Error) -> SortError {
        SortError::OutputWrite { path: self.output.clone(), source: e }
    }
}
