use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SortError;
use crate::key::KeyExtractor;

/// File descriptors kept available for the process on top of the open runs
pub(crate) const RESERVED_FILES: u64 = 256;

#[derive(Clone)]
pub(crate) struct Config {
    input: PathBuf,
    output: PathBuf,
    tmp: PathBuf,
    tmp_prefix: String,
    tasks: usize,
    chunk_lines: usize,
    buffer_size: usize,
    extractor: KeyExtractor,
    cancellation: Option<Arc<AtomicBool>>,
}

impl Config {
    pub(crate) fn new(
        input: PathBuf,
        output: PathBuf,
        tmp: PathBuf,
        tmp_prefix: String,
        tasks: usize,
        chunk_lines: usize,
        buffer_size: usize,
        extractor: KeyExtractor,
        cancellation: Option<Arc<AtomicBool>>,
    ) -> Config {
        let tasks = if tasks == 0 {
            num_cpus::get()
        } else {
            tasks
        };

        Config {
            input,
            output,
            tmp,
            tmp_prefix,
            tasks,
            chunk_lines,
            buffer_size,
            extractor,
            cancellation,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SortError> {
        if self.chunk_lines == 0 {
            return Err(SortError::Configuration("chunk size must be at least one line".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(SortError::Configuration("buffer size must be positive".to_string()));
        }
        if self.tmp_prefix.is_empty() || self.tmp_prefix.contains(std::path::is_separator) {
            return Err(
                SortError::Configuration(format!("invalid run file prefix: {:?}", self.tmp_prefix))
            );
        }
        self.extractor.delimiter().validate()
    }

    pub(crate) fn validate_output(&self) -> Result<(), SortError> {
        if self.output.file_name().is_none() {
            return Err(
                SortError::Configuration(format!("output is not a file path: {}", self.output.display()))
            );
        }
        Ok(())
    }

    pub(crate) fn input(&self) -> &PathBuf {
        &self.input
    }

    pub(crate) fn output(&self) -> &PathBuf {
        &self.output
    }

    /// Directory receiving the output temp file before it is persisted
    pub(crate) fn output_dir(&self) -> &Path {
        match self.output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub(crate) fn tmp(&self) -> &PathBuf {
        &self.tmp
    }

    pub(crate) fn tmp_prefix(&self) -> &String {
        &self.tmp_prefix
    }

    pub(crate) fn tasks(&self) -> usize {
        self.tasks
    }

    pub(crate) fn chunk_lines(&self) -> usize {
        self.chunk_lines
    }

    pub(crate) fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub(crate) fn extractor(&self) -> &KeyExtractor {
        &self.extractor
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}
