use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::chunk_iterator::Chunk;
use crate::error::SortError;
use crate::sorted_run::SortedRun;

/// Sorts a chunk and persists it as run `<dir>/<prefix><index>`.
pub(crate) struct RunWriter {
    dir: PathBuf,
    prefix: String,
    buffer_size: usize,
    pool: ThreadPool,
}

impl RunWriter {
    pub(crate) fn new(dir: &Path, prefix: &str, buffer_size: usize, pool: ThreadPool) -> RunWriter {
        RunWriter {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            buffer_size,
            pool,
        }
    }

    pub(crate) fn run_path(&self, run_index: usize) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, run_index))
    }

    pub(crate) fn write(&self, run_index: usize, chunk: Chunk) -> Result<SortedRun, SortError> {
        let first_line = chunk.first_line();
        log::debug!("Sorting chunk of {} lines starting at input line {}", chunk.len(), first_line);
        let mut records = chunk.into_records();
        // stable, equal keys keep their input order
        self.pool.install(|| records.par_sort());

        let path = self.run_path(run_index);
        let write_error = |e| SortError::RunWrite { run_index, source: e };
        let file = File::create(&path).map_err(write_error)?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        for record in &records {
            writer.write_all(record.line().as_bytes()).map_err(write_error)?;
            writer.write_all(b"\n").map_err(write_error)?;
        }
        writer.flush().map_err(write_error)?;

        log::debug!(
            "Wrote run {} with {} records: {}",
            run_index,
            records.len(),
            path.display()
        );
        Ok(SortedRun::new(run_index, path, records.len()))
    }
}
