use std::cmp::max;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use rlimit::{getrlimit, Resource, setrlimit};
use tempfile::{Builder, TempDir};

use crate::chunk_iterator::{ChunkIterator, trim_endl};
use crate::config::{Config, RESERVED_FILES};
use crate::delimiter::Delimiter;
use crate::error::SortError;
use crate::key::KeyExtractor;
use crate::line_record::LineRecord;
use crate::merger::RunMerger;
use crate::run_writer::RunWriter;
use crate::sorted_run::SortedRun;

/// Outcome of a successful [Sort::sort]
#[derive(Clone, Debug)]
pub struct SortStats {
    runs: usize,
    records: u64,
    phase1: Duration,
    phase2: Duration,
}

impl SortStats {
    /// Number of sorted runs produced by phase 1
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Number of records written to the output
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Elapsed time of phase 1, reading the input and writing sorted runs
    pub fn phase1(&self) -> Duration {
        self.phase1
    }

    /// Elapsed time of phase 2, merging the runs into the output
    pub fn phase2(&self) -> Duration {
        self.phase2
    }
}

/// Sort a text file of delimited line records by one column
///
/// The input is read in chunks of at most `chunk_lines` lines. Each chunk is sorted in memory and
/// persisted as a run in a private temporary directory, then all runs are merged in a single pass
/// into the output. The output file appears only when the sort succeeds. Records with equal keys
/// keep their input order.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
/// use column_merge_sort::delimiter::Delimiter;
/// use column_merge_sort::sort::Sort;
///
/// fn sort_records(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
///     let mut sort = Sort::new(input, output);
///     // sort by the third column of a comma separated file
///     sort.with_column(2);
///     sort.with_delimiter(Delimiter::literal(","));
///     // keep at most 1M lines in memory, fewer lines produce more intermediate runs
///     sort.with_chunk_lines(1_000_000);
///     // preferably on the same file system as the output
///     sort.with_tmp_dir(tmp);
///     let stats = sort.sort()?;
///     println!("sorted {} records in {:?}", stats.records(), stats.phase1() + stats.phase2());
///     Ok(())
/// }
/// ```
pub struct Sort {
    input: PathBuf,
    output: PathBuf,
    tmp: PathBuf,
    tmp_prefix: String,
    tasks: usize,
    chunk_lines: usize,
    buffer_size: usize,
    column_index: usize,
    delimiter: Delimiter,
    cancellation: Option<Arc<AtomicBool>>,
}

impl Sort {
    /// Create a default Sort definition.
    ///
    /// * intermediate runs are created under std::env::temp_dir()
    /// * run files are named tmpfile0, tmpfile1, ...
    /// * chunks of 300,000 lines
    /// * I/O buffers of 8192 bytes
    /// * the key is the first column (index 0)
    /// * the delimiter is a TAB ('\t')
    /// * chunks are sorted using all available cores
    pub fn new(input: PathBuf, output: PathBuf) -> Sort {
        Sort {
            input,
            output,
            tmp: std::env::temp_dir(),
            tmp_prefix: "tmpfile".to_string(),
            tasks: 0,
            chunk_lines: 300_000,
            buffer_size: 8192,
            column_index: 0,
            delimiter: Delimiter::default(),
            cancellation: None,
        }
    }

    /// Set the directory for intermediate runs. By default use std::env::temp_dir()
    /// A private directory is created inside and removed when the sort finishes
    pub fn with_tmp_dir(&mut self, tmp: PathBuf) {
        self.tmp = tmp;
    }

    /// Set the prefix of run file names. The default is "tmpfile"
    pub fn with_tmp_prefix(&mut self, tmp_prefix: &str) {
        self.tmp_prefix = tmp_prefix.to_string();
    }

    /// Set the number of threads sorting each chunk. The default is zero which will result in
    /// using all system cores
    pub fn with_tasks(&mut self, tasks: usize) {
        self.tasks = tasks;
    }

    /// Maximum number of lines held in memory and written to a single run
    pub fn with_chunk_lines(&mut self, chunk_lines: usize) {
        self.chunk_lines = chunk_lines;
    }

    /// Size in bytes of the read and write buffers
    pub fn with_buffer_size(&mut self, buffer_size: usize) {
        self.buffer_size = buffer_size;
    }

    /// Set the 0-based index of the key column
    pub fn with_column(&mut self, column_index: usize) {
        self.column_index = column_index;
    }

    /// Set the column delimiter. The default is a literal TAB
    pub fn with_delimiter(&mut self, delimiter: Delimiter) {
        self.delimiter = delimiter;
    }

    /// Abort the sort with [SortError::Cancelled] once `flag` is set
    pub fn with_cancellation(&mut self, flag: Arc<AtomicBool>) {
        self.cancellation = Some(flag);
    }

    /// Sort the input file into the output file
    ///
    /// The soft `RLIMIT_NOFILE` limit of the process is raised for the merge and restored after it.
    /// The limit is shared by the whole process, so concurrent sorts may observe each other's
    /// setting and restore it out of order.
    pub fn sort(&self) -> Result<SortStats, anyhow::Error> {
        let config = self.create_config();
        config.validate()?;
        config.validate_output()?;
        Self::internal_sort(&config)
    }

    /// Check whether the input file is already sorted by the configured column
    pub fn check(&self) -> Result<bool, anyhow::Error> {
        let config = self.create_config();
        config.validate()?;
        Self::internal_check(config.input(), config.extractor(), config.buffer_size())
    }

    fn create_config(&self) -> Config {
        Config::new(
            self.input.clone(),
            self.output.clone(),
            self.tmp.clone(),
            self.tmp_prefix.clone(),
            self.tasks,
            self.chunk_lines,
            self.buffer_size,
            KeyExtractor::new(self.delimiter.clone(), self.column_index),
            self.cancellation.clone(),
        )
    }

    fn internal_sort(config: &Config) -> Result<SortStats, anyhow::Error> {
        log::info!(
            "Start sort of {} into {}, column: {}, delimiter: {}, chunk lines: {}",
            config.input().display(),
            config.output().display(),
            config.extractor().column_index(),
            config.extractor().delimiter(),
            config.chunk_lines()
        );
        // removed with all remaining runs on every exit path
        let run_dir = Builder::new()
            .prefix("column-merge-sort-")
            .tempdir_in(config.tmp())
            .with_context(|| anyhow!("Failed to create run directory in {}", config.tmp().display()))?;

        let start = Instant::now();
        let runs = Self::create_runs(config, run_dir.path())?;
        let phase1 = start.elapsed();
        let records: usize = runs.iter().map(|run| run.records()).sum();
        log::info!("Phase 1 finished in {:.3} sec, {} records in {} runs", phase1.as_secs_f64(), records, runs.len());

        let start = Instant::now();
        let run_count = runs.len();
        let merged = Self::merge_runs(runs, config)?;
        let phase2 = start.elapsed();
        log::info!("Phase 2 finished in {:.3} sec, {} records", phase2.as_secs_f64(), merged);

        Self::remove_run_dir(run_dir);
        log::info!("Finish sort of {}", config.input().display());
        Ok(
            SortStats {
                runs: run_count,
                records: merged,
                phase1,
                phase2,
            }
        )
    }

    fn create_runs(config: &Config, run_dir: &Path) -> Result<Vec<SortedRun>, anyhow::Error> {
        log::info!("Phase 1 started, sorting with {} threads", config.tasks());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.tasks())
            .thread_name(|i| format!("sorting-{}", i))
            .build()?;
        let run_writer = RunWriter::new(run_dir, config.tmp_prefix(), config.buffer_size(), pool);

        let mut runs = Vec::new();
        let mut chunks = ChunkIterator::new(
            config.input(),
            config.chunk_lines(),
            config.buffer_size(),
            config.extractor().clone(),
        )?;
        loop {
            if config.cancelled() {
                log::info!("Phase 1 cancelled after {} runs", runs.len());
                return Err(SortError::Cancelled.into());
            }
            match chunks.next() {
                None => break,
                Some(chunk) => {
                    let run = run_writer.write(runs.len(), chunk?)?;
                    runs.push(run);
                }
            }
        }
        Ok(runs)
    }

    fn merge_runs(runs: Vec<SortedRun>, config: &Config) -> Result<u64, anyhow::Error> {
        log::info!("Phase 2 started");
        let output_error = |e| SortError::OutputWrite { path: config.output().clone(), source: e };
        let output_file = Builder::new()
            .prefix(".column-merge-sort-")
            .suffix(".partial")
            .tempfile_in(config.output_dir())
            .map_err(output_error)?;

        let (current_soft, current_hard) = Self::reserve_open_files(runs.len())?;
        let mut writer = BufWriter::with_capacity(config.buffer_size(), output_file);
        let merged = RunMerger::new(config).merge(runs, &mut writer);
        log::info!("Restore rlimit NOFILE, soft: {}, hard: {}", current_soft, current_hard);
        if let Err(e) = Self::set_rlimits(current_soft, current_hard) {
            log::warn!("Failed to restore rlimit NOFILE: {:#}", e);
        }
        let merged = merged?;

        let output_file = writer.into_inner()
            .map_err(|e| output_error(e.into_error()))?;
        output_file.persist(config.output())
            .map_err(|e| output_error(e.error))?;
        Ok(merged)
    }

    /// Raise the soft NOFILE limit to hold every run open at once. Returns the previous limits.
    fn reserve_open_files(runs: usize) -> Result<(u64, u64), anyhow::Error> {
        let (current_soft, current_hard) = Self::get_rlimits()?;
        log::info!("Current rlimit NOFILE, soft: {}, hard: {}", current_soft, current_hard);
        let new_soft = open_file_budget(runs, current_soft, current_hard)?;
        log::info!("Set new rlimit NOFILE, soft: {}, hard: {}", new_soft, current_hard);
        Self::set_rlimits(new_soft, current_hard)?;
        Ok((current_soft, current_hard))
    }

    fn get_rlimits() -> Result<(u64, u64), anyhow::Error> {
        getrlimit(Resource::NOFILE).with_context(|| "getrlimit")
    }

    fn set_rlimits(soft: u64, hard: u64) -> Result<(), anyhow::Error> {
        setrlimit(Resource::NOFILE, soft, hard)
            .with_context(|| format!("set rlimit NOFILE, soft: {}, hard: {}", soft, hard))?;
        Ok(())
    }

    fn remove_run_dir(run_dir: TempDir) {
        let path = run_dir.path().to_path_buf();
        if let Err(e) = run_dir.close() {
            log::warn!("Failed to remove run directory {}: {}", path.display(), e);
        }
    }

    pub(crate) fn internal_check(path: &PathBuf, extractor: &KeyExtractor, buffer_size: usize) -> Result<bool, anyhow::Error> {
        let file = File::open(path)
            .map_err(|e| SortError::InputRead { path: path.clone(), line_number: 0, source: e })?;
        let mut reader = BufReader::with_capacity(buffer_size, file);
        let mut previous: Option<LineRecord> = None;
        let mut line_number: u64 = 0;
        let mut line = String::new();
        while reader.read_line(&mut line)
            .map_err(|e| SortError::InputRead { path: path.clone(), line_number: line_number + 1, source: e })? != 0 {
            line_number += 1;
            trim_endl(&mut line);
            let current = LineRecord::new(std::mem::take(&mut line), line_number, extractor)?;
            if let Some(previous) = &previous {
                if previous > &current {
                    log::info!("{} is not sorted at line {}", path.display(), line_number);
                    return Ok(false);
                }
            }
            previous = Some(current);
        }
        Ok(true)
    }
}

/// Soft NOFILE limit needed to hold `runs` files open next to [RESERVED_FILES] other descriptors
fn open_file_budget(runs: usize, soft: u64, hard: u64) -> Result<u64, SortError> {
    let required = runs as u64 + RESERVED_FILES;
    if required > hard {
        return Err(SortError::ResourceExhaustion { runs, limit: hard });
    }
    Ok(max(required, soft))
}
