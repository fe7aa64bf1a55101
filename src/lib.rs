//! This crate implements an external merge sort for text files composed of delimited line records,
//! for example TSV or CSV, ordered by the text of a single column.
//!
//! Files that do not fit in memory are sorted in two phases. Phase 1 reads the input in chunks of
//! a bounded number of lines, sorts every chunk in memory using multiple CPU cores and persists it
//! as a sorted run in a temporary directory. Phase 2 merges all runs in a single pass, selecting
//! the smallest head among the runs with a binary heap, and writes the result to the output file.
//!
//! Keys are compared as text, byte by byte. The sort is stable: lines with equal keys keep their
//! input order. A line that does not have the configured column fails the sort, no line is
//! dropped or reordered silently.
//!
//! # Examples
//! ```
//! use std::path::PathBuf;
//! use column_merge_sort::sort::Sort;
//!
//! fn sort_records(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
//!     let mut sort = Sort::new(input, output);
//!
//!     // sort by the second TAB separated column
//!     sort.with_column(1);
//!
//!     // maximum number of lines in memory. Every chunk produces a run that stays open during
//!     // the merge, so larger chunks mean fewer open files.
//!     sort.with_chunk_lines(500_000);
//!
//!     // set the directory for intermediate runs. The default is the system temp dir -
//!     // std::env::temp_dir(), however, for large files it is recommended to provide a dedicated
//!     // directory, preferably on the same file system as the output.
//!     sort.with_tmp_dir(tmp);
//!
//!     let stats = sort.sort()?;
//!     log::info!("phase 1: {:?}, phase 2: {:?}", stats.phase1(), stats.phase2());
//!     Ok(())
//! }
//! ```
//!

pub(crate) mod line_record;
pub(crate) mod sorted_run;
pub(crate) mod config;
pub(crate) mod chunk_iterator;
pub(crate) mod run_writer;
pub(crate) mod run_reader;
pub(crate) mod merger;

pub mod sort;
pub mod key;
pub mod delimiter;
pub mod error;
