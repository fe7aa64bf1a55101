use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by [Sort](crate::sort::Sort).
///
/// The public operations return `anyhow::Error`; the root cause is always one of these variants
/// and can be recovered with `error.downcast_ref::<SortError>()`.
#[derive(Error, Debug)]
pub enum SortError {
    /// A line does not contain the configured column
    #[error("line {line_number}: requested column {column_index} but the line has only {fields} fields, line: {line:?}")]
    MalformedRecord {
        line_number: u64,
        column_index: usize,
        fields: usize,
        line: String,
    },

    /// Invalid sort configuration, detected before any file is touched
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to read input {path} at line {line_number}")]
    InputRead {
        path: PathBuf,
        line_number: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read run {run_index}")]
    RunRead {
        run_index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write run {run_index}")]
    RunWrite {
        run_index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output {path}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The merge needs more open files than the process may hold
    #[error("merging {runs} runs requires more open files than the limit of {limit}, increase the chunk size to produce fewer runs")]
    ResourceExhaustion {
        runs: usize,
        limit: u64,
    },

    #[error("sort cancelled")]
    Cancelled,
}
