use std::path::PathBuf;

/// Handle of a run persisted by phase 1
#[derive(Debug)]
pub(crate) struct SortedRun {
    index: usize,
    path: PathBuf,
    records: usize,
}

impl SortedRun {
    pub(crate) fn new(index: usize, path: PathBuf, records: usize) -> SortedRun {
        SortedRun {
            index,
            path,
            records,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn path(&self) -> &PathBuf {
        &self.path
    }

    pub(crate) fn records(&self) -> usize {
        self.records
    }
}
