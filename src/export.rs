//! Per-run results table.
//!
//! A comma-separated file with the header `run,best fitness` and one row per
//! completed run. The "fitness" column holds the tour length, matching the
//! table layout consumed by the comparison scripts.

use crate::error::{Error, Result};
use crate::ga::{Observer, RunResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: &str = "run,best fitness";

/// Appends one row per finished run to a CSV file.
#[derive(Debug)]
pub struct ResultsExport {
    path: PathBuf,
}

impl ResultsExport {
    /// Creates (or truncates) the file and writes the header.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        writeln!(file, "{HEADER}").map_err(|e| Error::io(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `run,best_length`. The file is reopened per row so rows
    /// written by earlier runs survive a crash in a later one.
    pub fn append(&self, result: &RunResult) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        writeln!(file, "{},{}", result.run, result.best_length)
            .map_err(|e| Error::io(&self.path, e))
    }
}

impl Observer for ResultsExport {
    fn on_run_complete(&mut self, result: &RunResult) -> Result<()> {
        self.append(result)
    }
}
