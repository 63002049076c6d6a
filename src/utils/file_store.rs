//! File-backed transaction number store

use std::fs;
use std::path::{Path, PathBuf};

use crate::traits::*;
use crate::types::*;

/// Keeps the next unused transaction number as decimal text in a file
#[derive(Debug, Clone)]
pub struct FileSequenceStore {
    path: PathBuf,
}

impl FileSequenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequenceStore for FileSequenceStore {
    fn load(&self) -> LedgerResult<Option<u64>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let next = content.trim().parse::<u64>().map_err(|e| {
            LedgerError::parse(format!("index file {}", self.path.display()), e.to_string())
        })?;
        Ok(Some(next))
    }

    fn save(&mut self, next: u64) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, next.to_string())?;
        Ok(())
    }
}
