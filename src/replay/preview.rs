// src/replay/preview.rs

use super::group::PlannedCommit;
use super::module_path::split_module_name;
use super::ReplayError;
use crate::model::ModuleCommitCounter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Human-readable log of every commit a run makes (or would make).
pub struct PreviewLog<W: Write> {
    out: W,
    path: PathBuf,
}

impl PreviewLog<BufWriter<File>> {
    /// Truncates any log left by a previous run.
    pub fn create(path: &Path) -> Result<Self, ReplayError> {
        let file = File::create(path).map_err(|source| ReplayError::io(path, source))?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> PreviewLog<W> {
    pub fn new(out: W, path: &Path) -> Self {
        Self { out, path: path.to_path_buf() }
    }

    pub fn write_commit(&mut self, planned: &PlannedCommit<'_>) -> Result<(), ReplayError> {
        let mut block = format!("--- Commit Preview for {} ---\n{}\nFiles:\n", planned.group.date, planned.message);
        for file in &planned.group.files {
            block.push_str(&format!("  - {}\n", file.relative.display()));
        }
        block.push('\n');
        self.write(&block)
    }

    pub fn write_test_mode_notice(&mut self) -> Result<(), ReplayError> {
        self.write("[TEST MODE] No files copied or commits made.\n")
    }

    /// Tab-separated totals per module, then the grand total.
    pub fn write_summary(&mut self, counter: &ModuleCommitCounter) -> Result<(), ReplayError> {
        let mut lines = vec![
            "\n--- Commit Totals per Module-Year ---".to_string(),
            "Year\tModule Code\tModule Name\tTotal Commits".to_string(),
        ];
        for (module, count) in counter.iter() {
            let (code, name) = split_module_name(&module.module);
            lines.push(format!("{}\t{code}\t{name}\t{count}", module.year));
        }
        lines.push(format!("\nTotal Commits Across All Modules: {}", counter.total()));
        self.write(&lines.join("\n"))
    }

    pub fn finish(mut self) -> Result<W, ReplayError> {
        self.out.flush().map_err(|source| ReplayError::io(&self.path, source))?;
        Ok(self.out)
    }

    fn write(&mut self, text: &str) -> Result<(), ReplayError> {
        self.out.write_all(text.as_bytes()).map_err(|source| ReplayError::io(&self.path, source))
    }
}
