use anyhow::Result;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use wordindex::config::{IndexStrategy, IndexerConfig};
use wordindex::{IndexOutcome, Pipeline};

pub struct TestHarness {
    pub temp_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn create_test_file(&self, path: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// Write a zip archive whose members are `(name, body)` pairs
    pub fn create_zip(&self, path: &str, members: &[(&str, &str)]) -> Result<PathBuf> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in members {
            writer.start_file(*name, SimpleFileOptions::default())?;
            writer.write_all(body.as_bytes())?;
        }
        let bytes = writer.finish()?.into_inner();
        self.create_test_file(path, bytes)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings(threads: usize, strategy: IndexStrategy) -> IndexerConfig {
        IndexerConfig {
            indexing_threads: threads,
            strategy,
            ..IndexerConfig::default()
        }
    }

    pub fn run(&self, settings: IndexerConfig) -> Result<IndexOutcome> {
        Ok(Pipeline::new(self.path().to_path_buf(), settings).run()?)
    }

    pub fn counts(&self, settings: IndexerConfig) -> Result<HashMap<String, u64>> {
        Ok(self.run(settings)?.counts)
    }
}

/// Owned copy of an expected map, for terse assertions
pub fn expected(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
    pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
}
