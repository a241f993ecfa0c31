//! Per-unit error collection and reporting

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Stage where an error occurred during processing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ProcessingStage {
    Enumerate,
    FileRead,
    Decode,
    Index,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStage::Enumerate => write!(f, "Enumerate"),
            ProcessingStage::FileRead => write!(f, "File Read"),
            ProcessingStage::Decode => write!(f, "Decode"),
            ProcessingStage::Index => write!(f, "Index"),
        }
    }
}

/// Error that occurred while processing a single file
#[derive(Debug, Clone)]
pub struct FileError {
    pub path: PathBuf,
    pub error: String,
    pub stage: ProcessingStage,
}

/// Collects errors from every stage thread.
///
/// Recording never fails the run; a failed unit is skipped and the pipeline
/// keeps going.
#[derive(Clone, Default)]
pub struct ErrorCollector {
    errors: Arc<Mutex<Vec<FileError>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error that occurred during processing
    pub fn record(&self, path: PathBuf, error: impl fmt::Display, stage: ProcessingStage) {
        self.errors.lock().push(FileError {
            path,
            error: error.to_string(),
            stage,
        });
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }

    /// Generate an error report
    pub fn get_report(&self) -> ErrorReport {
        ErrorReport::from_errors(&self.errors.lock())
    }
}

/// Detailed error report grouped by stage
#[derive(Debug, Default)]
pub struct ErrorReport {
    pub total_errors: usize,
    pub by_stage: BTreeMap<ProcessingStage, Vec<FileError>>,
}

impl ErrorReport {
    pub fn from_errors(errors: &[FileError]) -> Self {
        let mut by_stage: BTreeMap<ProcessingStage, Vec<FileError>> = BTreeMap::new();
        for error in errors {
            by_stage.entry(error.stage).or_default().push(error.clone());
        }

        Self {
            total_errors: errors.len(),
            by_stage,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Print a summary of the errors to stderr
    pub fn print_summary(&self) {
        if self.total_errors == 0 {
            return;
        }

        eprintln!("{} file(s) could not be indexed:", self.total_errors);
        for (stage, errors) in &self.by_stage {
            eprintln!("  {}: {} errors", stage, errors.len());

            // Show up to 5 examples per stage
            for error in errors.iter().take(5) {
                eprintln!("    - {}: {}", error.path.display(), error.error);
            }

            if errors.len() > 5 {
                eprintln!("    ... and {} more", errors.len() - 5);
            }
        }
    }
}
