//! The machine-readable outcome record of one pipeline run.
//!
//! The run never aborts on a unit failure; it completes and reports a
//! manifest of per-file and per-language outcomes plus every artifact it
//! wrote. Logging is a human-readable side channel only.

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    Failed,
}

/// Outcome of one file-extraction unit.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub extracted_keys: usize,
}

/// Outcome of one language-translation unit.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageOutcome {
    pub language: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_path: Option<PathBuf>,
}

/// Outcome of wiring the i18n bootstrap into the app entry file.
#[derive(Debug, Clone, Serialize)]
pub struct EntryFileOutcome {
    pub path: PathBuf,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated report for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root_dir: PathBuf,
    pub output_dir: PathBuf,
    pub files: Vec<FileOutcome>,
    pub languages: Vec<LanguageOutcome>,
    /// Present when an app entry file was found and provider wiring was
    /// attempted; absent for Next runs, empty-catalog runs, and projects
    /// with no recognizable entry file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_file: Option<EntryFileOutcome>,
    /// Number of distinct keys in the merged catalog.
    pub catalog_size: usize,
    /// True when no translatable strings were found; a normal terminal
    /// state, not an error.
    pub empty_catalog: bool,
    /// Paths of everything the run wrote (bundles, bootstrap, this report).
    pub artifacts: Vec<PathBuf>,
}

impl RunReport {
    pub fn files_succeeded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == OutcomeStatus::Ok)
            .count()
    }

    pub fn files_failed(&self) -> usize {
        self.files.len() - self.files_succeeded()
    }

    pub fn languages_succeeded(&self) -> usize {
        self.languages
            .iter()
            .filter(|l| l.status == OutcomeStatus::Ok)
            .count()
    }

    pub fn languages_failed(&self) -> usize {
        self.languages.len() - self.languages_succeeded()
    }

    pub fn entry_file_failed(&self) -> bool {
        matches!(
            &self.entry_file,
            Some(outcome) if outcome.status == OutcomeStatus::Failed
        )
    }
}
