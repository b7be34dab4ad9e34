//! Automated internationalization pipeline.
//!
//! Walks a front-end project, asks a text-generation model to extract
//! user-facing strings from each source file and rewrite it with i18n
//! lookups, translates the merged string catalog into the configured
//! languages, and persists locale bundles plus a framework bootstrap file.
//! Optionally opens a GitHub pull request carrying the generated artifacts.

pub mod config;
pub mod emit;
pub mod error;
pub mod extract;
pub mod github;
pub mod language;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod retry;
pub mod scan;
pub mod translate;

pub use config::{Config, Framework};
pub use error::{InvokeError, ParseFailure};
pub use language::Language;
pub use model::{ChatClient, Generate};
pub use pipeline::{run_pipeline, RunOptions};
pub use report::RunReport;
pub use retry::RetryConfig;
