//! Batch orchestration.
//!
//! Drives a whole run: enumerate candidate files, fan extraction out over a
//! bounded worker pool, merge the per-file string maps into the catalog,
//! fan translation out per language, persist bundles and the bootstrap
//! artifact, and aggregate everything into a [`RunReport`]. Faults never
//! escape a unit's boundary: the orchestrator only observes per-unit
//! success or failure, and retries are scoped to units, never the batch.

use crate::config::{Config, Framework};
use crate::emit::emit_bootstrap;
use crate::extract::{process_file, FileExtraction};
use crate::language::Language;
use crate::model::Generate;
use crate::parse::StringMap;
use crate::provider;
use crate::report::{EntryFileOutcome, FileOutcome, LanguageOutcome, OutcomeStatus, RunReport};
use crate::retry::RetryConfig;
use crate::scan::find_source_files;
use crate::translate::translate_catalog;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Parameters for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root_dir: PathBuf,
    pub output_dir: PathBuf,
    pub framework: Framework,
    pub target_languages: Vec<Language>,
    pub file_extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub retry: RetryConfig,
    pub max_concurrent_files: usize,
}

impl RunOptions {
    /// Build run options from the environment-derived config, validating
    /// the configured language codes up front.
    pub fn from_config(
        config: &Config,
        root_dir: PathBuf,
        output_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let target_languages = config
            .target_languages
            .iter()
            .map(|code| Language::from_code(code))
            .collect::<Result<Vec<_>>>()
            .context("invalid TARGET_LANGUAGES")?;
        let output_dir = output_dir.unwrap_or_else(|| root_dir.join("i18n_output"));

        Ok(Self {
            root_dir,
            output_dir,
            framework: config.framework,
            target_languages,
            file_extensions: config.file_extensions.clone(),
            exclude_dirs: config.exclude_dirs.clone(),
            retry: RetryConfig::model_call(),
            max_concurrent_files: config.max_concurrent_files.max(1),
        })
    }
}

/// Run the full extraction-and-translation pipeline.
///
/// Always completes with a report unless the environment itself is broken
/// (unreadable root, unwritable output directory). Individual file or
/// language failures are recorded in the report, with the failed unit's
/// pre-run state left untouched.
pub async fn run_pipeline<G: Generate + Sync>(
    generator: &G,
    opts: &RunOptions,
) -> Result<RunReport> {
    let files: Vec<PathBuf> =
        find_source_files(&opts.root_dir, &opts.file_extensions, &opts.exclude_dirs)
            .into_iter()
            // A previous run's output may live under the root; never re-process it.
            .filter(|path| !path.starts_with(&opts.output_dir))
            .collect();

    info!(
        "found {} candidate files under {}",
        files.len(),
        opts.root_dir.display()
    );

    tokio::fs::create_dir_all(&opts.output_dir)
        .await
        .with_context(|| format!("failed to create {}", opts.output_dir.display()))?;

    // Extraction fan-out over a bounded worker pool. Results carry their
    // index so the catalog merge below happens in the fixed sorted-file
    // order regardless of completion order.
    let mut results: Vec<(usize, Result<FileExtraction>)> =
        stream::iter(files.iter().enumerate())
            .map(move |(idx, path)| async move {
                (idx, process_file(generator, &opts.retry, path, opts.framework).await)
            })
            .buffer_unordered(opts.max_concurrent_files)
            .collect()
            .await;
    results.sort_by_key(|(idx, _)| *idx);

    let mut catalog = StringMap::new();
    let mut file_outcomes = Vec::with_capacity(files.len());
    let mut artifacts = Vec::new();

    for (path, (_, result)) in files.iter().zip(results) {
        match result {
            Ok(extraction) => {
                let out_path = mirror_path(&opts.root_dir, &opts.output_dir, path)?;
                if let Some(parent) = out_path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                tokio::fs::write(&out_path, &extraction.updated_code)
                    .await
                    .with_context(|| format!("failed to write {}", out_path.display()))?;
                artifacts.push(out_path);

                let extracted_keys = extraction.strings.len();
                // Later files win on key collision.
                for (key, value) in extraction.strings {
                    catalog.insert(key, value);
                }
                file_outcomes.push(FileOutcome {
                    path: path.clone(),
                    status: OutcomeStatus::Ok,
                    error: None,
                    extracted_keys,
                });
            }
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                file_outcomes.push(FileOutcome {
                    path: path.clone(),
                    status: OutcomeStatus::Failed,
                    error: Some(format!("{:#}", e)),
                    extracted_keys: 0,
                });
            }
        }
    }

    if catalog.is_empty() {
        info!("no translatable strings found; run complete");
        let mut report = RunReport {
            root_dir: opts.root_dir.clone(),
            output_dir: opts.output_dir.clone(),
            files: file_outcomes,
            languages: Vec::new(),
            entry_file: None,
            catalog_size: 0,
            empty_catalog: true,
            artifacts,
        };
        write_report(&mut report, &opts.output_dir).await?;
        return Ok(report);
    }

    info!("extracted {} distinct strings", catalog.len());

    // Persist the catalog as the source-language bundle.
    let locales_dir = opts.output_dir.join("locales");
    tokio::fs::create_dir_all(&locales_dir)
        .await
        .with_context(|| format!("failed to create {}", locales_dir.display()))?;

    let source = Language::source();
    let source_bundle_path = locales_dir.join(format!("{}.json", source.code()));
    write_bundle(&source_bundle_path, &catalog).await?;
    artifacts.push(source_bundle_path.clone());

    // Translation fan-out; a failed language is recorded but nothing of it
    // is persisted.
    let translations =
        translate_catalog(generator, &opts.retry, &catalog, &opts.target_languages).await?;

    let mut language_outcomes = Vec::new();
    let mut bootstrap_languages = vec![source];

    for (language, result) in translations {
        if language.is_source() {
            // Identity bundle, already on disk as the catalog.
            language_outcomes.push(LanguageOutcome {
                language: language.code().to_string(),
                status: OutcomeStatus::Ok,
                error: None,
                bundle_path: Some(source_bundle_path.clone()),
            });
            continue;
        }
        match result {
            Ok(bundle) => {
                let bundle_path = locales_dir.join(format!("{}.json", language.code()));
                write_bundle(&bundle_path, &bundle).await?;
                artifacts.push(bundle_path.clone());
                bootstrap_languages.push(language);
                language_outcomes.push(LanguageOutcome {
                    language: language.code().to_string(),
                    status: OutcomeStatus::Ok,
                    error: None,
                    bundle_path: Some(bundle_path),
                });
            }
            Err(e) => {
                warn!("translation to {} failed permanently: {}", language.code(), e);
                language_outcomes.push(LanguageOutcome {
                    language: language.code().to_string(),
                    status: OutcomeStatus::Failed,
                    error: Some(e.to_string()),
                    bundle_path: None,
                });
            }
        }
    }

    // The bootstrap artifact binds every language that has a bundle on disk.
    let bootstrap = emit_bootstrap(&bootstrap_languages, opts.framework)?;
    let bootstrap_path = opts.output_dir.join(opts.framework.bootstrap_file_name());
    tokio::fs::write(&bootstrap_path, bootstrap)
        .await
        .with_context(|| format!("failed to write {}", bootstrap_path.display()))?;
    artifacts.push(bootstrap_path);

    // Wire the bootstrap into the app entry file. Only React needs this;
    // the Next config file is picked up by the framework itself.
    let mut entry_outcome = None;
    if opts.framework == Framework::React {
        let entry_candidates: Vec<PathBuf> = find_source_files(
            &opts.root_dir,
            &provider::ENTRY_EXTENSIONS.map(str::to_string),
            &opts.exclude_dirs,
        )
        .into_iter()
        .filter(|path| !path.starts_with(&opts.output_dir))
        .collect();

        match provider::find_entry_file(&entry_candidates).await {
            Some(entry) => {
                match provider::wire_entry_file(generator, &opts.retry, &entry).await {
                    Ok(()) => {
                        let out_path = mirror_path(&opts.root_dir, &opts.output_dir, &entry)?;
                        if let Some(parent) = out_path.parent() {
                            tokio::fs::create_dir_all(parent)
                                .await
                                .with_context(|| format!("failed to create {}", parent.display()))?;
                        }
                        tokio::fs::copy(&entry, &out_path)
                            .await
                            .with_context(|| format!("failed to copy to {}", out_path.display()))?;
                        artifacts.push(out_path);
                        entry_outcome = Some(EntryFileOutcome {
                            path: entry,
                            status: OutcomeStatus::Ok,
                            error: None,
                        });
                    }
                    Err(e) => {
                        warn!("provider wiring of {} failed: {:#}", entry.display(), e);
                        entry_outcome = Some(EntryFileOutcome {
                            path: entry,
                            status: OutcomeStatus::Failed,
                            error: Some(format!("{:#}", e)),
                        });
                    }
                }
            }
            None => warn!("no app entry file rendering <App /> found; wire the bootstrap manually"),
        }
    }

    let mut report = RunReport {
        root_dir: opts.root_dir.clone(),
        output_dir: opts.output_dir.clone(),
        files: file_outcomes,
        languages: language_outcomes,
        entry_file: entry_outcome,
        catalog_size: catalog.len(),
        empty_catalog: false,
        artifacts,
    };
    write_report(&mut report, &opts.output_dir).await?;

    info!(
        "run complete: {}/{} files extracted, {}/{} languages translated",
        report.files_succeeded(),
        report.files.len(),
        report.languages_succeeded(),
        report.languages.len()
    );

    Ok(report)
}

/// Map a source path to its mirror under the output directory.
fn mirror_path(root: &Path, output: &Path, file: &Path) -> Result<PathBuf> {
    let rel = file
        .strip_prefix(root)
        .with_context(|| format!("{} is not under {}", file.display(), root.display()))?;
    Ok(output.join(rel))
}

/// Whole-file write of a locale bundle: pretty-printed UTF-8 JSON with
/// non-ASCII characters preserved unescaped.
async fn write_bundle(path: &Path, map: &StringMap) -> Result<()> {
    let mut json = serde_json::to_string_pretty(map).context("bundle serialization")?;
    json.push('\n');
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

async fn write_report(report: &mut RunReport, output_dir: &Path) -> Result<()> {
    let path = output_dir.join("run-report.json");
    report.artifacts.push(path.clone());
    let mut json = serde_json::to_string_pretty(report).context("report serialization")?;
    json.push('\n');
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}
