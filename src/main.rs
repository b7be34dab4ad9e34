use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use autoi18n::pipeline::{run_pipeline, RunOptions};
use autoi18n::{github, ChatClient, Config};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file (ignored in production/GitHub Actions)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("autoi18n=info".parse()?),
        )
        .init();

    let args = CliArgs::parse(std::env::args().skip(1))?;

    info!("Starting i18n automation run for {}", args.root_dir.display());

    // Load configuration from environment
    let config = Config::from_env()?;
    let options = RunOptions::from_config(&config, args.root_dir, args.output_dir)?;
    let client = ChatClient::new(&config);

    // Step 1: Extract, translate, and persist
    let report = run_pipeline(&client, &options).await?;

    info!(
        "Extraction: {}/{} files succeeded",
        report.files_succeeded(),
        report.files.len()
    );
    if report.empty_catalog {
        info!("No translatable strings found, nothing more to do");
        return Ok(exit_code(&report));
    }
    info!(
        "Translation: {}/{} languages succeeded ({} strings in the catalog)",
        report.languages_succeeded(),
        report.languages.len(),
        report.catalog_size
    );

    // Step 2: Optionally open a pull request with the generated artifacts
    if let (Some(token), Some(source_repo)) = (&config.github_token, &config.source_repo) {
        info!("Opening pull request against {}", source_repo);
        let client = github::GithubClient::new(token.clone());
        match github::run_pr_workflow(&client, source_repo, &report.output_dir).await? {
            Some(outcome) => info!("Pull request ready: {}", outcome.url),
            None => info!("No changes to propose, pull request skipped"),
        }
    }

    Ok(exit_code(&report))
}

/// Success only when every unit of work succeeded; partial runs still
/// produce artifacts but signal the failures to the caller.
fn exit_code(report: &autoi18n::RunReport) -> ExitCode {
    if report.files_failed() == 0 && report.languages_failed() == 0 && !report.entry_file_failed()
    {
        ExitCode::SUCCESS
    } else {
        warn!(
            "run finished with {} failed file(s), {} failed language(s), entry wiring failed: {}",
            report.files_failed(),
            report.languages_failed(),
            report.entry_file_failed()
        );
        ExitCode::FAILURE
    }
}

struct CliArgs {
    root_dir: PathBuf,
    output_dir: Option<PathBuf>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut root_dir = None;
        let mut output_dir = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => {
                    let value = args.next().context("--out requires a directory")?;
                    output_dir = Some(PathBuf::from(value));
                }
                "--help" | "-h" => {
                    bail!("usage: autoi18n <project-dir> [--out <output-dir>]");
                }
                flag if flag.starts_with('-') => bail!("unknown flag: {}", flag),
                positional => {
                    if root_dir.is_some() {
                        bail!("unexpected extra argument: {}", positional);
                    }
                    root_dir = Some(PathBuf::from(positional));
                }
            }
        }

        Ok(Self {
            root_dir: root_dir.context("usage: autoi18n <project-dir> [--out <output-dir>]")?,
            output_dir,
        })
    }
}
