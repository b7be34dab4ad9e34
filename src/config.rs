use anyhow::{bail, Context, Result};
use std::fmt;
use std::str::FromStr;

/// UI framework the rewritten code targets. Affects the extraction prompt
/// and the shape of the emitted bootstrap artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    React,
    Next,
}

impl Framework {
    /// i18n library the rewritten code should import from.
    pub fn i18n_library(&self) -> &'static str {
        match self {
            Framework::React => "react-i18next",
            Framework::Next => "next-i18next",
        }
    }

    /// File name of the bootstrap artifact.
    pub fn bootstrap_file_name(&self) -> &'static str {
        match self {
            Framework::React => "i18n.js",
            Framework::Next => "next-i18next.config.js",
        }
    }
}

impl FromStr for Framework {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "react" => Ok(Framework::React),
            "next" | "nextjs" => Ok(Framework::Next),
            other => bail!("unknown framework: '{}' (expected 'react' or 'next')", other),
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framework::React => f.write_str("React"),
            Framework::Next => f.write_str("Next"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Model API
    pub model_api_key: String,
    pub model_name: String,
    pub model_api_url: String,
    pub request_timeout_secs: u64,

    // Pipeline tuning
    pub max_concurrent_files: usize,

    // Run parameters
    pub target_languages: Vec<String>,
    pub file_extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub framework: Framework,

    // GitHub automation (optional; the PR workflow runs only when both are set)
    pub github_token: Option<String>,
    pub source_repo: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            model_api_key: std::env::var("MODEL_API_KEY").context("MODEL_API_KEY not set")?,
            model_name: std::env::var("MODEL_NAME")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            model_api_url: std::env::var("MODEL_API_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1/chat/completions".to_string()),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),

            max_concurrent_files: std::env::var("MAX_CONCURRENT_FILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),

            target_languages: std::env::var("TARGET_LANGUAGES")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| {
                    vec!["en".to_string(), "ar".to_string(), "fr".to_string()]
                }),
            file_extensions: std::env::var("FILE_EXTENSIONS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| default_extensions()),
            exclude_dirs: std::env::var("EXCLUDE_DIRS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| default_exclude_dirs()),
            framework: std::env::var("FRAMEWORK")
                .unwrap_or_else(|_| "react".to_string())
                .parse()?,

            github_token: std::env::var("GITHUB_TOKEN").ok(),
            source_repo: std::env::var("SOURCE_REPO").ok(),
        })
    }
}

/// Split a comma-separated env value, dropping empty segments.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_extensions() -> Vec<String> {
    [".jsx", ".tsx", ".js", ".ts"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Directory names skipped during source enumeration.
fn default_exclude_dirs() -> Vec<String> {
    ["node_modules", ".next", "dist", "build", "out", ".git"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
