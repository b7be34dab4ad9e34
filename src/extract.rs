//! Per-file string extraction.
//!
//! Drives one source file through prompt construction, model invocation,
//! payload recovery, and the rewrite of the file on disk. The model call and
//! the parse share one retry budget: garbage output is retried exactly like
//! a transport fault. The file is only ever written after a fully validated
//! payload is in hand, so a failed unit leaves disk state untouched.

use crate::config::Framework;
use crate::error::{InvokeError, ParseFailure};
use crate::model::Generate;
use crate::parse::{parse_model_output, ModelPayload, StringMap};
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Result of a successful extraction round-trip for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileExtraction {
    pub updated_code: String,
    pub strings: StringMap,
}

/// Extract user-facing strings from one file and rewrite it in place.
///
/// On success the file on disk is mutated exactly once, with the complete
/// rewritten content. On failure the original content is untouched and the
/// error is reported to the caller; the batch continues without this file.
pub async fn process_file<G: Generate>(
    generator: &G,
    retry: &RetryConfig,
    path: &Path,
    framework: Framework,
) -> Result<FileExtraction> {
    let code = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    debug!("processing {} ({} bytes)", path.display(), code.len());

    let prompt = build_extraction_prompt(&code, framework);
    let unit_name = format!("extraction of {}", path.display());

    let prompt_ref: &str = &prompt;
    let extraction = with_retry_if(
        retry,
        &unit_name,
        || async move {
            let raw = generator.generate(prompt_ref).await?;
            match parse_model_output(&raw)? {
                ModelPayload::Extraction {
                    updated_code,
                    strings,
                } => Ok(FileExtraction {
                    updated_code,
                    strings,
                }),
                ModelPayload::Translation(_) => Err(InvokeError::Malformed(ParseFailure::new(
                    "expected an extraction payload, got a flat map",
                    &raw,
                ))),
            }
        },
        InvokeError::is_retryable,
    )
    .await?;

    tokio::fs::write(path, &extraction.updated_code)
        .await
        .with_context(|| format!("failed to rewrite {}", path.display()))?;

    info!(
        "rewrote {} ({} strings extracted)",
        path.display(),
        extraction.strings.len()
    );

    Ok(extraction)
}

/// Build the extraction prompt embedding the file's full content.
fn build_extraction_prompt(code: &str, framework: Framework) -> String {
    format!(
        r#"You are an internationalization assistant for a {framework} project.
Extract all user-facing text such as headers, titles, button labels, paragraphs, alt text, and aria-labels from the following code.
Replace each occurrence with t('key') from {library}, and import useTranslation from '{library}' where needed.

Here is the code to process:

```jsx
{code}
```

RESPONSE FORMAT:
Your response must be valid JSON with exactly these two fields:
{{
    "updated_code": "// The complete modified code with t() functions",
    "i18n_json": {{
        "key1": "Original text 1",
        "key2": "Original text 2"
    }}
}}

IMPORTANT RULES:
1. The output must be VALID JSON - double quotes only, no comments, no trailing commas.
2. The "updated_code" must be the COMPLETE code, without syntax errors and with nothing elided or commented out.
3. The "i18n_json" field must contain ALL extracted strings.
4. Create logical keys based on the content (e.g. "welcomeMessage", "submitButton").
5. Process only human-readable text inside JSX, alt attributes, and aria-labels.
6. DO NOT modify dynamic expressions, component props, or JavaScript code.
7. Make sure to properly escape quotes in the JSON output.

YOUR RESPONSE MUST CONTAIN ONLY THE JSON OBJECT - NO EXPLANATIONS OR MARKDOWN FORMATTING."#,
        framework = framework,
        library = framework.i18n_library(),
        code = code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    enum Step {
        Text(&'static str),
        Status(u16),
    }

    /// Replays a fixed sequence of model responses.
    struct ScriptedGenerator {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicU32,
    }

    impl ScriptedGenerator {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Generate for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, InvokeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            match step {
                Step::Text(text) => Ok(text.to_string()),
                Step::Status(status) => Err(InvokeError::Api {
                    status,
                    body: "scripted".to_string(),
                }),
            }
        }
    }

    fn quick_retry() -> RetryConfig {
        RetryConfig::new(3, Duration::from_millis(5))
    }

    const VALID_PAYLOAD: &str = r#"{"updated_code": "const title = t('title');", "i18n_json": {"title": "Hello"}}"#;

    #[tokio::test]
    async fn test_success_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.jsx");
        std::fs::write(&path, "const title = \"Hello\";").unwrap();

        let generator = ScriptedGenerator::new(vec![Step::Text(VALID_PAYLOAD)]);
        let extraction = process_file(&generator, &quick_retry(), &path, Framework::React)
            .await
            .expect("Should succeed");

        assert_eq!(extraction.updated_code, "const title = t('title');");
        assert_eq!(extraction.strings["title"], "Hello");
        assert_eq!(generator.calls(), 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "const title = t('title');"
        );
    }

    #[tokio::test]
    async fn test_malformed_output_is_retried() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.jsx");
        std::fs::write(&path, "original").unwrap();

        let generator = ScriptedGenerator::new(vec![
            Step::Text("sorry, I cannot help with that"),
            Step::Text(VALID_PAYLOAD),
        ]);
        let extraction = process_file(&generator, &quick_retry(), &path, Framework::React)
            .await
            .expect("Should succeed after retry");

        assert_eq!(generator.calls(), 2);
        assert_eq!(extraction.strings.len(), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.jsx");
        std::fs::write(&path, "original content").unwrap();

        let generator = ScriptedGenerator::new(vec![
            Step::Text("garbage"),
            Step::Text("more garbage"),
            Step::Text("still garbage"),
        ]);
        let result = process_file(&generator, &quick_retry(), &path, Framework::React).await;

        assert!(result.is_err());
        assert_eq!(generator.calls(), 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original content");
    }

    #[tokio::test]
    async fn test_transient_fault_and_parse_failure_share_budget() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.jsx");
        std::fs::write(&path, "original").unwrap();

        let generator = ScriptedGenerator::new(vec![
            Step::Status(503),
            Step::Text("not json"),
            Step::Text(VALID_PAYLOAD),
        ]);
        let result = process_file(&generator, &quick_retry(), &path, Framework::React).await;

        assert!(result.is_ok());
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_client_error_fails_without_retry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.jsx");
        std::fs::write(&path, "original").unwrap();

        let generator = ScriptedGenerator::new(vec![Step::Status(401)]);
        let result = process_file(&generator, &quick_retry(), &path, Framework::React).await;

        assert!(result.is_err());
        assert_eq!(generator.calls(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_translation_shaped_response_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.jsx");
        std::fs::write(&path, "original").unwrap();

        // A flat map is a valid payload but the wrong shape for extraction.
        let generator = ScriptedGenerator::new(vec![
            Step::Text(r#"{"title": "Hello"}"#),
            Step::Text(r#"{"title": "Hello"}"#),
            Step::Text(r#"{"title": "Hello"}"#),
        ]);
        let result = process_file(&generator, &quick_retry(), &path, Framework::React).await;

        assert!(result.is_err());
        assert_eq!(generator.calls(), 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.jsx");

        let generator = ScriptedGenerator::new(vec![]);
        let result = process_file(&generator, &quick_retry(), &path, Framework::React).await;

        assert!(result.is_err());
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_prompt_embeds_code_and_framework() {
        let prompt = build_extraction_prompt("const x = 1;", Framework::React);

        assert!(prompt.contains("React project"));
        assert!(prompt.contains("react-i18next"));
        assert!(prompt.contains("const x = 1;"));
        assert!(prompt.contains("updated_code"));
        assert!(prompt.contains("i18n_json"));
        assert!(prompt.contains("ONLY THE JSON OBJECT"));
    }

    #[test]
    fn test_prompt_uses_next_library_for_next() {
        let prompt = build_extraction_prompt("code", Framework::Next);
        assert!(prompt.contains("next-i18next"));
        assert!(prompt.contains("Next project"));
    }
}
