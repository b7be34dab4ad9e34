//! Wiring the emitted bootstrap into the app entry file.
//!
//! For a React project the generated `i18n.js` is inert until the app's
//! entry file imports it and wraps `<App />` in an `I18nextProvider`. This
//! module locates that entry file, performs the import-and-wrap rewrite as
//! a pure text transform, and then runs a best-effort model pass over the
//! result to correct any syntax damage the transform may have caused. The
//! model pass is advisory: if it fails permanently, the wired (unfixed)
//! content is kept, since a missing provider is worse than odd whitespace.

use crate::error::{InvokeError, ParseFailure};
use crate::model::Generate;
use crate::parse::strip_code_fences;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const I18N_IMPORTS: &str = "import { I18nextProvider } from \"react-i18next\";\nimport i18n from \"./i18n\";";

/// Entry files are searched across the standard front-end extensions,
/// independent of the run's configured extraction extensions.
pub const ENTRY_EXTENSIONS: [&str; 4] = [".js", ".jsx", ".ts", ".tsx"];

/// Well-known entry file names, checked in order before falling back to
/// the first candidate.
const ENTRY_PRIORITY: [&str; 4] = ["index.js", "main.js", "index.tsx", "main.tsx"];

/// Find the app entry file: the first file rendering `<App />`, preferring
/// well-known entry names. Unreadable files are skipped.
pub async fn find_entry_file(files: &[PathBuf]) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    for path in files {
        match tokio::fs::read_to_string(path).await {
            Ok(content) if content.contains("<App />") => candidates.push(path.clone()),
            Ok(_) => {}
            Err(e) => debug!("skipping unreadable {}: {}", path.display(), e),
        }
    }

    for name in ENTRY_PRIORITY {
        if let Some(found) = candidates
            .iter()
            .find(|path| path.file_name().and_then(|n| n.to_str()) == Some(name))
        {
            return Some(found.clone());
        }
    }
    candidates.into_iter().next()
}

/// Pure text transform: prepend the i18n imports (unless the file already
/// touches i18next) and wrap every `<App />` occurrence in a provider.
pub fn wire_provider(content: &str) -> String {
    static APP_TAG: OnceLock<Regex> = OnceLock::new();
    static BLANK_AFTER_OPEN: OnceLock<Regex> = OnceLock::new();
    static GAP_BEFORE_CLOSE: OnceLock<Regex> = OnceLock::new();

    let content = if content.contains("i18next") {
        content.to_string()
    } else {
        format!("{}\n\n{}", I18N_IMPORTS, content)
    };

    let app_tag = APP_TAG.get_or_init(|| Regex::new(r"(\s*)(<App\s*/>)").unwrap());
    let wrapped = app_tag.replace_all(
        &content,
        "$1<I18nextProvider i18n={i18n}>\n$1  $2\n$1</I18nextProvider>",
    );

    // The wrap duplicates the captured leading whitespace; collapse the
    // blank lines it leaves inside the provider element.
    let blank = BLANK_AFTER_OPEN
        .get_or_init(|| Regex::new(r"(<I18nextProvider[^>]*>\n)\s*\n").unwrap());
    let tightened = blank.replace_all(&wrapped, "$1");

    let gap = GAP_BEFORE_CLOSE.get_or_init(|| Regex::new(r"\n\s*(</I18nextProvider>)").unwrap());
    gap.replace_all(&tightened, "$1").into_owned()
}

/// One retried model pass asking for syntax corrections to the wired code.
async fn fix_syntax<G: Generate>(
    generator: &G,
    retry: &RetryConfig,
    code: &str,
) -> Result<String, InvokeError> {
    let prompt = build_syntax_fix_prompt(code);

    let prompt_ref: &str = &prompt;
    with_retry_if(
        retry,
        "syntax fix of entry file",
        || async move {
            let raw = generator.generate(prompt_ref).await?;
            let fixed = strip_code_fences(&raw).trim().to_string();
            if fixed.is_empty() {
                return Err(InvokeError::Malformed(ParseFailure::new(
                    "syntax fix produced no code",
                    &raw,
                )));
            }
            Ok(fixed)
        },
        InvokeError::is_retryable,
    )
    .await
}

/// Rewrite `entry` in place: wire the provider, then apply the model's
/// syntax pass. A permanently failing syntax pass falls back to the wired
/// content rather than failing the unit.
pub async fn wire_entry_file<G: Generate>(
    generator: &G,
    retry: &RetryConfig,
    entry: &Path,
) -> Result<()> {
    let content = tokio::fs::read_to_string(entry)
        .await
        .with_context(|| format!("failed to read {}", entry.display()))?;

    let wired = wire_provider(&content);

    let fixed = match fix_syntax(generator, retry, &wired).await {
        Ok(fixed) => fixed,
        Err(e) => {
            warn!(
                "syntax fix for {} failed permanently ({}), keeping wired content",
                entry.display(),
                e
            );
            wired
        }
    };

    let mut output = fixed;
    output.push('\n');
    tokio::fs::write(entry, output)
        .await
        .with_context(|| format!("failed to rewrite {}", entry.display()))?;

    info!("wired i18n provider into {}", entry.display());
    Ok(())
}

fn build_syntax_fix_prompt(code: &str) -> String {
    format!(
        r#"You are an expert JavaScript and TypeScript developer.
The following code has been modified to include i18n support, but it may contain syntax errors.
Your task is to:
- Check for syntax errors.
- If there are errors, correct them while preserving the intended functionality.
- If there are no errors, return the code as is.

IMPORTANT: Do NOT add any unnecessary text, comments, or language annotations.

### Code:
```js
{code}
```

RESPONSE FORMAT:
Return only the corrected code inside ```js ... ``` without extra explanations."#,
        code = code,
    )
}
