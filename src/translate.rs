//! Translation fanout.
//!
//! Takes the aggregated string catalog and issues one translation request
//! per target language. Languages are independent units: each gets its own
//! retry budget, and one language failing permanently never blocks the
//! others. A bundle is only returned when it carries exactly the catalog's
//! key set; there are no partial bundles.

use crate::error::{InvokeError, ParseFailure};
use crate::language::Language;
use crate::model::Generate;
use crate::parse::{parse_model_output, ModelPayload, StringMap};
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::Context;
use futures::future::join_all;
use tracing::info;

/// Translate the catalog into every requested language.
///
/// The source language passes through unchanged as the identity bundle,
/// without a model call. The outer `Result` covers catalog serialization
/// only; per-language faults are carried in the entries, which preserve
/// the order of `languages`.
pub async fn translate_catalog<G: Generate + Sync>(
    generator: &G,
    retry: &RetryConfig,
    catalog: &StringMap,
    languages: &[Language],
) -> anyhow::Result<Vec<(Language, Result<StringMap, InvokeError>)>> {
    // serde_json keeps non-ASCII characters unescaped, matching the
    // human-readable form the locale bundles are persisted in.
    let catalog_json =
        serde_json::to_string_pretty(catalog).context("catalog serialization")?;

    let catalog_json: &str = &catalog_json;
    let units = languages.iter().map(|&language| async move {
        if language.is_source() {
            return (language, Ok(catalog.clone()));
        }
        info!("translating catalog to {} ({})", language.name(), language);
        let result = translate_one(generator, retry, catalog, catalog_json, language).await;
        (language, result)
    });

    Ok(join_all(units).await)
}

/// One retried translation unit for a single language.
async fn translate_one<G: Generate>(
    generator: &G,
    retry: &RetryConfig,
    catalog: &StringMap,
    catalog_json: &str,
    language: Language,
) -> Result<StringMap, InvokeError> {
    let prompt = build_translation_prompt(catalog_json, language);
    let unit_name = format!("translation to {}", language.code());

    let prompt_ref: &str = &prompt;
    with_retry_if(
        retry,
        &unit_name,
        || async move {
            let raw = generator.generate(prompt_ref).await?;
            let bundle = match parse_model_output(&raw)? {
                ModelPayload::Translation(map) => map,
                ModelPayload::Extraction { .. } => {
                    return Err(InvokeError::Malformed(ParseFailure::new(
                        "expected a flat translation map, got an extraction payload",
                        &raw,
                    )))
                }
            };
            validate_key_set(catalog, &bundle, &raw)?;
            Ok(bundle)
        },
        InvokeError::is_retryable,
    )
    .await
}

/// A bundle must cover exactly the catalog's key set; anything else is
/// treated like malformed output and consumes retry budget.
fn validate_key_set(
    catalog: &StringMap,
    bundle: &StringMap,
    raw: &str,
) -> Result<(), ParseFailure> {
    if bundle.len() != catalog.len() || catalog.keys().any(|key| !bundle.contains_key(key)) {
        return Err(ParseFailure::new(
            format!(
                "translated bundle has {} keys but the catalog has {}",
                bundle.len(),
                catalog.len()
            ),
            raw,
        ));
    }
    Ok(())
}

fn build_translation_prompt(catalog_json: &str, language: Language) -> String {
    format!(
        r#"You are a translation assistant. Translate the values of the following JSON key-value pairs into {language}.
Return only the translated JSON, with exactly the same keys as the input. Do not add any extra text or explanations.
Ensure your response is valid JSON that can be parsed with JSON.parse() or equivalent.

Input JSON:
{catalog_json}

Translated JSON (valid JSON only):"#,
        language = language.name(),
        catalog_json = catalog_json,
    )
}
