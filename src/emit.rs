//! Bootstrap artifact generation.
//!
//! Renders the static initialization file that wires the emitted locale
//! bundles into the target framework. Pure string building: deterministic
//! for a given input, no I/O.

use crate::config::Framework;
use crate::language::Language;
use anyhow::{bail, Result};

/// Render the i18n bootstrap artifact for `framework`, binding one resource
/// per language in the given order. An empty language list is invalid.
pub fn emit_bootstrap(languages: &[Language], framework: Framework) -> Result<String> {
    if languages.is_empty() {
        bail!("cannot emit an i18n bootstrap for an empty language list");
    }

    match framework {
        Framework::React => Ok(emit_react(languages)),
        Framework::Next => Ok(emit_next(languages)),
    }
}

fn emit_react(languages: &[Language]) -> String {
    let imports = languages
        .iter()
        .map(|lang| {
            format!(
                "import {code}Translation from \"./locales/{code}.json\";",
                code = lang.code()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let resources = languages
        .iter()
        .map(|lang| {
            format!(
                "    {code}: {{ translation: {code}Translation }}",
                code = lang.code()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let default_code = Language::source().code();

    format!(
        r#"import i18n from "i18next";
import {{ initReactI18next }} from "react-i18next";
{imports}

i18n
  .use(initReactI18next)
  .init({{
    resources: {{
{resources}
    }},
    lng: "{default_code}",
    fallbackLng: "{default_code}",
    interpolation: {{
      escapeValue: false
    }}
  }});

export default i18n;
"#
    )
}

fn emit_next(languages: &[Language]) -> String {
    let locales = languages
        .iter()
        .map(|lang| format!("\"{}\"", lang.code()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"// next-i18next.config.js
module.exports = {{
  i18n: {{
    defaultLocale: "{default_code}",
    locales: [{locales}],
  }},
}};
"#,
        default_code = Language::source().code()
    )
}
