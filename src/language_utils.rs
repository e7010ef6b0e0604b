use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// The translation API expects upper-case ISO 639-1 codes, optionally with a
/// regional variant for the few languages that have one (EN-GB, PT-BR, ...).
/// Users may type 2-letter, 3-letter (639-2/T or 639-2/B) or variant codes.

/// Regional variants accepted as target languages
const API_VARIANTS: &[&str] = &["en-gb", "en-us", "pt-br", "pt-pt", "zh-hans", "zh-hant"];

/// Map an ISO 639-2/B code to its 639-2/T spelling
fn bibliographic_to_terminology(code: &str) -> &str {
    match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        other => other,
    }
}

/// Split "en-GB" / "EN_gb" into a lower-case primary code and optional region
fn split_variant(code: &str) -> (String, Option<String>) {
    let normalized = code.trim().to_lowercase().replace('_', "-");
    match normalized.split_once('-') {
        Some((primary, region)) => (primary.to_string(), Some(region.to_string())),
        None => (normalized, None),
    }
}

/// Resolve any supported spelling of a language to its isolang entry
fn lookup(primary: &str) -> Option<Language> {
    match primary.len() {
        2 => Language::from_639_1(primary),
        3 => Language::from_639_3(bibliographic_to_terminology(primary)),
        _ => None,
    }
}

/// Validate a language code (ISO 639-1, 639-2/T, 639-2/B, or an API variant)
pub fn validate_language_code(code: &str) -> Result<()> {
    to_api_language_code(code).map(|_| ())
}

/// Convert a user supplied code into the form the translation API expects
pub fn to_api_language_code(code: &str) -> Result<String> {
    let (primary, region) = split_variant(code);
    let language = lookup(&primary).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    let part1 = language
        .to_639_1()
        .ok_or_else(|| anyhow!("Language '{}' has no two-letter code supported by the API", code))?;

    match region {
        None => Ok(part1.to_uppercase()),
        Some(region) => {
            let variant = format!("{}-{}", part1, region);
            if API_VARIANTS.contains(&variant.as_str()) {
                Ok(variant.to_uppercase())
            } else {
                Err(anyhow!("Unsupported language variant: {}", code))
            }
        }
    }
}

/// Check if two language codes represent the same language, ignoring regional variants
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let (primary1, _) = split_variant(code1);
    let (primary2, _) = split_variant(code2);

    match (lookup(&primary1), lookup(&primary2)) {
        (Some(first), Some(second)) => first == second,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (primary, _) = split_variant(code);
    let language = lookup(&primary).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(language.to_name().to_string())
}
