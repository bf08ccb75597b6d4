/*!
 * Language utilities for ISO language code handling.
 *
 * The translation API expects upper-case ISO 639-1 codes with an optional
 * regional variant ("DE", "EN-GB", "PT-BR"). Configuration accepts any ISO
 * 639-1 or ISO 639-2 code and is normalized through this module.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn terminology_code(bibliographic: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == bibliographic)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if terminology_code(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Resolve a language code to its isolang entry
fn resolve(code: &str) -> Result<Language> {
    let normalized_code = code.trim().to_lowercase();
    let language = match validate_language_code(&normalized_code)? {
        LanguageCodeType::Part1 => Language::from_639_1(&normalized_code),
        LanguageCodeType::Part2T => Language::from_639_3(&normalized_code),
        LanguageCodeType::Part2B => terminology_code(&normalized_code).and_then(Language::from_639_3),
    };
    language.ok_or_else(|| anyhow!("Cannot resolve language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    Ok(resolve(code)?.to_639_3().to_string())
}

/// Get the language name from a code, ignoring any regional variant
pub fn get_language_name(code: &str) -> Result<String> {
    let (primary, _) = split_variant(code);
    Ok(resolve(primary)?.to_name().to_string())
}

/// Convert a configured language code to the translation API format
///
/// "de", "ger" and "deu" all become "DE"; "en-gb" and "en_GB" become "EN-GB".
pub fn to_translation_code(code: &str) -> Result<String> {
    let (primary, variant) = split_variant(code);
    let language = resolve(primary)?;
    let part1 = language
        .to_639_1()
        .ok_or_else(|| anyhow!("Language has no two-letter code: {}", code))?;

    match variant {
        None => Ok(part1.to_uppercase()),
        Some(variant) if (2..=4).contains(&variant.len()) && variant.chars().all(|c| c.is_ascii_alphabetic()) => {
            Ok(format!("{}-{}", part1.to_uppercase(), variant.to_uppercase()))
        }
        Some(variant) => Err(anyhow!("Invalid language variant '{}' in: {}", variant, code)),
    }
}

/// Convert a code to a source-language code, which never carries a region
///
/// `"en-us"` and `"eng"` both become `"EN"`.
pub fn to_source_code(code: &str) -> Result<String> {
    let (primary, _) = split_variant(code);
    let language = resolve(primary)?;
    language
        .to_639_1()
        .map(|part1| part1.to_uppercase())
        .ok_or_else(|| anyhow!("Language has no two-letter code: {}", code))
}

fn split_variant(code: &str) -> (&str, Option<&str>) {
    let code = code.trim();
    match code.split_once(['-', '_']) {
        Some((primary, variant)) => (primary, Some(variant)),
        None => (code, None),
    }
}
