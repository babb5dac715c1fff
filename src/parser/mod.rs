//! Parser entry points: single language, multi-language and the legacy
//! single-file bilingual format.

pub mod body;
pub mod grammar;
pub mod guide;
pub mod lang;
pub mod merge;

pub use lang::{split_by_language, LanguageSplit};
pub use merge::MergeConfig;

use crate::error::{ParseWarning, WarningKind};
use crate::model::{ParseResult, StructureValidationResult};
use crate::validate;
use std::collections::{BTreeMap, BTreeSet};

/// Parse a guide written in one language.
pub fn parse_single_language(text: &str, lang: &str) -> ParseResult {
    guide::parse(text, lang)
}

/// Parse one text per language, check their structure against the base
/// language and merge them.
pub fn parse_multilang(texts: &BTreeMap<String, String>) -> (ParseResult, StructureValidationResult) {
    parse_multilang_with(texts, &MergeConfig::default())
}

pub fn parse_multilang_with(
    texts: &BTreeMap<String, String>,
    config: &MergeConfig,
) -> (ParseResult, StructureValidationResult) {
    parse_texts(texts, config, |_| true)
}

/// Parse every language, compare the ones `checked` accepts against the
/// base, then merge all of them.
fn parse_texts(
    texts: &BTreeMap<String, String>,
    config: &MergeConfig,
    checked: impl Fn(&str) -> bool,
) -> (ParseResult, StructureValidationResult) {
    let Some(base_lang) = config.choose_base(texts) else {
        return (ParseResult::default(), StructureValidationResult::default());
    };
    tracing::debug!(base = base_lang, languages = texts.len(), "parsing guide");

    let base = guide::parse(&texts[base_lang], base_lang);
    let others: Vec<(String, ParseResult)> = texts
        .iter()
        .filter(|(lang, _)| lang.as_str() != base_lang)
        .map(|(lang, text)| (lang.clone(), guide::parse(text, lang)))
        .collect();

    let mut validation = StructureValidationResult::default();
    validate::record(&mut validation, base_lang, &base);
    for (lang, other) in others.iter().filter(|(lang, _)| checked(lang.as_str())) {
        validate::compare(&mut validation, base_lang, &base, lang, other);
    }

    let merged = merge::merge(base_lang, base, &others);
    validation.warnings = merged
        .warnings
        .iter()
        .filter(|w| {
            matches!(
                w.kind,
                WarningKind::MissingTranslation | WarningKind::OrphanedTranslation
            ) && w.lang.as_deref().is_some_and(|lang| checked(lang))
        })
        .cloned()
        .collect();

    (merged, validation)
}

/// Parse a single document holding `<!-- @lang:en -->` / `<!-- @lang:zh -->`
/// blocks. Without markers the whole text is English and a warning is added.
pub fn parse_bilingual_legacy(text: &str) -> ParseResult {
    parse_bilingual_with(text, &MergeConfig::default()).0
}

/// Legacy bilingual parse that also returns the structure check.
///
/// `en` and `zh` are always merged so an absent half shows up as missing
/// translations. Only languages that have text of their own are compared
/// structurally.
pub fn parse_bilingual_with(
    text: &str,
    config: &MergeConfig,
) -> (ParseResult, StructureValidationResult) {
    if text.trim().is_empty() {
        let result = ParseResult {
            languages: vec!["en".to_string()],
            ..Default::default()
        };
        return (result, StructureValidationResult::default());
    }

    let split = split_by_language(text);
    let written: BTreeSet<String> = split
        .texts
        .iter()
        .filter(|(_, body)| !body.trim().is_empty())
        .map(|(lang, _)| lang.clone())
        .collect();
    let mut texts = split.texts;
    for lang in ["en", "zh"] {
        texts.entry(lang.to_string()).or_default();
    }

    let (mut result, validation) = parse_texts(&texts, config, |lang| written.contains(lang));
    if !split.has_markers {
        result.warnings.insert(
            0,
            ParseWarning::new(
                WarningKind::NoLanguageMarkers,
                "No <!-- @lang:xx --> markers found; treating the whole document as English",
            ),
        );
    }
    (result, validation)
}
