//! Cross-language structure checks.
//!
//! Translations may reword everything, but the skeleton (preset ids, step
//! ids, types, required flags and config files) must line up position by
//! position with the base language.

use crate::error::{ErrorKind, ParseError};
use crate::model::{DeploymentStep, ParseResult, StepSignature, StructureValidationResult};
use indexmap::IndexMap;

/// Key under which steps outside any preset are recorded.
pub const TOP_LEVEL: &str = "";

/// Compare one translation against the base document.
///
/// Languages are taken from each result's primary language. Every mismatch
/// is reported; nothing short-circuits. Only skeletons are compared, so
/// `warnings` stays empty.
pub fn validate_structure(base: &ParseResult, other: &ParseResult) -> StructureValidationResult {
    let base_lang = base.primary_language().unwrap_or("base");
    let other_lang = match other.primary_language() {
        Some(lang) if lang != base_lang => lang,
        _ => "other",
    };

    let mut result = StructureValidationResult::default();
    record(&mut result, base_lang, base);
    compare(&mut result, base_lang, base, other_lang, other);
    result
}

/// Store `parsed`'s skeleton under `lang`.
pub(crate) fn record(result: &mut StructureValidationResult, lang: &str, parsed: &ParseResult) {
    result
        .presets
        .insert(lang.to_string(), parsed.presets.iter().map(|p| p.id.clone()).collect());
    result.steps_by_preset.insert(lang.to_string(), skeleton(parsed));
}

/// Record `other` and append every mismatch against `base` to `result`.
pub(crate) fn compare(
    result: &mut StructureValidationResult,
    base_lang: &str,
    base: &ParseResult,
    other_lang: &str,
    other: &ParseResult,
) {
    record(result, other_lang, other);
    let labels = Labels {
        base: base_lang.to_uppercase(),
        other: other_lang.to_uppercase(),
        lang: other_lang,
    };
    let mut errors = Vec::new();

    let base_ids: Vec<&str> = base.presets.iter().map(|p| p.id.as_str()).collect();
    let other_ids: Vec<&str> = other.presets.iter().map(|p| p.id.as_str()).collect();

    if base_ids.len() != other_ids.len() {
        errors.push(labels.error(
            ErrorKind::PresetCountMismatch,
            format!(
                "Preset count mismatch: {} has {}, {} has {}",
                labels.base,
                base_ids.len(),
                labels.other,
                other_ids.len()
            ),
            "Ensure every language file has the same number of presets".to_string(),
        ));
    }

    for (i, (b, o)) in base_ids.iter().zip(&other_ids).enumerate() {
        if b != o {
            errors.push(labels.error(
                ErrorKind::PresetIdMismatch,
                format!(
                    "Preset ID mismatch at position {}: {} has '{}', {} has '{}'",
                    i + 1,
                    labels.base,
                    b,
                    labels.other,
                    o
                ),
                format!("Ensure preset IDs match: {{#{}}} should be the same in every file", b),
            ));
        }
    }

    for preset in &base.presets {
        // A preset missing from the translation is already a preset mismatch.
        let Some(translated) = other.presets.iter().find(|p| p.id == preset.id) else {
            continue;
        };
        let scope = format!("preset '{}'", preset.id);
        compare_steps(
            &mut errors,
            &labels,
            &scope,
            &signatures(&preset.steps),
            &signatures(&translated.steps),
        );
    }

    compare_steps(
        &mut errors,
        &labels,
        "top-level steps",
        &signatures(&base.steps),
        &signatures(&other.steps),
    );

    if !errors.is_empty() {
        tracing::debug!(lang = other_lang, count = errors.len(), "structure mismatches");
        result.valid = false;
    }
    result.errors.extend(errors);
}

struct Labels<'a> {
    base: String,
    other: String,
    lang: &'a str,
}

impl Labels<'_> {
    fn error(&self, kind: ErrorKind, message: String, suggestion: String) -> ParseError {
        ParseError::new(kind, message)
            .suggest(suggestion)
            .in_lang(self.lang)
    }
}

fn compare_steps(
    errors: &mut Vec<ParseError>,
    labels: &Labels<'_>,
    scope: &str,
    base: &[StepSignature],
    other: &[StepSignature],
) {
    if base.len() != other.len() {
        errors.push(labels.error(
            ErrorKind::StepCountMismatch,
            format!(
                "Step count mismatch in {}: {} has {}, {} has {}",
                scope,
                labels.base,
                base.len(),
                labels.other,
                other.len()
            ),
            format!("Ensure every language file has the same number of steps in {}", scope),
        ));
    }

    for (j, (b, o)) in base.iter().zip(other).enumerate() {
        if b.id != o.id {
            errors.push(labels.error(
                ErrorKind::StepIdMismatch,
                format!(
                    "Step ID mismatch in {} at step {}: {} has '{}', {} has '{}'",
                    scope,
                    j + 1,
                    labels.base,
                    b.id,
                    labels.other,
                    o.id
                ),
                format!("Ensure step ID {{#{}}} matches in the {} guide", b.id, labels.lang),
            ));
        }
        if b.step_type != o.step_type {
            errors.push(labels.error(
                ErrorKind::StepTypeMismatch,
                format!(
                    "Step type mismatch for '{}' in {}: {} has type={}, {} has type={}",
                    b.id, scope, labels.base, b.step_type, labels.other, o.step_type
                ),
                format!("Ensure type={} is the same in every file", b.step_type),
            ));
        }
        if b.required != o.required {
            errors.push(labels.error(
                ErrorKind::StepRequiredMismatch,
                format!(
                    "Step required mismatch for '{}' in {}: {} has required={}, {} has required={}",
                    b.id, scope, labels.base, b.required, labels.other, o.required
                ),
                format!("Ensure required={} is the same in every file", b.required),
            ));
        }
        if b.config_file != o.config_file {
            errors.push(labels.error(
                ErrorKind::StepConfigMismatch,
                format!(
                    "Step config mismatch for '{}' in {}: {} has config={}, {} has config={}",
                    b.id,
                    scope,
                    labels.base,
                    config_label(&b.config_file),
                    labels.other,
                    config_label(&o.config_file)
                ),
                format!("Ensure config={} is the same in every file", config_label(&b.config_file)),
            ));
        }
    }
}

fn config_label(config: &Option<String>) -> &str {
    config.as_deref().unwrap_or("none")
}

fn signatures(steps: &[DeploymentStep]) -> Vec<StepSignature> {
    steps.iter().map(|s| s.signature()).collect()
}

fn skeleton(parsed: &ParseResult) -> IndexMap<String, Vec<StepSignature>> {
    let mut map: IndexMap<String, Vec<StepSignature>> = parsed
        .presets
        .iter()
        .map(|p| (p.id.clone(), signatures(&p.steps)))
        .collect();
    if !parsed.steps.is_empty() {
        map.insert(TOP_LEVEL.to_string(), signatures(&parsed.steps));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_single_language;

    const EN: &str = "\
## Preset: Cloud {#cloud}

## Step 1: Backend {#backend type=docker_deploy required=true config=devices/backend.yaml}

## Step 2: Check {#check type=preview required=false}

## Preset: Edge {#edge}

## Step 1: Flash {#flash type=esp32_usb required=true}
";

    fn kinds(result: &StructureValidationResult) -> Vec<ErrorKind> {
        result.errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn identical_structure_is_valid() {
        let zh = EN.replace("Backend", "后端").replace("Check", "检查");
        let result = validate_structure(
            &parse_single_language(EN, "en"),
            &parse_single_language(&zh, "zh"),
        );
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.presets["en"], vec!["cloud", "edge"]);
        assert_eq!(result.presets["zh"], vec!["cloud", "edge"]);
        assert_eq!(result.steps_by_preset["zh"]["cloud"].len(), 2);
    }

    #[test]
    fn required_flag_mismatch() {
        let zh = EN.replace(
            "{#check type=preview required=false}",
            "{#check type=preview required=true}",
        );
        let result = validate_structure(
            &parse_single_language(EN, "en"),
            &parse_single_language(&zh, "zh"),
        );
        assert!(!result.valid);
        assert_eq!(kinds(&result), vec![ErrorKind::StepRequiredMismatch]);
        let err = &result.errors[0];
        assert!(err.message.contains("EN has required=false, ZH has required=true"));
        assert_eq!(err.suggestion.as_deref(), Some("Ensure required=false is the same in every file"));
        assert_eq!(err.lang.as_deref(), Some("zh"));
    }

    #[test]
    fn every_step_field_reported_independently() {
        let zh = EN.replace(
            "{#backend type=docker_deploy required=true config=devices/backend.yaml}",
            "{#server type=docker_local required=false}",
        );
        let result = validate_structure(
            &parse_single_language(EN, "en"),
            &parse_single_language(&zh, "zh"),
        );
        assert_eq!(
            kinds(&result),
            vec![
                ErrorKind::StepIdMismatch,
                ErrorKind::StepTypeMismatch,
                ErrorKind::StepRequiredMismatch,
                ErrorKind::StepConfigMismatch,
            ]
        );
        assert_eq!(
            result.errors[0].suggestion.as_deref(),
            Some("Ensure step ID {#backend} matches in the zh guide")
        );
    }

    #[test]
    fn preset_mismatches() {
        let zh = "## Preset: Edge {#edge}\n\n## Step 1: Flash {#flash type=esp32_usb}\n";
        let result = validate_structure(
            &parse_single_language(EN, "en"),
            &parse_single_language(zh, "zh"),
        );
        assert!(!result.valid);
        assert_eq!(
            kinds(&result),
            vec![ErrorKind::PresetCountMismatch, ErrorKind::PresetIdMismatch]
        );
        assert!(result.errors[0].message.contains("EN has 2, ZH has 1"));
    }

    #[test]
    fn step_count_mismatch_still_compares_shared_positions() {
        let zh = EN.replace(
            "## Step 2: Check {#check type=preview required=false}\n",
            "",
        );
        let result = validate_structure(
            &parse_single_language(EN, "en"),
            &parse_single_language(&zh, "zh"),
        );
        assert_eq!(kinds(&result), vec![ErrorKind::StepCountMismatch]);
    }

    #[test]
    fn top_level_steps_are_compared() {
        let en = "## Step 1: A {#a type=manual}\n";
        let zh = "## 步骤 1: 甲 {#a type=script}\n";
        let result = validate_structure(
            &parse_single_language(en, "en"),
            &parse_single_language(zh, "zh"),
        );
        assert_eq!(kinds(&result), vec![ErrorKind::StepTypeMismatch]);
        assert!(result.steps_by_preset["en"].contains_key(TOP_LEVEL));
    }

    #[test]
    fn same_language_twice_keeps_both_skeletons() {
        let result = validate_structure(
            &parse_single_language(EN, "en"),
            &parse_single_language(EN, "en"),
        );
        assert!(result.valid);
        assert_eq!(result.presets.keys().collect::<Vec<_>>(), vec!["en", "other"]);
    }
}
