//! Localized merge: fold per-language parses into one tree.
//!
//! The base language supplies the structure. Every other language only
//! contributes text to entities that already exist in the base with the
//! same id. Entities a translation adds on its own are left out and
//! reported as orphans.

use crate::error::{ParseWarning, WarningKind};
use crate::model::*;
use std::collections::BTreeMap;

/// Options for multi-language parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeConfig {
    /// Language whose structure wins. `None` prefers `en`, then the first
    /// code in sort order. Ignored when no text is given for it.
    pub base_language: Option<String>,
}

impl MergeConfig {
    pub fn with_base(lang: impl Into<String>) -> Self {
        Self {
            base_language: Some(lang.into()),
        }
    }

    /// Pick the base language among the given codes.
    pub fn choose_base<'a, V>(&self, texts: &'a BTreeMap<String, V>) -> Option<&'a str> {
        let preferred = self.base_language.as_deref().unwrap_or("en");
        texts
            .get_key_value(preferred)
            .or_else(|| texts.get_key_value("en"))
            .or_else(|| texts.iter().next())
            .map(|(lang, _)| lang.as_str())
    }
}

/// Merge translations into `base`. `others` must not contain the base
/// language; it is applied in the given order.
pub fn merge(base_lang: &str, base: ParseResult, others: &[(String, ParseResult)]) -> ParseResult {
    let mut merged = base;
    merged.languages = std::iter::once(base_lang.to_string())
        .chain(others.iter().map(|(lang, _)| lang.clone()))
        .collect();

    for (lang, other) in others {
        let mut warnings = Vec::new();

        merged.overview.absorb(&other.overview, lang);
        merge_success(&mut merged.success, &other.success, lang);

        for preset in merged.presets.iter_mut() {
            match other.presets.iter().find(|p| p.id == preset.id) {
                Some(translated) => merge_preset(preset, translated, lang, &mut warnings),
                None => {
                    for step in &preset.steps {
                        warnings.push(missing_step(step, lang, Some(&preset.id)));
                    }
                }
            }
        }
        for orphan in other
            .presets
            .iter()
            .filter(|p| !merged.presets.iter().any(|b| b.id == p.id))
        {
            warnings.push(orphan_warning("Preset", &orphan.id, lang, None));
        }

        merge_steps(&mut merged.steps, &other.steps, lang, None, &mut warnings);

        tracing::debug!(lang = %lang, warnings = warnings.len(), "merged translation");
        merged.errors.extend(other.errors.iter().cloned());
        merged.warnings.extend(other.warnings.iter().cloned());
        merged.warnings.extend(warnings);
    }

    merged
}

fn merge_success(base: &mut Option<SuccessContent>, other: &Option<SuccessContent>, lang: &str) {
    if let Some(other) = other {
        base.get_or_insert_with(SuccessContent::default)
            .content
            .absorb(&other.content, lang);
    }
}

fn merge_preset(
    base: &mut PresetGuide,
    other: &PresetGuide,
    lang: &str,
    warnings: &mut Vec<ParseWarning>,
) {
    base.name.absorb(&other.name, lang);
    base.description.absorb(&other.description, lang);
    merge_success(&mut base.completion, &other.completion, lang);
    merge_steps(&mut base.steps, &other.steps, lang, Some(&base.id), warnings);
}

fn merge_steps(
    base: &mut [DeploymentStep],
    other: &[DeploymentStep],
    lang: &str,
    preset: Option<&str>,
    warnings: &mut Vec<ParseWarning>,
) {
    for step in base.iter_mut() {
        match other.iter().find(|s| s.id == step.id) {
            Some(translated) => merge_step(step, translated, lang, warnings),
            None => warnings.push(missing_step(step, lang, preset)),
        }
    }
    for orphan in other.iter().filter(|s| !base.iter().any(|b| b.id == s.id)) {
        warnings.push(orphan_warning("Step", &orphan.id, lang, preset));
    }
}

fn merge_step(
    base: &mut DeploymentStep,
    other: &DeploymentStep,
    lang: &str,
    warnings: &mut Vec<ParseWarning>,
) {
    base.title.absorb(&other.title, lang);
    merge_section(&mut base.section, &other.section, lang);

    for target in base.targets.iter_mut() {
        if let Some(translated) = other.targets.iter().find(|t| t.id == target.id) {
            merge_target(target, translated, lang);
        }
    }
    for orphan in other
        .targets
        .iter()
        .filter(|t| !base.targets.iter().any(|b| b.id == t.id))
    {
        warnings.push(orphan_warning(
            "Target",
            &format!("{}/{}", base.id, orphan.id),
            lang,
            None,
        ));
    }
}

fn merge_section(base: &mut SectionContent, other: &SectionContent, lang: &str) {
    base.title.absorb(&other.title, lang);
    base.subtitle.absorb(&other.subtitle, lang);
    base.description.absorb(&other.description, lang);
    base.prerequisites.absorb(&other.prerequisites, lang);
    base.troubleshoot.absorb(&other.troubleshoot, lang);
    base.post_deploy.absorb(&other.post_deploy, lang);
    merge_wiring(&mut base.wiring, &other.wiring, lang);
}

fn merge_target(base: &mut TargetInfo, other: &TargetInfo, lang: &str) {
    base.name.absorb(&other.name, lang);
    base.description.absorb(&other.description, lang);
    base.description_html.absorb(&other.description_html, lang);
    base.troubleshoot.absorb(&other.troubleshoot, lang);
    base.post_deploy.absorb(&other.post_deploy, lang);
    merge_wiring(&mut base.wiring, &other.wiring, lang);
}

/// Wiring steps are per language; the image comes from the first language
/// that has one.
fn merge_wiring(base: &mut Option<WiringInfo>, other: &Option<WiringInfo>, lang: &str) {
    let Some(other) = other else {
        return;
    };
    match base {
        Some(wiring) => {
            if wiring.image.is_none() {
                wiring.image = other.image.clone();
            }
            wiring.steps.absorb(&other.steps, lang);
        }
        None => *base = Some(other.clone()),
    }
}

fn missing_step(step: &DeploymentStep, lang: &str, preset: Option<&str>) -> ParseWarning {
    ParseWarning::new(
        WarningKind::MissingTranslation,
        format!(
            "Step '{}'{} has no {} translation",
            step.id,
            in_preset(preset),
            lang.to_uppercase()
        ),
    )
    .in_lang(lang)
}

fn orphan_warning(what: &str, id: &str, lang: &str, preset: Option<&str>) -> ParseWarning {
    ParseWarning::new(
        WarningKind::OrphanedTranslation,
        format!(
            "{} '{}'{} only exists in {} and was left out of the merged guide",
            what,
            id,
            in_preset(preset),
            lang.to_uppercase()
        ),
    )
    .in_lang(lang)
}

fn in_preset(preset: Option<&str>) -> String {
    preset
        .map(|id| format!(" in preset '{}'", id))
        .unwrap_or_default()
}
