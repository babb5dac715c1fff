//! Single-language guide parser: a line-by-line section state machine.
//!
//! Headers move the parser between sections; every other line is appended
//! to whatever the current section accumulates. Before any transition the
//! pending step (and the open preset description or completion block) is
//! flushed, so presets and steps come out in document order.

use super::body::{build_section, parse_targets, tidy};
use super::grammar::{classify_header, parse_step_header, Header};
use crate::error::{ErrorKind, ParseError};
use crate::localized::Localized;
use crate::model::*;
use crate::render::html::markdown_to_html;
use std::collections::HashSet;

// -- Parser state -------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Overview,
    Preset,
    Step,
    Success,
    PresetCompletion,
}

/// Step header plus its body, waiting for the next transition.
struct PendingStep<'a> {
    header: &'a str,
    line: usize,
    body: Vec<&'a str>,
}

/// Preset under construction. Markdown is rendered once the text ends.
struct PresetBuilder<'a> {
    id: String,
    name: String,
    description: Vec<&'a str>,
    completion: Option<Vec<&'a str>>,
    steps: Vec<DeploymentStep>,
}

struct GuideParser<'a> {
    lang: &'a str,
    section: Section,
    overview: Vec<&'a str>,
    success: Option<Vec<&'a str>>,
    presets: Vec<PresetBuilder<'a>>,
    steps: Vec<DeploymentStep>,
    pending: Option<PendingStep<'a>>,
    /// Step ids seen in the current scope; cleared at each preset header.
    seen_ids: HashSet<String>,
    errors: Vec<ParseError>,
}

// -- Public API ---------------------------------------------------------------

/// Parse one language's guide text. Empty input gives an empty result.
pub fn parse(text: &str, lang: &str) -> ParseResult {
    if text.trim().is_empty() {
        return ParseResult {
            languages: vec![lang.to_string()],
            ..Default::default()
        };
    }

    let mut parser = GuideParser::new(lang);
    for (idx, line) in text.lines().enumerate() {
        parser.process_line(line, idx + 1);
    }
    parser.finish()
}

// -- Line processing ----------------------------------------------------------

impl<'a> GuideParser<'a> {
    fn new(lang: &'a str) -> Self {
        Self {
            lang,
            section: Section::Overview,
            overview: Vec::new(),
            success: None,
            presets: Vec::new(),
            steps: Vec::new(),
            pending: None,
            seen_ids: HashSet::new(),
            errors: Vec::new(),
        }
    }

    fn process_line(&mut self, line: &'a str, line_no: usize) {
        match classify_header(line.trim()) {
            Some(Header::Success) => {
                self.flush();
                self.success.get_or_insert_with(Vec::new);
                self.section = Section::Success;
            }
            Some(Header::Preset { name, id }) => {
                self.flush();
                self.seen_ids.clear();
                self.presets.push(PresetBuilder {
                    id: id.to_string(),
                    name: name.trim().to_string(),
                    description: Vec::new(),
                    completion: None,
                    steps: Vec::new(),
                });
                self.section = Section::Preset;
            }
            Some(Header::Step) => {
                self.flush();
                self.pending = Some(PendingStep {
                    header: line.trim(),
                    line: line_no,
                    body: Vec::new(),
                });
                self.section = Section::Step;
            }
            // Inside an open step this is the step's post-deploy subsection.
            Some(Header::Completion) if self.pending.is_none() && !self.presets.is_empty() => {
                self.flush();
                if let Some(preset) = self.presets.last_mut() {
                    preset.completion.get_or_insert_with(Vec::new);
                }
                self.section = Section::PresetCompletion;
            }
            _ => self.append(line),
        }
    }

    fn append(&mut self, line: &'a str) {
        match self.section {
            Section::Overview => self.overview.push(line),
            Section::Step => {
                if let Some(step) = self.pending.as_mut() {
                    step.body.push(line);
                }
            }
            Section::Success => self.success.get_or_insert_with(Vec::new).push(line),
            Section::Preset => {
                if let Some(preset) = self.presets.last_mut() {
                    preset.description.push(line);
                }
            }
            Section::PresetCompletion => {
                if let Some(preset) = self.presets.last_mut() {
                    preset.completion.get_or_insert_with(Vec::new).push(line);
                }
            }
        }
    }

    /// Finalize the pending step, if any.
    fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let header = match parse_step_header(pending.header, pending.line) {
            Ok(header) => header,
            Err(err) => {
                tracing::debug!(lang = self.lang, line = pending.line, "dropping step: {}", err);
                self.errors.push(err.in_lang(self.lang));
                return;
            }
        };

        if self.seen_ids.contains(&header.id) {
            self.errors.push(
                ParseError::new(
                    ErrorKind::DuplicateStepId,
                    format!("Duplicate step ID: {}", header.id),
                )
                .at_line(pending.line)
                .suggest(format!(
                    "Rename one of the steps; {{#{}}} must be unique within its preset",
                    header.id
                ))
                .in_lang(self.lang),
            );
            return;
        }
        self.seen_ids.insert(header.id.clone());

        let targets = if header.step_type.supports_targets() {
            parse_targets(&pending.body, self.lang)
        } else {
            Vec::new()
        };

        let step = DeploymentStep {
            id: header.id.clone(),
            title: Localized::from_value(self.lang, header.title.clone()),
            step_type: header.step_type,
            required: header.required,
            config_file: header.config_file.clone(),
            section: build_section(&header, &pending.body, self.lang),
            targets,
        };
        tracing::trace!(lang = self.lang, id = %step.id, "step parsed");

        match self.presets.last_mut() {
            Some(preset) => preset.steps.push(step),
            None => self.steps.push(step),
        }
    }

    fn finish(mut self) -> ParseResult {
        self.flush();
        let lang = self.lang;

        let presets: Vec<PresetGuide> = self
            .presets
            .into_iter()
            .map(|p| PresetGuide {
                id: p.id,
                name: Localized::from_value(lang, p.name),
                description: Localized::from_value(lang, render(&p.description)),
                steps: p.steps,
                completion: p.completion.map(|lines| SuccessContent {
                    content: Localized::from_value(lang, render(&lines)),
                }),
            })
            .collect();

        tracing::debug!(
            lang,
            presets = presets.len(),
            steps = self.steps.len(),
            errors = self.errors.len(),
            "guide parsed"
        );

        ParseResult {
            languages: vec![lang.to_string()],
            overview: Localized::from_value(lang, render(&self.overview)),
            presets,
            steps: self.steps,
            success: self.success.map(|lines| SuccessContent {
                content: Localized::from_value(lang, render(&lines)),
            }),
            errors: self.errors,
            warnings: Vec::new(),
        }
    }
}

fn render(lines: &[&str]) -> String {
    markdown_to_html(&tidy(lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_valid() {
        let result = parse("  \n\n", "en");
        assert!(!result.has_errors());
        assert!(result.presets.is_empty());
        assert!(result.steps.is_empty());
        assert!(result.success.is_none());
        assert_eq!(result.languages, vec!["en"]);
    }

    #[test]
    fn single_step() {
        let text = "\
## Step 1: Deploy Backend {#backend type=docker_deploy required=true}

Deploy the backend service.

### Prerequisites

- Docker installed

### Troubleshooting

| Issue | Solution |
|-------|----------|
| Port busy | Stop other services |
";
        let result = parse(text, "en");
        assert!(!result.has_errors());
        assert_eq!(result.steps.len(), 1);

        let step = &result.steps[0];
        assert_eq!(step.id, "backend");
        assert_eq!(step.step_type, StepType::DockerDeploy);
        assert!(step.required);
        assert_eq!(step.title.get_exact("en").map(String::as_str), Some("Deploy Backend"));
        let section = &step.section;
        assert!(section.description.get_exact("en").unwrap().contains("Deploy the backend"));
        assert!(section.prerequisites.get_exact("en").unwrap().contains("Docker installed"));
        assert!(section.troubleshoot.get_exact("en").unwrap().contains("Port busy"));
        assert_eq!(
            section.subtitle.get_exact("en").map(String::as_str),
            Some("Deploy the backend service.")
        );
        assert!(section.wiring.is_none());
    }

    #[test]
    fn overview_and_success() {
        let text = "\
# Deployment Guide

This is the overview section before any steps.

## Step 1: Deploy {#step1 type=manual required=true}

Step content.

# Deployment Complete

Congratulations! All done.

## Next Steps

1. Open web interface
";
        let result = parse(text, "en");
        assert!(result.overview.get_exact("en").unwrap().contains("overview section"));
        let success = result.success.as_ref().unwrap();
        let html = success.content.get_exact("en").unwrap();
        assert!(html.contains("Congratulations"));
        assert!(html.contains("Open web interface"));
        assert!(!result.steps[0]
            .section
            .description
            .get_exact("en")
            .unwrap()
            .contains("Congratulations"));
    }

    #[test]
    fn presets_group_steps_in_order() {
        let text = "\
# Overview

General overview.

## Preset: Cloud Solution {#cloud}

Cloud solution description.

## Step 1: Deploy Cloud {#cloud_deploy type=docker_deploy required=true}

Cloud step content.

## Preset: Edge Computing {#edge}

Edge solution description.

## Step 1: Deploy Edge {#edge_deploy type=script required=true}

Edge step content.
";
        let result = parse(text, "en");
        assert!(!result.has_errors());
        assert_eq!(result.presets.len(), 2);
        assert!(result.steps.is_empty());

        let cloud = &result.presets[0];
        assert_eq!(cloud.id, "cloud");
        assert_eq!(cloud.name.get_exact("en").map(String::as_str), Some("Cloud Solution"));
        assert!(cloud.description.get_exact("en").unwrap().contains("Cloud solution description"));
        assert_eq!(cloud.steps.len(), 1);
        assert_eq!(cloud.steps[0].id, "cloud_deploy");

        let edge = &result.presets[1];
        assert_eq!(edge.id, "edge");
        assert_eq!(edge.steps[0].id, "edge_deploy");
    }

    #[test]
    fn duplicate_step_id_keeps_first() {
        let text = "\
## Step 1: First {#same_id type=manual required=true}

First content.

## Step 2: Second {#same_id type=manual required=true}

Second content.
";
        let result = parse(text, "en");
        let dups: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.kind == ErrorKind::DuplicateStepId)
            .collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].line, Some(5));
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].title.get_exact("en").map(String::as_str), Some("First"));
    }

    #[test]
    fn same_step_id_in_different_presets_is_fine() {
        let text = "\
## Preset: A {#a}

## Step 1: Setup {#setup type=manual}

## Preset: B {#b}

## Step 1: Setup {#setup type=manual}
";
        let result = parse(text, "en");
        assert!(!result.has_errors());
        assert_eq!(result.presets[0].steps.len(), 1);
        assert_eq!(result.presets[1].steps.len(), 1);
    }

    #[test]
    fn invalid_type_drops_step() {
        let result = parse("## Step 1: Deploy {#deploy type=invalid_type required=true}\n\nBody.\n", "en");
        assert!(result.has_errors());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::InvalidStepType);
        assert_eq!(result.errors[0].lang.as_deref(), Some("en"));
        assert!(result.steps.is_empty());
    }

    #[test]
    fn missing_type_drops_step() {
        let result = parse("## Step 1: Deploy {#step1 required=true}\n\nContent.\n", "en");
        assert_eq!(result.errors[0].kind, ErrorKind::MissingRequiredField);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn malformed_header_reported() {
        let result = parse("## Step 1: Forgot the id\n\nContent.\n", "en");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::InvalidStepFormat);
        assert_eq!(result.errors[0].line, Some(1));
    }

    #[test]
    fn completion_header_depends_on_open_step() {
        let text = "\
## Preset: Cloud {#cloud}

Pick cloud.

## Step 1: Deploy {#deploy type=manual}

Do it.

### Deployment Complete

Step is live.

## Preset: Edge {#edge}

### Deployment Complete

Edge preset is ready.
";
        let result = parse(text, "en");
        assert!(!result.has_errors());

        let cloud = &result.presets[0];
        let step = &cloud.steps[0];
        assert!(step.section.post_deploy.get_exact("en").unwrap().contains("Step is live"));
        assert!(cloud.completion.is_none());

        let edge = &result.presets[1];
        let completion = edge.completion.as_ref().unwrap();
        assert!(completion.content.get_exact("en").unwrap().contains("Edge preset is ready"));
        assert!(!edge.description.get_exact("en").unwrap().contains("ready"));
    }

    #[test]
    fn completion_after_step_ended_by_success_has_no_preset() {
        let text = "\
## Step 1: Deploy {#deploy type=manual}

# Deployment Complete

### Deployment Complete

Still success content.
";
        let result = parse(text, "en");
        let success = result.success.as_ref().unwrap();
        assert!(success.content.get_exact("en").unwrap().contains("Still success content"));
    }

    #[test]
    fn completion_in_success_goes_to_last_preset() {
        let text = "\
## Preset: Cloud {#cloud}

## Step 1: Deploy {#deploy type=manual}

# Deployment Complete

All done.

### Deployment Complete

More global.
";
        let result = parse(text, "en");
        let success = result.success.as_ref().unwrap().content.get_exact("en").unwrap();
        assert!(success.contains("All done."));
        assert!(!success.contains("More global."));

        let completion = result.presets[0].completion.as_ref().unwrap();
        assert!(completion.content.get_exact("en").unwrap().contains("More global."));
    }

    #[test]
    fn repeated_success_header_appends() {
        let text = "\
## Step 1: Deploy {#deploy type=manual}

# Deployment Complete

First part.

# Deployment Complete

Second part.
";
        let result = parse(text, "en");
        let success = result.success.as_ref().unwrap().content.get_exact("en").unwrap();
        assert!(success.contains("First part."));
        assert!(success.contains("Second part."));
        assert_eq!(result.steps.len(), 1);
    }

    #[test]
    fn targets_only_for_supporting_types() {
        let text = "\
## Step 1: Deploy {#deploy type=docker_deploy}

Choose where to run.

### Target: Local {#local default=true}

This machine.

### Target: Remote {#remote type=remote}

Over SSH.

## Step 2: Manual {#manual type=manual}

### Target: Ignored {#ignored}

Text.
";
        let result = parse(text, "en");
        assert_eq!(result.steps.len(), 2);
        let deploy = &result.steps[0];
        let ids: Vec<_> = deploy.targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["local", "remote"]);
        assert_eq!(
            deploy.section.description.get_exact("en").map(String::as_str),
            Some("<p>Choose where to run.</p>\n")
        );
        assert!(result.steps[1].targets.is_empty());
    }

    #[test]
    fn reparse_is_identical() {
        let text = "## Preset: A {#a}\n\nIntro.\n\n## Step 1: S {#s type=preview required=false}\n\nBody.\n";
        assert_eq!(parse(text, "en"), parse(text, "en"));
    }
}
