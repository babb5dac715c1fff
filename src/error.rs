//! Diagnostics produced while parsing and validating guides.
//!
//! Nothing here is fatal: the offending entity is dropped and parsing
//! carries on, so callers inspect `errors` before trusting a result.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidStepFormat,
    DuplicateStepId,
    InvalidStepType,
    MissingRequiredField,
    /// Reserved; target headers currently degrade to defaults instead.
    InvalidTargetFormat,
    PresetCountMismatch,
    PresetIdMismatch,
    StepCountMismatch,
    StepIdMismatch,
    StepTypeMismatch,
    StepRequiredMismatch,
    StepConfigMismatch,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidStepFormat => "invalid_step_format",
            ErrorKind::DuplicateStepId => "duplicate_step_id",
            ErrorKind::InvalidStepType => "invalid_step_type",
            ErrorKind::MissingRequiredField => "missing_required_field",
            ErrorKind::InvalidTargetFormat => "invalid_target_format",
            ErrorKind::PresetCountMismatch => "preset_count_mismatch",
            ErrorKind::PresetIdMismatch => "preset_id_mismatch",
            ErrorKind::StepCountMismatch => "step_count_mismatch",
            ErrorKind::StepIdMismatch => "step_id_mismatch",
            ErrorKind::StepTypeMismatch => "step_type_mismatch",
            ErrorKind::StepRequiredMismatch => "step_required_mismatch",
            ErrorKind::StepConfigMismatch => "step_config_mismatch",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    NoLanguageMarkers,
    MissingTranslation,
    /// Entity only exists in a non-base language and was left out of the merge.
    OrphanedTranslation,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::NoLanguageMarkers => "no_language_markers",
            WarningKind::MissingTranslation => "missing_translation",
            WarningKind::OrphanedTranslation => "orphaned_translation",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parse or structure error with an optional location and fix hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}{}", line_suffix(.line))]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based line in the language's own text.
    pub line: Option<usize>,
    pub suggestion: Option<String>,
    /// Language whose text produced the error.
    pub lang: Option<String>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            suggestion: None,
            lang: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn in_lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_string());
        self
    }
}

/// Advisory finding; never affects `has_errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub kind: WarningKind,
    pub message: String,
    pub lang: Option<String>,
}

impl ParseWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            lang: None,
        }
    }

    pub fn in_lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_string());
        self
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" (line {})", n),
        None => String::new(),
    }
}
