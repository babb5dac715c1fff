//! Report rendering: trait-based format dispatch for the lint CLI.

pub mod html;
pub mod json;
pub mod text;

use crate::model::{ParseResult, StructureValidationResult};
use anyhow::{anyhow, Result};
use serde::Serialize;

/// Outcome of checking one guide (one file, or one group of translations).
#[derive(Debug, Clone, Serialize)]
pub struct GuideReport {
    /// File or group name shown to the user.
    pub source: String,
    pub result: ParseResult,
    /// Present when several language files were compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<StructureValidationResult>,
}

impl GuideReport {
    pub fn is_ok(&self) -> bool {
        !self.result.has_errors() && self.validation.as_ref().map_or(true, |v| v.valid)
    }
}

/// Trait for rendering lint reports into a specific output format.
pub trait Renderer {
    fn render(&self, reports: &[GuideReport]) -> Result<String>;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "text" | "txt" => Ok(Box::new(text::TextRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use text or json", format)),
    }
}
