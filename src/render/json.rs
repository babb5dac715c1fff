//! JSON renderer: the report model serialized as-is for tooling.

use crate::render::{GuideReport, Renderer};
use anyhow::{Context, Result};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, reports: &[GuideReport]) -> Result<String> {
        let mut out =
            serde_json::to_string_pretty(reports).context("failed to serialize report")?;
        out.push('\n');
        Ok(out)
    }
}
