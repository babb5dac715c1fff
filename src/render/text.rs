//! Plain-text lint report for terminals and CI logs.

use crate::error::{ParseError, ParseWarning};
use crate::render::{GuideReport, Renderer};
use anyhow::Result;

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, reports: &[GuideReport]) -> Result<String> {
        let mut out = String::new();

        for report in reports {
            render_report(&mut out, report);
            out.push('\n');
        }

        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        out.push_str(&format!(
            "{} guide(s) checked, {} failed\n",
            reports.len(),
            failed
        ));
        Ok(out)
    }
}

fn render_report(out: &mut String, report: &GuideReport) {
    let result = &report.result;
    let step_count = result.all_steps().count();
    out.push_str(&format!(
        "{} {} [{}]: {} preset(s), {} step(s)\n",
        if report.is_ok() { "ok" } else { "FAILED" },
        report.source,
        result.languages.join(", "),
        result.presets.len(),
        step_count
    ));

    for error in &result.errors {
        push_error(out, error);
    }
    for warning in &result.warnings {
        push_warning(out, warning);
    }

    if let Some(validation) = &report.validation {
        if validation.valid {
            out.push_str("  structure: consistent\n");
        } else {
            out.push_str(&format!(
                "  structure: {} mismatch(es)\n",
                validation.errors.len()
            ));
            for error in &validation.errors {
                push_error(out, error);
            }
        }
    }
}

fn push_error(out: &mut String, error: &ParseError) {
    out.push_str(&format!(
        "  error[{}]{}: {}\n",
        error.kind,
        origin(&error.lang, error.line),
        error.message
    ));
    if let Some(suggestion) = &error.suggestion {
        out.push_str(&format!("    suggestion: {}\n", suggestion));
    }
}

fn push_warning(out: &mut String, warning: &ParseWarning) {
    out.push_str(&format!(
        "  warning[{}]{}: {}\n",
        warning.kind,
        origin(&warning.lang, None),
        warning.message
    ));
}

/// ` (zh, line 3)` style location suffix.
fn origin(lang: &Option<String>, line: Option<usize>) -> String {
    let parts: Vec<String> = lang
        .iter()
        .cloned()
        .chain(line.map(|n| format!("line {}", n)))
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}
