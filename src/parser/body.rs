//! Step and target bodies: subsections, subtitle, wiring and targets.

use super::grammar::{classify_body_line, BodyLine, StepHeader, Subsection, TargetHeader};
use crate::localized::Localized;
use crate::model::{SectionContent, TargetInfo, WiringInfo};
use crate::render::html::markdown_to_html;
use regex::Regex;
use std::sync::LazyLock;

static RE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)[^)]*\)").unwrap());

static RE_ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(.+)$").unwrap());

static RE_LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]\s|\d+[.)]\s)").unwrap());

static RE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());

static RE_STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__|~~(.+?)~~").unwrap());

static RE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*|\b_([^_]+)_\b").unwrap());

static RE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Markdown of each subsection, trimmed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Subsections {
    pub main: String,
    pub prerequisites: String,
    pub wiring: String,
    pub troubleshoot: String,
    pub post_deploy: String,
}

/// Split body lines on subsection headers. The scan stops at the first
/// target header; targets are parsed separately.
pub fn split_subsections(lines: &[&str]) -> Subsections {
    let mut main = Vec::new();
    let mut prerequisites = Vec::new();
    let mut wiring = Vec::new();
    let mut troubleshoot = Vec::new();
    let mut post_deploy = Vec::new();
    let mut current = Subsection::Main;

    for &line in lines {
        match classify_body_line(line.trim()) {
            BodyLine::Target(_) => break,
            BodyLine::Subsection(sub) => current = sub,
            BodyLine::Separator | BodyLine::Text => {
                let bucket = match current {
                    Subsection::Main => &mut main,
                    Subsection::Prerequisites => &mut prerequisites,
                    Subsection::Wiring => &mut wiring,
                    Subsection::Troubleshoot => &mut troubleshoot,
                    Subsection::PostDeploy => &mut post_deploy,
                };
                bucket.push(line);
            }
        }
    }

    Subsections {
        main: tidy(&main),
        prerequisites: tidy(&prerequisites),
        wiring: tidy(&wiring),
        troubleshoot: tidy(&troubleshoot),
        post_deploy: tidy(&post_deploy),
    }
}

/// Join lines, dropping leading blanks and trailing blanks/`---`.
pub fn tidy(lines: &[&str]) -> String {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let mut end = lines.len();
    while end > start {
        let last = lines[end - 1].trim();
        if last.is_empty() || last == "---" {
            end -= 1;
        } else {
            break;
        }
    }
    lines[start..end].join("\n")
}

/// First plain-prose line with inline markup removed, or `""`.
/// Blockquote lines count as prose without their `>` markers.
pub fn extract_subtitle(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| line.trim().trim_start_matches('>').trim())
        .find(|line| is_prose(line))
        .map(strip_inline)
        .unwrap_or_default()
}

fn is_prose(line: &str) -> bool {
    !(line.is_empty()
        || line.starts_with("![")
        || line.starts_with('#')
        || line.starts_with('|')
        || line.starts_with("```")
        || line == "---"
        || RE_LIST_MARKER.is_match(line))
}

fn strip_inline(line: &str) -> String {
    let text = RE_IMAGE.replace_all(line, "");
    let text = RE_LINK.replace_all(&text, "$1");
    let text = RE_STRONG.replace_all(&text, "$1$2$3");
    let text = RE_EMPHASIS.replace_all(&text, "$1$2");
    let text = RE_CODE.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Wiring image and ordered steps; `None` when neither is present.
pub fn extract_wiring(markdown: &str, lang: &str) -> Option<WiringInfo> {
    let image = RE_IMAGE
        .captures(markdown)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string());

    let steps: Vec<String> = markdown
        .lines()
        .filter_map(|line| RE_ORDERED_ITEM.captures(line.trim()))
        .map(|caps| caps[1].trim().to_string())
        .collect();

    if image.is_none() && steps.is_empty() {
        return None;
    }
    Some(WiringInfo {
        image,
        steps: Localized::from_value(lang, steps),
    })
}

/// Build a step's section from its validated header and raw body lines.
pub fn build_section(header: &StepHeader, body: &[&str], lang: &str) -> SectionContent {
    let subs = split_subsections(body);
    SectionContent {
        title: Localized::from_value(lang, header.title.clone()),
        subtitle: Localized::from_value(lang, extract_subtitle(&subs.main)),
        description: Localized::from_value(lang, markdown_to_html(&subs.main)),
        prerequisites: Localized::from_value(lang, markdown_to_html(&subs.prerequisites)),
        troubleshoot: Localized::from_value(lang, markdown_to_html(&subs.troubleshoot)),
        post_deploy: Localized::from_value(lang, markdown_to_html(&subs.post_deploy)),
        wiring: extract_wiring(&subs.wiring, lang),
    }
}

/// Parse `### Target:` sections over the whole (untruncated) step body.
/// A target ends at `---` or at the next target header.
pub fn parse_targets(body: &[&str], lang: &str) -> Vec<TargetInfo> {
    let mut targets = Vec::new();
    let mut current: Option<(TargetHeader<'_>, Vec<&str>)> = None;
    let mut closed = false;

    for &line in body {
        match classify_body_line(line.trim()) {
            BodyLine::Target(header) => {
                if let Some((prev, content)) = current.take() {
                    targets.push(build_target(&prev, &content, lang));
                }
                current = Some((header, Vec::new()));
                closed = false;
            }
            BodyLine::Separator => closed = true,
            _ => {
                if let Some((_, content)) = current.as_mut() {
                    if !closed {
                        content.push(line);
                    }
                }
            }
        }
    }
    if let Some((prev, content)) = current {
        targets.push(build_target(&prev, &content, lang));
    }
    targets
}

fn build_target(header: &TargetHeader<'_>, content: &[&str], lang: &str) -> TargetInfo {
    let subs = split_subsections(content);
    TargetInfo {
        id: header.id.to_string(),
        name: Localized::from_value(lang, header.name.trim().to_string()),
        config_file: header.config_file.clone(),
        default: header.default,
        target_type: header.target_type,
        description: Localized::from_value(lang, subs.main.clone()),
        description_html: Localized::from_value(lang, markdown_to_html(&subs.main)),
        troubleshoot: Localized::from_value(lang, markdown_to_html(&subs.troubleshoot)),
        post_deploy: Localized::from_value(lang, markdown_to_html(&subs.post_deploy)),
        wiring: extract_wiring(&subs.wiring, lang),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetType;

    fn lines(s: &str) -> Vec<&str> {
        s.lines().collect()
    }

    #[test]
    fn no_subsections() {
        let subs = split_subsections(&lines("This is main content.\n\nMore content here.\n"));
        assert!(subs.main.contains("main content"));
        assert_eq!(subs.prerequisites, "");
        assert_eq!(subs.troubleshoot, "");
    }

    #[test]
    fn all_subsections() {
        let body = "Main content here.\n\n### Prerequisites\n\nSetup requirements.\n\n### Wiring\n\n![Diagram](image.png)\n\n1. Connect cable\n2. Power on\n\n### Troubleshooting\n\nCheck connections.\n\n### Deployment Complete\n\nOpen the dashboard.\n\n---\n";
        let subs = split_subsections(&lines(body));
        assert_eq!(subs.main, "Main content here.");
        assert_eq!(subs.prerequisites, "Setup requirements.");
        assert!(subs.wiring.contains("Connect cable"));
        assert_eq!(subs.troubleshoot, "Check connections.");
        assert_eq!(subs.post_deploy, "Open the dashboard.");
    }

    #[test]
    fn chinese_subsections() {
        let body = "主要内容。\n\n### 前置条件\n\n- 条件 1\n\n### 故障排除\n\n检查网络连接。\n";
        let subs = split_subsections(&lines(body));
        assert!(subs.main.contains("主要内容"));
        assert!(subs.prerequisites.contains("条件 1"));
        assert!(subs.troubleshoot.contains("网络连接"));
    }

    #[test]
    fn split_stops_at_first_target() {
        let body = "Intro.\n\n### Target: Local {#local}\n\nLocal text.\n\n### Troubleshooting\n\nTarget fix.\n";
        let subs = split_subsections(&lines(body));
        assert_eq!(subs.main, "Intro.");
        assert_eq!(subs.troubleshoot, "");
    }

    #[test]
    fn subtitle_skips_markup_lines() {
        let md = "![diagram](a.png)\n\n| a | b |\n- item\n1. first\n#### Heading\n\nUse **Docker** with [compose](https://x.y) and `make`.";
        assert_eq!(extract_subtitle(md), "Use Docker with compose and make.");
    }

    #[test]
    fn subtitle_keeps_identifiers() {
        assert_eq!(extract_subtitle("Set my_var_name to *on*."), "Set my_var_name to on.");
        assert_eq!(extract_subtitle(""), "");
    }

    #[test]
    fn subtitle_unquotes_blockquotes() {
        assert_eq!(extract_subtitle("> **quoted** bold note"), "quoted bold note");
        assert_eq!(extract_subtitle(">> nested"), "nested");
        assert_eq!(extract_subtitle(">\n> \n> Second line."), "Second line.");
    }

    #[test]
    fn wiring_with_image_and_steps() {
        let w = extract_wiring(
            "![Wiring Diagram](gallery/wiring.png)\n\n1. Connect USB cable\n2. Power on the device\n3. Check LED status\n",
            "en",
        )
        .unwrap();
        assert_eq!(w.image.as_deref(), Some("gallery/wiring.png"));
        let steps = w.steps.get_exact("en").unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], "Connect USB cable");
    }

    #[test]
    fn wiring_image_only() {
        let w = extract_wiring("![Architecture](arch.png)\n\nSome text.", "en").unwrap();
        assert_eq!(w.image.as_deref(), Some("arch.png"));
        assert_eq!(w.steps.get_exact("en"), Some(&Vec::new()));
    }

    #[test]
    fn wiring_absent() {
        assert!(extract_wiring("Just plain text.", "en").is_none());
        assert!(extract_wiring("", "en").is_none());
    }

    #[test]
    fn targets_end_at_separator_or_next_header() {
        let body = "Pick one.\n\n### Target: Local {#local config=devices/local.yaml default=true}\n\nRun on this machine.\n\n### Wiring\n\n1. Plug in\n\n### Troubleshooting\n\nRestart Docker.\n\n### Target: Remote {#remote config=devices/remote.yaml type=remote}\n\nRun over SSH.\n\n---\n\nTrailing text that belongs to nobody.\n";
        let targets = parse_targets(&lines(body), "en");
        assert_eq!(targets.len(), 2);

        let local = &targets[0];
        assert_eq!(local.id, "local");
        assert!(local.default);
        assert_eq!(local.config_file.as_deref(), Some("devices/local.yaml"));
        assert_eq!(local.description.get_exact("en").map(String::as_str), Some("Run on this machine."));
        assert!(local.troubleshoot.get_exact("en").unwrap().contains("Restart Docker"));
        let wiring = local.wiring.as_ref().unwrap();
        assert_eq!(wiring.steps.get_exact("en").unwrap(), &vec!["Plug in".to_string()]);

        let remote = &targets[1];
        assert_eq!(remote.target_type, TargetType::Remote);
        assert_eq!(remote.description.get_exact("en").map(String::as_str), Some("Run over SSH."));
        assert!(!remote.description_html.get_exact("en").unwrap().contains("Trailing"));
    }
}
