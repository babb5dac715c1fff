//! Header grammar, line classification and `{#id key=value}` attributes.
//!
//! Every header accepts an English and a Chinese keyword so guides can be
//! written in either language with the same punctuation.

use crate::error::{ErrorKind, ParseError};
use crate::model::{StepType, TargetType};
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_SUCCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#\s+(?:Deployment\s+Complete|部署完成)\s*$").unwrap()
});

static RE_PRESET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^##\s+(?:Preset|套餐)\s*[:：]\s*(.+?)\s*\{#(\w+)[^}]*\}\s*$").unwrap()
});

static RE_STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^##\s+(?:Step\s+\d+\s*[:：]\s*|步骤\s*\d+\s*[:：]\s*)?(.+?)\s*\{#(\w+)([^}]*)\}\s*$",
    )
    .unwrap()
});

// Anything that looks like it wants to be a step. Checked against RE_STEP later.
static RE_STEP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^##\s+(?:Step\s+\d+\s*[:：]|步骤\s*\d+|[^{]*\{#)").unwrap()
});

static RE_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^###\s+(?:Target|部署目标)\s*[:：]?\s*(.+?)\s*\{#(\w+)([^}]*)\}\s*$").unwrap()
});

static RE_COMPLETION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^###\s+(?:Deployment\s+Complete|部署完成)\s*$").unwrap()
});

static RE_PREREQUISITES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^###\s+(?:Prerequisites|前置条件)\s*$").unwrap());

static RE_WIRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^###\s+(?:Wiring|接线)\s*$").unwrap());

static RE_TROUBLESHOOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^###\s+(?:Troubleshooting|故障排查|故障排除)\s*$").unwrap()
});

static RE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)=(?:"([^"]*)"|(\S+))"#).unwrap());

// -- Document-level headers ---------------------------------------------------

/// A line that changes the parser's section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header<'a> {
    /// `# Deployment Complete`
    Success,
    Preset { name: &'a str, id: &'a str },
    /// Raw step header; validated when the step is finalized.
    Step,
    /// `### Deployment Complete`. Only a header when no step is open.
    Completion,
}

/// Classify a trimmed line. Precedence: success, preset, step, completion.
pub fn classify_header(line: &str) -> Option<Header<'_>> {
    if RE_SUCCESS.is_match(line) {
        return Some(Header::Success);
    }
    if let Some(caps) = RE_PRESET.captures(line) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let id = caps.get(2).map_or("", |m| m.as_str());
        return Some(Header::Preset { name, id });
    }
    if RE_STEP_LIKE.is_match(line) {
        return Some(Header::Step);
    }
    if RE_COMPLETION.is_match(line) {
        return Some(Header::Completion);
    }
    None
}

// -- Body-level lines ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsection {
    Main,
    Prerequisites,
    Wiring,
    Troubleshoot,
    PostDeploy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyLine<'a> {
    Target(TargetHeader<'a>),
    Subsection(Subsection),
    /// `---`
    Separator,
    Text,
}

/// Classify a trimmed line inside a step body.
pub fn classify_body_line(line: &str) -> BodyLine<'_> {
    if let Some(target) = parse_target_header(line) {
        return BodyLine::Target(target);
    }
    if let Some(sub) = subsection_of(line) {
        return BodyLine::Subsection(sub);
    }
    if line == "---" {
        return BodyLine::Separator;
    }
    BodyLine::Text
}

fn subsection_of(line: &str) -> Option<Subsection> {
    if RE_PREREQUISITES.is_match(line) {
        Some(Subsection::Prerequisites)
    } else if RE_WIRING.is_match(line) {
        Some(Subsection::Wiring)
    } else if RE_TROUBLESHOOT.is_match(line) {
        Some(Subsection::Troubleshoot)
    } else if RE_COMPLETION.is_match(line) {
        Some(Subsection::PostDeploy)
    } else {
        None
    }
}

// -- Attributes ---------------------------------------------------------------

/// Attribute value after coercion: `true`/`false` (any case) become booleans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Bool(bool),
}

impl AttrValue {
    fn coerce(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            AttrValue::Bool(true)
        } else if raw.eq_ignore_ascii_case("false") {
            AttrValue::Bool(false)
        } else {
            AttrValue::Text(raw.to_string())
        }
    }

    /// The value as written, booleans rendered back as `true`/`false`.
    pub fn as_text(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Bool(b) => b.to_string(),
        }
    }
}

/// `key=value` tokens in source order. A repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttributes(Vec<(String, AttrValue)>);

impl RawAttributes {
    pub fn parse(input: &str) -> Self {
        let pairs = RE_ATTR
            .captures_iter(input)
            .map(|caps| {
                let key = caps[1].to_string();
                let raw = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                (key, AttrValue::coerce(raw))
            })
            .collect();
        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// -- Step headers -------------------------------------------------------------

/// A step header that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepHeader {
    pub title: String,
    pub id: String,
    pub step_type: StepType,
    pub required: bool,
    pub config_file: Option<String>,
}

const STEP_FORMAT_HINT: &str = "Use format: ## Step N: Title {#step_id type=xxx required=true}";

/// Validate a step header line into a typed record.
pub fn parse_step_header(line: &str, line_no: usize) -> Result<StepHeader, ParseError> {
    let caps = RE_STEP.captures(line).ok_or_else(|| {
        ParseError::new(
            ErrorKind::InvalidStepFormat,
            format!("Invalid step header format: {}", line),
        )
        .at_line(line_no)
        .suggest(STEP_FORMAT_HINT)
    })?;

    let title = caps[1].trim().to_string();
    let id = caps[2].to_string();
    let attrs = RawAttributes::parse(&caps[3]);

    let step_type = match attrs.get("type") {
        None => {
            return Err(ParseError::new(
                ErrorKind::MissingRequiredField,
                format!("Step '{}' missing required 'type' attribute", id),
            )
            .at_line(line_no)
            .suggest(format!(
                "Add type=xxx where xxx is one of: {}",
                StepType::valid_list()
            )))
        }
        Some(value) => {
            let tag = value.as_text();
            let parsed = match value {
                AttrValue::Text(s) => s.parse::<StepType>().ok(),
                AttrValue::Bool(_) => None,
            };
            parsed.ok_or_else(|| {
                ParseError::new(
                    ErrorKind::InvalidStepType,
                    format!("Invalid step type '{}' for step '{}'", tag, id),
                )
                .at_line(line_no)
                .suggest(format!("Valid types: {}", StepType::valid_list()))
            })?
        }
    };

    let required = match attrs.get("required") {
        None => true,
        Some(AttrValue::Bool(b)) => *b,
        Some(AttrValue::Text(other)) => {
            return Err(ParseError::new(
                ErrorKind::InvalidStepFormat,
                format!("Step '{}' has non-boolean required={}", id, other),
            )
            .at_line(line_no)
            .suggest("Use required=true or required=false"))
        }
    };

    Ok(StepHeader {
        title,
        id,
        step_type,
        required,
        config_file: attrs.get("config").map(AttrValue::as_text),
    })
}

// -- Target headers -----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHeader<'a> {
    pub name: &'a str,
    pub id: &'a str,
    pub config_file: Option<String>,
    pub default: bool,
    pub target_type: TargetType,
}

pub fn parse_target_header(line: &str) -> Option<TargetHeader<'_>> {
    let caps = RE_TARGET.captures(line)?;
    let name = caps.get(1)?.as_str();
    let id = caps.get(2)?.as_str();
    let attrs = RawAttributes::parse(caps.get(3).map_or("", |m| m.as_str()));

    let target_type = match attrs.get("type") {
        Some(AttrValue::Text(t)) if t.eq_ignore_ascii_case("remote") => TargetType::Remote,
        _ => TargetType::Local,
    };

    Some(TargetHeader {
        name,
        id,
        config_file: attrs.get("config").map(AttrValue::as_text),
        default: matches!(attrs.get("default"), Some(AttrValue::Bool(true))),
        target_type,
    })
}
