//! Data model for parsed deployment guides.
//!
//! A single-language parse and a merged multi-language parse share these
//! types; a single-language result simply has one language in every
//! [`Localized`] field.

use crate::error::{ParseError, ParseWarning};
use crate::localized::Localized;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Closed set of deployment step kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    DockerDeploy,
    DockerLocal,
    DockerRemote,
    SshDeb,
    Script,
    Manual,
    Esp32Usb,
    HimaxUsb,
    Preview,
    RecameraCpp,
    RecameraNodered,
    SerialCamera,
    HaIntegration,
}

impl StepType {
    pub const ALL: [StepType; 13] = [
        StepType::DockerDeploy,
        StepType::DockerLocal,
        StepType::DockerRemote,
        StepType::SshDeb,
        StepType::Script,
        StepType::Manual,
        StepType::Esp32Usb,
        StepType::HimaxUsb,
        StepType::Preview,
        StepType::RecameraCpp,
        StepType::RecameraNodered,
        StepType::SerialCamera,
        StepType::HaIntegration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepType::DockerDeploy => "docker_deploy",
            StepType::DockerLocal => "docker_local",
            StepType::DockerRemote => "docker_remote",
            StepType::SshDeb => "ssh_deb",
            StepType::Script => "script",
            StepType::Manual => "manual",
            StepType::Esp32Usb => "esp32_usb",
            StepType::HimaxUsb => "himax_usb",
            StepType::Preview => "preview",
            StepType::RecameraCpp => "recamera_cpp",
            StepType::RecameraNodered => "recamera_nodered",
            StepType::SerialCamera => "serial_camera",
            StepType::HaIntegration => "ha_integration",
        }
    }

    /// Types whose body may offer alternative `### Target:` sections.
    pub fn supports_targets(self) -> bool {
        matches!(self, StepType::DockerDeploy | StepType::RecameraCpp)
    }

    /// Comma-separated, sorted list of valid tags for error hints.
    pub fn valid_list() -> String {
        let mut names: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

impl FromStr for StepType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a target runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    #[default]
    Local,
    Remote,
}

/// Wiring diagram plus ordered assembly instructions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WiringInfo {
    /// Language-independent; the first language that supplies one wins.
    pub image: Option<String>,
    pub steps: Localized<Vec<String>>,
}

/// Step body, split into its subsections. HTML unless noted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SectionContent {
    pub title: Localized<String>,
    /// First plain-prose line of the body, markup stripped.
    pub subtitle: Localized<String>,
    pub description: Localized<String>,
    pub prerequisites: Localized<String>,
    pub troubleshoot: Localized<String>,
    pub post_deploy: Localized<String>,
    pub wiring: Option<WiringInfo>,
}

/// Alternative execution mode for a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetInfo {
    pub id: String,
    pub name: Localized<String>,
    pub config_file: Option<String>,
    pub default: bool,
    pub target_type: TargetType,
    /// Plain Markdown, for compact selectors.
    pub description: Localized<String>,
    pub description_html: Localized<String>,
    pub troubleshoot: Localized<String>,
    pub post_deploy: Localized<String>,
    pub wiring: Option<WiringInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentStep {
    pub id: String,
    pub title: Localized<String>,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub required: bool,
    pub config_file: Option<String>,
    pub section: SectionContent,
    /// Only populated when `step_type.supports_targets()`.
    pub targets: Vec<TargetInfo>,
}

impl DeploymentStep {
    pub fn signature(&self) -> StepSignature {
        StepSignature {
            id: self.id.clone(),
            step_type: self.step_type,
            required: self.required,
            config_file: self.config_file.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SuccessContent {
    pub content: Localized<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetGuide {
    pub id: String,
    pub name: Localized<String>,
    pub description: Localized<String>,
    pub steps: Vec<DeploymentStep>,
    pub completion: Option<SuccessContent>,
}

/// Everything parsed from one guide, in document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParseResult {
    /// Contributing languages, base first.
    pub languages: Vec<String>,
    pub overview: Localized<String>,
    pub presets: Vec<PresetGuide>,
    /// Steps outside any preset.
    pub steps: Vec<DeploymentStep>,
    pub success: Option<SuccessContent>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn primary_language(&self) -> Option<&str> {
        self.languages.first().map(String::as_str)
    }

    /// Preset steps in preset order, then top-level steps.
    pub fn all_steps(&self) -> impl Iterator<Item = &DeploymentStep> {
        self.presets
            .iter()
            .flat_map(|p| p.steps.iter())
            .chain(self.steps.iter())
    }
}

/// The structural facts of a step that every language must agree on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSignature {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub required: bool,
    pub config_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureValidationResult {
    pub valid: bool,
    /// language → preset ids in document order.
    pub presets: IndexMap<String, Vec<String>>,
    /// language → preset id → step signatures in document order.
    pub steps_by_preset: IndexMap<String, IndexMap<String, Vec<StepSignature>>>,
    pub errors: Vec<ParseError>,
    /// Translation gaps of the compared languages. Filled by the parse entry
    /// points; empty from [`crate::validate_structure`].
    pub warnings: Vec<ParseWarning>,
}

impl Default for StructureValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            presets: IndexMap::new(),
            steps_by_preset: IndexMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_type_round_trips_every_tag() {
        for t in StepType::ALL {
            assert_eq!(t.as_str().parse::<StepType>(), Ok(t));
        }
        assert!("docker".parse::<StepType>().is_err());
        assert!("Manual".parse::<StepType>().is_err());
    }

    #[test]
    fn only_docker_deploy_and_recamera_cpp_take_targets() {
        let with_targets: Vec<_> = StepType::ALL
            .into_iter()
            .filter(|t| t.supports_targets())
            .collect();
        assert_eq!(with_targets, vec![StepType::DockerDeploy, StepType::RecameraCpp]);
    }

    #[test]
    fn valid_list_is_sorted() {
        let list = StepType::valid_list();
        assert!(list.starts_with("docker_deploy, docker_local"));
        assert!(list.ends_with("ssh_deb"));
    }
}
