//! Artifacts produced by a test run and how they are classified for display.

pub mod classify;

pub use self::classify::{ArtifactClassifier, ArtifactFs, LocalFs};

use std::path::PathBuf;

use serde::Serialize;

use crate::api::TestResult;

/// Display kind of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Video,
    Image,
    Json,
    Xml,
    Log,
    Feature,
    Folder,
    Text,
    Binary,
    Unknown,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArtifactKind::Video => "video",
            ArtifactKind::Image => "image",
            ArtifactKind::Json => "json",
            ArtifactKind::Xml => "xml",
            ArtifactKind::Log => "log",
            ArtifactKind::Feature => "feature",
            ArtifactKind::Folder => "folder",
            ArtifactKind::Text => "text",
            ArtifactKind::Binary => "binary",
            ArtifactKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A file or directory referenced by a test result. Derived at projection
/// time, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub label: String,
    pub test_id: String,
}

/// The artifact slots of a [`TestResult`], in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactField {
    FeatureFile,
    OutputXml,
    Video,
    Screenshots,
    NetworkLogs,
    AgentLogs,
    PlannerThoughts,
    Plan,
    FinalResponse,
}

impl ArtifactField {
    pub const CANONICAL_ORDER: [ArtifactField; 9] = [
        ArtifactField::FeatureFile,
        ArtifactField::OutputXml,
        ArtifactField::Video,
        ArtifactField::Screenshots,
        ArtifactField::NetworkLogs,
        ArtifactField::AgentLogs,
        ArtifactField::PlannerThoughts,
        ArtifactField::Plan,
        ArtifactField::FinalResponse,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ArtifactField::FeatureFile => "Feature File",
            ArtifactField::OutputXml => "XML Results",
            ArtifactField::Video => "Video",
            ArtifactField::Screenshots => "Screenshots",
            ArtifactField::NetworkLogs => "Network Logs",
            ArtifactField::AgentLogs => "Agent Logs",
            ArtifactField::PlannerThoughts => "Planner Thoughts",
            ArtifactField::Plan => "Plan",
            ArtifactField::FinalResponse => "Final Response",
        }
    }

    /// The populated path for this slot, if any. Empty strings count as unset.
    pub fn path_in(self, result: &TestResult) -> Option<&str> {
        let raw = match self {
            ArtifactField::FeatureFile => &result.feature_file,
            ArtifactField::OutputXml => &result.output_xml,
            ArtifactField::Video => &result.video,
            ArtifactField::Screenshots => &result.screenshots_folder,
            ArtifactField::NetworkLogs => &result.network_logs,
            ArtifactField::AgentLogs => &result.agent_logs_folder,
            ArtifactField::PlannerThoughts => &result.planner_thoughts,
            ArtifactField::Plan => &result.plan,
            ArtifactField::FinalResponse => &result.final_response,
        };
        raw.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}
