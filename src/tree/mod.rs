//! Display hierarchy: execution -> test result -> artifact.

pub mod projector;

pub use self::projector::TreeProjector;

use serde::Serialize;

use crate::api::{ExecutionBrief, ExecutionStatus, TestResult};
use crate::artifact::{Artifact, ArtifactKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// One tracked execution (level 0).
    Root(ExecutionNode),
    /// Pass/fail headline for an execution (level 1).
    Summary(SummaryNode),
    /// One test scenario (level 1).
    TestResult(TestResultNode),
    /// A file or folder on disk (level 2, and below for folders).
    Artifact(Artifact),
    /// Stands in for missing data.
    Sentinel(Sentinel),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionNode {
    pub brief: ExecutionBrief,
    pub hydrated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryNode {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub test_passed: bool,
    pub test_summary: String,
    pub total_tests: u32,
    pub failed_tests: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResultNode {
    pub execution_id: String,
    pub result: TestResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sentinel {
    NoExecutions,
    Error { execution_id: String, message: String },
}

impl TreeNode {
    pub fn label(&self) -> String {
        match self {
            TreeNode::Root(n) => n.brief.execution_id.clone(),
            TreeNode::Summary(n) if n.test_passed => "Passed".to_string(),
            TreeNode::Summary(_) => "Failed".to_string(),
            TreeNode::TestResult(n) => {
                if n.result.test_name.is_empty() {
                    n.result.test_id.clone()
                } else {
                    n.result.test_name.clone()
                }
            }
            TreeNode::Artifact(a) => a.label.clone(),
            TreeNode::Sentinel(Sentinel::NoExecutions) => "No executions".to_string(),
            TreeNode::Sentinel(Sentinel::Error { .. }) => "Error loading test results".to_string(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            TreeNode::Root(n) => {
                let b = &n.brief;
                let mut desc = format!(
                    "{} | {}/{} tests",
                    b.status, b.completed_tests, b.total_tests
                );
                if b.failed_tests > 0 {
                    desc.push_str(&format!(", {} failed", b.failed_tests));
                }
                desc.push_str(&format!(" | {}", b.start_time.format("%Y-%m-%d %H:%M:%S")));
                if !b.source.is_empty() {
                    desc.push_str(&format!(" | {}", b.source));
                }
                desc
            }
            TreeNode::Summary(n) => {
                if n.test_summary.is_empty() {
                    format!("{} | {} of {} failed", n.status, n.failed_tests, n.total_tests)
                } else {
                    n.test_summary.clone()
                }
            }
            TreeNode::TestResult(n) => {
                let r = &n.result;
                let mut desc = format!("{:.1}s", r.time);
                if !r.testsuite_name.is_empty() {
                    desc = format!("{} | {}", r.testsuite_name, desc);
                }
                if !r.passed() {
                    desc.push_str(&format!(
                        " | {} failures, {} errors",
                        r.failures_count, r.errors_count
                    ));
                }
                desc
            }
            TreeNode::Artifact(a) => format!("{} | {}", a.kind, a.path.display()),
            TreeNode::Sentinel(Sentinel::NoExecutions) => {
                "backend not polled yet or no runs reported".to_string()
            }
            TreeNode::Sentinel(Sentinel::Error { message, .. }) => message.clone(),
        }
    }

    pub fn is_expandable(&self) -> bool {
        match self {
            TreeNode::Root(_) | TreeNode::TestResult(_) => true,
            TreeNode::Artifact(a) => a.kind == ArtifactKind::Folder,
            TreeNode::Summary(_) | TreeNode::Sentinel(_) => false,
        }
    }

    pub fn execution_id(&self) -> Option<&str> {
        match self {
            TreeNode::Root(n) => Some(&n.brief.execution_id),
            TreeNode::Summary(n) => Some(&n.execution_id),
            TreeNode::TestResult(n) => Some(&n.execution_id),
            TreeNode::Sentinel(Sentinel::Error { execution_id, .. }) => Some(execution_id),
            TreeNode::Artifact(_) | TreeNode::Sentinel(Sentinel::NoExecutions) => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, TreeNode::Sentinel(_))
    }
}
