//! Pull-based projection of cache contents into [`TreeNode`]s.
//!
//! Nothing here is pushed to the display. Consumers ask for roots, then
//! for the children of whatever node the user expands. Level-1 children
//! hydrate execution detail on demand; level-2 children check the disk
//! every time they are asked for.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::{ExecutionNode, Sentinel, SummaryNode, TestResultNode, TreeNode};
use crate::api::TestResult;
use crate::artifact::{Artifact, ArtifactClassifier, ArtifactField, ArtifactKind};
use crate::cache::ExecutionCache;

pub struct TreeProjector {
    cache: Arc<ExecutionCache>,
    classifier: Arc<ArtifactClassifier>,
    artifact_root: Option<PathBuf>,
}

impl TreeProjector {
    pub fn new(cache: Arc<ExecutionCache>, classifier: Arc<ArtifactClassifier>) -> Self {
        Self {
            cache,
            classifier,
            artifact_root: None,
        }
    }

    /// Resolve relative artifact paths against `root`.
    pub fn with_artifact_root(mut self, root: Option<PathBuf>) -> Self {
        self.artifact_root = root;
        self
    }

    /// Level 0: every cached execution, newest first.
    ///
    /// Never empty; an empty cache yields a single `NoExecutions` sentinel.
    pub fn roots(&self) -> Vec<TreeNode> {
        let mut entries = self.cache.snapshot();
        if entries.is_empty() {
            return vec![TreeNode::Sentinel(Sentinel::NoExecutions)];
        }

        entries.sort_by(|a, b| {
            Reverse(a.brief.start_time)
                .cmp(&Reverse(b.brief.start_time))
                .then_with(|| a.brief.execution_id.cmp(&b.brief.execution_id))
        });

        entries
            .into_iter()
            .map(|entry| {
                TreeNode::Root(ExecutionNode {
                    hydrated: entry.details.is_some(),
                    brief: entry.brief,
                })
            })
            .collect()
    }

    pub async fn children(&self, node: &TreeNode) -> Vec<TreeNode> {
        match node {
            TreeNode::Root(n) => self.execution_children(&n.brief.execution_id).await,
            TreeNode::TestResult(n) => self
                .artifacts(&n.result)
                .into_iter()
                .map(TreeNode::Artifact)
                .collect(),
            TreeNode::Artifact(a) => self.folder_entries(a),
            TreeNode::Summary(_) | TreeNode::Sentinel(_) => Vec::new(),
        }
    }

    /// Level 1: a summary node followed by one node per test result, in
    /// backend order. Any failure becomes a single error sentinel.
    pub async fn execution_children(&self, execution_id: &str) -> Vec<TreeNode> {
        let detail = match self.cache.hydrate(execution_id).await {
            Ok(detail) => detail,
            Err(e) => {
                return vec![TreeNode::Sentinel(Sentinel::Error {
                    execution_id: execution_id.to_string(),
                    message: e.to_string(),
                })];
            }
        };

        // Prefer the latest polled brief; the detail may predate it.
        let brief = self
            .cache
            .brief(execution_id)
            .unwrap_or_else(|| detail.brief.clone());

        let mut children = Vec::with_capacity(detail.xml_results.len() + 1);
        children.push(TreeNode::Summary(SummaryNode {
            execution_id: execution_id.to_string(),
            status: brief.status,
            test_passed: detail.test_passed,
            test_summary: detail.test_summary.clone(),
            total_tests: brief.total_tests,
            failed_tests: brief.failed_tests,
        }));
        children.extend(detail.xml_results.iter().map(|result| {
            TreeNode::TestResult(TestResultNode {
                execution_id: execution_id.to_string(),
                result: result.clone(),
            })
        }));
        children
    }

    /// Level 2: populated artifact slots whose path exists right now, in
    /// canonical order.
    pub fn artifacts(&self, result: &TestResult) -> Vec<Artifact> {
        let fs = self.classifier.fs();
        ArtifactField::CANONICAL_ORDER
            .iter()
            .filter_map(|field| {
                let raw = field.path_in(result)?;
                let path = self.resolve(raw);
                if !fs.exists(&path) {
                    debug!(test_id = %result.test_id, path = %path.display(), "artifact not on disk yet");
                    return None;
                }
                Some(Artifact {
                    kind: self.classifier.classify(&path),
                    label: field.label().to_string(),
                    path,
                    test_id: result.test_id.clone(),
                })
            })
            .collect()
    }

    /// Entries of a folder artifact, sorted by name. Unreadable folders
    /// expand to nothing.
    fn folder_entries(&self, folder: &Artifact) -> Vec<TreeNode> {
        if folder.kind != ArtifactKind::Folder {
            return Vec::new();
        }
        let entries = match self.classifier.fs().list_dir(&folder.path) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %folder.path.display(), error = %e, "cannot list artifact folder");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .map(|path| {
                let label = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                TreeNode::Artifact(Artifact {
                    kind: self.classifier.classify(&path),
                    label,
                    path,
                    test_id: folder.test_id.clone(),
                })
            })
            .collect()
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        match &self.artifact_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
