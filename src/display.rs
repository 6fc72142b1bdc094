//! Plain-text rendering of projected trees for the terminal.

use futures::future::{BoxFuture, FutureExt};

use crate::tree::{TreeNode, TreeProjector};

/// One line per node: `label  (description)`, indented two spaces per level.
pub fn render_line(node: &TreeNode, depth: usize) -> String {
    let marker = match node {
        TreeNode::Sentinel(_) => "!",
        _ if node.is_expandable() => "+",
        _ => "-",
    };
    let description = node.description();
    if description.is_empty() {
        format!("{}{} {}", "  ".repeat(depth), marker, node.label())
    } else {
        format!("{}{} {}  ({})", "  ".repeat(depth), marker, node.label(), description)
    }
}

/// Level 0 only. Never touches the network.
pub fn render_roots(projector: &TreeProjector) -> String {
    let mut out = String::new();
    for node in projector.roots() {
        out.push_str(&render_line(&node, 0));
        out.push('\n');
    }
    out
}

/// `node` and everything below it, down to `max_depth` levels.
pub fn render_subtree<'a>(
    projector: &'a TreeProjector,
    node: &'a TreeNode,
    depth: usize,
    max_depth: usize,
) -> BoxFuture<'a, String> {
    async move {
        let mut out = render_line(node, depth);
        out.push('\n');
        if depth < max_depth && node.is_expandable() {
            for child in projector.children(node).await {
                out.push_str(&render_subtree(projector, &child, depth + 1, max_depth).await);
            }
        }
        out
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ExecutionStatus;
    use crate::artifact::ArtifactClassifier;
    use crate::cache::tests::{brief, detail_for, FakeApi};
    use crate::cache::ExecutionCache;
    use std::sync::Arc;

    #[test]
    fn test_empty_roots_render_sentinel() {
        let cache = Arc::new(ExecutionCache::new(Arc::new(FakeApi::default())));
        let projector = TreeProjector::new(cache, Arc::new(ArtifactClassifier::default()));
        let out = render_roots(&projector);
        assert!(out.starts_with("! No executions"));
        assert_eq!(out.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_subtree_includes_results() {
        let api = Arc::new(FakeApi::default());
        let b = brief("e1", ExecutionStatus::Failed, 1);
        let results = vec![serde_json::from_value(serde_json::json!({
            "test_id": "t1",
            "test_name": "login",
            "testsuite_name": "auth",
            "time": 1.5,
            "failures_count": 1
        }))
        .unwrap()];
        api.push_detail("e1", Ok(detail_for(&b, results)));
        let cache = Arc::new(ExecutionCache::new(api));
        cache.reconcile(vec![b]);
        let projector = TreeProjector::new(cache, Arc::new(ArtifactClassifier::default()));

        let root = projector.roots().remove(0);
        let out = render_subtree(&projector, &root, 0, 2).await;
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("+ e1  (failed | 0/2 tests"));
        assert!(lines[1].starts_with("  - "));
        assert!(lines[2].contains("login  (auth | 1.5s | 1 failures, 0 errors)"));
    }
}
