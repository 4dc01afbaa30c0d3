use crate::error::GraphError;
use crate::ir::{Cluster, Edge, Node, NodeKind, Roadmap};

pub const FALLBACK_TITLE: &str = "Technical roadmap (fallback)";

/// Longest error fragment embedded in the fallback title.
pub const ERROR_FRAGMENT_CHARS: usize = 20;

const CLUSTERS: [(&str, &str); 3] = [
    ("phase1", "Phase 1: Research preparation"),
    ("phase2", "Phase 2: Core research"),
    ("phase3", "Phase 3: Application and validation"),
];

const NODES: [(&str, &str, NodeKind, &str); 12] = [
    ("s1", "Preparation", NodeKind::StageLabel, "phase1"),
    ("t1", "Literature review", NodeKind::Task, "phase1"),
    ("sub1", "Input: CNKI / WoS", NodeKind::SubContent, "phase1"),
    ("m1", "Bibliometrics", NodeKind::Method, "phase1"),
    ("s2", "Core research", NodeKind::StageLabel, "phase2"),
    ("t2", "Build the model", NodeKind::Task, "phase2"),
    ("sub2", "Vars: GDP / R&D", NodeKind::SubContent, "phase2"),
    ("m2", "Regression", NodeKind::Method, "phase2"),
    ("s3", "Validation", NodeKind::StageLabel, "phase3"),
    ("t3", "Empirical study", NodeKind::Task, "phase3"),
    ("sub3", "Metric: accuracy", NodeKind::SubContent, "phase3"),
    ("m3", "Case study", NodeKind::Method, "phase3"),
];

const EDGES: [(&str, &str); 8] = [
    ("t1", "t2"),
    ("t2", "t3"),
    ("t1", "sub1"),
    ("t2", "sub2"),
    ("t3", "sub3"),
    ("sub1", "m1"),
    ("sub2", "m2"),
    ("sub3", "m3"),
];

/// Canned three-phase roadmap used whenever extraction fails.
///
/// `raw_text` is only inspected for diagnostics. A non-blank `error` is
/// embedded (whitespace-collapsed, truncated) into the title.
pub fn build_fallback_roadmap(raw_text: &str, error: Option<&str>) -> Roadmap {
    log::warn!(
        "using fallback roadmap for {} chars of input{}",
        raw_text.chars().count(),
        error.map(|e| format!(": {e}")).unwrap_or_default()
    );

    match assemble(&fallback_title(error)) {
        Ok(roadmap) => roadmap,
        Err(err) => unreachable!("fallback roadmap is invalid: {err}"),
    }
}

fn assemble(title: &str) -> Result<Roadmap, GraphError> {
    let clusters = CLUSTERS
        .iter()
        .map(|(id, label)| Cluster::new(id, label))
        .collect::<Result<Vec<_>, _>>()?;
    let nodes = NODES
        .iter()
        .map(|(id, label, kind, parent)| Node::new(id, label, *kind, parent))
        .collect::<Result<Vec<_>, _>>()?;
    let edges = EDGES
        .iter()
        .map(|(source, target)| Edge::new(source, target))
        .collect::<Result<Vec<_>, _>>()?;
    Roadmap::build(title, clusters, nodes, edges)
}

fn fallback_title(error: Option<&str>) -> String {
    let fragment = error
        .map(|e| e.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|e| !e.is_empty())
        .map(|e| e.chars().take(ERROR_FRAGMENT_CHARS).collect::<String>());
    match fragment {
        Some(fragment) => format!("{FALLBACK_TITLE} [Error: {fragment}...]"),
        None => FALLBACK_TITLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded_fragment(title: &str) -> Option<&str> {
        let start = title.find("[Error: ")? + "[Error: ".len();
        let end = title.rfind("...]")?;
        Some(&title[start..end])
    }

    #[test]
    fn timeout_error_is_embedded_in_title() {
        let roadmap = build_fallback_roadmap("paper text", Some("timeout after 60s"));
        let fragment = embedded_fragment(roadmap.title()).unwrap();
        assert_eq!(fragment, "timeout after 60s");
        assert!(fragment.chars().count() <= ERROR_FRAGMENT_CHARS);
        assert_eq!(roadmap.clusters().len(), 3);
        assert_eq!(roadmap.nodes().len(), 12);
        assert_eq!(roadmap.edges().len(), 8);
    }

    #[test]
    fn no_error_keeps_plain_title() {
        assert_eq!(build_fallback_roadmap("", None).title(), FALLBACK_TITLE);
        assert_eq!(build_fallback_roadmap("", Some("  \n ")).title(), FALLBACK_TITLE);
    }

    #[test]
    fn output_is_valid_for_arbitrary_error_text() {
        let long = "x".repeat(10_000);
        let multibyte = "解析失败：模型返回了无效的 JSON 结构，请稍后重试";
        for error in ["", "\n", long.as_str(), multibyte, "quote \" and \\ backslash"] {
            let roadmap = build_fallback_roadmap(error, Some(error));
            assert!(roadmap.ensure_consistency().is_ok());
            if let Some(fragment) = embedded_fragment(roadmap.title()) {
                assert!(fragment.chars().count() <= ERROR_FRAGMENT_CHARS);
            }
        }
    }

    #[test]
    fn every_cluster_has_one_node_of_each_kind() {
        let roadmap = build_fallback_roadmap("", None);
        for cluster in roadmap.clusters() {
            let mut kinds: Vec<NodeKind> = roadmap
                .nodes_in_cluster(cluster.id())
                .iter()
                .map(|n| n.kind())
                .collect();
            kinds.sort();
            assert_eq!(
                kinds,
                vec![
                    NodeKind::StageLabel,
                    NodeKind::Task,
                    NodeKind::SubContent,
                    NodeKind::Method
                ]
            );
        }
        assert!(roadmap.has_edge("t1", "t2"));
        assert!(roadmap.has_edge("t2", "t3"));
        assert!(roadmap.has_edge("sub3", "m3"));
    }
}
