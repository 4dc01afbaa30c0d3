use std::collections::HashSet;

use crate::ir::Roadmap;

use super::types::{EdgeOrigin, EdgeStyle, PlannedEdge, SyntheticKind};

/// Weight of the invisible edges chaining the columns together.
pub const COLUMN_ANCHOR_WEIGHT: u32 = 100;

/// Explicit edges in source order, styled by the kinds of their endpoints.
fn explicit_edges(roadmap: &Roadmap) -> Vec<PlannedEdge> {
    let mut planned = Vec::with_capacity(roadmap.edges().len());
    for edge in roadmap.edges() {
        let (Some(source), Some(target)) = (roadmap.node(edge.source()), roadmap.node(edge.target()))
        else {
            log::debug!(
                "skipping unresolved edge {} -> {}",
                edge.source(),
                edge.target()
            );
            continue;
        };
        planned.push(PlannedEdge {
            source: edge.source().to_string(),
            target: edge.target().to_string(),
            label: edge.label().map(str::to_string),
            style: EdgeStyle::for_kinds(source.kind(), target.kind()),
            weight: None,
            origin: EdgeOrigin::Explicit,
        });
    }
    planned
}

/// Collects the explicit edges and inserts ordering edges without ever
/// duplicating an existing (source, target) pair.
pub(super) struct Synthesizer {
    existing: HashSet<(String, String)>,
    edges: Vec<PlannedEdge>,
}

impl Synthesizer {
    pub(super) fn new(roadmap: &Roadmap) -> Self {
        let edges = explicit_edges(roadmap);
        Self {
            existing: edges
                .iter()
                .map(|edge| (edge.source.clone(), edge.target.clone()))
                .collect(),
            edges,
        }
    }

    /// Solid arrowed edges between consecutive ids.
    pub(super) fn chain(&mut self, ids: &[String], kind: SyntheticKind) {
        for pair in ids.windows(2) {
            self.insert(&pair[0], &pair[1], EdgeStyle::SolidArrow, None, kind);
        }
    }

    /// Heavy edges between consecutive column representatives. A pair that is
    /// already linked keeps its edge and takes on the anchor weight.
    pub(super) fn anchor(&mut self, ids: &[String]) {
        for pair in ids.windows(2) {
            let (source, target) = (&pair[0], &pair[1]);
            if let Some(edge) = self
                .edges
                .iter_mut()
                .find(|edge| edge.source == *source && edge.target == *target)
            {
                edge.weight = Some(edge.weight.unwrap_or(0).max(COLUMN_ANCHOR_WEIGHT));
                log::debug!("anchoring existing edge {source} -> {target}");
                continue;
            }
            self.insert(
                source,
                target,
                EdgeStyle::Invisible,
                Some(COLUMN_ANCHOR_WEIGHT),
                SyntheticKind::ColumnAnchor,
            );
        }
    }

    /// Invisible edges between consecutive row proxies of one task.
    pub(super) fn stack(&mut self, proxies: &[String]) {
        for pair in proxies.windows(2) {
            self.insert(&pair[0], &pair[1], EdgeStyle::Invisible, None, SyntheticKind::RowStack);
        }
    }

    fn insert(
        &mut self,
        source: &str,
        target: &str,
        style: EdgeStyle,
        weight: Option<u32>,
        kind: SyntheticKind,
    ) {
        if source == target
            || !self
                .existing
                .insert((source.to_string(), target.to_string()))
        {
            return;
        }
        log::debug!("synthesizing {kind:?} edge {source} -> {target}");
        self.edges.push(PlannedEdge {
            source: source.to_string(),
            target: target.to_string(),
            label: None,
            style,
            weight,
            origin: EdgeOrigin::Synthetic(kind),
        });
    }

    /// Explicit edges in source order, then synthetic edges.
    pub(super) fn finish(self) -> Vec<PlannedEdge> {
        self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Cluster, Edge, Node, NodeKind};

    fn roadmap(edges: &[(&str, &str)]) -> Roadmap {
        Roadmap::build(
            "Roadmap",
            vec![Cluster::new("c1", "Phase").unwrap()],
            vec![
                Node::new("a", "A", NodeKind::Task, "c1").unwrap(),
                Node::new("b", "B", NodeKind::Task, "c1").unwrap(),
                Node::new("c", "C", NodeKind::Task, "c1").unwrap(),
            ],
            edges
                .iter()
                .map(|(s, t)| Edge::new(s, t).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn synthetic(edges: &[PlannedEdge]) -> Vec<&PlannedEdge> {
        edges
            .iter()
            .filter(|edge| edge.origin != EdgeOrigin::Explicit)
            .collect()
    }

    #[test]
    fn chain_skips_existing_pairs() {
        let roadmap = roadmap(&[("a", "b")]);
        let mut synth = Synthesizer::new(&roadmap);
        synth.chain(&ids(&["a", "b", "c"]), SyntheticKind::TaskChain);
        synth.chain(&ids(&["b", "c"]), SyntheticKind::StageChain);
        let edges = synth.finish();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].origin, EdgeOrigin::Explicit);
        let added = synthetic(&edges);
        assert_eq!(added.len(), 1);
        assert_eq!((added[0].source.as_str(), added[0].target.as_str()), ("b", "c"));
        assert_eq!(added[0].style, EdgeStyle::SolidArrow);
        assert_eq!(added[0].origin, EdgeOrigin::Synthetic(SyntheticKind::TaskChain));
    }

    #[test]
    fn reverse_pairs_are_distinct() {
        let roadmap = roadmap(&[("b", "a")]);
        let mut synth = Synthesizer::new(&roadmap);
        synth.chain(&ids(&["a", "b"]), SyntheticKind::TaskChain);
        assert_eq!(synthetic(&synth.finish()).len(), 1);
    }

    #[test]
    fn anchors_are_invisible_and_heavy() {
        let roadmap = roadmap(&[]);
        let mut synth = Synthesizer::new(&roadmap);
        synth.anchor(&ids(&["a", "b", "c"]));
        let edges = synth.finish();
        assert_eq!(edges.len(), 2);
        assert!(edges
            .iter()
            .all(|e| e.style == EdgeStyle::Invisible && e.weight == Some(COLUMN_ANCHOR_WEIGHT)));
    }

    #[test]
    fn anchor_over_existing_edge_raises_its_weight() {
        let roadmap = roadmap(&[("a", "b")]);
        let mut synth = Synthesizer::new(&roadmap);
        synth.anchor(&ids(&["a", "b", "c"]));
        let edges = synth.finish();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].origin, EdgeOrigin::Explicit);
        assert_eq!(edges[0].style, EdgeStyle::SolidArrow);
        assert_eq!(edges[0].weight, Some(COLUMN_ANCHOR_WEIGHT));
        assert_eq!(edges[1].origin, EdgeOrigin::Synthetic(SyntheticKind::ColumnAnchor));
    }

    #[test]
    fn row_proxies_are_stacked_invisibly() {
        let roadmap = roadmap(&[]);
        let mut synth = Synthesizer::new(&roadmap);
        synth.stack(&ids(&["p0", "p1", "p2"]));
        synth.stack(&ids(&["q0"]));
        let edges = synth.finish();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.style == EdgeStyle::Invisible
            && e.weight.is_none()
            && e.origin == EdgeOrigin::Synthetic(SyntheticKind::RowStack)));
    }

    #[test]
    fn explicit_edges_keep_labels_and_order() {
        let roadmap = Roadmap::build(
            "Roadmap",
            vec![Cluster::new("c1", "Phase").unwrap()],
            vec![
                Node::new("t", "T", NodeKind::Task, "c1").unwrap(),
                Node::new("d", "D", NodeKind::SubContent, "c1").unwrap(),
                Node::new("m", "M", NodeKind::Method, "c1").unwrap(),
            ],
            vec![
                Edge::new("d", "m").unwrap(),
                Edge::new("t", "d").unwrap().with_label("details"),
            ],
        )
        .unwrap();
        let edges = explicit_edges(&roadmap);
        assert_eq!(edges[0].style, EdgeStyle::Invisible);
        assert_eq!(edges[1].style, EdgeStyle::DashedNoArrow);
        assert_eq!(edges[1].label.as_deref(), Some("details"));
    }
}
