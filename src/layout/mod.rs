mod edges;
mod ranking;
pub(crate) mod types;
pub use edges::COLUMN_ANCHOR_WEIGHT;
pub use ranking::chunk_rows;
pub use types::*;
use edges::*;
use ranking::*;

use crate::config::{LayoutConfig, LayoutMode};
use crate::ir::{Node, NodeKind, Roadmap};

/// Plans columns, ordering, rank groups, synthetic edges and edge styles for
/// a validated roadmap.
///
/// Never fails: ids that do not resolve are skipped, and empty columns drop
/// out of every grouping and chaining step.
pub fn plan_layout(roadmap: &Roadmap, config: &LayoutConfig) -> LayoutPlan {
    let mut ordered: Vec<&Node> = roadmap.nodes().iter().collect();
    ordered.sort_by_key(|node| node.sequence_index());

    let mut columns: [Vec<String>; 4] = Default::default();
    let mut nodes = Vec::with_capacity(ordered.len());
    for node in &ordered {
        let column = Column::of(node.kind());
        let lane = &mut columns[column.index()];
        nodes.push(PlacedNode {
            id: node.id().to_string(),
            label: node.label().to_string(),
            kind: node.kind(),
            column,
            cluster: node.parent_cluster().to_string(),
            order: lane.len(),
        });
        lane.push(node.id().to_string());
    }

    let mut stages = Vec::new();
    let mut task_spine = Vec::new();
    let mut clusters = Vec::with_capacity(roadmap.clusters().len());
    for cluster in roadmap.clusters() {
        let members = roadmap.nodes_in_cluster(cluster.id());
        stages.extend(ids_of_kind(&members, NodeKind::StageLabel));
        task_spine.extend(ids_of_kind(&members, NodeKind::Task));
        clusters.push(ClusterBox {
            id: cluster.id().to_string(),
            label: cluster.label().to_string(),
            members: members
                .iter()
                .filter(|node| node.kind() != NodeKind::StageLabel)
                .map(|node| node.id().to_string())
                .collect(),
        });
    }

    let mut synthesizer = Synthesizer::new(roadmap);
    synthesizer.chain(&task_spine, SyntheticKind::TaskChain);
    synthesizer.chain(&stages, SyntheticKind::StageChain);

    let (rank_groups, proxies) = match config.mode {
        LayoutMode::Stacked => {
            let (groups, proxies) = method_rows(roadmap, config.row_batch_size());
            for rows in proxies.chunk_by(|a, b| a.cluster == b.cluster && a.task == b.task) {
                let ids: Vec<String> = rows.iter().map(|proxy| proxy.id.clone()).collect();
                synthesizer.stack(&ids);
            }
            (groups, proxies)
        }
        LayoutMode::Columns => {
            // With rankdir=LR the chain fixes column precedence; in stacked mode
            // it would contradict the method rows, so it is column-only.
            let representatives: Vec<String> = columns
                .iter()
                .filter_map(|lane| lane.first().cloned())
                .collect();
            synthesizer.anchor(&representatives);
            (column_rank_groups(&columns), Vec::new())
        }
    };

    let edges = synthesizer.finish();

    log::debug!(
        "planned {} nodes, {} rank groups, {} edges ({:?} mode)",
        nodes.len(),
        rank_groups.len(),
        edges.len(),
        config.mode
    );

    LayoutPlan {
        title: roadmap.title().to_string(),
        mode: config.mode,
        nodes,
        stages,
        clusters,
        columns,
        rank_groups,
        proxies,
        edges,
    }
}

fn ids_of_kind(members: &[&Node], kind: NodeKind) -> Vec<String> {
    members
        .iter()
        .filter(|node| node.kind() == kind)
        .map(|node| node.id().to_string())
        .collect()
}
