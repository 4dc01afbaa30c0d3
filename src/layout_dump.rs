use crate::layout::{Column, EdgeOrigin, LayoutPlan, SyntheticKind};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct PlanDump {
    pub title: String,
    pub mode: String,
    pub nodes: Vec<NodeDump>,
    pub stages: Vec<String>,
    pub clusters: Vec<ClusterDump>,
    pub columns: Vec<ColumnDump>,
    pub rank_groups: Vec<RankGroupDump>,
    pub proxies: Vec<ProxyDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub kind: String,
    pub column: String,
    pub cluster: String,
    pub order: usize,
}

#[derive(Debug, Serialize)]
pub struct ClusterDump {
    pub id: String,
    pub label: String,
    pub members: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnDump {
    pub name: String,
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RankGroupDump {
    pub name: String,
    pub cluster: Option<String>,
    pub proxy: Option<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProxyDump {
    pub id: String,
    pub cluster: String,
    pub task: String,
    pub row: usize,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub style: String,
    pub weight: Option<u32>,
    pub origin: String,
}

impl PlanDump {
    pub fn from_plan(plan: &LayoutPlan) -> Self {
        let nodes = plan
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                label: node.label.clone(),
                kind: node.kind.as_str().to_string(),
                column: node.column.group_name().to_string(),
                cluster: node.cluster.clone(),
                order: node.order,
            })
            .collect();

        let clusters = plan
            .clusters
            .iter()
            .map(|cluster| ClusterDump {
                id: cluster.id.clone(),
                label: cluster.label.clone(),
                members: cluster.members.clone(),
            })
            .collect();

        let columns = Column::ALL
            .iter()
            .map(|column| ColumnDump {
                name: column.group_name().to_string(),
                nodes: plan.column(*column).to_vec(),
            })
            .collect();

        let rank_groups = plan
            .rank_groups
            .iter()
            .map(|group| RankGroupDump {
                name: group.name.clone(),
                cluster: group.cluster.clone(),
                proxy: group.proxy.clone(),
                members: group.members.clone(),
            })
            .collect();

        let proxies = plan
            .proxies
            .iter()
            .map(|proxy| ProxyDump {
                id: proxy.id.clone(),
                cluster: proxy.cluster.clone(),
                task: proxy.task.clone(),
                row: proxy.row,
            })
            .collect();

        let edges = plan
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.source.clone(),
                to: edge.target.clone(),
                label: edge.label.clone(),
                style: edge.style.name().to_string(),
                weight: edge.weight,
                origin: origin_name(edge.origin).to_string(),
            })
            .collect();

        PlanDump {
            title: plan.title.clone(),
            mode: format!("{:?}", plan.mode),
            nodes,
            stages: plan.stages.clone(),
            clusters,
            columns,
            rank_groups,
            proxies,
            edges,
        }
    }
}

fn origin_name(origin: EdgeOrigin) -> &'static str {
    match origin {
        EdgeOrigin::Explicit => "explicit",
        EdgeOrigin::Synthetic(SyntheticKind::TaskChain) => "task_chain",
        EdgeOrigin::Synthetic(SyntheticKind::StageChain) => "stage_chain",
        EdgeOrigin::Synthetic(SyntheticKind::ColumnAnchor) => "column_anchor",
        EdgeOrigin::Synthetic(SyntheticKind::RowStack) => "row_stack",
    }
}

pub fn write_plan_dump(path: &Path, plan: &LayoutPlan) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = PlanDump::from_plan(plan);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::fallback::build_fallback_roadmap;
    use crate::layout::plan_layout;

    #[test]
    fn dump_lists_columns_and_edge_origins() {
        let plan = plan_layout(&build_fallback_roadmap("", None), &LayoutConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        write_plan_dump(&path, &plan).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["mode"], "Stacked");
        assert_eq!(value["columns"][0]["name"], "phase");
        assert_eq!(value["columns"][0]["nodes"], serde_json::json!(["s1", "s2", "s3"]));
        let origins: Vec<&str> = value["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|edge| edge["origin"].as_str().unwrap())
            .collect();
        assert_eq!(origins.iter().filter(|o| **o == "explicit").count(), 8);
        assert_eq!(origins.iter().filter(|o| **o == "stage_chain").count(), 2);
        assert_eq!(value["rank_groups"][0]["proxy"], "proxy_s1_t1_0");
        assert_eq!(value["proxies"][0]["task"], "t1");
        assert_eq!(value["proxies"][0]["cluster"], "phase1");
        assert_eq!(value["proxies"][0]["row"], 0);
    }

    #[test]
    fn dump_names_row_stack_edges() {
        let json = r#"{
            "title": "Rows",
            "clusters": [{"id": "c1", "label": "Phase"}],
            "nodes": [
                {"id": "t1", "label": "Task", "type": "task", "parent_cluster": "c1"},
                {"id": "m1", "label": "A", "type": "method", "parent_cluster": "c1"},
                {"id": "m2", "label": "B", "type": "method", "parent_cluster": "c1"}
            ],
            "edges": [
                {"source": "t1", "target": "m1"},
                {"source": "t1", "target": "m2"}
            ]
        }"#;
        let roadmap: crate::ir::Roadmap = serde_json::from_str(json).unwrap();
        let config = LayoutConfig {
            max_methods_per_row: 1,
            ..Default::default()
        };
        let dump = PlanDump::from_plan(&plan_layout(&roadmap, &config));
        let stacked: Vec<&EdgeDump> = dump.edges.iter().filter(|e| e.origin == "row_stack").collect();
        assert_eq!(stacked.len(), 1);
        assert_eq!((stacked[0].from.as_str(), stacked[0].to.as_str()), ("proxy_c1_t1_0", "proxy_c1_t1_1"));
        assert_eq!(stacked[0].style, "invisible");
        assert_eq!(dump.proxies.iter().map(|p| p.row).collect::<Vec<_>>(), [0, 1]);
    }
}
