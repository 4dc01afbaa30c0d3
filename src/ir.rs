use crate::error::{ConsistencyError, GraphError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Labels longer than this are accepted but read poorly in a column.
pub const ADVISORY_LABEL_CHARS: usize = 15;

/// Semantic type of a roadmap node. Decides the node's column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[serde(alias = "phase")]
    StageLabel,
    Task,
    SubContent,
    Method,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StageLabel => "stage_label",
            Self::Task => "task",
            Self::SubContent => "sub_content",
            Self::Method => "method",
        }
    }
}

/// One row/phase of the roadmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    id: String,
    label: String,
}

impl Cluster {
    pub fn new(id: &str, label: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: required("cluster", "id", id)?,
            label: required("cluster", "label", label)?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: String,
    label: String,
    kind: NodeKind,
    parent_cluster: String,
    sequence_index: usize,
}

impl Node {
    pub fn new(
        id: &str,
        label: &str,
        kind: NodeKind,
        parent_cluster: &str,
    ) -> Result<Self, ValidationError> {
        let node = Self {
            id: required("node", "id", id)?,
            label: required("node", "label", label)?,
            kind,
            parent_cluster: required("node", "parent_cluster", parent_cluster)?,
            sequence_index: 0,
        };
        if node.label.chars().count() > ADVISORY_LABEL_CHARS {
            log::debug!(
                "node {} label exceeds {} characters: {}",
                node.id,
                ADVISORY_LABEL_CHARS,
                node.label
            );
        }
        Ok(node)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent_cluster(&self) -> &str {
        &self.parent_cluster
    }

    /// Position of the node in the roadmap's node sequence. The only source of
    /// "natural" reading order.
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source: String,
    target: String,
    label: Option<String>,
}

impl Edge {
    pub fn new(source: &str, target: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            source: required("edge", "source", source)?,
            target: required("edge", "target", target)?,
            label: None,
        })
    }

    pub fn with_label(mut self, label: &str) -> Self {
        let label = label.trim();
        self.label = (!label.is_empty()).then(|| label.to_string());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// The roadmap aggregate. Built once, validated, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RoadmapDocument", into = "RoadmapDocument")]
pub struct Roadmap {
    title: String,
    clusters: Vec<Cluster>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Roadmap {
    /// Assembles a roadmap and stamps each node with its sequence index.
    ///
    /// Cross-entity invariants are not checked here; call
    /// [`Roadmap::ensure_consistency`] (or use [`Roadmap::build`]).
    pub fn new(
        title: &str,
        clusters: Vec<Cluster>,
        mut nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<Self, ValidationError> {
        let title = required("roadmap", "title", title)?;
        for (idx, node) in nodes.iter_mut().enumerate() {
            node.sequence_index = idx;
        }
        Ok(Self {
            title,
            clusters,
            nodes,
            edges,
        })
    }

    pub fn build(
        title: &str,
        clusters: Vec<Cluster>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<Self, GraphError> {
        let roadmap = Self::new(title, clusters, nodes, edges)?;
        roadmap.ensure_consistency()?;
        Ok(roadmap)
    }

    pub fn ensure_consistency(&self) -> Result<(), ConsistencyError> {
        if self.clusters.is_empty() {
            return Err(ConsistencyError::NoClusters);
        }
        if self.nodes.is_empty() {
            return Err(ConsistencyError::NoNodes);
        }

        let mut cluster_ids = HashSet::new();
        for cluster in &self.clusters {
            if !cluster_ids.insert(cluster.id.as_str()) {
                return Err(ConsistencyError::DuplicateCluster(cluster.id.clone()));
            }
        }

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(ConsistencyError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &self.edges {
            if !node_ids.contains(edge.source.as_str()) || !node_ids.contains(edge.target.as_str())
            {
                return Err(ConsistencyError::DanglingEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                });
            }
        }

        for node in &self.nodes {
            if !cluster_ids.contains(node.parent_cluster.as_str()) {
                return Err(ConsistencyError::UnknownCluster {
                    node: node.id.clone(),
                    cluster: node.parent_cluster.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Nodes of a cluster in sequence order.
    pub fn nodes_in_cluster(&self, cluster_id: &str) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|node| node.parent_cluster == cluster_id)
            .collect();
        nodes.sort_by_key(|node| node.sequence_index);
        nodes
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }
}

fn required(entity: &'static str, field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty(entity, field));
    }
    Ok(trimmed.to_string())
}

/// Wire form of a roadmap, as produced by structure extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadmapDocument {
    pub title: String,
    #[serde(default)]
    pub clusters: Vec<ClusterDocument>,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterDocument {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub parent_cluster: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDocument {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RoadmapDocument {
    /// Runs every constructor and the consistency check.
    pub fn into_roadmap(self) -> Result<Roadmap, GraphError> {
        let clusters = self
            .clusters
            .iter()
            .map(|cluster| Cluster::new(&cluster.id, &cluster.label))
            .collect::<Result<Vec<_>, _>>()?;
        let nodes = self
            .nodes
            .iter()
            .map(|node| Node::new(&node.id, &node.label, node.kind, &node.parent_cluster))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = self
            .edges
            .iter()
            .map(|edge| {
                Edge::new(&edge.source, &edge.target)
                    .map(|built| built.with_label(edge.label.as_deref().unwrap_or_default()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Roadmap::build(&self.title, clusters, nodes, edges)
    }
}

impl TryFrom<RoadmapDocument> for Roadmap {
    type Error = GraphError;

    fn try_from(document: RoadmapDocument) -> Result<Self, Self::Error> {
        document.into_roadmap()
    }
}

impl From<Roadmap> for RoadmapDocument {
    fn from(roadmap: Roadmap) -> Self {
        Self {
            title: roadmap.title,
            clusters: roadmap
                .clusters
                .into_iter()
                .map(|cluster| ClusterDocument {
                    id: cluster.id,
                    label: cluster.label,
                })
                .collect(),
            nodes: roadmap
                .nodes
                .into_iter()
                .map(|node| NodeDocument {
                    id: node.id,
                    label: node.label,
                    kind: node.kind,
                    parent_cluster: node.parent_cluster,
                })
                .collect(),
            edges: roadmap
                .edges
                .into_iter()
                .map(|edge| EdgeDocument {
                    source: edge.source,
                    target: edge.target,
                    label: edge.label,
                })
                .collect(),
        }
    }
}
