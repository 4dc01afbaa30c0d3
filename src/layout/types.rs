use crate::config::LayoutMode;
use crate::ir::NodeKind;

/// The four semantic lanes, in their fixed left-to-right order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Stage,
    Task,
    SubContent,
    Method,
}

impl Column {
    pub const ALL: [Column; 4] = [
        Column::Stage,
        Column::Task,
        Column::SubContent,
        Column::Method,
    ];

    pub fn of(kind: NodeKind) -> Self {
        match kind {
            NodeKind::StageLabel => Self::Stage,
            NodeKind::Task => Self::Task,
            NodeKind::SubContent => Self::SubContent,
            NodeKind::Method => Self::Method,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Stage => 0,
            Self::Task => 1,
            Self::SubContent => 2,
            Self::Method => 3,
        }
    }

    /// Renderer `group` shared by every node of the column.
    pub fn group_name(self) -> &'static str {
        match self {
            Self::Stage => "phase",
            Self::Task => "task",
            Self::SubContent => "sub_content",
            Self::Method => "method",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeStyle {
    SolidArrow,
    DashedNoArrow,
    Invisible,
}

impl EdgeStyle {
    /// Visibility policy; first matching rule wins:
    /// method endpoint → invisible, task → sub_content → dashed without
    /// arrowhead, any other sub_content endpoint → invisible, else solid arrow.
    pub fn for_kinds(source: NodeKind, target: NodeKind) -> Self {
        use NodeKind::*;
        match (source, target) {
            (Method, _) | (_, Method) => Self::Invisible,
            (Task, SubContent) => Self::DashedNoArrow,
            (SubContent, _) | (_, SubContent) => Self::Invisible,
            _ => Self::SolidArrow,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SolidArrow => "solid_arrow",
            Self::DashedNoArrow => "dashed_no_arrow",
            Self::Invisible => "invisible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticKind {
    TaskChain,
    StageChain,
    ColumnAnchor,
    /// Invisible proxy-to-proxy link stacking a task's method rows.
    RowStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeOrigin {
    Explicit,
    Synthetic(SyntheticKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedEdge {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub style: EdgeStyle,
    pub weight: Option<u32>,
    pub origin: EdgeOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub column: Column,
    pub cluster: String,
    /// Position within the node's column.
    pub order: usize,
}

/// Cluster boundary box. Holds only task, sub_content and method members.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterBox {
    pub id: String,
    pub label: String,
    pub members: Vec<String>,
}

/// Zero-size invisible node keeping a method row aligned with the stage column.
/// Row 0 shares its rank with the task; later rows stack below it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyNode {
    pub id: String,
    pub cluster: String,
    pub task: String,
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankGroup {
    pub name: String,
    /// Cluster the group is declared in; `None` for global column groups.
    pub cluster: Option<String>,
    pub proxy: Option<String>,
    pub members: Vec<String>,
}

/// Renderer-agnostic constraint set for one roadmap.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub title: String,
    pub mode: LayoutMode,
    /// In sequence order.
    pub nodes: Vec<PlacedNode>,
    /// Stage nodes in rendering order (cluster order, then sequence order).
    pub stages: Vec<String>,
    pub clusters: Vec<ClusterBox>,
    pub columns: [Vec<String>; 4],
    pub rank_groups: Vec<RankGroup>,
    pub proxies: Vec<ProxyNode>,
    /// Explicit edges in source order, then synthetic edges.
    pub edges: Vec<PlannedEdge>,
}

impl LayoutPlan {
    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn column(&self, column: Column) -> &[String] {
        &self.columns[column.index()]
    }

    pub fn edges_between<'a>(
        &'a self,
        source: &'a str,
        target: &'a str,
    ) -> impl Iterator<Item = &'a PlannedEdge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.source == source && edge.target == target)
    }

    pub fn synthetic_edges(&self, kind: SyntheticKind) -> impl Iterator<Item = &PlannedEdge> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.origin == EdgeOrigin::Synthetic(kind))
    }

    pub fn is_proxy(&self, id: &str) -> bool {
        self.proxies.iter().any(|proxy| proxy.id == id)
    }
}
