use crate::ir::NodeKind;

/// Graphviz attributes for one node kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub shape: String,
    pub style: String,
    pub fill_color: String,
    pub border_color: String,
    pub font_color: Option<String>,
    pub width: Option<f32>,
}

impl NodeStyle {
    fn new(shape: &str, style: &str, fill_color: &str, border_color: &str) -> Self {
        Self {
            shape: shape.to_string(),
            style: style.to_string(),
            fill_color: fill_color.to_string(),
            border_color: border_color.to_string(),
            font_color: None,
            width: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub font_family: String,
    pub title_font_size: f32,
    pub node_font_size: f32,
    pub edge_font_size: f32,
    pub edge_color: String,
    pub stage: NodeStyle,
    pub task: NodeStyle,
    pub sub_content: NodeStyle,
    pub method: NodeStyle,
    pub cluster_border: String,
    pub cluster_font_color: Option<String>,
    pub cluster_background: Option<String>,
}

impl Theme {
    /// Palette of the stacked drawing.
    pub fn classic() -> Self {
        let mut stage = NodeStyle::new("box", "rounded,filled", "#2b3a67", "#2b3a67");
        stage.font_color = Some("white".to_string());
        Self {
            font_family: "Microsoft YaHei".to_string(),
            title_font_size: 12.0,
            node_font_size: 11.0,
            edge_font_size: 10.0,
            edge_color: "#5c6f7b".to_string(),
            stage,
            task: NodeStyle::new("box", "filled", "#ffffff", "#4a6fa5"),
            sub_content: NodeStyle::new("note", "dashed,filled", "#f5f5f5", "#666666"),
            method: NodeStyle::new("parallelogram", "filled", "#eef3ff", "#7aa2f7"),
            cluster_border: "#9aa5b1".to_string(),
            cluster_font_color: None,
            cluster_background: None,
        }
    }

    /// Palette of the four-column drawing: wider boxes, ellipse methods and a
    /// tinted cluster background.
    pub fn columns() -> Self {
        let mut theme = Self::classic();
        theme.title_font_size = 14.0;
        theme.node_font_size = 12.0;
        theme.edge_font_size = 11.0;
        theme.edge_color = "#333333".to_string();
        theme.stage.width = Some(2.5);
        theme.task.border_color = "black".to_string();
        theme.task.width = Some(2.5);
        theme.sub_content.width = Some(2.0);
        theme.method = NodeStyle::new("ellipse", "filled", "#e1f5fe", "#01579b");
        theme.cluster_border = "#404040".to_string();
        theme.cluster_font_color = Some("#404040".to_string());
        theme.cluster_background = Some("#f9f9f9".to_string());
        theme
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "stacked" => Some(Self::classic()),
            "columns" | "beautiful" => Some(Self::columns()),
            _ => None,
        }
    }

    pub fn node_style(&self, kind: NodeKind) -> &NodeStyle {
        match kind {
            NodeKind::StageLabel => &self.stage,
            NodeKind::Task => &self.task,
            NodeKind::SubContent => &self.sub_content,
            NodeKind::Method => &self.method,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
