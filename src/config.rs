use crate::theme::Theme;
use anyhow::Context;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// How rank-equivalence groups are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// One band per cluster, top to bottom; methods are chunked into rows
    /// anchored by invisible proxies in the stage column.
    #[default]
    Stacked,
    /// Four strict global columns, left to right.
    Columns,
}

impl LayoutMode {
    pub fn rank_direction(self) -> &'static str {
        match self {
            Self::Stacked => "TB",
            Self::Columns => "LR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
    Pdf,
    /// The DOT source handed to the renderer; needs no external binary.
    Dot,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Dot => "dot",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub max_methods_per_row: usize,
    /// Passed to the renderer verbatim.
    pub rank_sep: String,
    pub node_sep: String,
}

impl LayoutConfig {
    /// Batch size for method rows; a configured zero behaves like one.
    pub fn row_batch_size(&self) -> usize {
        self.max_methods_per_row.max(1)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Stacked,
            max_methods_per_row: 3,
            rank_sep: "0.7".to_string(),
            node_sep: "0.4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub output_prefix: PathBuf,
    pub font_path: Option<PathBuf>,
    /// `W:H` hint, e.g. `3:4`.
    pub aspect: Option<String>,
    pub dot_binary: String,
    /// Wall-clock limit for one renderer run; zero disables it.
    pub timeout_secs: u64,
    /// Rasterize PNG output in process from the renderer's SVG.
    pub rasterize_png: bool,
}

impl RenderConfig {
    /// `<output_prefix>.<ext>`; the prefix is never treated as having an
    /// extension of its own.
    pub fn output_path(&self) -> PathBuf {
        let mut name = OsString::from(self.output_prefix.as_os_str());
        name.push(".");
        name.push(self.format.extension());
        PathBuf::from(name)
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.aspect.as_deref().and_then(parse_aspect)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Svg,
            output_prefix: PathBuf::from("roadmap"),
            font_path: None,
            aspect: Some("3:4".to_string()),
            dot_binary: "dot".to_string(),
            timeout_secs: 60,
            rasterize_png: true,
        }
    }
}

/// Converts a `W:H` hint into a width/height ratio. Anything that is not two
/// positive numbers separated by a colon yields `None`.
pub fn parse_aspect(value: &str) -> Option<f64> {
    let (w, h) = value.trim().split_once(':')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(w / h)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Switches the layout mode together with its stock palette. The font
    /// family carries over.
    pub fn set_mode(&mut self, mode: LayoutMode) {
        let font_family = std::mem::take(&mut self.theme.font_family);
        self.theme = match mode {
            LayoutMode::Stacked => Theme::classic(),
            LayoutMode::Columns => Theme::columns(),
        };
        self.theme.font_family = font_family;
        self.layout.mode = mode;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutSection>,
    render: Option<RenderSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    title_font_size: Option<f32>,
    node_font_size: Option<f32>,
    edge_font_size: Option<f32>,
    edge_color: Option<String>,
    cluster_border: Option<String>,
    cluster_background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutSection {
    mode: Option<LayoutMode>,
    max_methods_per_row: Option<usize>,
    rank_sep: Option<Spacing>,
    node_sep: Option<Spacing>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderSection {
    format: Option<OutputFormat>,
    output_prefix: Option<PathBuf>,
    font_path: Option<PathBuf>,
    aspect: Option<String>,
    dot_binary: Option<String>,
    timeout_secs: Option<u64>,
    rasterize_png: Option<bool>,
}

/// Spacing accepted either as `"0.7"` or `0.7`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Spacing {
    Text(String),
    Number(f64),
}

impl Spacing {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(value) => value.to_string(),
        }
    }
}

/// Loads a JSON/JSON5 config file over the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    load_config_for_mode(path, None)
}

/// Like [`load_config`], but `mode` takes precedence over the file's
/// `layout.mode`. The mode's palette is chosen before the file's `theme` and
/// `themeVariables` are merged, so those survive the override.
pub fn load_config_for_mode(
    path: Option<&Path>,
    mode: Option<LayoutMode>,
) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        if let Some(mode) = mode {
            config.set_mode(mode);
        }
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let parsed: ConfigFile = json5::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;

    let layout = parsed.layout.unwrap_or_default();
    if let Some(mode) = mode.or(layout.mode) {
        config.set_mode(mode);
    }
    if let Some(v) = layout.max_methods_per_row {
        config.layout.max_methods_per_row = v;
    }
    if let Some(v) = layout.rank_sep {
        config.layout.rank_sep = v.into_string();
    }
    if let Some(v) = layout.node_sep {
        config.layout.node_sep = v.into_string();
    }

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::from_name(theme_name) {
            Some(theme) => {
                let font_family = std::mem::take(&mut config.theme.font_family);
                config.theme = theme;
                config.theme.font_family = font_family;
            }
            None => log::warn!("ignoring unknown theme {theme_name:?}"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.title_font_size {
            config.theme.title_font_size = v;
        }
        if let Some(v) = vars.node_font_size {
            config.theme.node_font_size = v;
        }
        if let Some(v) = vars.edge_font_size {
            config.theme.edge_font_size = v;
        }
        if let Some(v) = vars.edge_color {
            config.theme.edge_color = v;
        }
        if let Some(v) = vars.cluster_border {
            config.theme.cluster_border = v;
        }
        if let Some(v) = vars.cluster_background {
            config.theme.cluster_background = Some(v);
        }
    }

    let render = parsed.render.unwrap_or_default();
    if let Some(v) = render.format {
        config.render.format = v;
    }
    if let Some(v) = render.output_prefix {
        config.render.output_prefix = v;
    }
    if let Some(v) = render.font_path {
        config.render.font_path = Some(v);
    }
    if let Some(v) = render.aspect {
        config.render.aspect = Some(v);
    }
    if let Some(v) = render.dot_binary {
        config.render.dot_binary = v;
    }
    if let Some(v) = render.timeout_secs {
        config.render.timeout_secs = v;
    }
    if let Some(v) = render.rasterize_png {
        config.render.rasterize_png = v;
    }

    Ok(config)
}
