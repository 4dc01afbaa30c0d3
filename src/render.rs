use crate::config::{Config, LayoutMode, OutputFormat, RenderConfig};
use crate::error::RenderError;
use crate::ir::NodeKind;
use crate::layout::{EdgeStyle, LayoutPlan, PlacedNode, RankGroup};
use crate::theme::{NodeStyle, Theme};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Emits the plan as a Graphviz `digraph`.
pub fn to_dot(plan: &LayoutPlan, config: &Config) -> String {
    let theme = &config.theme;
    let mut out = String::new();
    out.push_str("digraph \"TechRoadmap\" {\n");

    let mut graph_attrs = vec![
        ("rankdir", plan.mode.rank_direction().to_string()),
        ("splines", "ortho".to_string()),
        ("newrank", "true".to_string()),
    ];
    if plan.mode == LayoutMode::Columns {
        graph_attrs.push(("compound", "true".to_string()));
    }
    graph_attrs.extend([
        ("label", plan.title.clone()),
        ("labelloc", "t".to_string()),
        ("fontname", theme.font_family.clone()),
        ("fontsize", format_number(theme.title_font_size)),
        ("ranksep", config.layout.rank_sep.clone()),
        ("nodesep", config.layout.node_sep.clone()),
    ]);
    if let Some(ratio) = config.render.aspect_ratio() {
        graph_attrs.push(("ratio", ratio.to_string()));
    }
    for (key, value) in &graph_attrs {
        out.push_str(&format!("  {key}={};\n", quote(value)));
    }

    out.push_str(&format!(
        "  node [fontname={}, fontsize={}];\n",
        quote(&theme.font_family),
        quote(&format_number(theme.node_font_size))
    ));
    out.push_str(&format!(
        "  edge [fontname={}, fontsize={}, color={}];\n",
        quote(&theme.font_family),
        quote(&format_number(theme.edge_font_size)),
        quote(&theme.edge_color)
    ));

    for id in &plan.stages {
        if let Some(node) = plan.node(id) {
            write_node(&mut out, "  ", node, theme, "phase");
        }
    }

    for cluster in &plan.clusters {
        out.push_str(&format!(
            "  subgraph {} {{\n",
            quote(&format!("cluster_{}", cluster.id))
        ));
        out.push_str(&format!("    label={};\n", quote(&cluster.label)));
        out.push_str("    style=\"dashed\";\n    labelloc=\"t\";\n    labeljust=\"l\";\n");
        out.push_str(&format!("    color={};\n", quote(&theme.cluster_border)));
        if let Some(color) = &theme.cluster_font_color {
            out.push_str(&format!("    fontcolor={};\n", quote(color)));
        }
        if let Some(color) = &theme.cluster_background {
            out.push_str(&format!("    bgcolor={};\n", quote(color)));
        }
        for id in &cluster.members {
            if let Some(node) = plan.node(id) {
                let group = match node.kind {
                    NodeKind::Task => "task",
                    _ => "method",
                };
                write_node(&mut out, "    ", node, theme, group);
            }
        }
        for group in plan
            .rank_groups
            .iter()
            .filter(|group| group.cluster.as_deref() == Some(cluster.id.as_str()))
        {
            write_rank_group(&mut out, "    ", group);
        }
        out.push_str("  }\n");
    }

    for group in plan.rank_groups.iter().filter(|group| group.cluster.is_none()) {
        write_rank_group(&mut out, "  ", group);
    }

    for edge in &plan.edges {
        let mut attrs = match edge.style {
            EdgeStyle::SolidArrow => vec![("style", "solid"), ("arrowhead", "normal")],
            EdgeStyle::DashedNoArrow => vec![("style", "dashed"), ("arrowhead", "none")],
            EdgeStyle::Invisible => vec![("style", "invis"), ("arrowhead", "none")],
        }
        .into_iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect::<Vec<_>>();
        if let Some(label) = &edge.label {
            attrs.push(("label", label.clone()));
        }
        if let Some(weight) = edge.weight {
            attrs.push(("weight", weight.to_string()));
        }
        out.push_str(&format!(
            "  {} -> {} [{}];\n",
            quote(&edge.source),
            quote(&edge.target),
            format_attrs(&attrs)
        ));
    }

    out.push_str("}\n");
    out
}

fn write_node(out: &mut String, indent: &str, node: &PlacedNode, theme: &Theme, group: &str) {
    let style: &NodeStyle = theme.node_style(node.kind);
    let mut attrs = vec![
        ("label", node.label.clone()),
        ("shape", style.shape.clone()),
        ("style", style.style.clone()),
        ("fillcolor", style.fill_color.clone()),
        ("color", style.border_color.clone()),
    ];
    if let Some(color) = &style.font_color {
        attrs.push(("fontcolor", color.clone()));
    }
    if let Some(width) = style.width {
        attrs.push(("width", format_number(width)));
    }
    attrs.push(("group", group.to_string()));
    out.push_str(&format!("{indent}{} [{}];\n", quote(&node.id), format_attrs(&attrs)));
}

fn write_rank_group(out: &mut String, indent: &str, group: &RankGroup) {
    out.push_str(&format!("{indent}{{\n"));
    out.push_str(&format!("{indent}  rank=same;\n"));
    if let Some(proxy) = &group.proxy {
        out.push_str(&format!(
            "{indent}  {} [shape=box, style=invis, width=0, height=0, label=\"\", group=\"phase\"];\n",
            quote(proxy)
        ));
    }
    for member in &group.members {
        out.push_str(&format!("{indent}  {};\n", quote(member)));
    }
    out.push_str(&format!("{indent}}}\n"));
}

fn format_attrs(attrs: &[(&str, String)]) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!("{key}={}", quote(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Double-quoted DOT string. Line breaks become `\n` escapes.
fn quote(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('"');
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

pub fn write_dot(plan: &LayoutPlan, config: &Config, path: &Path) -> Result<(), RenderError> {
    std::fs::write(path, to_dot(plan, config)).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Produces `<output_prefix>.<ext>` and returns its path. Failures are
/// reported once and never retried.
pub fn render_roadmap(plan: &LayoutPlan, config: &Config) -> Result<PathBuf, RenderError> {
    let render = &config.render;
    let output = render.output_path();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RenderError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if render.format == OutputFormat::Dot {
        write_dot(plan, config, &output)?;
        log::info!("wrote {}", output.display());
        return Ok(output);
    }

    let dot = to_dot(plan, config);
    let bytes = match render.format {
        OutputFormat::Png if render.rasterize_png && cfg!(feature = "png") => {
            let svg = run_renderer(&dot, "svg", render)?;
            rasterize(&svg, config)?
        }
        format => run_renderer(&dot, format.extension(), render)?,
    };

    std::fs::write(&output, bytes).map_err(|source| RenderError::Io {
        path: output.clone(),
        source,
    })?;
    log::info!("wrote {}", output.display());
    Ok(output)
}

/// Pipes `dot` into the renderer and returns its stdout.
fn run_renderer(dot: &str, format: &str, render: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    let mut command = Command::new(&render.dot_binary);
    command
        .arg(format!("-T{format}"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(font_path) = render.font_path.as_deref().filter(|p| p.exists()) {
        command.env("GDFONTPATH", font_path);
    }

    log::debug!("running {} -T{format}", render.dot_binary);
    let mut child = command.spawn().map_err(|source| RenderError::MissingBinary {
        binary: render.dot_binary.clone(),
        source,
    })?;

    let writer = child.stdin.take().map(|mut stdin| {
        let input = dot.as_bytes().to_vec();
        thread::spawn(move || match stdin.write_all(&input) {
            Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
            _ => Ok(()),
        })
    });
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = wait_with_timeout(&mut child, render)?;

    if let Some(writer) = writer {
        join(writer)?.map_err(RenderError::Pipe)?;
    }
    let stdout = match stdout {
        Some(handle) => join(handle)?.map_err(RenderError::Pipe)?,
        None => Vec::new(),
    };
    let stderr = match stderr {
        Some(handle) => join(handle)?.map_err(RenderError::Pipe)?,
        None => Vec::new(),
    };

    if !status.success() {
        return Err(RenderError::Failed {
            binary: render.dot_binary.clone(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }
    if !stderr.is_empty() {
        log::warn!("{}: {}", render.dot_binary, String::from_utf8_lossy(&stderr).trim());
    }
    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join<T>(handle: JoinHandle<io::Result<T>>) -> Result<io::Result<T>, RenderError> {
    handle
        .join()
        .map_err(|_| RenderError::Pipe(io::Error::other("renderer pipe thread panicked")))
}

fn wait_with_timeout(child: &mut Child, render: &RenderConfig) -> Result<ExitStatus, RenderError> {
    if render.timeout_secs == 0 {
        return child.wait().map_err(RenderError::Pipe);
    }
    // A timeout too large to represent never expires.
    let Some(deadline) = Instant::now().checked_add(Duration::from_secs(render.timeout_secs))
    else {
        return child.wait().map_err(RenderError::Pipe);
    };
    loop {
        if let Some(status) = child.try_wait().map_err(RenderError::Pipe)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            // The pipes close once the process is gone, releasing the threads.
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderError::Timeout {
                binary: render.dot_binary.clone(),
                seconds: render.timeout_secs,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(feature = "png")]
fn rasterize(svg: &[u8], config: &Config) -> Result<Vec<u8>, RenderError> {
    let mut opt = usvg::Options::default();
    opt.font_family = config.theme.font_family.clone();
    {
        let fontdb = opt.fontdb_mut();
        fontdb.load_system_fonts();
        if let Some(dir) = config.render.font_path.as_deref().filter(|p| p.is_dir()) {
            fontdb.load_fonts_dir(dir);
        }
    }

    let tree =
        usvg::Tree::from_data(svg, &opt).map_err(|err| RenderError::Raster(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| RenderError::Raster("failed to allocate pixmap".to_string()))?;
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap
        .encode_png()
        .map_err(|err| RenderError::Raster(err.to_string()))
}

#[cfg(not(feature = "png"))]
fn rasterize(_svg: &[u8], _config: &Config) -> Result<Vec<u8>, RenderError> {
    Err(RenderError::Raster("built without the `png` feature".to_string()))
}
