use crate::config::{load_config_for_mode, Config, LayoutMode, OutputFormat};
use crate::extract::{EXTRACTION_PROMPT, JsonResponseSource, PlainTextSource, TextSource};
use crate::fallback::build_fallback_roadmap;
use crate::ir::Roadmap;
use crate::layout::plan_layout;
use crate::layout_dump::write_plan_dump;
use crate::pipeline::resolve_roadmap;
use crate::render::render_roadmap;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "roadmap", version, about = "Technical roadmap diagrams via Graphviz")]
pub struct Args {
    /// Roadmap JSON or a recorded model reply containing it; '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Plain-text document the roadmap was extracted from (diagnostics only)
    #[arg(short = 't', long = "text")]
    pub text: Option<PathBuf>,

    /// Draw the built-in fallback roadmap instead of reading input
    #[arg(long = "mock")]
    pub mock: bool,

    /// Output path prefix; the extension is appended
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Config JSON/JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout mode
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<LayoutMode>,

    /// Font family name
    #[arg(long = "font")]
    pub font: Option<String>,

    /// Font directory handed to the renderer
    #[arg(long = "fontPath")]
    pub font_path: Option<PathBuf>,

    /// Aspect ratio hint, W:H
    #[arg(long = "aspect")]
    pub aspect: Option<String>,

    /// Methods per row in stacked mode
    #[arg(long = "maxMethodsPerRow")]
    pub max_methods_per_row: Option<usize>,

    #[arg(long = "ranksep")]
    pub rank_sep: Option<String>,

    #[arg(long = "nodesep")]
    pub node_sep: Option<String>,

    /// Graphviz binary
    #[arg(long = "dot")]
    pub dot_binary: Option<String>,

    /// Also write the layout plan as JSON
    #[arg(long = "dumpPlan")]
    pub dump_plan: Option<PathBuf>,

    /// Print the extraction prompt for a language model and exit
    #[arg(long = "prompt")]
    pub prompt: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    if args.prompt {
        return write_prompt(&mut io::stdout().lock());
    }
    let config = build_config(&args)?;
    let roadmap = load_roadmap(&args)?;

    let plan = plan_layout(&roadmap, &config.layout);
    if let Some(path) = args.dump_plan.as_deref() {
        write_plan_dump(path, &plan)
            .with_context(|| format!("failed to write plan dump {}", path.display()))?;
    }
    let output = render_roadmap(&plan, &config)?;
    println!("generated: {}", output.display());
    Ok(())
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = load_config_for_mode(args.config.as_deref(), args.mode)?;
    if let Some(font) = &args.font {
        config.theme.font_family = font.clone();
    }
    if let Some(path) = &args.font_path {
        config.render.font_path = Some(path.clone());
    }
    if let Some(format) = args.format {
        config.render.format = format;
    }
    if let Some(prefix) = &args.output {
        config.render.output_prefix = prefix.clone();
    }
    if let Some(aspect) = &args.aspect {
        config.render.aspect = Some(aspect.clone());
    }
    if let Some(max) = args.max_methods_per_row {
        config.layout.max_methods_per_row = max;
    }
    if let Some(sep) = &args.rank_sep {
        config.layout.rank_sep = sep.clone();
    }
    if let Some(sep) = &args.node_sep {
        config.layout.node_sep = sep.clone();
    }
    if let Some(binary) = &args.dot_binary {
        config.render.dot_binary = binary.clone();
    }
    Ok(config)
}

fn load_roadmap(args: &Args) -> Result<Roadmap> {
    if args.mock {
        return Ok(build_fallback_roadmap("Mock Data", None));
    }
    let input = args
        .input
        .as_deref()
        .context("no input given; pass --input <roadmap.json> or use --mock")?;
    let response = read_input(input)?;

    let text = match args.text.as_deref() {
        Some(path) => PlainTextSource::default()
            .read_text(path)
            .unwrap_or_else(|err| {
                log::warn!("{err}");
                String::new()
            }),
        None => String::new(),
    };
    Ok(resolve_roadmap(&text, &JsonResponseSource::new(response)))
}

fn write_prompt(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", EXTRACTION_PROMPT.trim_end())?;
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
