use crate::error::ExtractionError;
use crate::ir::{Roadmap, RoadmapDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static FENCED_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```\s*json\s*([\s\S]*?)```").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub const DEFAULT_MAX_CHARS: usize = 15_000;

/// Instructions handed to a language model together with the document text.
/// The reply is expected in the shape accepted by [`parse_roadmap_response`].
pub const EXTRACTION_PROMPT: &str = "\
You are a research architect. Read the paper and design a structured technical roadmap. \
Split the research process into 3-5 phases (for example: background and problem, \
theoretical framework, core model design, experiments and application).
Produce four kinds of nodes:
1. 'stage_label': the phase name (column 1).
2. 'task': a core task (column 2), verb plus object.
3. 'sub_content': a concrete detail of a task (column 3), such as an indicator or variable.
4. 'method': a method or tool used in the phase (column 4).
The output must follow this JSON schema exactly:
{
  \"title\": string,
  \"clusters\": [ { \"id\": string, \"label\": string } ],
  \"nodes\": [ { \"id\": string, \"label\": string, \"type\": \"stage_label\"|\"task\"|\"sub_content\"|\"method\", \"parent_cluster\": string } ],
  \"edges\": [ { \"source\": string, \"target\": string, \"label\"?: string } ]
}
Rules:
1. Every cluster is one band of the diagram.
2. Every cluster contains exactly one 'stage_label' node.
3. The main flow runs between 'task' nodes; each 'task' points to its 'sub_content' nodes.
4. 'sub_content' must be specific: name the indicators or variables.
5. Keep node labels short (at most 15 characters).
6. Output nothing but the JSON.";

/// Produces cleaned plain text from a document.
pub trait TextSource {
    fn read_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Turns document text into a candidate roadmap.
pub trait StructureSource {
    fn extract(&self, text: &str) -> Result<Roadmap, ExtractionError>;
}

/// Reads UTF-8 text files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainTextSource {
    pub max_chars: usize,
}

impl Default for PlainTextSource {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl TextSource for PlainTextSource {
    fn read_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = clean_text(&raw, self.max_chars);
        if text.is_empty() {
            return Err(ExtractionError::EmptyText);
        }
        log::debug!("read {} chars from {}", text.chars().count(), path.display());
        Ok(text)
    }
}

/// Drops lines shorter than two characters, collapses whitespace runs and
/// truncates the joined text to `max_chars` characters.
pub fn clean_text(raw: &str, max_chars: usize) -> String {
    let joined = raw
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= 2)
        .map(|line| WHITESPACE_RE.replace_all(line, " "))
        .collect::<Vec<_>>()
        .join("\n");
    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

/// Replays a recorded model reply instead of calling a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponseSource {
    response: String,
}

impl JsonResponseSource {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl StructureSource for JsonResponseSource {
    fn extract(&self, _text: &str) -> Result<Roadmap, ExtractionError> {
        parse_roadmap_response(&self.response)
    }
}

/// Body of the first fenced ```json block, else the outermost `{...}` span.
pub fn extract_json_block(response: &str) -> Option<&str> {
    if let Some(body) = FENCED_JSON_RE.captures(response).and_then(|caps| caps.get(1)) {
        return Some(body.as_str().trim());
    }
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

/// Parses a model reply leniently (single quotes, trailing commas, comments)
/// and validates the result.
pub fn parse_roadmap_response(response: &str) -> Result<Roadmap, ExtractionError> {
    let block = extract_json_block(response).ok_or(ExtractionError::NoJson)?;
    let document: RoadmapDocument =
        json5::from_str(block).map_err(|err| ExtractionError::Json(err.to_string()))?;
    let roadmap = document.into_roadmap()?;
    log::debug!(
        "parsed roadmap {:?}: {} clusters, {} nodes, {} edges",
        roadmap.title(),
        roadmap.clusters().len(),
        roadmap.nodes().len(),
        roadmap.edges().len()
    );
    Ok(roadmap)
}
