use crate::model::MindmapNode;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const DEFAULT_MAX_LABEL_WIDTH: usize = 40;
const DEFAULT_MAX_NODES: usize = 80;
const ELLIPSIS: char = '…';

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generator failed: {0}")]
    Upstream(String),
    #[error("Malformed generator response: {0}")]
    MalformedResponse(String),
    #[error("Invalid node list JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Generator returned no nodes")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Study material handed to a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Produces a canonical node list from a note.
pub trait MindmapGenerator: Send + Sync {
    fn generate(&self, note: &NoteInput) -> Result<Vec<MindmapNode>, GenerationError>;
}

/// Runs `generator`, substituting the fallback skeleton on failure.
pub fn generate_or_fallback(generator: &dyn MindmapGenerator, note: &NoteInput) -> Vec<MindmapNode> {
    match generator.generate(note) {
        Ok(nodes) if !nodes.is_empty() => nodes,
        Ok(_) => {
            warn!(title = %note.title, "generator returned nothing, using fallback mindmap");
            fallback_mindmap(&note.title)
        }
        Err(err) => {
            warn!(title = %note.title, error = %err, "generation failed, using fallback mindmap");
            fallback_mindmap(&note.title)
        }
    }
}

/// Generic study skeleton used when nothing better is available.
pub fn fallback_mindmap(title: &str) -> Vec<MindmapNode> {
    let title = if title.trim().is_empty() {
        "Untitled Note"
    } else {
        title.trim()
    };

    let mut nodes = vec![MindmapNode::root("root", title)];
    let branches = [
        ("Key Concepts", "covers"),
        ("Important Terms", "defines"),
        ("Examples", "illustrated by"),
        ("Review Questions", "tested by"),
    ];
    for (i, (label, relation)) in branches.iter().enumerate() {
        nodes.push(MindmapNode::child(
            format!("fallback-{}", i + 1),
            *label,
            "root",
            *relation,
        ));
    }
    nodes
}

fn fenced_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid fence regex"))
}

/// Extracts and decodes the node array from a raw model response.
///
/// Accepts a bare JSON array, an array inside a fenced code block, or an array
/// surrounded by prose.
pub fn parse_generated_nodes(raw: &str) -> Result<Vec<MindmapNode>, GenerationError> {
    let body = fenced_block_regex()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let start = body
        .find('[')
        .ok_or_else(|| GenerationError::MalformedResponse("no JSON array found".to_string()))?;
    let end = body
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| GenerationError::MalformedResponse("unterminated JSON array".to_string()))?;

    let nodes: Vec<MindmapNode> = serde_json::from_str(&body[start..=end])?;
    if nodes.is_empty() {
        return Err(GenerationError::Empty);
    }

    debug!(nodes = nodes.len(), "parsed generated node list");
    Ok(nodes)
}

/// Cuts `text` to `max_width` display columns, marking the cut with an ellipsis.
pub fn truncate_label(text: &str, max_width: usize) -> String {
    let text = text.trim();
    if text.width() <= max_width || max_width == 0 {
        return text.to_string();
    }

    let mut result = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width + 1 > max_width {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    let mut result = result.trim_end().to_string();
    result.push(ELLIPSIS);
    result
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OutlineEntry {
    depth: usize,
    text: String,
    heading: bool,
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").expect("valid heading regex"))
}

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[-*+•]|\d+[.)])\s+(.+)$").expect("valid bullet regex"))
}

fn first_sentence(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|&(i, ch)| {
            matches!(ch, '.' | '?' | '!')
                && text[i + ch.len_utf8()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
        })
        .map(|(i, ch)| i + ch.len_utf8())
        .unwrap_or(text.len());
    text[..end].trim()
}

/// Flattens note text into (depth, text) entries.
///
/// Headings nest by their `#` count; bullets and paragraphs sit one level below
/// the current heading, deeper by two columns of indentation per level.
fn parse_outline(content: &str, title: &str) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    let mut heading_depth = 0;

    for line in content.lines() {
        let line = line.replace('\t', "  ");
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        if let Some(caps) = heading_regex().captures(trimmed) {
            let depth = caps[1].len();
            let text = caps[2].trim();

            // A top heading repeating the note title is the root itself
            if entries.is_empty() && depth == 1 && text.eq_ignore_ascii_case(title.trim()) {
                continue;
            }

            heading_depth = depth;
            entries.push(OutlineEntry {
                depth,
                text: text.to_string(),
                heading: true,
            });
            continue;
        }

        let text = match bullet_regex().captures(trimmed) {
            Some(caps) => caps[1].trim().to_string(),
            None => first_sentence(trimmed).to_string(),
        };
        if text.is_empty() {
            continue;
        }

        entries.push(OutlineEntry {
            depth: heading_depth + 1 + indent / 2,
            text,
            heading: false,
        });
    }

    entries
}

/// Derives a mindmap from the structure of the note text itself.
#[derive(Debug, Clone)]
pub struct OutlineGenerator {
    pub max_label_width: usize,
    pub max_nodes: usize,
}

impl Default for OutlineGenerator {
    fn default() -> Self {
        Self {
            max_label_width: DEFAULT_MAX_LABEL_WIDTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl OutlineGenerator {
    pub fn new(max_label_width: usize) -> Self {
        Self {
            max_label_width,
            ..Self::default()
        }
    }
}

impl MindmapGenerator for OutlineGenerator {
    fn generate(&self, note: &NoteInput) -> Result<Vec<MindmapNode>, GenerationError> {
        let entries = parse_outline(&note.content, &note.title);
        if entries.is_empty() {
            debug!(title = %note.title, "note has no outline structure");
            return Ok(fallback_mindmap(&note.title));
        }

        let title = truncate_label(&note.title, self.max_label_width);
        let root_label = if title.is_empty() {
            "Untitled Note".to_string()
        } else {
            title
        };
        let mut nodes = vec![MindmapNode::root("root", root_label)];

        // (id, depth, is heading) of the open ancestors
        let mut level_stack: Vec<(String, usize, bool)> = vec![("root".to_string(), 0, true)];

        for (i, entry) in entries.iter().enumerate() {
            if nodes.len() >= self.max_nodes {
                debug!(limit = self.max_nodes, "outline truncated");
                break;
            }

            // Headings never nest under bullets or paragraphs
            while level_stack.len() > 1
                && level_stack.last().is_some_and(|(_, depth, heading)| {
                    *depth >= entry.depth || (entry.heading && !*heading)
                })
            {
                level_stack.pop();
            }

            let Some((parent_id, _, _)) = level_stack.last() else {
                break;
            };
            let relation = if parent_id == "root" { "covers" } else { "includes" };

            let id = format!("n{}", i + 1);
            nodes.push(MindmapNode::child(
                id.clone(),
                truncate_label(&entry.text, self.max_label_width),
                parent_id.clone(),
                relation,
            ));
            level_stack.push((id, entry.depth, entry.heading));
        }

        Ok(nodes)
    }
}

/// Reads a model response (or a plain node list) from disk on every call.
#[derive(Debug, Clone)]
pub struct StoredResponseGenerator {
    pub path: PathBuf,
}

impl StoredResponseGenerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MindmapGenerator for StoredResponseGenerator {
    fn generate(&self, _note: &NoteInput) -> Result<Vec<MindmapNode>, GenerationError> {
        let raw = fs::read_to_string(&self.path)?;
        parse_generated_nodes(&raw)
    }
}
