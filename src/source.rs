use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::generate::{
    parse_generated_nodes, GenerationError, MindmapGenerator, NoteInput, OutlineGenerator,
    StoredResponseGenerator,
};
use crate::model::MindmapNode;
use crate::store::{self, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads a node list file: a canonical JSON array, or a raw model response
/// wrapping one.
pub fn read_node_list(path: &Path) -> AppResult<Vec<MindmapNode>> {
    match store::load_canonical(path) {
        Ok(nodes) => Ok(nodes),
        Err(StoreError::Json(err)) => {
            debug!(error = %err, "not a plain node list, trying model response format");
            let raw = fs::read_to_string(path)?;
            Ok(parse_generated_nodes(&raw)?)
        }
        Err(err) => Err(err.into()),
    }
}

pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| "Untitled Note".to_string())
}

/// Where a mindmap comes from, and where regeneration pulls a fresh one from.
#[derive(Debug, Clone, PartialEq)]
pub enum MapSource {
    /// A stored node list (or model response); regenerating re-reads it.
    NodeList { path: PathBuf },
    /// A plain-text note; regenerating re-derives the outline.
    Note { path: PathBuf, title: String },
}

impl MapSource {
    pub fn from_path(path: &Path, title: Option<String>) -> AppResult<Self> {
        if path.as_os_str().is_empty() {
            return Err(AppError::InvalidPath(path.to_path_buf()));
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        Ok(if is_json {
            MapSource::NodeList {
                path: path.to_path_buf(),
            }
        } else {
            MapSource::Note {
                path: path.to_path_buf(),
                title: title.unwrap_or_else(|| title_from_path(path)),
            }
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            MapSource::NodeList { path } | MapSource::Note { path, .. } => path,
        }
    }

    /// Initial load.
    pub fn load(&self, config: &AppConfig) -> AppResult<Vec<MindmapNode>> {
        match self {
            MapSource::NodeList { path } => read_node_list(path),
            MapSource::Note { .. } => Ok(self.regenerate(config)?),
        }
    }

    /// Produces a fresh node list. Runs off the UI thread.
    pub fn regenerate(&self, config: &AppConfig) -> Result<Vec<MindmapNode>, GenerationError> {
        match self {
            MapSource::NodeList { path } => {
                let note = NoteInput::new(title_from_path(path), String::new());
                StoredResponseGenerator::new(path.clone()).generate(&note)
            }
            MapSource::Note { path, title } => {
                let content = fs::read_to_string(path)?;
                let generator = OutlineGenerator {
                    max_label_width: config.max_label_width,
                    max_nodes: config.max_nodes,
                };
                generator.generate(&NoteInput::new(title.clone(), content))
            }
        }
    }
}
