use crate::model::MindmapNode;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("I/O error: {0}")]
    GenericIo(#[from] io::Error),
    #[error("Invalid mindmap JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn classify(err: io::Error, path: &Path) -> StoreError {
    match err.kind() {
        io::ErrorKind::NotFound => StoreError::FileNotFound(path.display().to_string()),
        io::ErrorKind::PermissionDenied => StoreError::PermissionDenied(path.display().to_string()),
        _ => StoreError::GenericIo(err),
    }
}

/// Loads the canonical node list. Positions are never stored; they are
/// recomputed from this list every time.
pub fn load_canonical(path: &Path) -> Result<Vec<MindmapNode>, StoreError> {
    let file = File::open(path).map_err(|e| classify(e, path))?;
    let reader = BufReader::new(file);
    let nodes: Vec<MindmapNode> = serde_json::from_reader(reader)?;
    debug!(path = %path.display(), nodes = nodes.len(), "loaded canonical mindmap");
    Ok(nodes)
}

pub fn save_canonical(path: &Path, nodes: &[MindmapNode]) -> Result<(), StoreError> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| classify(e, path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, nodes)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    debug!(path = %path.display(), nodes = nodes.len(), "saved canonical mindmap");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.json");
        let nodes = vec![
            MindmapNode::root("root", "Economics"),
            MindmapNode::child("a", "Supply", "root", "studies"),
        ];

        save_canonical(&path, &nodes).unwrap();
        let loaded = load_canonical(&path).unwrap();
        assert_eq!(loaded, nodes);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"x\""));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_canonical(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(StoreError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_canonical(&path), Err(StoreError::Json(_))));
    }
}
