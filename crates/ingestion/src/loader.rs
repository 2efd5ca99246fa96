//! Plain-text document loading
//!
//! Reads source documents from disk and attaches provenance metadata
//! (`filename`, `source`) that retrieval surfaces back to callers.

use ragkit_common::{RagError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A document read from disk, ready for chunking
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

/// Load a single text file
pub fn load_text_file(path: &Path) -> Result<LoadedDocument> {
    let text = fs::read_to_string(path).map_err(|e| {
        RagError::persistence(format!("failed to read {}: {}", path.display(), e))
    })?;

    let mut metadata = BTreeMap::new();
    if let Some(name) = path.file_name() {
        metadata.insert("filename".to_string(), name.to_string_lossy().to_string());
    }
    metadata.insert("source".to_string(), path.display().to_string());

    Ok(LoadedDocument { text, metadata })
}

/// Load every file with the given extension from a directory, in name order.
///
/// Name ordering keeps ingestion deterministic across platforms whose
/// directory iteration order differs.
pub fn load_directory(dir: &Path, extension: &str) -> Result<Vec<LoadedDocument>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        RagError::persistence(format!("failed to read directory {}: {}", dir.display(), e))
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        documents.push(load_text_file(path)?);
    }

    debug!(
        dir = %dir.display(),
        extension,
        documents = documents.len(),
        "Directory loaded"
    );

    Ok(documents)
}
