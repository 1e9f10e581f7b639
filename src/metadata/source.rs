use std::path::Path;

use serde::{Deserialize, Serialize};

use super::MetadataError;

/// Source file information for provenance tracking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceFileInfo {
    /// Source id (acquisition directory stem)
    pub name: String,

    /// Acquisition directory path
    pub path: Option<String>,

    /// File format
    pub format: Option<String>,

    /// Size of the binary storage file in bytes
    pub size_bytes: Option<u64>,
}

impl SourceFileInfo {
    /// Create new source file info with the given source id
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Describe a Bruker `.d` acquisition directory
    pub fn from_acquisition_dir(name: &str, dir: &Path, storage_file: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: Some(dir.display().to_string()),
            format: Some("Bruker .d".to_string()),
            size_bytes: std::fs::metadata(storage_file).ok().map(|m| m.len()),
        }
    }

    /// Serialize to JSON for Parquet footer storage
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }
}
