use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::processing::ProcessingHistory;
use super::source::SourceFileInfo;
use super::MetadataError;
use crate::config::ExtractionConfig;
use crate::schema::*;

/// Provenance stored in the footer of every cube dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CubeMetadata {
    /// Source acquisition
    pub source_file: Option<SourceFileInfo>,

    /// Parameters the cube was extracted with
    pub extraction_config: Option<ExtractionConfig>,

    /// Processing history
    pub processing_history: Option<ProcessingHistory>,

    /// When the dataset was written (RFC 3339), filled in on read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_timestamp: Option<String>,

    /// Software that wrote the dataset, filled in on read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converter_info: Option<String>,
}

impl CubeMetadata {
    /// Create a new empty metadata container
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert all metadata to a HashMap suitable for Parquet key_value_metadata
    pub fn to_parquet_metadata(&self) -> Result<HashMap<String, String>, MetadataError> {
        let mut metadata = HashMap::new();

        metadata.insert(KEY_FORMAT_VERSION.to_string(), SWIMCUBE_FORMAT_VERSION.to_string());

        metadata.insert(
            KEY_CONVERSION_TIMESTAMP.to_string(),
            chrono::Utc::now().to_rfc3339(),
        );

        metadata.insert(
            KEY_CONVERTER_INFO.to_string(),
            format!("swimcube v{}", env!("CARGO_PKG_VERSION")),
        );

        if let Some(ref source) = self.source_file {
            metadata.insert(KEY_SOURCE_FILE.to_string(), source.to_json()?);
        }

        if let Some(ref config) = self.extraction_config {
            metadata.insert(
                KEY_EXTRACTION_CONFIG.to_string(),
                serde_json::to_string(config)?,
            );
        }

        if let Some(ref history) = self.processing_history {
            metadata.insert(KEY_PROCESSING_HISTORY.to_string(), history.to_json()?);
        }

        Ok(metadata)
    }

    /// Reconstruct metadata from Parquet key_value_metadata
    pub fn from_parquet_metadata(
        metadata: &HashMap<String, String>,
    ) -> Result<Self, MetadataError> {
        let mut result = Self::new();

        if let Some(json) = metadata.get(KEY_SOURCE_FILE) {
            result.source_file = Some(SourceFileInfo::from_json(json)?);
        }

        if let Some(json) = metadata.get(KEY_EXTRACTION_CONFIG) {
            result.extraction_config = Some(serde_json::from_str(json)?);
        }

        if let Some(json) = metadata.get(KEY_PROCESSING_HISTORY) {
            result.processing_history = Some(ProcessingHistory::from_json(json)?);
        }

        result.conversion_timestamp = metadata.get(KEY_CONVERSION_TIMESTAMP).cloned();
        result.converter_info = metadata.get(KEY_CONVERTER_INFO).cloned();

        Ok(result)
    }
}
