use super::*;
use crate::config::ExtractionConfig;
use crate::schema::{KEY_CONVERTER_INFO, KEY_EXTRACTION_CONFIG, KEY_FORMAT_VERSION, KEY_SOURCE_FILE};

#[test]
fn test_footer_roundtrip() {
    let mut history = ProcessingHistory::new();
    history.add_step(ProcessingStep::now("time-domain reconstruction").with_parameter("gaps", 2));
    history.add_step(ProcessingStep::now("power spectrum").with_parameter("strategy", "batched"));

    let metadata = CubeMetadata {
        source_file: Some(SourceFileInfo::new("run_042")),
        extraction_config: Some(ExtractionConfig::new(1024, 0.5)),
        processing_history: Some(history),
        ..Default::default()
    };

    let footer = metadata.to_parquet_metadata().unwrap();
    assert_eq!(footer.get(KEY_FORMAT_VERSION).unwrap(), "1.0.0");
    assert!(footer.get(KEY_CONVERTER_INFO).unwrap().starts_with("swimcube v"));
    assert!(footer.contains_key(KEY_EXTRACTION_CONFIG));

    let restored = CubeMetadata::from_parquet_metadata(&footer).unwrap();
    assert_eq!(restored.source_file.unwrap().name, "run_042");
    let config = restored.extraction_config.unwrap();
    assert_eq!(config.unique_swim_ids, 1024);
    assert_eq!(config.instrument_sampling_period, 0.5);

    let steps = restored.processing_history.unwrap().steps;
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].order, 1);
    assert_eq!(steps[1].order, 2);
    assert_eq!(steps[1].parameters.get("strategy").unwrap(), "batched");
    assert!(restored.conversion_timestamp.is_some());
}

#[test]
fn test_empty_metadata_has_only_required_keys() {
    let footer = CubeMetadata::new().to_parquet_metadata().unwrap();
    assert_eq!(footer.len(), 3);
    assert!(!footer.contains_key(KEY_SOURCE_FILE));
}

#[test]
fn test_malformed_footer_value() {
    let mut footer = std::collections::HashMap::new();
    footer.insert(KEY_SOURCE_FILE.to_string(), "{not json".to_string());
    assert!(matches!(
        CubeMetadata::from_parquet_metadata(&footer),
        Err(MetadataError::JsonError(_))
    ));
}
