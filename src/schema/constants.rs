/// Dataset format version - follows semantic versioning
pub const SWIMCUBE_FORMAT_VERSION: &str = "1.0.0";

/// File extension for cube datasets
pub const DATASET_EXTENSION: &str = "parquet";

/// Metadata key for format version in Parquet footer
pub const KEY_FORMAT_VERSION: &str = "swimcube:format_version";

/// Metadata key for the cube kind (`time_domain` / `frequency_domain`)
pub const KEY_CUBE_KIND: &str = "swimcube:cube_kind";

/// Metadata key for the dimension names, JSON array
pub const KEY_DIMS: &str = "swimcube:dims";

/// Metadata key for the cube shape, JSON array `[rows, columns]`
pub const KEY_SHAPE: &str = "swimcube:shape";

/// Metadata key for the name of the stored variable
pub const KEY_VARIABLE: &str = "swimcube:variable";

/// Metadata key for source file information
pub const KEY_SOURCE_FILE: &str = "swimcube:source_file";

/// Metadata key for the extraction parameters
pub const KEY_EXTRACTION_CONFIG: &str = "swimcube:extraction_config";

/// Metadata key for data processing history
pub const KEY_PROCESSING_HISTORY: &str = "swimcube:processing_history";

/// Metadata key for conversion timestamp
pub const KEY_CONVERSION_TIMESTAMP: &str = "swimcube:conversion_timestamp";

/// Metadata key for converter software info
pub const KEY_CONVERTER_INFO: &str = "swimcube:converter_info";
