use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;
use serde::{Deserialize, Serialize};

use crate::cube::CubeKind;
use crate::schema::{columns, row_column, value_column};

/// Output profiles for common use cases.
///
/// Profiles provide sensible defaults for compression and performance tuning,
/// hiding low-level Parquet settings from end users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Prioritize speed over compression.
    ///
    /// - Compression: ZSTD level 1
    /// - Row group size: 262,144 cells
    Fast,

    /// Balance between speed and compression (default).
    ///
    /// - Compression: ZSTD level 3
    /// - Row group size: 1,048,576 cells
    #[default]
    Balanced,

    /// Maximum compression, slower writes.
    ///
    /// - Compression: ZSTD level 15
    /// - Row group size: 4,194,304 cells
    MaxCompression,
}

impl Profile {
    /// Returns the ZSTD compression level for this profile.
    pub fn compression_level(&self) -> i32 {
        match self {
            Profile::Fast => 1,
            Profile::Balanced => 3,
            Profile::MaxCompression => 15,
        }
    }

    /// Returns the row group size (cube cells per row group) for this profile.
    pub fn row_group_size(&self) -> usize {
        match self {
            Profile::Fast => 262_144,
            Profile::Balanced => 1_048_576,
            Profile::MaxCompression => 4_194_304,
        }
    }

    /// Returns the number of cells per Arrow record batch for this profile.
    pub fn batch_size(&self) -> usize {
        match self {
            Profile::Fast => 65_536,
            Profile::Balanced => 131_072,
            Profile::MaxCompression => 262_144,
        }
    }

    /// Returns all available profile names.
    pub fn variants() -> &'static [&'static str] {
        &["fast", "balanced", "max-compression"]
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Fast => write!(f, "fast"),
            Profile::Balanced => write!(f, "balanced"),
            Profile::MaxCompression => write!(f, "max-compression"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Profile::Fast),
            "balanced" | "default" => Ok(Profile::Balanced),
            "max-compression" | "maxcompression" | "max" => Ok(Profile::MaxCompression),
            _ => Err(format!(
                "Unknown profile '{}'. Valid options: {}",
                s,
                Profile::variants().join(", ")
            )),
        }
    }
}

/// Compression options for cube datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// ZSTD compression (recommended, best compression ratio)
    Zstd(i32),
    /// Snappy compression (faster, slightly larger files)
    Snappy,
    /// No compression (fastest write, largest files)
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

/// Configuration for the cube dataset writer
#[derive(Debug, Clone)]
pub struct DatasetWriterConfig {
    /// Compression type to use
    pub compression: CompressionType,

    /// Target row group size (cube cells per group)
    pub row_group_size: usize,

    /// Cube cells per Arrow record batch handed to the Parquet writer
    pub batch_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write statistics for columns
    pub write_statistics: bool,

    /// Enable BYTE_STREAM_SPLIT encoding for the value column
    pub use_byte_stream_split: bool,
}

impl Default for DatasetWriterConfig {
    fn default() -> Self {
        Self::from_profile(Profile::default())
    }
}

impl DatasetWriterConfig {
    /// Settings for one of the output profiles
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            compression: CompressionType::Zstd(profile.compression_level()),
            row_group_size: profile.row_group_size(),
            batch_size: profile.batch_size(),
            data_page_size: 1024 * 1024,
            write_statistics: true,
            use_byte_stream_split: true,
        }
    }

    /// Override the ZSTD compression level
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression = CompressionType::Zstd(level);
        self
    }

    /// Create writer properties for a cube of `kind` from this configuration
    pub(super) fn to_writer_properties(
        &self,
        kind: CubeKind,
        metadata: &HashMap<String, String>,
    ) -> WriterProperties {
        let compression = match self.compression {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        };

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(compression)
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size.max(1));

        // Coordinates repeat: the row coordinate n_mz times in a row, the
        // mass axis with period n_mz
        let (row_name, _) = row_column(kind);
        for col in [row_name, columns::MASS_CHARGE] {
            builder =
                builder.set_column_dictionary_enabled(ColumnPath::new(vec![col.to_string()]), true);
        }

        let value = ColumnPath::new(vec![value_column(kind).to_string()]);
        builder = builder.set_column_dictionary_enabled(value.clone(), false);
        if self.use_byte_stream_split {
            builder = builder.set_column_encoding(value, Encoding::BYTE_STREAM_SPLIT);
        }

        let kv_metadata: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: Some(v.clone()),
            })
            .collect();

        builder = builder.set_key_value_metadata(Some(kv_metadata));

        builder.build()
    }
}
