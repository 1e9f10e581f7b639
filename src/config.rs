//! Extraction configuration and TOML config file support.
//!
//! Callers can build an [`ExtractionConfig`] directly or load one from a
//! config file:
//!
//! ```toml
//! # swimcube.toml
//! [extraction]
//! unique_swim_ids = 2048
//! instrument_sampling_period = 1.0
//! gap_threshold = 1.0
//! calibration = "recalibrated"
//!
//! [spectral]
//! strategy = "auto"
//! memory_budget_mb = 512
//! parallel = false
//!
//! [output]
//! profile = "balanced"
//! compression_level = 3
//! ```
//!
//! The `[extraction]` table and its two keys are required; everything else
//! falls back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetWriterConfig, Profile};
use crate::spectral::FftStrategy;
use crate::storage::CalibrationMode;

/// Default number of SWIM pulses per acquisition
pub const DEFAULT_UNIQUE_SWIM_IDS: u32 = 2048;

/// Default instrument sampling period
pub const DEFAULT_SAMPLING_PERIOD: f64 = 1.0;

/// Default rounded retention-time delta above which a pulse is considered missing
pub const DEFAULT_GAP_THRESHOLD: f64 = 1.0;

/// Default memory budget for the batched Fourier transform, in MiB
pub const DEFAULT_FFT_MEMORY_BUDGET_MB: u64 = 512;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has missing/mistyped keys
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration value for {field}: {message}")]
    Invalid {
        /// Offending key
        field: &'static str,
        /// Why the value was rejected
        message: String,
    },
}

/// Parameters governing one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Declared number of SWIM pulses; the time axis length
    pub unique_swim_ids: u32,

    /// Sampling period used to scale the frequency axis
    pub instrument_sampling_period: f64,

    /// Rounded retention-time delta above which one pulse is treated as missing
    pub gap_threshold: f64,

    /// Calibration requested from the array storage
    pub calibration: CalibrationMode,

    /// Fourier transform execution strategy
    pub fft_strategy: FftStrategy,

    /// Memory budget for the batched transform, in MiB
    pub fft_memory_budget_mb: u64,

    /// Transform channels on a thread pool (requires the `parallel` feature)
    pub parallel: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            unique_swim_ids: DEFAULT_UNIQUE_SWIM_IDS,
            instrument_sampling_period: DEFAULT_SAMPLING_PERIOD,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            calibration: CalibrationMode::default(),
            fft_strategy: FftStrategy::default(),
            fft_memory_budget_mb: DEFAULT_FFT_MEMORY_BUDGET_MB,
            parallel: false,
        }
    }
}

impl ExtractionConfig {
    /// Create a configuration with the given pulse count and sampling period
    pub fn new(unique_swim_ids: u32, instrument_sampling_period: f64) -> Self {
        Self {
            unique_swim_ids,
            instrument_sampling_period,
            ..Default::default()
        }
    }

    /// Set the transform strategy
    pub fn with_strategy(mut self, strategy: FftStrategy) -> Self {
        self.fft_strategy = strategy;
        self
    }

    /// Set the gap threshold
    pub fn with_gap_threshold(mut self, gap_threshold: f64) -> Self {
        self.gap_threshold = gap_threshold;
        self
    }

    /// Number of frequency bins produced by the transform
    pub fn n_frequencies(&self) -> usize {
        self.unique_swim_ids as usize / 2 + 1
    }

    /// Batched transform memory budget in bytes
    pub fn memory_budget_bytes(&self) -> u64 {
        self.fft_memory_budget_mb.saturating_mul(1024 * 1024)
    }

    /// Whether the gap threshold was left at its default while the sampling
    /// period was changed. The threshold is compared against retention-time
    /// deltas, not pulse periods, so this combination is usually a mistake.
    pub fn gap_threshold_ignores_period(&self) -> bool {
        self.gap_threshold == DEFAULT_GAP_THRESHOLD
            && self.instrument_sampling_period != DEFAULT_SAMPLING_PERIOD
    }

    /// Reject values that would make the run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unique_swim_ids == 0 {
            return Err(ConfigError::Invalid {
                field: "unique_swim_ids",
                message: "must be a positive integer".to_string(),
            });
        }

        if !self.instrument_sampling_period.is_finite() || self.instrument_sampling_period <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "instrument_sampling_period",
                message: format!(
                    "must be a positive number, got {}",
                    self.instrument_sampling_period
                ),
            });
        }

        if !self.gap_threshold.is_finite() || self.gap_threshold < 0.0 {
            return Err(ConfigError::Invalid {
                field: "gap_threshold",
                message: format!("must be a non-negative number, got {}", self.gap_threshold),
            });
        }

        Ok(())
    }
}

/// Root structure of a `swimcube.toml` file.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    /// Required extraction parameters
    pub extraction: ExtractionSection,

    /// Transform tuning
    #[serde(default)]
    pub spectral: SpectralSection,

    /// Output file tuning
    #[serde(default)]
    pub output: OutputSection,
}

/// `[extraction]` table.
#[derive(Debug, Deserialize)]
pub struct ExtractionSection {
    /// Declared number of SWIM pulses
    pub unique_swim_ids: u32,

    /// Instrument sampling period
    pub instrument_sampling_period: f64,

    /// Gap threshold override
    pub gap_threshold: Option<f64>,

    /// Calibration mode override
    pub calibration: Option<CalibrationMode>,
}

/// `[spectral]` table.
#[derive(Debug, Default, Deserialize)]
pub struct SpectralSection {
    /// Transform strategy
    pub strategy: Option<FftStrategy>,

    /// Batched transform memory budget in MiB
    pub memory_budget_mb: Option<u64>,

    /// Parallel channel transforms
    pub parallel: Option<bool>,
}

/// `[output]` table.
#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    /// Conversion profile
    pub profile: Option<Profile>,

    /// ZSTD compression level (1-22)
    pub compression_level: Option<i32>,

    /// Rows (cube cells) per Parquet row group
    pub row_group_size: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validated extraction parameters
    pub fn extraction_config(&self) -> Result<ExtractionConfig, ConfigError> {
        let defaults = ExtractionConfig::default();
        let config = ExtractionConfig {
            unique_swim_ids: self.extraction.unique_swim_ids,
            instrument_sampling_period: self.extraction.instrument_sampling_period,
            gap_threshold: self.extraction.gap_threshold.unwrap_or(defaults.gap_threshold),
            calibration: self.extraction.calibration.unwrap_or(defaults.calibration),
            fft_strategy: self.spectral.strategy.unwrap_or(defaults.fft_strategy),
            fft_memory_budget_mb: self
                .spectral
                .memory_budget_mb
                .unwrap_or(defaults.fft_memory_budget_mb),
            parallel: self.spectral.parallel.unwrap_or(defaults.parallel),
        };
        config.validate()?;
        Ok(config)
    }

    /// Output writer settings: the profile's defaults with explicit overrides applied
    pub fn dataset_writer_config(&self) -> DatasetWriterConfig {
        let profile = self.output.profile.unwrap_or_default();
        let mut config = DatasetWriterConfig::from_profile(profile);
        if let Some(level) = self.output.compression_level {
            config = config.with_compression_level(level);
        }
        if let Some(rows) = self.output.row_group_size {
            config.row_group_size = rows;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [extraction]
            unique_swim_ids = 1024
            instrument_sampling_period = 0.5
            gap_threshold = 2.0
            calibration = "raw"

            [spectral]
            strategy = "channel"
            memory_budget_mb = 64
            parallel = true

            [output]
            profile = "fast"
            row_group_size = 4096
        "#;

        let file = ConfigFile::from_str(toml).unwrap();
        let config = file.extraction_config().unwrap();
        assert_eq!(config.unique_swim_ids, 1024);
        assert_eq!(config.instrument_sampling_period, 0.5);
        assert_eq!(config.gap_threshold, 2.0);
        assert_eq!(config.calibration, CalibrationMode::Raw);
        assert_eq!(config.fft_strategy, FftStrategy::ChannelAtATime);
        assert_eq!(config.fft_memory_budget_mb, 64);
        assert!(config.parallel);

        let writer = file.dataset_writer_config();
        assert_eq!(writer.row_group_size, 4096);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml = r#"
            [extraction]
            unique_swim_ids = 2048
            instrument_sampling_period = 1.0
        "#;

        let config = ConfigFile::from_str(toml)
            .unwrap()
            .extraction_config()
            .unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn test_missing_required_key() {
        let toml = r#"
            [extraction]
            unique_swim_ids = 2048
        "#;
        assert!(matches!(ConfigFile::from_str(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_non_numeric_value() {
        let toml = r#"
            [extraction]
            unique_swim_ids = "many"
            instrument_sampling_period = 1.0
        "#;
        assert!(matches!(ConfigFile::from_str(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_rejects_zero_pulses() {
        let config = ExtractionConfig::new(0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "unique_swim_ids", .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_period() {
        assert!(ExtractionConfig::new(16, 0.0).validate().is_err());
        assert!(ExtractionConfig::new(16, -1.0).validate().is_err());
        assert!(ExtractionConfig::new(16, f64::NAN).validate().is_err());
        assert!(ExtractionConfig::new(16, 0.25).validate().is_ok());
    }

    #[test]
    fn test_gap_threshold_period_mismatch() {
        assert!(!ExtractionConfig::default().gap_threshold_ignores_period());
        assert!(ExtractionConfig::new(16, 0.5).gap_threshold_ignores_period());
        assert!(!ExtractionConfig::new(16, 0.5)
            .with_gap_threshold(0.5)
            .gap_threshold_ignores_period());
    }

    #[test]
    fn test_frequency_bin_count() {
        assert_eq!(ExtractionConfig::new(2048, 1.0).n_frequencies(), 1025);
        assert_eq!(ExtractionConfig::new(1, 1.0).n_frequencies(), 1);
        assert_eq!(ExtractionConfig::new(7, 1.0).n_frequencies(), 4);
    }
}
