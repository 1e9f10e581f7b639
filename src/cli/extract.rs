use anyhow::{Context, Result};
use clap::Args;
use log::info;
use std::path::PathBuf;

use swimcube::config::{ConfigFile, ExtractionConfig};
use swimcube::dataset::{DatasetWriterConfig, Profile};
use swimcube::storage::CalibrationMode;

use super::{ProfileArg, StrategyArg};

/// Arguments of the `extract` command. Flags override config file values.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Bruker .d acquisition directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory receiving the two cube datasets
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of SWIM pulses (time axis length)
    #[arg(short = 'n', long)]
    unique_swim_ids: Option<u32>,

    /// Instrument sampling period
    #[arg(short = 's', long)]
    sampling_period: Option<f64>,

    /// Rounded retention-time delta above which a pulse counts as missing
    #[arg(long)]
    gap_threshold: Option<f64>,

    /// Fourier transform strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Memory budget for the batched transform, in MiB
    #[arg(long, value_name = "MB")]
    memory_budget_mb: Option<u64>,

    /// Transform channels in parallel (requires the parallel feature)
    #[arg(long)]
    parallel: bool,

    /// Path to the baf2sql_c shared library
    #[arg(long, env = "BAF2SQL_LIBRARY", value_name = "PATH")]
    library: Option<PathBuf>,

    /// Read raw instead of recalibrated mass axes
    #[arg(long)]
    raw_calibration: bool,

    /// Output profile (fast, balanced, max-compression)
    #[arg(short = 'p', long, value_enum)]
    profile: Option<ProfileArg>,

    /// Write the extraction report as JSON to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    // === Advanced tuning flags (hidden from --help) ===
    /// Compression level for ZSTD (1-22, default: profile-dependent)
    #[arg(short = 'c', long, hide = true)]
    compression_level: Option<i32>,

    /// Row group size (cube cells per row group)
    #[arg(short = 'r', long, hide = true)]
    row_group_size: Option<usize>,
}

impl ExtractArgs {
    /// Merge the config file (if any) with command-line overrides
    fn resolve(&self) -> Result<(ExtractionConfig, DatasetWriterConfig)> {
        let (mut config, mut writer_config) = match &self.config {
            Some(path) => {
                let file = ConfigFile::from_file(path)?;
                info!("Loaded configuration from {}", path.display());
                let config = file
                    .extraction_config()
                    .with_context(|| format!("Invalid configuration in {}", path.display()))?;
                (config, file.dataset_writer_config())
            }
            None => (ExtractionConfig::default(), DatasetWriterConfig::default()),
        };

        if let Some(n) = self.unique_swim_ids {
            config.unique_swim_ids = n;
        }
        if let Some(period) = self.sampling_period {
            config.instrument_sampling_period = period;
        }
        if let Some(threshold) = self.gap_threshold {
            config.gap_threshold = threshold;
        }
        if let Some(strategy) = self.strategy {
            config.fft_strategy = strategy.into();
        }
        if let Some(mb) = self.memory_budget_mb {
            config.fft_memory_budget_mb = mb;
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.raw_calibration {
            config.calibration = CalibrationMode::Raw;
        }
        config.validate().context("Invalid extraction parameters")?;

        if let Some(profile) = self.profile {
            writer_config = DatasetWriterConfig::from_profile(Profile::from(profile));
        }
        if let Some(level) = self.compression_level {
            writer_config = writer_config.with_compression_level(level);
        }
        if let Some(rows) = self.row_group_size {
            writer_config.row_group_size = rows;
        }

        Ok((config, writer_config))
    }
}

#[cfg(feature = "baf2sql")]
pub fn run(args: ExtractArgs) -> Result<()> {
    use swimcube::extract::SwimExtractor;
    use swimcube::storage::DEFAULT_LIBRARY_NAME;

    let (config, writer_config) = args.resolve()?;
    let library = args
        .library
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_NAME));

    info!(
        "Extracting {} ({} pulses, sampling period {})",
        args.input.display(),
        config.unique_swim_ids,
        config.instrument_sampling_period
    );

    let extractor = SwimExtractor::open(&args.input, &library)
        .with_context(|| format!("Failed to open acquisition {}", args.input.display()))?;
    let output = extractor
        .extract_and_save(&args.output_dir, &config, &writer_config)
        .with_context(|| format!("Extraction of {} failed", args.input.display()))?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&output.report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    super::print_summary(&output);
    Ok(())
}

#[cfg(not(feature = "baf2sql"))]
pub fn run(args: ExtractArgs) -> Result<()> {
    args.resolve()?;
    anyhow::bail!("swimcube was built without the baf2sql feature; rebuild with --features baf2sql")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use swimcube::dataset::CompressionType;
    use swimcube::spectral::FftStrategy;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ExtractArgs,
    }

    fn parse(argv: &[&str]) -> ExtractArgs {
        let mut full = vec!["swimcube", "run.d", "out"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn test_flags_without_config_file() {
        let args = parse(&["-n", "1024", "-s", "0.5", "--strategy", "channel", "--raw-calibration"]);
        let (config, writer) = args.resolve().unwrap();

        assert_eq!(config.unique_swim_ids, 1024);
        assert_eq!(config.instrument_sampling_period, 0.5);
        assert_eq!(config.fft_strategy, FftStrategy::ChannelAtATime);
        assert_eq!(config.calibration, CalibrationMode::Raw);
        assert_eq!(writer.compression, CompressionType::Zstd(3));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swimcube.toml");
        std::fs::write(
            &path,
            "[extraction]\nunique_swim_ids = 512\ninstrument_sampling_period = 2.0\n\n[output]\nprofile = \"fast\"\n",
        )
        .unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "-s", "4.0", "-c", "7"]);
        let (config, writer) = args.resolve().unwrap();

        assert_eq!(config.unique_swim_ids, 512);
        assert_eq!(config.instrument_sampling_period, 4.0);
        assert_eq!(writer.compression, CompressionType::Zstd(7));
        assert_eq!(writer.row_group_size, Profile::Fast.row_group_size());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = parse(&["-n", "0"]);
        assert!(args.resolve().is_err());
    }
}
