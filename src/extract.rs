//! End-to-end extraction: acquisition records in, two cube datasets out.
//!
//! [`run_extraction`] is the storage-agnostic pipeline:
//!
//! 1. read the mass axis once, from the first record's mass-axis array
//! 2. reconstruct the [`TimeDomainCube`](crate::cube::TimeDomainCube)
//! 3. write it, transform it, write the power spectra
//! 4. move both files into place
//!
//! Both datasets are written to temporary files inside the output directory
//! and renamed only once both are complete, so a failed run leaves no
//! partial output behind.
//!
//! [`SwimExtractor`] wires the pipeline to a Bruker `.d` directory through
//! the vendor `baf2sql` library.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::acquisition::{AcquisitionError, AcquisitionRecord};
use crate::config::{ConfigError, ExtractionConfig};
use crate::cube::{CubeKind, MassAxis};
use crate::dataset::{output_path, write_cube_to, DatasetError, DatasetStats, DatasetWriterConfig};
use crate::metadata::{CubeMetadata, ProcessingHistory, ProcessingStep, SourceFileInfo};
use crate::reconstruct::{ReconstructError, ReconstructionReport, TimeDomainReconstructor};
use crate::spectral::{ResolvedStrategy, SpectralTransformer};
use crate::storage::{ArrayStorage, StorageError};

#[cfg(feature = "baf2sql")]
pub use self::baf::SwimExtractor;

/// Name of the binary storage file inside a `.d` directory
pub const BAF_FILE_NAME: &str = "analysis.baf";

/// Errors that abort an extraction run, named after the failing stage
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Input acquisition directory does not exist
    #[error("Input directory not found: {}", .0.display())]
    InputDirectoryMissing(PathBuf),

    /// Input directory has no binary storage file
    #[error("No analysis.baf found in {}", .0.display())]
    BafFileMissing(PathBuf),

    /// Vendor library path does not exist
    #[error("baf2sql library not found: {}", .0.display())]
    LibraryMissing(PathBuf),

    /// Extraction parameters are invalid
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Array storage could not be loaded or opened
    #[error("Array storage error: {0}")]
    Storage(#[from] StorageError),

    /// Acquisition metadata could not be read
    #[error("Acquisition metadata error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Acquisition table has no rows
    #[error("Acquisition has no records")]
    NoRecords,

    /// Mass axis array could not be read
    #[error("Failed to read mass axis (array {array_id}): {source}")]
    MassAxis {
        /// Mass-axis array id of the first record
        array_id: u64,
        /// Storage failure
        source: StorageError,
    },

    /// Mass axis array has no elements
    #[error("Mass axis (array {0}) is empty")]
    EmptyMassAxis(u64),

    /// Time-domain cube could not be assembled
    #[error("Time-domain reconstruction failed: {0}")]
    Reconstruction(#[from] ReconstructError),

    /// Dataset could not be written
    #[error("Failed to write dataset: {0}")]
    Dataset(#[from] DatasetError),

    /// Output directory or file could not be created
    #[error("Output I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Diagnostics of one run, serializable to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Reconstruction diagnostics
    #[serde(flatten)]
    pub reconstruction: ReconstructionReport,

    /// Transform strategy actually used
    pub strategy: ResolvedStrategy,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    /// Time-domain dataset
    pub time_domain_path: PathBuf,
    /// Frequency-domain dataset
    pub fourier_domain_path: PathBuf,
    /// Time-domain write statistics
    pub time_domain_stats: DatasetStats,
    /// Frequency-domain write statistics
    pub fourier_domain_stats: DatasetStats,
    /// Run diagnostics
    pub report: ExtractionReport,
}

/// Source id of an acquisition directory: its file stem
pub fn source_id_for(input_dir: &Path) -> String {
    input_dir
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "acquisition".to_string())
}

/// Read the shared mass axis from the first record
fn read_mass_axis<S: ArrayStorage + ?Sized>(
    storage: &S,
    records: &[AcquisitionRecord],
) -> Result<MassAxis, ExtractError> {
    let array_id = records.first().ok_or(ExtractError::NoRecords)?.mass_axis_array_id;
    let values = storage
        .read_doubles(array_id)
        .map_err(|source| ExtractError::MassAxis { array_id, source })?;
    if values.is_empty() {
        return Err(ExtractError::EmptyMassAxis(array_id));
    }
    Ok(MassAxis::new(values))
}

/// Run the pipeline over `records` and write both cubes into `output_dir`.
///
/// The datasets are named `<source.name>_timedomain.parquet` and
/// `<source.name>_fourierdomain.parquet`; existing files are replaced.
pub fn run_extraction<S: ArrayStorage + ?Sized>(
    source: &SourceFileInfo,
    records: &[AcquisitionRecord],
    storage: &S,
    config: &ExtractionConfig,
    writer_config: &DatasetWriterConfig,
    output_dir: &Path,
) -> Result<ExtractionOutput, ExtractError> {
    config.validate()?;
    if config.gap_threshold_ignores_period() {
        warn!(
            "Gap threshold is {} while the sampling period is {}; pulses may be misclassified as gaps",
            config.gap_threshold, config.instrument_sampling_period
        );
    }
    if records.is_empty() {
        return Err(ExtractError::NoRecords);
    }

    std::fs::create_dir_all(output_dir)?;

    let mass_axis = read_mass_axis(storage, records)?;
    info!(
        "Extracting {}: {} records, {} mass channels",
        source.name,
        records.len(),
        mass_axis.len()
    );

    let reconstruction =
        TimeDomainReconstructor::new(storage, mass_axis, config.unique_swim_ids as usize)
            .with_gap_threshold(config.gap_threshold)
            .reconstruct(records)?;
    let time_domain = reconstruction.cube;
    let reconstruction_report = reconstruction.report;

    let mut history = ProcessingHistory::new();
    history.add_step(
        ProcessingStep::now("time-domain reconstruction")
            .with_parameter("unique_swim_ids", config.unique_swim_ids)
            .with_parameter("gap_threshold", config.gap_threshold)
            .with_parameter("records", reconstruction_report.records_total)
            .with_parameter("skipped", reconstruction_report.skipped.len())
            .with_parameter("gaps_detected", reconstruction_report.gaps_detected),
    );
    let mut metadata = CubeMetadata {
        source_file: Some(source.clone()),
        extraction_config: Some(config.clone()),
        processing_history: Some(history.clone()),
        ..Default::default()
    };

    let mut time_file = NamedTempFile::new_in(output_dir)?;
    let time_domain_stats = write_cube_to(time_file.as_file_mut(), &time_domain, &metadata, writer_config)?;
    info!("{}", time_domain_stats);

    let transformer = SpectralTransformer::from_config(config);
    let strategy = transformer.resolve(&time_domain);
    let spectra = transformer.transform_with(&time_domain, strategy);

    history.add_step(
        ProcessingStep::now("power spectrum")
            .with_parameter("strategy", strategy)
            .with_parameter("sampling_period", config.instrument_sampling_period)
            .with_parameter("n_frequencies", spectra.n_frequencies()),
    );
    metadata.processing_history = Some(history);

    let mut fourier_file = NamedTempFile::new_in(output_dir)?;
    let fourier_domain_stats = write_cube_to(fourier_file.as_file_mut(), &spectra, &metadata, writer_config)?;
    info!("{}", fourier_domain_stats);

    let time_domain_path = output_path(output_dir, &source.name, CubeKind::TimeDomain);
    let fourier_domain_path = output_path(output_dir, &source.name, CubeKind::FrequencyDomain);

    time_file
        .persist(&time_domain_path)
        .map_err(|e| ExtractError::Io(e.error))?;
    if let Err(e) = fourier_file.persist(&fourier_domain_path) {
        // Keep the pair consistent
        if let Err(cleanup) = std::fs::remove_file(&time_domain_path) {
            warn!(
                "Could not remove {} after failed write: {}",
                time_domain_path.display(),
                cleanup
            );
        }
        return Err(ExtractError::Io(e.error));
    }

    info!(
        "Wrote {} and {}",
        time_domain_path.display(),
        fourier_domain_path.display()
    );

    Ok(ExtractionOutput {
        time_domain_path,
        fourier_domain_path,
        time_domain_stats,
        fourier_domain_stats,
        report: ExtractionReport {
            reconstruction: reconstruction_report,
            strategy,
        },
    })
}

#[cfg(feature = "baf2sql")]
mod baf {
    use std::path::{Path, PathBuf};

    use log::info;

    use super::{run_extraction, source_id_for, ExtractError, ExtractionOutput, BAF_FILE_NAME};
    use crate::acquisition::AcquisitionReader;
    use crate::config::ExtractionConfig;
    use crate::dataset::DatasetWriterConfig;
    use crate::metadata::SourceFileInfo;
    use crate::storage::Baf2SqlLibrary;

    /// Extraction over a Bruker `.d` acquisition directory
    #[derive(Debug)]
    pub struct SwimExtractor {
        input_dir: PathBuf,
        baf_path: PathBuf,
        library: Baf2SqlLibrary,
    }

    impl SwimExtractor {
        /// Check the acquisition directory and load the vendor library.
        ///
        /// `library_path` may be a bare file name, in which case the system
        /// loader search path is used.
        pub fn open<P: AsRef<Path>, L: AsRef<Path>>(
            input_dir: P,
            library_path: L,
        ) -> Result<Self, ExtractError> {
            let input_dir = input_dir.as_ref().to_path_buf();
            if !input_dir.is_dir() {
                return Err(ExtractError::InputDirectoryMissing(input_dir));
            }

            let baf_path = input_dir.join(BAF_FILE_NAME);
            if !baf_path.is_file() {
                return Err(ExtractError::BafFileMissing(input_dir));
            }

            let library_path = library_path.as_ref();
            if library_path.components().count() > 1 && !library_path.exists() {
                return Err(ExtractError::LibraryMissing(library_path.to_path_buf()));
            }
            let library = Baf2SqlLibrary::load(library_path)?;

            Ok(Self {
                input_dir,
                baf_path,
                library,
            })
        }

        /// Source id used to name the output datasets
        pub fn source_id(&self) -> String {
            source_id_for(&self.input_dir)
        }

        /// Run the full extraction into `output_dir`
        pub fn extract_and_save<P: AsRef<Path>>(
            &self,
            output_dir: P,
            config: &ExtractionConfig,
            writer_config: &DatasetWriterConfig,
        ) -> Result<ExtractionOutput, ExtractError> {
            config.validate()?;

            let cache = self.library.sqlite_cache_filename(&self.baf_path, false)?;
            info!("Acquisition metadata cache: {}", cache.display());

            let storage = self.library.open_storage(&self.baf_path, config.calibration)?;
            let records = AcquisitionReader::open(&cache)?.read_records()?;

            let source =
                SourceFileInfo::from_acquisition_dir(&self.source_id(), &self.input_dir, &self.baf_path);

            run_extraction(
                &source,
                &records,
                &storage,
                config,
                writer_config,
                output_dir.as_ref(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_cube;
    use crate::storage::InMemoryArrayStorage;
    use tempfile::tempdir;

    fn fixture(n_records: u64) -> (InMemoryArrayStorage, Vec<AcquisitionRecord>) {
        let mut storage = InMemoryArrayStorage::new();
        storage.insert(1, vec![100.0, 200.0, 300.0]);
        let records = (0..n_records)
            .map(|i| {
                storage.insert(100 + i, vec![i as f64, 2.0 * i as f64, 5.0]);
                AcquisitionRecord::new(i as f64, 1, 100 + i)
            })
            .collect();
        (storage, records)
    }

    #[test]
    fn test_source_id() {
        assert_eq!(source_id_for(Path::new("/data/run_042.d")), "run_042");
        assert_eq!(source_id_for(Path::new("plain")), "plain");
    }

    #[test]
    fn test_writes_both_cubes() {
        let dir = tempdir().unwrap();
        let (storage, records) = fixture(8);
        let config = ExtractionConfig::new(8, 1.0);

        let output = run_extraction(
            &SourceFileInfo::new("run"),
            &records,
            &storage,
            &config,
            &DatasetWriterConfig::default(),
            dir.path(),
        )
        .unwrap();

        assert_eq!(output.time_domain_path, dir.path().join("run_timedomain.parquet"));
        assert_eq!(output.time_domain_stats.shape, (8, 3));
        assert_eq!(output.fourier_domain_stats.shape, (5, 3));
        assert_eq!(output.report.reconstruction.rows_written, 8);
        assert_eq!(output.report.strategy, ResolvedStrategy::Batched);

        let time = read_cube(&output.time_domain_path).unwrap();
        assert_eq!(time.values[[7, 1]], 14.0);
        let spectra = read_cube(&output.fourier_domain_path).unwrap();
        // Constant channel has no power once its mean is removed
        assert!(spectra.values.column(2).iter().all(|v| v.abs() < 1e-18));
    }

    #[test]
    fn test_empty_mass_axis_is_fatal() {
        let dir = tempdir().unwrap();
        let (mut storage, records) = fixture(4);
        storage.insert(1, Vec::new());

        let result = run_extraction(
            &SourceFileInfo::new("run"),
            &records,
            &storage,
            &ExtractionConfig::new(4, 1.0),
            &DatasetWriterConfig::default(),
            dir.path(),
        );
        assert!(matches!(result, Err(ExtractError::EmptyMassAxis(1))));
    }

    #[test]
    fn test_missing_mass_axis_is_fatal() {
        let dir = tempdir().unwrap();
        let (mut storage, records) = fixture(4);
        storage.remove(1);

        let result = run_extraction(
            &SourceFileInfo::new("run"),
            &records,
            &storage,
            &ExtractionConfig::new(4, 1.0),
            &DatasetWriterConfig::default(),
            dir.path(),
        );
        assert!(matches!(
            result,
            Err(ExtractError::MassAxis { array_id: 1, .. })
        ));
    }

    #[test]
    fn test_no_records() {
        let dir = tempdir().unwrap();
        let storage = InMemoryArrayStorage::new();
        let result = run_extraction(
            &SourceFileInfo::new("run"),
            &[],
            &storage,
            &ExtractionConfig::default(),
            &DatasetWriterConfig::default(),
            dir.path(),
        );
        assert!(matches!(result, Err(ExtractError::NoRecords)));
    }

    #[test]
    fn test_invalid_config_rejected_before_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let (storage, records) = fixture(4);

        let result = run_extraction(
            &SourceFileInfo::new("run"),
            &records,
            &storage,
            &ExtractionConfig::new(0, 1.0),
            &DatasetWriterConfig::default(),
            &out,
        );
        assert!(matches!(result, Err(ExtractError::Config(_))));
        assert!(!out.exists());
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = ExtractionReport {
            reconstruction: ReconstructionReport {
                records_total: 3,
                rows_written: 3,
                final_swim_id: 4,
                ..Default::default()
            },
            strategy: ResolvedStrategy::ChannelAtATime,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["records_total"], 3);
        assert_eq!(json["strategy"], "channel_at_a_time");
    }
}
