//! # swimcube - SWIM Acquisitions to Spectral Cubes
//!
//! `swimcube` converts time-resolved ion-mobility (SWIM) acquisitions stored
//! in Bruker `.d` directories into two analysis-ready cubes:
//!
//! - a **time-domain** intensity cube, one row per SWIM pulse, with missing
//!   pulses detected from retention-time gaps and left as zero rows
//! - a **frequency-domain** cube holding the power spectrum of every mass
//!   channel across the pulse axis
//!
//! ## Key Features
//!
//! - **Vendor storage behind a trait**: the `baf2sql` library is loaded at
//!   runtime and hidden behind [`storage::ArrayStorage`], so the pipeline
//!   runs equally well on in-memory fixtures.
//!
//! - **Bounded-memory transforms**: [`spectral::FftStrategy::Auto`] switches
//!   from one bulk FFT to channel-at-a-time transforms when the batched
//!   buffer would exceed the memory budget.
//!
//! - **Self-describing output**: cubes are stored as long-table Parquet with
//!   dimension names, shape and provenance in the footer, readable from any
//!   Parquet tool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use swimcube::prelude::*;
//!
//! let extractor = SwimExtractor::open("run_042.d", DEFAULT_LIBRARY_NAME)?;
//! let output = extractor.extract_and_save(
//!     "out",
//!     &ExtractionConfig::new(2048, 1.0),
//!     &DatasetWriterConfig::default(),
//! )?;
//!
//! println!("{}", output.time_domain_path.display());
//! println!("{} records skipped", output.report.reconstruction.skipped.len());
//! # Ok::<(), swimcube::extract::ExtractError>(())
//! ```
//!
//! ## Reading the Cubes
//!
//! ```python
//! # Python
//! import pyarrow.parquet as pq
//! df = pq.read_table("out/run_042_fourierdomain.parquet").to_pandas()
//! cube = df.pivot(index="frequency", columns="mass_charge", values="amplitude")
//! ```
//!
//! ```sql
//! -- DuckDB
//! SELECT frequency, sum(amplitude) FROM read_parquet('out/run_042_fourierdomain.parquet')
//! GROUP BY frequency ORDER BY frequency;
//! ```
//!
//! ## Architecture
//!
//! - [`storage`]: array storage trait, `baf2sql` binding, in-memory store
//! - [`acquisition`]: acquisition records from the SQLite metadata cache
//! - [`reconstruct`]: pulse indexing and time-domain cube assembly
//! - [`spectral`]: per-channel power spectra
//! - [`cube`]: cube types shared by every stage
//! - [`dataset`]: Parquet cube writer and reader
//! - [`schema`]: Arrow schema and footer keys
//! - [`metadata`]: provenance stored in the footer
//! - [`config`]: extraction parameters and TOML config files
//! - [`extract`]: the end-to-end pipeline

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod acquisition;
pub mod config;
pub mod cube;
pub mod dataset;
pub mod extract;
pub mod metadata;
pub mod reconstruct;
pub mod schema;
pub mod spectral;
pub mod storage;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::acquisition::{AcquisitionError, AcquisitionReader, AcquisitionRecord};
    pub use crate::config::{ConfigError, ConfigFile, ExtractionConfig};
    pub use crate::cube::{
        CubeKind, DatasetCube, FrequencyDomainCube, LabeledCube, MassAxis, TimeDomainCube,
    };
    pub use crate::dataset::{
        read_cube, write_cube, CubeReader, DatasetError, DatasetStats, DatasetWriterConfig,
        Profile,
    };
    #[cfg(feature = "baf2sql")]
    pub use crate::extract::SwimExtractor;
    pub use crate::extract::{
        run_extraction, ExtractError, ExtractionOutput, ExtractionReport,
    };
    pub use crate::metadata::{CubeMetadata, SourceFileInfo};
    pub use crate::reconstruct::{
        assign_swim_ids, ReconstructError, ReconstructionReport, SwimIndexer,
        TimeDomainReconstructor,
    };
    pub use crate::spectral::{FftStrategy, ResolvedStrategy, SpectralTransformer};
    #[cfg(feature = "baf2sql")]
    pub use crate::storage::{Baf2SqlLibrary, BinaryStorage, DEFAULT_LIBRARY_NAME};
    pub use crate::storage::{ArrayStorage, CalibrationMode, InMemoryArrayStorage, StorageError};
}
