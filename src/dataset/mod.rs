//! # Cube Dataset Module
//!
//! Each cube is persisted as a single Parquet file holding a long table,
//! one row per cube cell:
//!
//! ```text
//! {output_dir}/
//! ├── {source_id}_timedomain.parquet     # swim_id, mass_charge, intensity
//! └── {source_id}_fourierdomain.parquet  # frequency, mass_charge, amplitude
//! ```
//!
//! The footer records the cube kind, dimension names, shape and variable,
//! plus [`CubeMetadata`](crate::metadata::CubeMetadata) provenance. Readers
//! rebuild the dense cube from row-major cell order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use swimcube::dataset::{read_cube, DatasetWriterConfig, Profile};
//! use swimcube::metadata::CubeMetadata;
//! # fn demo(cube: &swimcube::cube::TimeDomainCube) -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatasetWriterConfig::from_profile(Profile::Fast);
//! let stats = swimcube::dataset::write_cube("run_timedomain.parquet", cube, &CubeMetadata::new(), &config)?;
//! println!("{}", stats);
//!
//! let restored = read_cube("run_timedomain.parquet")?;
//! assert_eq!(restored.values.dim(), stats.shape);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod reader;
mod stats;
mod writer;


use std::path::{Path, PathBuf};

pub use config::{CompressionType, DatasetWriterConfig, Profile};
pub use error::DatasetError;
pub use reader::{read_cube, CubeReader, FileMetadata};
pub use stats::DatasetStats;
pub use writer::{write_cube, write_cube_to, CubeWriter};

use crate::cube::CubeKind;
use crate::schema::DATASET_EXTENSION;

/// Path of the dataset holding the `kind` cube of `source_id`
pub fn output_path(output_dir: &Path, source_id: &str, kind: CubeKind) -> PathBuf {
    output_dir.join(format!(
        "{}{}.{}",
        source_id,
        kind.file_suffix(),
        DATASET_EXTENSION
    ))
}
