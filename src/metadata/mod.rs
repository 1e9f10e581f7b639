//! # Cube Provenance Metadata
//!
//! Everything needed to trace a cube back to the acquisition it came from is
//! stored as JSON values in the Parquet footer:
//!
//! 1. **Source file**: the `.d` directory and its binary storage file
//! 2. **Extraction parameters**: the validated [`ExtractionConfig`](crate::config::ExtractionConfig)
//! 3. **Processing history**: reconstruction and transform steps with their
//!    parameters and timestamps

mod cube;
mod error;
mod processing;
mod source;

#[cfg(test)]
mod tests;

pub use cube::CubeMetadata;
pub use error::MetadataError;
pub use processing::{ProcessingHistory, ProcessingStep};
pub use source::SourceFileInfo;
