use crate::cube::CubeKind;

/// Errors that can occur during dataset operations
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the Arrow library during array operations
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Error from the Parquet library
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Error processing metadata
    #[error("Metadata error: {0}")]
    MetadataError(#[from] crate::metadata::MetadataError),

    /// Error serializing/deserializing JSON
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// File schema does not describe the expected cube
    #[error("Schema error: {0}")]
    SchemaError(#[from] crate::schema::SchemaValidationError),

    /// File is not a cube dataset or is internally inconsistent
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Cube handed to a writer does not match the declared shape
    #[error("Shape mismatch: writer expects {expected:?}, cube is {actual:?}")]
    ShapeMismatch {
        /// Declared `(rows, columns)`
        expected: (usize, usize),
        /// Actual `(rows, columns)`
        actual: (usize, usize),
    },

    /// Cube handed to a writer is of the other kind
    #[error("Cube kind mismatch: writer expects {expected}, got {actual}")]
    KindMismatch {
        /// Declared kind
        expected: CubeKind,
        /// Actual kind
        actual: CubeKind,
    },
}
