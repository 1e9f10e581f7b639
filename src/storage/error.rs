//! Errors raised by array storage adapters.

use std::path::PathBuf;

/// Errors raised by array storage adapters
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The vendor library could not be loaded
    #[error("Failed to load array storage library {}: {message}", .path.display())]
    LibraryLoad {
        /// Path that was passed to the loader
        path: PathBuf,
        /// Loader error text
        message: String,
    },

    /// A required entry point is missing from the vendor library
    #[error("Array storage library is missing symbol {0}")]
    MissingSymbol(String),

    /// A path could not be passed across the library boundary
    #[error("Path is not valid UTF-8 or contains a NUL byte: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Opening the storage behind a BAF file failed
    #[error("Failed to open array storage for {}: {message}", .path.display())]
    Open {
        /// BAF file that was being opened
        path: PathBuf,
        /// Last error reported by the library
        message: String,
    },

    /// The library reported an error while reading an array
    #[error("Failed to read array {array_id}: {message}")]
    Read {
        /// Array that was being read
        array_id: u64,
        /// Last error reported by the library
        message: String,
    },

    /// The SQLite cache for a BAF file could not be resolved
    #[error("Failed to resolve SQLite cache for {}: {message}", .path.display())]
    SqliteCache {
        /// BAF file the cache belongs to
        path: PathBuf,
        /// Last error reported by the library
        message: String,
    },

    /// No array with the requested id exists
    #[error("Array {0} not found")]
    ArrayNotFound(u64),

    /// Array is too large to be addressed on this platform
    #[error("Array {array_id} has {count} elements, which exceeds addressable memory")]
    TooLarge {
        /// Array that was being read
        array_id: u64,
        /// Element count reported by the store
        count: u64,
    },
}
