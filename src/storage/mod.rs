//! Array storage adapters.
//!
//! Raw spectra in a BAF acquisition are not stored in the SQLite metadata
//! cache; the cache only carries numeric array identifiers. The arrays
//! themselves live in the vendor binary store and are fetched by id through
//! the [`ArrayStorage`] capability.
//!
//! Two implementations ship with the crate:
//!
//! - [`BinaryStorage`] (feature `baf2sql`): a scoped handle into the vendor
//!   `baf2sql_c` library, closed automatically when dropped.
//! - [`InMemoryArrayStorage`]: a map-backed store used for synthetic runs,
//!   tests and benchmarks.

#[cfg(feature = "baf2sql")]
pub mod baf2sql;
pub mod error;
pub mod memory;

#[cfg(feature = "baf2sql")]
pub use baf2sql::{Baf2SqlLibrary, BinaryStorage, DEFAULT_LIBRARY_NAME};
pub use error::StorageError;
pub use memory::InMemoryArrayStorage;

use serde::{Deserialize, Serialize};

/// Calibration applied by the vendor library when arrays are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// Use the raw (acquisition-time) calibration
    Raw,
    /// Use the most recent recalibration stored with the acquisition
    #[default]
    Recalibrated,
}

impl CalibrationMode {
    /// Flag value expected by `baf2sql_array_open_storage`
    pub fn as_flag(self) -> i32 {
        match self {
            CalibrationMode::Raw => 1,
            CalibrationMode::Recalibrated => 0,
        }
    }
}

/// Read access to numeric arrays addressed by id.
pub trait ArrayStorage {
    /// Number of elements in the array with the given id
    fn element_count(&self, array_id: u64) -> Result<u64, StorageError>;

    /// Read the array with the given id as double-precision values
    fn read_doubles(&self, array_id: u64) -> Result<Vec<f64>, StorageError>;
}

impl<S: ArrayStorage + ?Sized> ArrayStorage for &S {
    fn element_count(&self, array_id: u64) -> Result<u64, StorageError> {
        (**self).element_count(array_id)
    }

    fn read_doubles(&self, array_id: u64) -> Result<Vec<f64>, StorageError> {
        (**self).read_doubles(array_id)
    }
}
