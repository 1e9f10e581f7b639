use std::fmt;

use crate::cube::CubeKind;

/// Statistics from a completed cube write
#[derive(Debug, Clone)]
pub struct DatasetStats {
    /// Which cube was written
    pub kind: CubeKind,
    /// Cube shape `(rows, columns)`
    pub shape: (usize, usize),
    /// Number of cells (Parquet rows) written
    pub cells_written: usize,
    /// Number of Parquet row groups written
    pub row_groups_written: usize,
    /// Uncompressed size of the column data in all row groups, in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} cube {}x{} ({} cells) in {} row groups, {} bytes",
            self.kind,
            self.shape.0,
            self.shape.1,
            self.cells_written,
            self.row_groups_written,
            self.file_size_bytes
        )
    }
}
