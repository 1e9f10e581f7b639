use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, Float64Array, UInt32Array};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};

use crate::cube::{CubeKind, DatasetCube, MassAxis};
use crate::metadata::CubeMetadata;
use crate::schema::{
    columns, row_column, validate_schema, value_column, KEY_CUBE_KIND, KEY_DIMS,
    KEY_FORMAT_VERSION, KEY_SHAPE, KEY_VARIABLE,
};

use super::error::DatasetError;

/// Footer information of a cube dataset
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Format version string
    pub format_version: String,
    /// Which cube the file holds
    pub kind: CubeKind,
    /// Dimension names
    pub dims: Vec<String>,
    /// Cube shape `(rows, columns)`
    pub shape: (usize, usize),
    /// Stored variable name
    pub variable: String,
    /// Total number of Parquet rows (cube cells)
    pub total_rows: i64,
    /// Number of row groups
    pub num_row_groups: usize,
    /// Arrow schema of the file
    pub schema: Arc<Schema>,
    /// Raw key-value metadata from the Parquet footer
    pub key_value_metadata: HashMap<String, String>,
    /// Parsed provenance (if readable)
    pub cube_metadata: Option<CubeMetadata>,
}

/// Reader for cube datasets written by [`CubeWriter`](super::CubeWriter)
pub struct CubeReader {
    path: PathBuf,
    batch_size: usize,
    file_metadata: FileMetadata,
}

fn required<'a>(kv: &'a HashMap<String, String>, key: &str) -> Result<&'a String, DatasetError> {
    kv.get(key)
        .ok_or_else(|| DatasetError::InvalidFormat(format!("footer is missing {}", key)))
}

fn float64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array, DatasetError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DatasetError::ColumnNotFound(name.to_string()))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| DatasetError::InvalidFormat(format!("{} is not Float64", name)))
}

fn uint32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, DatasetError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DatasetError::ColumnNotFound(name.to_string()))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| DatasetError::InvalidFormat(format!("{} is not UInt32", name)))
}

impl CubeReader {
    /// Open a dataset and parse its footer
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let parquet_reader = SerializedFileReader::new(file)?;
        let file_metadata = Self::extract_file_metadata(&parquet_reader)?;

        Ok(Self {
            path,
            batch_size: 65_536,
            file_metadata,
        })
    }

    /// Set the number of cells read per record batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn extract_file_metadata(
        reader: &SerializedFileReader<File>,
    ) -> Result<FileMetadata, DatasetError> {
        let parquet_metadata = reader.metadata();
        let file_meta = parquet_metadata.file_metadata();
        let schema = parquet::arrow::parquet_to_arrow_schema(
            file_meta.schema_descr(),
            file_meta.key_value_metadata(),
        )?;

        let mut kv_metadata = HashMap::new();
        if let Some(kv_list) = file_meta.key_value_metadata() {
            for kv in kv_list {
                if let Some(value) = &kv.value {
                    kv_metadata.insert(kv.key.clone(), value.clone());
                }
            }
        }

        let format_version = kv_metadata
            .get(KEY_FORMAT_VERSION)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        let kind_name = required(&kv_metadata, KEY_CUBE_KIND)?;
        let kind = CubeKind::parse(kind_name)
            .ok_or_else(|| DatasetError::InvalidFormat(format!("unknown cube kind {}", kind_name)))?;
        validate_schema(&schema, kind)?;

        let dims: Vec<String> = serde_json::from_str(required(&kv_metadata, KEY_DIMS)?)?;
        let shape = match serde_json::from_str::<Vec<usize>>(required(&kv_metadata, KEY_SHAPE)?)?[..] {
            [rows, cols] => (rows, cols),
            _ => {
                return Err(DatasetError::InvalidFormat(
                    "shape must have two dimensions".to_string(),
                ))
            }
        };
        let variable = kv_metadata
            .get(KEY_VARIABLE)
            .cloned()
            .unwrap_or_else(|| kind.variable().to_string());

        let cube_metadata = CubeMetadata::from_parquet_metadata(&kv_metadata).ok();

        let total_rows: i64 = (0..parquet_metadata.num_row_groups())
            .map(|i| parquet_metadata.row_group(i).num_rows())
            .sum();

        Ok(FileMetadata {
            format_version,
            kind,
            dims,
            shape,
            variable,
            total_rows,
            num_row_groups: parquet_metadata.num_row_groups(),
            schema: Arc::new(schema),
            key_value_metadata: kv_metadata,
            cube_metadata,
        })
    }

    /// Get file metadata
    pub fn metadata(&self) -> &FileMetadata {
        &self.file_metadata
    }

    /// Rebuild the dense cube from the long table
    pub fn read_cube(&self) -> Result<DatasetCube, DatasetError> {
        let meta = &self.file_metadata;
        let kind = meta.kind;
        let (n_rows, n_cols) = meta.shape;
        let n_cells = n_rows.checked_mul(n_cols).ok_or_else(|| {
            DatasetError::InvalidFormat(format!(
                "footer shape {}x{} overflows the addressable cell count",
                n_rows, n_cols
            ))
        })?;

        if usize::try_from(meta.total_rows).ok() != Some(n_cells) {
            return Err(DatasetError::InvalidFormat(format!(
                "footer declares {}x{} cells but the file holds {} rows",
                n_rows, n_cols, meta.total_rows
            )));
        }
        if n_cols == 0 {
            return Err(DatasetError::InvalidFormat(
                "cube has no mass channels".to_string(),
            ));
        }

        let (row_name, _) = row_column(kind);
        let mut row_coords = Vec::with_capacity(n_rows);
        let mut masses = Vec::with_capacity(n_cols);
        let mut values = Vec::with_capacity(n_cells);

        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(self.batch_size)
            .build()?;

        for batch in reader {
            let batch = batch?;
            let mass = float64_column(&batch, columns::MASS_CHARGE)?;
            let cells = float64_column(&batch, value_column(kind))?;
            let coords: Vec<f64> = match kind {
                CubeKind::TimeDomain => uint32_column(&batch, row_name)?
                    .values()
                    .iter()
                    .map(|&id| id as f64)
                    .collect(),
                CubeKind::FrequencyDomain => float64_column(&batch, row_name)?.values().to_vec(),
            };

            let first = values.len();
            for i in 0..batch.num_rows() {
                let cell = first + i;
                if cell < n_cols {
                    masses.push(mass.value(i));
                }
                if cell % n_cols == 0 {
                    row_coords.push(coords[i]);
                }
            }
            values.extend_from_slice(cells.values());
        }

        let values = Array2::from_shape_vec((n_rows, n_cols), values)
            .map_err(|e| DatasetError::InvalidFormat(e.to_string()))?;

        Ok(DatasetCube {
            kind,
            row_coords,
            mass_axis: MassAxis::new(masses),
            values,
        })
    }
}

/// Read a whole cube dataset
pub fn read_cube<P: AsRef<Path>>(path: P) -> Result<DatasetCube, DatasetError> {
    CubeReader::open(path)?.read_cube()
}
