use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use log::debug;
use parquet::arrow::ArrowWriter;

use crate::cube::{CubeKind, LabeledCube};
use crate::metadata::CubeMetadata;
use crate::schema::{create_cube_schema_arc, KEY_CUBE_KIND, KEY_DIMS, KEY_SHAPE, KEY_VARIABLE};

use super::config::DatasetWriterConfig;
use super::error::DatasetError;
use super::stats::DatasetStats;

/// Streaming writer for one cube dataset.
///
/// The cube kind and shape are fixed at creation because they are part of
/// the footer; [`CubeWriter::write_cube`] rejects cubes that disagree.
pub struct CubeWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    schema: Arc<Schema>,
    kind: CubeKind,
    shape: (usize, usize),
    batch_size: usize,
    cells_written: usize,
}

impl CubeWriter<File> {
    /// Create a new writer to a file path
    pub fn new_file<P: AsRef<Path>>(
        path: P,
        kind: CubeKind,
        shape: (usize, usize),
        metadata: &CubeMetadata,
        config: &DatasetWriterConfig,
    ) -> Result<Self, DatasetError> {
        let file = File::create(path)?;
        Self::new(file, kind, shape, metadata, config)
    }
}

impl<W: Write + Send> CubeWriter<W> {
    /// Create a new writer to any Write implementation
    pub fn new(
        writer: W,
        kind: CubeKind,
        shape: (usize, usize),
        metadata: &CubeMetadata,
        config: &DatasetWriterConfig,
    ) -> Result<Self, DatasetError> {
        let schema = create_cube_schema_arc(kind);

        let mut footer = metadata.to_parquet_metadata()?;
        footer.insert(KEY_CUBE_KIND.to_string(), kind.as_str().to_string());
        footer.insert(
            KEY_DIMS.to_string(),
            serde_json::to_string(&[kind.row_dim(), kind.col_dim()])?,
        );
        footer.insert(KEY_SHAPE.to_string(), serde_json::to_string(&[shape.0, shape.1])?);
        footer.insert(KEY_VARIABLE.to_string(), kind.variable().to_string());

        let props = config.to_writer_properties(kind, &footer);
        let arrow_writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;

        Ok(Self {
            writer: arrow_writer,
            schema,
            kind,
            shape,
            batch_size: config.batch_size.max(1),
            cells_written: 0,
        })
    }

    /// Write every cell of `cube` in row-major order
    pub fn write_cube<C: LabeledCube + ?Sized>(&mut self, cube: &C) -> Result<(), DatasetError> {
        if cube.kind() != self.kind {
            return Err(DatasetError::KindMismatch {
                expected: self.kind,
                actual: cube.kind(),
            });
        }
        if cube.shape() != self.shape {
            return Err(DatasetError::ShapeMismatch {
                expected: self.shape,
                actual: cube.shape(),
            });
        }

        let values = cube.values();
        let flat: Cow<'_, [f64]> = match values.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(values.iter().copied().collect()),
        };
        let mass_axis = cube.mass_axis().as_slice();
        let n_cols = self.shape.1;
        let total = flat.len();

        for start in (0..total).step_by(self.batch_size) {
            let end = (start + self.batch_size).min(total);

            let row_coordinates: ArrayRef = match self.kind {
                CubeKind::TimeDomain => Arc::new(UInt32Array::from_iter_values(
                    (start..end).map(|i| cube.row_coordinate(i / n_cols) as u32),
                )),
                CubeKind::FrequencyDomain => Arc::new(Float64Array::from_iter_values(
                    (start..end).map(|i| cube.row_coordinate(i / n_cols)),
                )),
            };
            let masses = Float64Array::from_iter_values((start..end).map(|i| mass_axis[i % n_cols]));
            let cells = Float64Array::from(flat[start..end].to_vec());

            let arrays: Vec<ArrayRef> = vec![row_coordinates, Arc::new(masses), Arc::new(cells)];
            let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
            self.writer.write(&batch)?;
            self.cells_written += end - start;
        }

        debug!("Buffered {} cells of the {} cube", self.cells_written, self.kind);
        Ok(())
    }

    /// Flush any buffered data and finalize the file
    pub fn finish(self) -> Result<DatasetStats, DatasetError> {
        let file_metadata = self.writer.close()?;

        Ok(DatasetStats {
            kind: self.kind,
            shape: self.shape,
            cells_written: self.cells_written,
            row_groups_written: file_metadata.row_groups.len(),
            file_size_bytes: file_metadata
                .row_groups
                .iter()
                .map(|rg| rg.total_byte_size as u64)
                .sum(),
        })
    }
}

/// Write `cube` to any writer as a complete dataset
pub fn write_cube_to<W, C>(
    writer: W,
    cube: &C,
    metadata: &CubeMetadata,
    config: &DatasetWriterConfig,
) -> Result<DatasetStats, DatasetError>
where
    W: Write + Send,
    C: LabeledCube + ?Sized,
{
    let mut cube_writer = CubeWriter::new(writer, cube.kind(), cube.shape(), metadata, config)?;
    cube_writer.write_cube(cube)?;
    cube_writer.finish()
}

/// Write `cube` to a new file at `path`
pub fn write_cube<P, C>(
    path: P,
    cube: &C,
    metadata: &CubeMetadata,
    config: &DatasetWriterConfig,
) -> Result<DatasetStats, DatasetError>
where
    P: AsRef<Path>,
    C: LabeledCube + ?Sized,
{
    write_cube_to(File::create(path)?, cube, metadata, config)
}
