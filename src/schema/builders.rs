use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder};

use super::columns;
use super::constants::{KEY_CUBE_KIND, KEY_FORMAT_VERSION, SWIMCUBE_FORMAT_VERSION};
use crate::cube::CubeKind;

/// Creates a Field with CV term metadata annotation
fn field_with_cv(name: &str, data_type: DataType, nullable: bool, cv_accession: &str) -> Field {
    let mut metadata = HashMap::new();
    metadata.insert("cv_accession".to_string(), cv_accession.to_string());
    Field::new(name, data_type, nullable).with_metadata(metadata)
}

/// Name and type of the row-coordinate column for `kind`
pub fn row_column(kind: CubeKind) -> (&'static str, DataType) {
    match kind {
        CubeKind::TimeDomain => (columns::SWIM_ID, DataType::UInt32),
        CubeKind::FrequencyDomain => (columns::FREQUENCY, DataType::Float64),
    }
}

/// Name of the value column for `kind`
pub fn value_column(kind: CubeKind) -> &'static str {
    match kind {
        CubeKind::TimeDomain => columns::INTENSITY,
        CubeKind::FrequencyDomain => columns::AMPLITUDE,
    }
}

/// Creates the long-table Arrow schema for one cube.
///
/// Every cube cell is a row `(row coordinate, mass_charge, value)`. Rows are
/// written in row-major cube order, so the row coordinate repeats for
/// `n_mz` consecutive rows and compresses to almost nothing under RLE.
///
/// # Example
///
/// ```
/// use swimcube::cube::CubeKind;
/// use swimcube::schema::create_cube_schema;
///
/// let schema = create_cube_schema(CubeKind::TimeDomain);
/// assert_eq!(schema.fields().len(), 3);
/// assert!(schema.field_with_name("swim_id").is_ok());
/// ```
pub fn create_cube_schema(kind: CubeKind) -> Schema {
    let mut builder = SchemaBuilder::new();

    let (row_name, row_type) = row_column(kind);
    builder.push(Field::new(row_name, row_type, false));

    builder.push(field_with_cv(
        columns::MASS_CHARGE,
        DataType::Float64,
        false,
        "MS:1000040", // m/z
    ));

    match kind {
        CubeKind::TimeDomain => builder.push(field_with_cv(
            columns::INTENSITY,
            DataType::Float64,
            false,
            "MS:1000042", // peak intensity
        )),
        CubeKind::FrequencyDomain => {
            builder.push(Field::new(columns::AMPLITUDE, DataType::Float64, false))
        }
    }

    let mut schema = builder.finish();

    let mut metadata = HashMap::new();
    metadata.insert(KEY_FORMAT_VERSION.to_string(), SWIMCUBE_FORMAT_VERSION.to_string());
    metadata.insert(KEY_CUBE_KIND.to_string(), kind.as_str().to_string());
    schema = schema.with_metadata(metadata);

    schema
}

/// Creates the cube schema wrapped in an Arc
pub fn create_cube_schema_arc(kind: CubeKind) -> Arc<Schema> {
    Arc::new(create_cube_schema(kind))
}
