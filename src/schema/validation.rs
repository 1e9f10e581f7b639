use arrow::datatypes::{DataType, Schema};

use super::builders::{row_column, value_column};
use super::columns;
use crate::cube::CubeKind;

/// Validates that a schema holds a cube of the given kind.
///
/// Returns `Ok(())` if the schema contains all required columns with correct types,
/// or an error describing the incompatibility.
pub fn validate_schema(schema: &Schema, kind: CubeKind) -> Result<(), SchemaValidationError> {
    let required_columns = [
        row_column(kind),
        (columns::MASS_CHARGE, DataType::Float64),
        (value_column(kind), DataType::Float64),
    ];

    for (name, expected_type) in required_columns {
        match schema.field_with_name(name) {
            Ok(field) => {
                if field.data_type() != &expected_type {
                    return Err(SchemaValidationError::TypeMismatch {
                        column: name.to_string(),
                        expected: format!("{:?}", expected_type),
                        found: format!("{:?}", field.data_type()),
                    });
                }
            }
            Err(_) => {
                return Err(SchemaValidationError::MissingColumn(name.to_string()));
            }
        }
    }

    Ok(())
}

/// Errors that can occur during schema validation
#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    /// A required column is missing from the schema
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A column has an incorrect data type
    #[error("Type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the column with the type mismatch
        column: String,
        /// Expected data type
        expected: String,
        /// Actual data type found
        found: String,
    },
}
