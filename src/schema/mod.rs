//! # Cube Dataset Schema
//!
//! Arrow schema for the long-table layout that both cubes are stored in.
//!
//! ## Schema Columns
//!
//! | Column | Type | Cube | Description | CV Term |
//! |--------|------|------|-------------|---------|
//! | swim_id | UInt32 | time domain | 1-based pulse index | |
//! | frequency | Float64 | frequency domain | Frequency bin | |
//! | mass_charge | Float64 | both | Mass-to-charge ratio | MS:1000040 |
//! | intensity | Float64 | time domain | Signal intensity | MS:1000042 |
//! | amplitude | Float64 | frequency domain | Spectral power | |
//!
//! ## Compression Strategy
//!
//! Rows are written in row-major cube order, so the first column holds
//! `n_mz` identical values in a row and the mass column repeats with period
//! `n_mz`. Dictionary + RLE handles both; the value column uses
//! BYTE_STREAM_SPLIT.

mod builders;
/// Cube column name constants.
pub mod columns;
mod constants;
mod validation;


pub use builders::{create_cube_schema, create_cube_schema_arc, row_column, value_column};
pub use columns::*;
pub use constants::*;
pub use validation::{validate_schema, SchemaValidationError};
