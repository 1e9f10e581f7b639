//! Acquisition metadata from the BAF SQLite cache.
//!
//! Every SWIM pulse is recorded as one row of the `Spectra` table. The row
//! carries the retention time and the ids of its profile m/z and intensity
//! arrays in the binary storage.

use std::path::Path;

use log::debug;
use rusqlite::{Connection, OpenFlags, Row};
use serde::{Deserialize, Serialize};

/// Table holding one row per acquired spectrum
const SPECTRA_TABLE: &str = "Spectra";

/// Projection used to build [`AcquisitionRecord`]s, in acquisition order
const RECORDS_QUERY: &str =
    "SELECT Rt, ProfileMzId, ProfileIntensityId FROM Spectra ORDER BY Id";

/// Errors raised while reading acquisition metadata
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    /// SQLite error opening or querying the cache
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A row could not be mapped to an acquisition record
    #[error("Invalid acquisition row {row}: {message}")]
    InvalidRow {
        /// Zero-based row position in acquisition order
        row: usize,
        /// What was wrong with the row
        message: String,
    },
}

/// One raw pulse event as recorded by the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRecord {
    /// Retention time in seconds
    pub retention_time: f64,
    /// Id of the profile m/z array in the binary storage
    pub mass_axis_array_id: u64,
    /// Id of the profile intensity array in the binary storage
    pub intensity_array_id: u64,
}

impl AcquisitionRecord {
    /// Create a new record
    pub fn new(retention_time: f64, mass_axis_array_id: u64, intensity_array_id: u64) -> Self {
        Self {
            retention_time,
            mass_axis_array_id,
            intensity_array_id,
        }
    }
}

fn array_id(row: &Row<'_>, column: usize, name: &str, position: usize) -> Result<u64, AcquisitionError> {
    let value: Option<i64> = row.get(column)?;
    let value = value.ok_or_else(|| AcquisitionError::InvalidRow {
        row: position,
        message: format!("{} is NULL", name),
    })?;
    u64::try_from(value).map_err(|_| AcquisitionError::InvalidRow {
        row: position,
        message: format!("{} is negative ({})", name, value),
    })
}

/// Reader over the acquisition metadata store.
pub struct AcquisitionReader {
    conn: Connection,
}

impl AcquisitionReader {
    /// Open the SQLite cache at `path` read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AcquisitionError> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("Opened acquisition metadata {}", path.as_ref().display());
        Ok(Self { conn })
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Read every acquisition record in acquisition order
    pub fn read_records(&self) -> Result<Vec<AcquisitionRecord>, AcquisitionError> {
        let mut stmt = self.conn.prepare(RECORDS_QUERY)?;
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let position = records.len();
            let retention_time: f64 = row.get(0)?;
            records.push(AcquisitionRecord {
                retention_time,
                mass_axis_array_id: array_id(row, 1, "ProfileMzId", position)?,
                intensity_array_id: array_id(row, 2, "ProfileIntensityId", position)?,
            });
        }

        debug!("Read {} acquisition records from {}", records.len(), SPECTRA_TABLE);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> AcquisitionReader {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Spectra (
                Id INTEGER PRIMARY KEY,
                Rt REAL NOT NULL,
                ProfileMzId INTEGER,
                ProfileIntensityId INTEGER
            );
            INSERT INTO Spectra VALUES (2, 0.5, 1, 11);
            INSERT INTO Spectra VALUES (1, 0.0, 1, 10);
            INSERT INTO Spectra VALUES (3, 1.5, 1, 12);",
        )
        .unwrap();
        AcquisitionReader::from_connection(conn)
    }

    #[test]
    fn test_records_in_acquisition_order() {
        let reader = fixture();
        let records = reader.read_records().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], AcquisitionRecord::new(0.0, 1, 10));
        assert_eq!(records[1], AcquisitionRecord::new(0.5, 1, 11));
        assert_eq!(records[2], AcquisitionRecord::new(1.5, 1, 12));
    }

    #[test]
    fn test_null_intensity_id_is_invalid() {
        let reader = fixture();
        reader
            .conn
            .execute("INSERT INTO Spectra VALUES (4, 2.0, 1, NULL)", [])
            .unwrap();

        let err = reader.read_records().unwrap_err();
        assert!(matches!(err, AcquisitionError::InvalidRow { row: 3, .. }));
    }

    #[test]
    fn test_empty_acquisition() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Spectra (Id INTEGER PRIMARY KEY, Rt REAL, ProfileMzId INTEGER, ProfileIntensityId INTEGER);",
        )
        .unwrap();
        let reader = AcquisitionReader::from_connection(conn);

        assert!(reader.read_records().unwrap().is_empty());
    }

    #[test]
    fn test_missing_table() {
        let reader = AcquisitionReader::from_connection(Connection::open_in_memory().unwrap());
        assert!(matches!(reader.read_records(), Err(AcquisitionError::Sqlite(_))));
    }
}
