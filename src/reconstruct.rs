//! Time-domain reconstruction.
//!
//! The instrument records one spectrum per SWIM pulse, but the record stream
//! is irregular: pulses can be dropped, and individual intensity arrays can
//! be unreadable. Reconstruction maps the stream onto a fixed pulse index
//! (`swim_id`, 1-based) and assembles the `(unique_swim_ids, n_mz)` cube.
//!
//! # Index assignment
//!
//! A running counter starts at 1 and advances by one per record. When the
//! rounded retention-time delta to the previous record exceeds the gap
//! threshold, the counter advances once more *before* the record is placed,
//! leaving an empty row for the missing pulse.
//!
//! ```
//! use swimcube::reconstruct::assign_swim_ids;
//!
//! let ids = assign_swim_ids(&[0.0, 1.0, 1.0, 3.0, 4.0], 1.0);
//! assert_eq!(ids, vec![1, 2, 3, 5, 6]);
//! ```
//!
//! # Failure handling
//!
//! A record whose intensity array cannot be read (or has the wrong length)
//! produces [`RecordOutcome::Skipped`]: its row keeps the zero fill and the
//! run continues. A swim id beyond the declared `unique_swim_ids` is a hard
//! error, since the declared pulse count no longer describes the data.

use log::{debug, info, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::acquisition::AcquisitionRecord;
use crate::cube::{MassAxis, TimeDomainCube};
use crate::storage::{ArrayStorage, StorageError};

/// Fatal reconstruction errors
#[derive(Debug, thiserror::Error)]
pub enum ReconstructError {
    /// A record mapped to a pulse index outside the declared range
    #[error(
        "Record {record_index} maps to swim id {swim_id}, beyond the declared {unique_swim_ids} pulses"
    )]
    SwimIndexOutOfRange {
        /// Zero-based record position
        record_index: usize,
        /// Swim id the record would have been written to
        swim_id: usize,
        /// Declared pulse count
        unique_swim_ids: usize,
    },

    /// The assembled buffer does not match the mass axis
    #[error("Time-domain buffer has {actual} channels, mass axis has {expected}")]
    ShapeMismatch {
        /// Mass axis length
        expected: usize,
        /// Buffer width
        actual: usize,
    },
}

/// Why a single record could not be written
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The storage failed to deliver the intensity array
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The intensity array does not match the mass axis
    #[error("Intensity array has {actual} values, mass axis has {expected}")]
    LengthMismatch {
        /// Mass axis length
        expected: usize,
        /// Intensity array length
        actual: usize,
    },
}

/// Result of processing one record.
#[derive(Debug)]
pub enum RecordOutcome {
    /// The record's intensities were written to row `swim_id`
    Written {
        /// 1-based pulse index
        swim_id: usize,
    },
    /// The record was skipped; row `swim_id` was left untouched
    Skipped {
        /// 1-based pulse index
        swim_id: usize,
        /// What went wrong
        reason: RecordError,
    },
}

/// Pulse index chosen for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwimAssignment {
    /// 1-based pulse index
    pub swim_id: usize,
    /// Whether a missing pulse was inferred just before this record
    pub gap_before: bool,
}

/// Assigns pulse indices to records in acquisition order.
#[derive(Debug, Clone)]
pub struct SwimIndexer {
    next_swim_id: usize,
    previous_rt: Option<f64>,
    gap_threshold: f64,
    gaps_detected: usize,
}

impl SwimIndexer {
    /// Create an indexer starting at swim id 1
    pub fn new(gap_threshold: f64) -> Self {
        Self {
            next_swim_id: 1,
            previous_rt: None,
            gap_threshold,
            gaps_detected: 0,
        }
    }

    /// Assign the next record, then advance the counter
    pub fn assign(&mut self, retention_time: f64) -> SwimAssignment {
        // Half-way deltas round to even
        let gap_before = match self.previous_rt {
            Some(previous) => (retention_time - previous).round_ties_even() > self.gap_threshold,
            None => false,
        };
        if gap_before {
            self.next_swim_id += 1;
            self.gaps_detected += 1;
        }
        self.previous_rt = Some(retention_time);

        let swim_id = self.next_swim_id;
        self.next_swim_id += 1;

        SwimAssignment {
            swim_id,
            gap_before,
        }
    }

    /// Swim id the next record would receive without a gap
    pub fn next_swim_id(&self) -> usize {
        self.next_swim_id
    }

    /// Number of missing pulses inferred so far
    pub fn gaps_detected(&self) -> usize {
        self.gaps_detected
    }
}

/// Swim ids for a sequence of retention times
pub fn assign_swim_ids(retention_times: &[f64], gap_threshold: f64) -> Vec<usize> {
    let mut indexer = SwimIndexer::new(gap_threshold);
    retention_times
        .iter()
        .map(|&rt| indexer.assign(rt).swim_id)
        .collect()
}

/// A record that was skipped during reconstruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Zero-based record position
    pub record_index: usize,
    /// Pulse index the record would have filled
    pub swim_id: usize,
    /// Intensity array that failed
    pub intensity_array_id: u64,
    /// Error text
    pub reason: String,
}

/// Diagnostics gathered while assembling the cube
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionReport {
    /// Records processed
    pub records_total: usize,
    /// Rows written (repeated writes to one row count each time)
    pub rows_written: usize,
    /// Records whose rows were left at the default fill
    pub skipped: Vec<SkippedRecord>,
    /// Missing pulses inferred from retention-time gaps
    pub gaps_detected: usize,
    /// Counter value after the last record
    pub final_swim_id: usize,
}

/// An assembled cube together with its diagnostics
#[derive(Debug)]
pub struct Reconstruction {
    /// The time-domain cube
    pub cube: TimeDomainCube,
    /// Per-run diagnostics
    pub report: ReconstructionReport,
}

/// Builds a [`TimeDomainCube`] from acquisition records.
pub struct TimeDomainReconstructor<'a, S: ArrayStorage + ?Sized> {
    storage: &'a S,
    mass_axis: MassAxis,
    unique_swim_ids: usize,
    gap_threshold: f64,
}

impl<'a, S: ArrayStorage + ?Sized> TimeDomainReconstructor<'a, S> {
    /// Create a reconstructor for `unique_swim_ids` pulses on `mass_axis`
    pub fn new(storage: &'a S, mass_axis: MassAxis, unique_swim_ids: usize) -> Self {
        Self {
            storage,
            mass_axis,
            unique_swim_ids,
            gap_threshold: crate::config::DEFAULT_GAP_THRESHOLD,
        }
    }

    /// Override the gap threshold
    pub fn with_gap_threshold(mut self, gap_threshold: f64) -> Self {
        self.gap_threshold = gap_threshold;
        self
    }

    fn read_pulse(&self, record: &AcquisitionRecord) -> Result<Vec<f64>, RecordError> {
        let intensities = self.storage.read_doubles(record.intensity_array_id)?;
        if intensities.len() != self.mass_axis.len() {
            return Err(RecordError::LengthMismatch {
                expected: self.mass_axis.len(),
                actual: intensities.len(),
            });
        }
        Ok(intensities)
    }

    /// Assemble the cube from `records`, in the order given
    pub fn reconstruct(
        &self,
        records: &[AcquisitionRecord],
    ) -> Result<Reconstruction, ReconstructError> {
        let n_mz = self.mass_axis.len();
        let mut intensities = Array2::<f64>::zeros((self.unique_swim_ids, n_mz));
        let mut indexer = SwimIndexer::new(self.gap_threshold);
        let mut report = ReconstructionReport {
            records_total: records.len(),
            ..Default::default()
        };

        info!(
            "Reconstructing {} records into {} pulses x {} channels",
            records.len(),
            self.unique_swim_ids,
            n_mz
        );

        for (record_index, record) in records.iter().enumerate() {
            let assignment = indexer.assign(record.retention_time);
            if assignment.gap_before {
                warn!(
                    "Retention time gap before record {} (rt {:.3}); swim id {} left empty",
                    record_index,
                    record.retention_time,
                    assignment.swim_id - 1
                );
            }

            let swim_id = assignment.swim_id;
            if swim_id > self.unique_swim_ids {
                return Err(ReconstructError::SwimIndexOutOfRange {
                    record_index,
                    swim_id,
                    unique_swim_ids: self.unique_swim_ids,
                });
            }

            let outcome = match self.read_pulse(record) {
                Ok(pulse) => {
                    intensities
                        .row_mut(swim_id - 1)
                        .assign(&ndarray::ArrayView1::from(pulse.as_slice()));
                    RecordOutcome::Written { swim_id }
                }
                Err(reason) => RecordOutcome::Skipped { swim_id, reason },
            };

            match outcome {
                RecordOutcome::Written { swim_id } => {
                    report.rows_written += 1;
                    debug!("Record {} -> swim id {}", record_index, swim_id);
                }
                RecordOutcome::Skipped { swim_id, reason } => {
                    warn!("Skipping record {} (swim id {}): {}", record_index, swim_id, reason);
                    report.skipped.push(SkippedRecord {
                        record_index,
                        swim_id,
                        intensity_array_id: record.intensity_array_id,
                        reason: reason.to_string(),
                    });
                }
            }
        }

        report.gaps_detected = indexer.gaps_detected();
        report.final_swim_id = indexer.next_swim_id();

        info!(
            "Reconstruction complete: {} rows written, {} skipped, {} gaps",
            report.rows_written,
            report.skipped.len(),
            report.gaps_detected
        );

        let actual = intensities.ncols();
        let cube = TimeDomainCube::from_parts(self.mass_axis.clone(), intensities).ok_or(
            ReconstructError::ShapeMismatch {
                expected: n_mz,
                actual,
            },
        )?;

        Ok(Reconstruction { cube, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::LabeledCube;
    use crate::storage::InMemoryArrayStorage;

    const MASS_AXIS_ID: u64 = 1;

    /// Storage with a 3-channel mass axis and one intensity array per record,
    /// each filled with its record number + 1
    fn storage_for(n_records: usize) -> InMemoryArrayStorage {
        let mut storage = InMemoryArrayStorage::new();
        storage.insert(MASS_AXIS_ID, vec![100.0, 150.0, 200.0]);
        for i in 0..n_records {
            storage.insert(100 + i as u64, vec![(i + 1) as f64; 3]);
        }
        storage
    }

    fn records(retention_times: &[f64]) -> Vec<AcquisitionRecord> {
        retention_times
            .iter()
            .enumerate()
            .map(|(i, &rt)| AcquisitionRecord::new(rt, MASS_AXIS_ID, 100 + i as u64))
            .collect()
    }

    fn axis() -> MassAxis {
        MassAxis::new(vec![100.0, 150.0, 200.0])
    }

    #[test]
    fn test_gap_skips_one_index() {
        assert_eq!(assign_swim_ids(&[0.0, 1.0, 1.0, 3.0, 4.0], 1.0), vec![1, 2, 3, 5, 6]);
    }

    #[test]
    fn test_gap_rounding_half_to_even() {
        // 1.5 rounds to 2 (gap), 2.5 rounds to 2 (gap), 0.5 rounds to 0
        assert_eq!(assign_swim_ids(&[0.0, 1.5], 1.0), vec![1, 3]);
        assert_eq!(assign_swim_ids(&[0.0, 0.5, 1.0], 1.0), vec![1, 2, 3]);
        // 1.4 rounds to 1, not a gap
        assert_eq!(assign_swim_ids(&[0.0, 1.4], 1.0), vec![1, 2]);
    }

    #[test]
    fn test_configurable_threshold() {
        assert_eq!(assign_swim_ids(&[0.0, 2.0, 4.0], 2.0), vec![1, 2, 3]);
        assert_eq!(assign_swim_ids(&[0.0, 3.0], 2.0), vec![1, 3]);
    }

    #[test]
    fn test_reconstruct_places_rows() {
        let storage = storage_for(5);
        let reconstruction = TimeDomainReconstructor::new(&storage, axis(), 8)
            .reconstruct(&records(&[0.0, 1.0, 1.0, 3.0, 4.0]))
            .unwrap();
        let cube = &reconstruction.cube;

        assert_eq!(cube.shape(), (8, 3));
        let first_column: Vec<f64> = cube.channel(0).unwrap().to_vec();
        assert_eq!(first_column, vec![1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 0.0, 0.0]);

        let report = &reconstruction.report;
        assert_eq!(report.records_total, 5);
        assert_eq!(report.rows_written, 5);
        assert_eq!(report.gaps_detected, 1);
        assert_eq!(report.final_swim_id, 7);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_failed_read_leaves_one_zero_row() {
        let mut storage = storage_for(6);
        storage.remove(102);
        let reconstruction = TimeDomainReconstructor::new(&storage, axis(), 6)
            .reconstruct(&records(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();

        let zero_rows: Vec<usize> = reconstruction
            .cube
            .swim_ids()
            .filter(|&id| reconstruction.cube.pulse(id as usize).unwrap().iter().all(|&v| v == 0.0))
            .map(|id| id as usize)
            .collect();
        assert_eq!(zero_rows, vec![3]);

        let skipped = &reconstruction.report.skipped;
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].record_index, 2);
        assert_eq!(skipped[0].swim_id, 3);
        assert_eq!(skipped[0].intensity_array_id, 102);
    }

    #[test]
    fn test_failed_read_still_advances_retention_time() {
        let mut storage = storage_for(4);
        storage.remove(101);
        let reconstruction = TimeDomainReconstructor::new(&storage, axis(), 6)
            .reconstruct(&records(&[0.0, 1.0, 3.0, 4.0]))
            .unwrap();

        let column: Vec<f64> = reconstruction.cube.channel(0).unwrap().to_vec();
        assert_eq!(column, vec![1.0, 0.0, 0.0, 3.0, 4.0, 0.0]);
        assert_eq!(reconstruction.report.gaps_detected, 1);

        // Measured from the failed record, rt 2.0 is one step away, not a gap
        let mut storage = storage_for(4);
        storage.remove(101);
        let reconstruction = TimeDomainReconstructor::new(&storage, axis(), 4)
            .reconstruct(&records(&[0.0, 1.0, 2.0, 3.0]))
            .unwrap();

        let column: Vec<f64> = reconstruction.cube.channel(0).unwrap().to_vec();
        assert_eq!(column, vec![1.0, 0.0, 3.0, 4.0]);
        assert_eq!(reconstruction.report.gaps_detected, 0);
    }

    #[test]
    fn test_length_mismatch_is_skipped() {
        let mut storage = storage_for(2);
        storage.insert(101, vec![1.0, 2.0]);
        let reconstruction = TimeDomainReconstructor::new(&storage, axis(), 2)
            .reconstruct(&records(&[0.0, 1.0]))
            .unwrap();

        assert_eq!(reconstruction.report.rows_written, 1);
        assert!(reconstruction.report.skipped[0].reason.contains("2 values"));
        assert!(reconstruction.cube.pulse(2).unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_out_of_range_swim_id_fails_fast() {
        let storage = storage_for(4);
        let err = TimeDomainReconstructor::new(&storage, axis(), 3)
            .reconstruct(&records(&[0.0, 1.0, 2.0, 3.0]))
            .unwrap_err();

        assert!(matches!(
            err,
            ReconstructError::SwimIndexOutOfRange {
                record_index: 3,
                swim_id: 4,
                unique_swim_ids: 3
            }
        ));
    }

    #[test]
    fn test_gap_can_push_past_declared_range() {
        let storage = storage_for(2);
        let err = TimeDomainReconstructor::new(&storage, axis(), 2)
            .reconstruct(&records(&[0.0, 5.0]))
            .unwrap_err();
        assert!(matches!(err, ReconstructError::SwimIndexOutOfRange { swim_id: 3, .. }));
    }

    #[test]
    fn test_fewer_records_than_pulses() {
        let storage = storage_for(2);
        let reconstruction = TimeDomainReconstructor::new(&storage, axis(), 4)
            .reconstruct(&records(&[0.0, 1.0]))
            .unwrap();
        assert_eq!(reconstruction.report.final_swim_id, 3);
        assert!(reconstruction.cube.pulse(4).unwrap().iter().all(|&v| v == 0.0));
    }
}
