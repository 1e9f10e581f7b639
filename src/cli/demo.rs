use anyhow::{Context, Result};
use log::info;
use std::f64::consts::PI;
use std::path::PathBuf;

use swimcube::acquisition::AcquisitionRecord;
use swimcube::config::ExtractionConfig;
use swimcube::dataset::{DatasetWriterConfig, Profile};
use swimcube::extract::run_extraction;
use swimcube::metadata::SourceFileInfo;
use swimcube::storage::InMemoryArrayStorage;

/// Array id of the shared mass axis
const MASS_AXIS_ID: u64 = 1;
/// First intensity array id
const FIRST_PULSE_ID: u64 = 1_000;
/// Every pulse with this stride is never recorded, producing a gap
const DROPPED_PULSE_STRIDE: u32 = 97;
/// Pulse whose intensity array is missing from storage
const UNREADABLE_PULSE: u32 = 10;

/// Generate a synthetic SWIM acquisition and run the full pipeline on it
pub fn run(output_dir: PathBuf, pulses: u32, channels: usize, profile: Profile) -> Result<()> {
    info!("swimcube demo: {} pulses x {} channels", pulses, channels);

    let (storage, records) = synthetic_acquisition(pulses, channels);
    info!(
        "Generated {} records ({} arrays in storage)",
        records.len(),
        storage.len()
    );

    let config = ExtractionConfig::new(pulses, 1.0);
    let writer_config = DatasetWriterConfig::from_profile(profile);

    let output = run_extraction(
        &SourceFileInfo::new("demo_swim_run"),
        &records,
        &storage,
        &config,
        &writer_config,
        &output_dir,
    )
    .context("Demo extraction failed")?;

    super::print_summary(&output);
    Ok(())
}

/// Each channel oscillates at its own pulse frequency on top of a baseline.
/// Pulses on the drop stride are absent from the record list; one recorded
/// pulse points at an array that was never stored.
fn synthetic_acquisition(pulses: u32, channels: usize) -> (InMemoryArrayStorage, Vec<AcquisitionRecord>) {
    let mut storage = InMemoryArrayStorage::new();
    storage.insert(
        MASS_AXIS_ID,
        (0..channels).map(|c| 200.0 + 1.5 * c as f64).collect(),
    );

    let mut records = Vec::new();
    for pulse in 0..pulses {
        if pulse > 0 && pulse % DROPPED_PULSE_STRIDE == 0 {
            continue;
        }

        let array_id = FIRST_PULSE_ID + u64::from(pulse);
        if pulse != UNREADABLE_PULSE {
            let t = f64::from(pulse);
            let intensities = (0..channels)
                .map(|c| {
                    let cycles = 1.0 + (c % 16) as f64;
                    let phase = 2.0 * PI * cycles * t / f64::from(pulses);
                    1_000.0 + 50.0 * c as f64 + 400.0 * phase.sin() + 25.0 * (t * 12.9898).sin()
                })
                .collect();
            storage.insert(array_id, intensities);
        }

        records.push(AcquisitionRecord::new(f64::from(pulse), MASS_AXIS_ID, array_id));
    }

    (storage, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_acquisition_shape() {
        let (storage, records) = synthetic_acquisition(200, 8);
        // pulses 97 and 194 are dropped
        assert_eq!(records.len(), 198);
        // one record has no stored array
        assert_eq!(storage.len(), 1 + 197);
        assert_eq!(records[0].mass_axis_array_id, MASS_AXIS_ID);
    }
}
