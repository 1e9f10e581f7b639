//! Dense two-dimensional cubes produced by an extraction run.
//!
//! Both cubes share the mass-charge axis as their second dimension:
//!
//! | Cube | Shape | Dimensions | Values |
//! |------|-------|------------|--------|
//! | [`TimeDomainCube`] | `(unique_swim_ids, n_mz)` | `(swim_id, mass_charge)` | intensity |
//! | [`FrequencyDomainCube`] | `(unique_swim_ids / 2 + 1, n_mz)` | `(frequency, mass_charge)` | power |
//!
//! Cubes are immutable once built: the reconstructor is the only code that
//! writes into a time-domain buffer, and it hands over ownership when done.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Shared mass-charge sampling grid of an acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct MassAxis {
    values: Arc<[f64]>,
}

impl MassAxis {
    /// Wrap the m/z values read from the storage
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Number of mass channels
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the axis has no channels
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// m/z values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl Deref for MassAxis {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

/// Which of the two cubes a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeKind {
    /// Pulse-indexed intensities
    TimeDomain,
    /// Per-channel power spectra
    FrequencyDomain,
}

impl CubeKind {
    /// Name of the first dimension
    pub fn row_dim(self) -> &'static str {
        match self {
            CubeKind::TimeDomain => "swim_id",
            CubeKind::FrequencyDomain => "frequency",
        }
    }

    /// Name of the second dimension
    pub fn col_dim(self) -> &'static str {
        "mass_charge"
    }

    /// Name of the stored variable
    pub fn variable(self) -> &'static str {
        match self {
            CubeKind::TimeDomain => "intensity",
            CubeKind::FrequencyDomain => "amplitude",
        }
    }

    /// File name suffix following the source id
    pub fn file_suffix(self) -> &'static str {
        match self {
            CubeKind::TimeDomain => "_timedomain",
            CubeKind::FrequencyDomain => "_fourierdomain",
        }
    }

    /// Stable identifier stored in dataset footers
    pub fn as_str(self) -> &'static str {
        match self {
            CubeKind::TimeDomain => "time_domain",
            CubeKind::FrequencyDomain => "frequency_domain",
        }
    }

    /// Parse the identifier written by [`CubeKind::as_str`]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "time_domain" => Some(CubeKind::TimeDomain),
            "frequency_domain" => Some(CubeKind::FrequencyDomain),
            _ => None,
        }
    }
}

impl fmt::Display for CubeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access shared by both cubes, used by the dataset writer.
pub trait LabeledCube {
    /// Which cube this is
    fn kind(&self) -> CubeKind;

    /// Coordinate of row `row` along the first dimension
    fn row_coordinate(&self, row: usize) -> f64;

    /// Mass-charge coordinates
    fn mass_axis(&self) -> &MassAxis;

    /// Cell values, shape `(rows, mass_axis.len())`
    fn values(&self) -> ArrayView2<'_, f64>;

    /// `(rows, columns)`
    fn shape(&self) -> (usize, usize) {
        self.values().dim()
    }
}

/// Pulse-indexed intensity cube, shape `(unique_swim_ids, n_mz)`.
#[derive(Debug, Clone)]
pub struct TimeDomainCube {
    mass_axis: MassAxis,
    intensities: Array2<f64>,
}

impl TimeDomainCube {
    /// Take ownership of an assembled buffer.
    ///
    /// Returns `None` when the buffer width does not match the mass axis.
    pub(crate) fn from_parts(mass_axis: MassAxis, intensities: Array2<f64>) -> Option<Self> {
        (intensities.ncols() == mass_axis.len()).then_some(Self {
            mass_axis,
            intensities,
        })
    }

    /// Number of pulses (the declared `unique_swim_ids`)
    pub fn n_pulses(&self) -> usize {
        self.intensities.nrows()
    }

    /// Number of mass channels
    pub fn n_channels(&self) -> usize {
        self.intensities.ncols()
    }

    /// Intensities of one pulse, addressed by its 1-based swim id
    pub fn pulse(&self, swim_id: usize) -> Option<ArrayView1<'_, f64>> {
        (1..=self.n_pulses())
            .contains(&swim_id)
            .then(|| self.intensities.row(swim_id - 1))
    }

    /// Intensities of one mass channel across every pulse
    pub fn channel(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.n_channels()).then(|| self.intensities.column(index))
    }

    /// Swim ids labelling the rows, `1..=n_pulses`
    pub fn swim_ids(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=self.n_pulses()).map(|id| id as u32)
    }
}

impl LabeledCube for TimeDomainCube {
    fn kind(&self) -> CubeKind {
        CubeKind::TimeDomain
    }

    fn row_coordinate(&self, row: usize) -> f64 {
        (row + 1) as f64
    }

    fn mass_axis(&self) -> &MassAxis {
        &self.mass_axis
    }

    fn values(&self) -> ArrayView2<'_, f64> {
        self.intensities.view()
    }
}

/// Per-channel power spectra, shape `(unique_swim_ids / 2 + 1, n_mz)`.
#[derive(Debug, Clone)]
pub struct FrequencyDomainCube {
    frequencies: Vec<f64>,
    mass_axis: MassAxis,
    power: Array2<f64>,
}

impl FrequencyDomainCube {
    pub(crate) fn from_parts(frequencies: Vec<f64>, mass_axis: MassAxis, power: Array2<f64>) -> Self {
        debug_assert_eq!(frequencies.len(), power.nrows());
        debug_assert_eq!(mass_axis.len(), power.ncols());
        Self {
            frequencies,
            mass_axis,
            power,
        }
    }

    /// Frequency axis
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Number of frequency bins
    pub fn n_frequencies(&self) -> usize {
        self.power.nrows()
    }

    /// Power spectrum of one mass channel
    pub fn channel(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.power.ncols()).then(|| self.power.column(index))
    }
}

impl LabeledCube for FrequencyDomainCube {
    fn kind(&self) -> CubeKind {
        CubeKind::FrequencyDomain
    }

    fn row_coordinate(&self, row: usize) -> f64 {
        self.frequencies[row]
    }

    fn mass_axis(&self) -> &MassAxis {
        &self.mass_axis
    }

    fn values(&self) -> ArrayView2<'_, f64> {
        self.power.view()
    }
}

/// A cube read back from a dataset file.
#[derive(Debug, Clone)]
pub struct DatasetCube {
    /// Which cube the file holds
    pub kind: CubeKind,
    /// Coordinates along the first dimension
    pub row_coords: Vec<f64>,
    /// Mass-charge coordinates
    pub mass_axis: MassAxis,
    /// Cell values
    pub values: Array2<f64>,
}

impl LabeledCube for DatasetCube {
    fn kind(&self) -> CubeKind {
        self.kind
    }

    fn row_coordinate(&self, row: usize) -> f64 {
        self.row_coords[row]
    }

    fn mass_axis(&self) -> &MassAxis {
        &self.mass_axis
    }

    fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_domain_accessors() {
        let axis = MassAxis::new(vec![100.0, 200.0]);
        let values = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let cube = TimeDomainCube::from_parts(axis, values).unwrap();

        assert_eq!(cube.shape(), (3, 2));
        assert_eq!(cube.pulse(1).unwrap().to_vec(), vec![1.0, 2.0]);
        assert_eq!(cube.pulse(3).unwrap().to_vec(), vec![5.0, 6.0]);
        assert!(cube.pulse(0).is_none());
        assert!(cube.pulse(4).is_none());
        assert_eq!(cube.channel(1).unwrap().to_vec(), vec![2.0, 4.0, 6.0]);
        assert_eq!(cube.swim_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(cube.row_coordinate(2), 3.0);
    }

    #[test]
    fn test_width_must_match_axis() {
        let axis = MassAxis::new(vec![100.0, 200.0, 300.0]);
        assert!(TimeDomainCube::from_parts(axis, Array2::zeros((4, 2))).is_none());
    }

    #[test]
    fn test_kind_identifiers() {
        for kind in [CubeKind::TimeDomain, CubeKind::FrequencyDomain] {
            assert_eq!(CubeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(CubeKind::TimeDomain.file_suffix(), "_timedomain");
        assert_eq!(CubeKind::FrequencyDomain.file_suffix(), "_fourierdomain");
        assert_eq!(CubeKind::FrequencyDomain.variable(), "amplitude");
        assert!(CubeKind::parse("mobility").is_none());
    }
}
