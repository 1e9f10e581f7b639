//! Per-channel power spectra across the pulse axis.
//!
//! For every mass channel the pulse-axis signal is mean-centred (removing
//! the DC baseline), transformed with a one-sided real DFT, and reduced to
//! power `|X_k|^2`. The output has `n / 2 + 1` frequency bins with
//! `f_k = k / (n * sampling_period)`.
//!
//! Two execution strategies produce the same result:
//!
//! - [`ResolvedStrategy::Batched`] packs every channel into one buffer and
//!   runs a single bulk transform. Fast, but needs memory proportional to
//!   the whole cube.
//! - [`ResolvedStrategy::ChannelAtATime`] reuses one buffer of length `n`
//!   per worker, so memory stays flat however many channels there are.
//!
//! [`FftStrategy::Auto`] chooses between them from a memory budget, which
//! keeps large-`n_mz` acquisitions (hundreds of thousands of channels) on the
//! bounded path.
//!
//! # Example
//!
//! ```
//! use swimcube::prelude::*;
//!
//! let mut storage = InMemoryArrayStorage::new();
//! storage.insert(1, vec![100.0, 200.0]);
//! for i in 0..8u64 {
//!     storage.insert(10 + i, vec![i as f64, 1.0]);
//! }
//! let records: Vec<_> = (0..8u64)
//!     .map(|i| AcquisitionRecord::new(i as f64, 1, 10 + i))
//!     .collect();
//!
//! let axis = MassAxis::new(storage.read_doubles(1)?);
//! let time_domain = TimeDomainReconstructor::new(&storage, axis, 8)
//!     .reconstruct(&records)?
//!     .cube;
//!
//! let spectra = SpectralTransformer::new(1.0).transform(&time_domain);
//! assert_eq!(spectra.shape(), (5, 2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod batched;
mod channel;
mod strategy;

#[cfg(test)]
mod tests;

pub use strategy::{batched_working_bytes, channel_working_bytes, FftStrategy, ResolvedStrategy};

use log::{debug, info};
#[cfg(not(feature = "parallel"))]
use log::warn;
use ndarray::{Array2, ArrayView1, ArrayViewMut1};
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::{ExtractionConfig, DEFAULT_FFT_MEMORY_BUDGET_MB};
use crate::cube::{FrequencyDomainCube, LabeledCube, TimeDomainCube};

/// One-sided real-FFT frequency bins for `n` samples spaced `period` apart.
///
/// Matches `numpy.fft.rfftfreq(n, period)`.
pub fn rfft_frequencies(n: usize, period: f64) -> Vec<f64> {
    if n == 0 {
        return vec![0.0];
    }
    let step = 1.0 / (n as f64 * period);
    (0..=n / 2).map(|k| k as f64 * step).collect()
}

/// Copy a channel into the transform buffer with its mean removed
pub(crate) fn load_centered(column: ArrayView1<'_, f64>, buffer: &mut [Complex<f64>]) {
    let mean = column.sum() / column.len() as f64;
    for (slot, &value) in buffer.iter_mut().zip(column.iter()) {
        *slot = Complex::new(value - mean, 0.0);
    }
}

/// Write the power of the non-negative frequency bins
pub(crate) fn store_power(spectrum: &[Complex<f64>], mut out: ArrayViewMut1<'_, f64>) {
    for (slot, bin) in out.iter_mut().zip(spectrum.iter()) {
        *slot = bin.norm_sqr();
    }
}

/// Computes a [`FrequencyDomainCube`] from a [`TimeDomainCube`].
#[derive(Debug, Clone)]
pub struct SpectralTransformer {
    strategy: FftStrategy,
    memory_budget_bytes: u64,
    sampling_period: f64,
    parallel: bool,
}

impl SpectralTransformer {
    /// Transformer with the automatic strategy and default memory budget
    pub fn new(sampling_period: f64) -> Self {
        Self {
            strategy: FftStrategy::Auto,
            memory_budget_bytes: DEFAULT_FFT_MEMORY_BUDGET_MB * 1024 * 1024,
            sampling_period,
            parallel: false,
        }
    }

    /// Transformer configured from an extraction config
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            strategy: config.fft_strategy,
            memory_budget_bytes: config.memory_budget_bytes(),
            sampling_period: config.instrument_sampling_period,
            parallel: config.parallel,
        }
    }

    /// Set the execution strategy
    pub fn with_strategy(mut self, strategy: FftStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the batched-transform memory budget
    pub fn with_memory_budget_bytes(mut self, bytes: u64) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    /// Run channel-at-a-time transforms on a thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Strategy that [`transform`](Self::transform) will use for `cube`
    pub fn resolve(&self, cube: &TimeDomainCube) -> ResolvedStrategy {
        let (n_pulses, n_channels) = cube.shape();
        let resolved = self
            .strategy
            .resolve(n_pulses, n_channels, self.memory_budget_bytes);
        debug!(
            "FFT strategy {} resolved to {} (batched needs {} bytes, per channel {} bytes, budget {} bytes)",
            self.strategy,
            resolved,
            batched_working_bytes(n_pulses, n_channels),
            channel_working_bytes(n_pulses),
            self.memory_budget_bytes
        );
        resolved
    }

    /// Transform with the configured strategy
    pub fn transform(&self, cube: &TimeDomainCube) -> FrequencyDomainCube {
        self.transform_with(cube, self.resolve(cube))
    }

    /// Transform with an explicit strategy
    pub fn transform_with(
        &self,
        cube: &TimeDomainCube,
        strategy: ResolvedStrategy,
    ) -> FrequencyDomainCube {
        let (n_pulses, n_channels) = cube.shape();
        let frequencies = rfft_frequencies(n_pulses, self.sampling_period);

        if n_pulses == 0 {
            return FrequencyDomainCube::from_parts(
                frequencies,
                cube.mass_axis().clone(),
                Array2::zeros((1, n_channels)),
            );
        }

        info!(
            "Computing power spectra for {} channels x {} pulses ({})",
            n_channels, n_pulses, strategy
        );

        let fft = FftPlanner::<f64>::new().plan_fft_forward(n_pulses);
        let signal = cube.values();

        let power = match strategy {
            ResolvedStrategy::Batched => batched::power_spectra(signal, &fft),
            ResolvedStrategy::ChannelAtATime => self.channel_spectra(signal, &fft),
        };

        FrequencyDomainCube::from_parts(frequencies, cube.mass_axis().clone(), power)
    }

    #[cfg(feature = "parallel")]
    fn channel_spectra(
        &self,
        signal: ndarray::ArrayView2<'_, f64>,
        fft: &std::sync::Arc<dyn rustfft::Fft<f64>>,
    ) -> Array2<f64> {
        if self.parallel {
            debug!(
                "Transforming channels on {} threads",
                rayon::current_num_threads()
            );
            channel::power_spectra_parallel(signal, fft)
        } else {
            channel::power_spectra(signal, fft)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn channel_spectra(
        &self,
        signal: ndarray::ArrayView2<'_, f64>,
        fft: &std::sync::Arc<dyn rustfft::Fft<f64>>,
    ) -> Array2<f64> {
        if self.parallel {
            warn!("Parallel transforms requested but built without the parallel feature; transforming sequentially.");
        }
        channel::power_spectra(signal, fft)
    }
}
