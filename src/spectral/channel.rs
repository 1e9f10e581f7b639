//! Channel-at-a-time transform: working memory is bounded by the pulse
//! count, independent of the number of mass channels.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis};
use num_complex::Complex;
use rustfft::Fft;

use super::{load_centered, store_power};

/// Reusable per-worker buffers
pub(crate) struct ChannelScratch {
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl ChannelScratch {
    pub(crate) fn new(fft: &Arc<dyn Fft<f64>>) -> Self {
        Self {
            fft: Arc::clone(fft),
            buffer: vec![Complex::default(); fft.len()],
            scratch: vec![Complex::default(); fft.get_inplace_scratch_len()],
        }
    }

    fn transform(&mut self, column: ndarray::ArrayView1<'_, f64>, out: ndarray::ArrayViewMut1<'_, f64>) {
        load_centered(column, &mut self.buffer);
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
        store_power(&self.buffer, out);
    }
}

pub(crate) fn power_spectra(signal: ArrayView2<'_, f64>, fft: &Arc<dyn Fft<f64>>) -> Array2<f64> {
    let (n_pulses, n_channels) = signal.dim();
    let mut power = Array2::<f64>::zeros((n_pulses / 2 + 1, n_channels));
    let mut scratch = ChannelScratch::new(fft);

    for (column, out) in signal.axis_iter(Axis(1)).zip(power.axis_iter_mut(Axis(1))) {
        scratch.transform(column, out);
    }

    power
}

#[cfg(feature = "parallel")]
pub(crate) fn power_spectra_parallel(
    signal: ArrayView2<'_, f64>,
    fft: &Arc<dyn Fft<f64>>,
) -> Array2<f64> {
    use ndarray::parallel::prelude::*;

    let (n_pulses, n_channels) = signal.dim();
    let mut power = Array2::<f64>::zeros((n_pulses / 2 + 1, n_channels));

    power
        .axis_iter_mut(Axis(1))
        .into_par_iter()
        .zip(signal.axis_iter(Axis(1)))
        .for_each_init(
            || ChannelScratch::new(fft),
            |scratch, (out, column)| scratch.transform(column, out),
        );

    power
}
