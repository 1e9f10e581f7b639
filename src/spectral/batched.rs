//! Batched transform: every channel is packed into one channel-major
//! complex buffer and transformed with a single call.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis};
use num_complex::Complex;
use rustfft::Fft;

use super::{load_centered, store_power};

pub(crate) fn power_spectra(signal: ArrayView2<'_, f64>, fft: &Arc<dyn Fft<f64>>) -> Array2<f64> {
    let (n_pulses, n_channels) = signal.dim();
    let mut power = Array2::<f64>::zeros((n_pulses / 2 + 1, n_channels));
    if n_channels == 0 {
        return power;
    }

    let mut buffer = vec![Complex::<f64>::default(); n_pulses * n_channels];
    for (column, chunk) in signal
        .axis_iter(Axis(1))
        .zip(buffer.chunks_exact_mut(n_pulses))
    {
        load_centered(column, chunk);
    }

    // rustfft treats a buffer that is a multiple of the plan length as
    // consecutive independent transforms
    fft.process(&mut buffer);

    for (out, spectrum) in power
        .axis_iter_mut(Axis(1))
        .zip(buffer.chunks_exact(n_pulses))
    {
        store_power(spectrum, out);
    }

    power
}
