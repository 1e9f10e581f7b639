use std::f64::consts::PI;

use ndarray::Array2;

use super::*;
use crate::cube::{LabeledCube, MassAxis, TimeDomainCube};

fn cube_from_fn(n_pulses: usize, n_channels: usize, f: impl Fn(usize, usize) -> f64) -> TimeDomainCube {
    let axis = MassAxis::new((0..n_channels).map(|c| 100.0 + c as f64).collect());
    let values = Array2::from_shape_fn((n_pulses, n_channels), |(t, c)| f(t, c));
    TimeDomainCube::from_parts(axis, values).unwrap()
}

fn assert_close(a: f64, b: f64) {
    let tolerance = 1e-9 * (1.0 + a.abs().max(b.abs()));
    assert!((a - b).abs() <= tolerance, "{a} != {b}");
}

#[test]
fn test_constant_channel_has_no_power() {
    let cube = cube_from_fn(16, 3, |_, c| 5.0 + c as f64 * 100.0);
    let spectra = SpectralTransformer::new(1.0).transform(&cube);

    assert_eq!(spectra.shape(), (9, 3));
    for value in spectra.values().iter() {
        assert!(value.abs() < 1e-18, "residual power {value}");
    }
}

#[test]
fn test_dc_bin_is_zero_after_centering() {
    let cube = cube_from_fn(10, 2, |t, c| (t * t + c) as f64 + 50.0);
    let spectra = SpectralTransformer::new(1.0).transform(&cube);

    for channel in 0..2 {
        assert!(spectra.channel(channel).unwrap()[0].abs() < 1e-18);
    }
}

#[test]
fn test_sinusoid_power_lands_in_its_bin() {
    let n = 16;
    let k0 = 3;
    let amplitude = 2.0;
    let cube = cube_from_fn(n, 1, |t, _| {
        7.0 + amplitude * (2.0 * PI * k0 as f64 * t as f64 / n as f64).cos()
    });
    let spectra = SpectralTransformer::new(1.0).transform(&cube);
    let channel = spectra.channel(0).unwrap();

    let expected = (amplitude * n as f64 / 2.0).powi(2);
    assert_close(channel[k0], expected);
    for (k, &power) in channel.iter().enumerate() {
        if k != k0 {
            assert!(power < 1e-12, "bin {k} has power {power}");
        }
    }
}

#[test]
fn test_strategies_agree() {
    let cube = cube_from_fn(33, 7, |t, c| ((t * 31 + c * 17) % 13) as f64 * (c + 1) as f64);
    let transformer = SpectralTransformer::new(0.5);

    let batched = transformer.transform_with(&cube, ResolvedStrategy::Batched);
    let channel = transformer.transform_with(&cube, ResolvedStrategy::ChannelAtATime);

    assert_eq!(batched.shape(), channel.shape());
    assert_eq!(batched.frequencies(), channel.frequencies());
    for (a, b) in batched.values().iter().zip(channel.values().iter()) {
        assert_close(*a, *b);
    }
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_sequential() {
    let cube = cube_from_fn(64, 40, |t, c| ((t ^ c) % 9) as f64);
    let sequential = SpectralTransformer::new(1.0)
        .transform_with(&cube, ResolvedStrategy::ChannelAtATime);
    let parallel = SpectralTransformer::new(1.0)
        .with_parallel(true)
        .transform_with(&cube, ResolvedStrategy::ChannelAtATime);

    for (a, b) in sequential.values().iter().zip(parallel.values().iter()) {
        assert_close(*a, *b);
    }
}

#[test]
fn test_single_pulse_yields_single_zero_bin() {
    let cube = cube_from_fn(1, 4, |_, c| c as f64 + 1.0);
    let spectra = SpectralTransformer::new(1.0).transform(&cube);

    assert_eq!(spectra.shape(), (1, 4));
    assert_eq!(spectra.frequencies(), &[0.0]);
    assert!(spectra.values().iter().all(|v| *v == 0.0));
}

#[test]
fn test_frequency_axis() {
    assert_eq!(rfft_frequencies(8, 1.0), vec![0.0, 0.125, 0.25, 0.375, 0.5]);
    assert_eq!(rfft_frequencies(5, 0.5), vec![0.0, 0.4, 0.8]);
    assert_eq!(rfft_frequencies(2048, 1.0).len(), 1025);
    assert_eq!(rfft_frequencies(1, 1.0), vec![0.0]);
}

#[test]
fn test_output_keeps_mass_axis() {
    let cube = cube_from_fn(4, 3, |t, _| t as f64);
    let spectra = SpectralTransformer::new(1.0).transform(&cube);
    assert_eq!(spectra.mass_axis().as_slice(), &[100.0, 101.0, 102.0]);
}

#[test]
fn test_nan_stays_in_its_channel() {
    let cube = cube_from_fn(8, 2, |t, c| if c == 0 && t == 3 { f64::NAN } else { t as f64 });
    let spectra = SpectralTransformer::new(1.0).transform(&cube);

    assert!(spectra.channel(0).unwrap().iter().all(|v| v.is_nan()));
    assert!(spectra.channel(1).unwrap().iter().all(|v| v.is_finite()));
}

#[test]
fn test_auto_prefers_channel_for_wide_cubes() {
    let budget = 512 * 1024 * 1024;
    assert_eq!(
        FftStrategy::Auto.resolve(2048, 200_000, budget),
        ResolvedStrategy::ChannelAtATime
    );
    assert_eq!(
        FftStrategy::Auto.resolve(2048, 1_000, budget),
        ResolvedStrategy::Batched
    );
    assert_eq!(
        FftStrategy::Batched.resolve(2048, 200_000, budget),
        ResolvedStrategy::Batched
    );
    assert_eq!(
        FftStrategy::ChannelAtATime.resolve(4, 1, budget),
        ResolvedStrategy::ChannelAtATime
    );
}

#[test]
fn test_transformer_resolves_with_its_budget() {
    let cube = cube_from_fn(16, 8, |t, _| t as f64);
    let needed = batched_working_bytes(16, 8);

    let roomy = SpectralTransformer::new(1.0).with_memory_budget_bytes(needed);
    assert_eq!(roomy.resolve(&cube), ResolvedStrategy::Batched);

    let tight = SpectralTransformer::new(1.0).with_memory_budget_bytes(needed - 1);
    assert_eq!(tight.resolve(&cube), ResolvedStrategy::ChannelAtATime);
}

#[test]
fn test_working_bytes() {
    assert_eq!(batched_working_bytes(4, 2), 4 * 2 * 16 + 3 * 2 * 8);
    assert_eq!(channel_working_bytes(2048), 2 * 2048 * 16);
}

#[test]
fn test_strategy_names() {
    assert_eq!("auto".parse::<FftStrategy>().unwrap(), FftStrategy::Auto);
    assert_eq!("Batched".parse::<FftStrategy>().unwrap(), FftStrategy::Batched);
    assert_eq!(
        "channel-at-a-time".parse::<FftStrategy>().unwrap(),
        FftStrategy::ChannelAtATime
    );
    assert!("gpu".parse::<FftStrategy>().is_err());
    assert_eq!(FftStrategy::ChannelAtATime.to_string(), "channel");
}
