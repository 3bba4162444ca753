//! Test-signal generation utilities.

use ndarray::Array2;

use crate::{EngineResult, HArray, RealFloat, to_precision};

/// Generates `n_samples` of a sine wave.
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `n_samples` - Number of samples to generate
/// * `amplitude` - Peak amplitude
///
/// # Returns
/// A one-dimensional, uniquely owned [`HArray`].
pub fn sine_wave<F: RealFloat>(
    frequency: f64,
    sample_rate: f64,
    n_samples: usize,
    amplitude: f64,
) -> EngineResult<HArray<F>> {
    let data = (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            to_precision(amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin())
        })
        .collect();
    HArray::from_shape_vec(&[n_samples], data)
}

/// Generates a `(channels, n_samples)` array with one sine per channel.
///
/// Channel `c` oscillates at `frequencies[c]`.
pub fn sine_channels<F: RealFloat>(
    frequencies: &[f64],
    sample_rate: f64,
    n_samples: usize,
    amplitude: f64,
) -> EngineResult<HArray<F>> {
    let data = Array2::from_shape_fn((frequencies.len(), n_samples), |(ch, i)| {
        let t = i as f64 / sample_rate;
        to_precision::<F>(amplitude * (2.0 * std::f64::consts::PI * frequencies[ch] * t).sin())
    });
    HArray::from_ndarray(&data)
}

/// Generates `n_samples` of a sum of equal-amplitude sines, one per frequency.
///
/// The peak of the sum never exceeds `amplitude`.
pub fn multi_tone<F: RealFloat>(
    frequencies: &[f64],
    sample_rate: f64,
    n_samples: usize,
    amplitude: f64,
) -> EngineResult<HArray<F>> {
    let scale = amplitude / frequencies.len().max(1) as f64;
    let data = (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let sum: f64 = frequencies
                .iter()
                .map(|&f| (2.0 * std::f64::consts::PI * f * t).sin())
                .sum();
            to_precision(scale * sum)
        })
        .collect();
    HArray::from_shape_vec(&[n_samples], data)
}
