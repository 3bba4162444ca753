//! Buffer comparison and similarity utilities.
//!
//! [`SampleBuffer::eq`](crate::SampleBuffer::eq) is exact. The functions here
//! measure how far apart two buffers are, which is what callers want when the
//! buffers come out of a transform or a resampler.

use crate::dtype::check_dtype;
use crate::{EngineError, EngineResult, SampleBuffer};

/// Host values of two buffers after checking they are comparable.
fn comparable_values(a: &SampleBuffer, b: &SampleBuffer) -> EngineResult<(Vec<f64>, Vec<f64>)> {
    check_dtype(a.dtype()?, b.dtype()?)?;
    if a.shape()? != b.shape()? {
        return Err(EngineError::size_mismatch(
            format!("comparison of shapes {:?} and {:?}", a.shape()?, b.shape()?),
            a.len()?,
            b.len()?,
        ));
    }
    Ok((a.to_host_values()?, b.to_host_values()?))
}

/// Largest absolute difference between corresponding components.
///
/// Complex buffers are compared on their real and imaginary parts separately.
///
/// # Errors
/// - [`EngineError::DtypeMismatch`] if the element kinds differ
/// - [`EngineError::SizeMismatch`] if the shapes differ
pub fn max_abs_diff(a: &SampleBuffer, b: &SampleBuffer) -> EngineResult<f64> {
    let (a, b) = comparable_values(a, b)?;
    Ok(max_abs_diff_slice(&a, &b))
}

/// Whether every component satisfies `|a - b| <= atol + rtol * |b|`.
pub fn allclose(a: &SampleBuffer, b: &SampleBuffer, rtol: f64, atol: f64) -> EngineResult<bool> {
    let (a, b) = comparable_values(a, b)?;
    Ok(a.iter()
        .zip(&b)
        .all(|(&x, &y)| (x - y).abs() <= atol + rtol * y.abs()))
}

/// Computes the Mean Squared Error (MSE) between two buffers.
///
/// Lower values indicate higher similarity.
pub fn mse(a: &SampleBuffer, b: &SampleBuffer) -> EngineResult<f64> {
    let (a, b) = comparable_values(a, b)?;
    mse_slice(&a, &b)
}

/// Largest absolute difference between two equally long slices.
///
/// Extra elements in the longer slice are ignored.
pub fn max_abs_diff_slice(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Mean squared error between two slices.
///
/// # Errors
/// [`EngineError::SizeMismatch`] if the slices differ in length.
pub fn mse_slice(a: &[f64], b: &[f64]) -> EngineResult<f64> {
    if a.len() != b.len() {
        return Err(EngineError::size_mismatch("mse", a.len(), b.len()));
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let n = a.len() as f64;
    Ok(a.iter().zip(b).map(|(&x, &y)| (x - y) * (x - y)).sum::<f64>() / n)
}

/// Pearson correlation coefficient between two slices.
///
/// Returns 0 when either slice has no variance.
pub fn correlation_slice(a: &[f64], b: &[f64]) -> EngineResult<f64> {
    if a.len() != b.len() {
        return Err(EngineError::size_mismatch("correlation", a.len(), b.len()));
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den_a = 0.0;
    let mut den_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        num += dx * dy;
        den_a += dx * dx;
        den_b += dy * dy;
    }

    let denominator = (den_a * den_b).sqrt();
    if denominator == 0.0 {
        Ok(0.0)
    } else {
        Ok(num / denominator)
    }
}

/// Shift in `-max_shift..=max_shift` at which `candidate` best lines up with `reference`.
///
/// Compares `reference[start..start + span]` against
/// `candidate[start + shift..start + shift + span]` and returns the shift with
/// the smallest largest-absolute-error, together with that error. Shifts that
/// would read outside either slice are skipped; if none fits, the error is
/// infinite.
pub fn best_shift(
    reference: &[f64],
    candidate: &[f64],
    start: usize,
    span: usize,
    max_shift: usize,
) -> (isize, f64) {
    let mut best = (0, f64::INFINITY);
    if start + span > reference.len() {
        return best;
    }
    let expected = &reference[start..start + span];
    for shift in -(max_shift as isize)..=max_shift as isize {
        let Some(from) = start.checked_add_signed(shift) else {
            continue;
        };
        if from + span > candidate.len() {
            continue;
        }
        let err = max_abs_diff_slice(expected, &candidate[from..from + span]);
        if err < best.1 {
            best = (shift, err);
        }
    }
    best
}
