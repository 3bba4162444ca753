//! Window coefficient generation.
//!
//! Window coefficients are consumed by the short-time transform's framing step,
//! which depends only on the [`WindowFunction`] trait; [`StandardWindows`] is
//! the closed-form implementation shipped with the crate. The sinc resampler
//! picks its kernel window from [`SincWindow`](crate::SincWindow) instead.
//!
//! Symmetric windows are meant for filter design. Periodic windows, meant for
//! spectral analysis, are the first `n` points of the symmetric window of
//! length `n + 1`.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// Named window shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum WindowType {
    /// Modified Bartlett-Hann window.
    Barthann,
    /// Triangular window with zero end points.
    Bartlett,
    /// Three-term Blackman window.
    Blackman,
    /// Four-term minimum side-lobe Blackman-Harris window.
    BlackmanHarris,
    /// Bohman window (convolution of two half-cosines).
    Bohman,
    /// Rectangular window.
    Boxcar,
    /// Simple sine window.
    Cosine,
    /// Hann window.
    Hann,
    /// Triangular window with non-zero end points.
    Triangle,
}

impl WindowType {
    /// Lower-case name used by `Display` and `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Barthann => "barthann",
            Self::Bartlett => "bartlett",
            Self::Blackman => "blackman",
            Self::BlackmanHarris => "blackmanharris",
            Self::Bohman => "bohman",
            Self::Boxcar => "boxcar",
            Self::Cosine => "cosine",
            Self::Hann => "hann",
            Self::Triangle => "triangle",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "barthann" => Ok(Self::Barthann),
            "bartlett" => Ok(Self::Bartlett),
            "blackman" => Ok(Self::Blackman),
            "blackmanharris" => Ok(Self::BlackmanHarris),
            "bohman" => Ok(Self::Bohman),
            "boxcar" | "rectangular" => Ok(Self::Boxcar),
            "cosine" | "sine" => Ok(Self::Cosine),
            "hann" | "hanning" => Ok(Self::Hann),
            "triangle" | "triang" => Ok(Self::Triangle),
            _ => Err(EngineError::invalid_parameter(
                "window",
                format!("unknown window '{s}'"),
            )),
        }
    }
}

/// Source of window coefficient sequences.
pub trait WindowFunction {
    /// Coefficients of `window` sampled at `npoints` points.
    ///
    /// # Errors
    /// [`EngineError::InvalidLength`] if `npoints` is zero.
    fn coefficients(
        &self,
        window: WindowType,
        npoints: usize,
        symmetric: bool,
    ) -> EngineResult<Vec<f64>>;
}

/// Closed-form implementation of every [`WindowType`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardWindows;

impl WindowFunction for StandardWindows {
    fn coefficients(
        &self,
        window: WindowType,
        npoints: usize,
        symmetric: bool,
    ) -> EngineResult<Vec<f64>> {
        if npoints == 0 {
            return Err(EngineError::invalid_length(
                "a window needs at least one point",
            ));
        }
        if npoints == 1 {
            return Ok(vec![1.0]);
        }
        if symmetric {
            return Ok(symmetric_window(window, npoints));
        }
        let mut extended = symmetric_window(window, npoints + 1);
        extended.truncate(npoints);
        Ok(extended)
    }
}

/// Symmetric window of `m >= 2` points.
fn symmetric_window(window: WindowType, m: usize) -> Vec<f64> {
    let denom = (m - 1) as f64;
    match window {
        WindowType::Boxcar => vec![1.0; m],
        WindowType::Hann => general_cosine(&[0.5, 0.5], m),
        WindowType::Blackman => general_cosine(&[0.42, 0.5, 0.08], m),
        WindowType::BlackmanHarris => general_cosine(&[0.35875, 0.48829, 0.14128, 0.01168], m),
        WindowType::Bartlett => (0..m)
            .map(|n| {
                let n = n as f64;
                if n <= denom / 2.0 {
                    2.0 * n / denom
                } else {
                    2.0 - 2.0 * n / denom
                }
            })
            .collect(),
        WindowType::Barthann => (0..m)
            .map(|n| {
                let fac = (n as f64 / denom - 0.5).abs();
                0.62 - 0.48 * fac + 0.38 * (2.0 * PI * fac).cos()
            })
            .collect(),
        WindowType::Bohman => (0..m)
            .map(|n| {
                if n == 0 || n == m - 1 {
                    return 0.0;
                }
                let fac = (-1.0 + 2.0 * n as f64 / denom).abs();
                (1.0 - fac) * (PI * fac).cos() + (PI * fac).sin() / PI
            })
            .collect(),
        WindowType::Cosine => (0..m)
            .map(|n| (PI * (n as f64 + 0.5) / m as f64).sin())
            .collect(),
        WindowType::Triangle => {
            let half = m.div_ceil(2);
            let rising: Vec<f64> = (1..=half)
                .map(|n| {
                    if m % 2 == 1 {
                        2.0 * n as f64 / (m as f64 + 1.0)
                    } else {
                        (2.0 * n as f64 - 1.0) / m as f64
                    }
                })
                .collect();
            let mirrored = if m % 2 == 1 { half - 1 } else { half };
            rising
                .iter()
                .copied()
                .chain(rising[..mirrored].iter().rev().copied())
                .collect()
        }
    }
}

/// `sum_k (-1)^k a_k cos(2 pi k n / (m - 1))`
fn general_cosine(coeffs: &[f64], m: usize) -> Vec<f64> {
    let denom = (m - 1) as f64;
    (0..m)
        .map(|n| {
            let phase = 2.0 * PI * n as f64 / denom;
            coeffs
                .iter()
                .enumerate()
                .map(|(k, &a)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * a * (k as f64 * phase).cos()
                })
                .sum()
        })
        .collect()
}
