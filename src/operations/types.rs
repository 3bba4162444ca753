//! Parameter types shared by the transform engines.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// Direction and flavour of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum FftMode {
    /// Full complex forward transform; real input is promoted to complex.
    Forward,
    /// Full complex inverse transform, normalised by `1/length`.
    ///
    /// With a real engine dtype the real part of the result is returned.
    Inverse,
    /// Real-input forward transform producing `length/2 + 1` bins.
    RealForward,
    /// Inverse of [`FftMode::RealForward`], producing `length` real samples.
    RealInverse,
}

impl FftMode {
    /// Whether the mode uses the real-optimized transform.
    pub const fn is_real(self) -> bool {
        matches!(self, Self::RealForward | Self::RealInverse)
    }

    /// Whether the mode maps spectra back to the time domain.
    pub const fn is_inverse(self) -> bool {
        matches!(self, Self::Inverse | Self::RealInverse)
    }

    /// Lower-case name used by `Display` and `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Inverse => "inverse",
            Self::RealForward => "real_forward",
            Self::RealInverse => "real_inverse",
        }
    }
}

impl fmt::Display for FftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FftMode {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "forward" | "fft" => Ok(Self::Forward),
            "inverse" | "ifft" => Ok(Self::Inverse),
            "real_forward" | "rfft" => Ok(Self::RealForward),
            "real_inverse" | "irfft" => Ok(Self::RealInverse),
            other => Err(EngineError::invalid_parameter(
                "mode",
                format!("unknown transform mode '{other}'"),
            )),
        }
    }
}
