//! Filter design parameters of the windowed-sinc resampler.
//!
//! The types mirror `rubato`'s and convert into them with `From`.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// How values between the tabulated sinc offsets are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SincInterpolationType {
    /// Closest tabulated offset, no interpolation.
    Nearest,
    /// Linear blend of the two surrounding offsets.
    #[default]
    Linear,
    /// Quadratic polynomial through three offsets.
    Quadratic,
    /// Cubic polynomial through four offsets.
    Cubic,
}

impl SincInterpolationType {
    /// Lower-case name used by `Display` and `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
        }
    }
}

impl fmt::Display for SincInterpolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SincInterpolationType {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "quadratic" => Ok(Self::Quadratic),
            "cubic" => Ok(Self::Cubic),
            other => Err(EngineError::invalid_parameter(
                "interpolation",
                format!("unknown sinc interpolation '{other}'"),
            )),
        }
    }
}

impl From<SincInterpolationType> for rubato::SincInterpolationType {
    fn from(interpolation: SincInterpolationType) -> Self {
        match interpolation {
            SincInterpolationType::Nearest => Self::Nearest,
            SincInterpolationType::Linear => Self::Linear,
            SincInterpolationType::Quadratic => Self::Quadratic,
            SincInterpolationType::Cubic => Self::Cubic,
        }
    }
}

/// Window applied to the sinc kernel.
///
/// The `2` variants are the squared windows: slower roll-off, higher
/// stop-band attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SincWindow {
    /// Blackman
    Blackman,
    /// Squared Blackman
    Blackman2,
    /// Blackman-Harris
    BlackmanHarris,
    /// Squared Blackman-Harris
    #[default]
    BlackmanHarris2,
    /// Hann
    Hann,
    /// Squared Hann
    Hann2,
}

impl SincWindow {
    /// Lower-case name used by `Display` and `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blackman => "blackman",
            Self::Blackman2 => "blackman2",
            Self::BlackmanHarris => "blackmanharris",
            Self::BlackmanHarris2 => "blackmanharris2",
            Self::Hann => "hann",
            Self::Hann2 => "hann2",
        }
    }
}

impl fmt::Display for SincWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SincWindow {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "blackman" => Ok(Self::Blackman),
            "blackman2" => Ok(Self::Blackman2),
            "blackmanharris" => Ok(Self::BlackmanHarris),
            "blackmanharris2" => Ok(Self::BlackmanHarris2),
            "hann" => Ok(Self::Hann),
            "hann2" => Ok(Self::Hann2),
            _ => Err(EngineError::invalid_parameter(
                "window",
                format!("unknown sinc window '{s}'"),
            )),
        }
    }
}

impl From<SincWindow> for rubato::WindowFunction {
    fn from(window: SincWindow) -> Self {
        match window {
            SincWindow::Blackman => Self::Blackman,
            SincWindow::Blackman2 => Self::Blackman2,
            SincWindow::BlackmanHarris => Self::BlackmanHarris,
            SincWindow::BlackmanHarris2 => Self::BlackmanHarris2,
            SincWindow::Hann => Self::Hann,
            SincWindow::Hann2 => Self::Hann2,
        }
    }
}

/// Filter design parameters of the sinc resampler.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SincInterpolationParameters {
    /// Length of the windowed sinc filter, rounded up to a multiple of 8.
    pub sinc_len: usize,
    /// Cutoff relative to the lower of the two Nyquist frequencies, in `(0, 1)`.
    pub f_cutoff: f32,
    /// Tabulated sub-sample offsets per input sample.
    pub oversampling_factor: usize,
    /// How values between tabulated offsets are computed.
    pub interpolation: SincInterpolationType,
    /// Window applied to the sinc.
    pub window: SincWindow,
}

impl Default for SincInterpolationParameters {
    fn default() -> Self {
        Self {
            sinc_len: 256,
            f_cutoff: 0.95,
            oversampling_factor: 128,
            interpolation: SincInterpolationType::Linear,
            window: SincWindow::BlackmanHarris2,
        }
    }
}

impl SincInterpolationParameters {
    /// Check every field is usable.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> EngineResult<()> {
        if self.sinc_len == 0 {
            return Err(EngineError::invalid_parameter("sinc_len", "must be >= 1"));
        }
        if !(self.f_cutoff > 0.0 && self.f_cutoff < 1.0) {
            return Err(EngineError::invalid_parameter(
                "f_cutoff",
                format!("must lie in (0, 1), got {}", self.f_cutoff),
            ));
        }
        if self.oversampling_factor == 0 {
            return Err(EngineError::invalid_parameter(
                "oversampling_factor",
                "must be >= 1",
            ));
        }
        Ok(())
    }
}

impl From<SincInterpolationParameters> for rubato::SincInterpolationParameters {
    fn from(parameters: SincInterpolationParameters) -> Self {
        Self {
            sinc_len: parameters.sinc_len,
            f_cutoff: parameters.f_cutoff,
            oversampling_factor: parameters.oversampling_factor,
            interpolation: parameters.interpolation.into(),
            window: parameters.window.into(),
        }
    }
}
