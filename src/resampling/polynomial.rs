//! Polynomial degrees of the fast resampler.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// Degree of the polynomial fitted through the samples around each output position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum PolynomialDegree {
    /// Nearest input sample, no interpolation.
    Nearest,
    /// Straight line through the two surrounding samples.
    Linear,
    /// Cubic through four samples.
    #[default]
    Cubic,
    /// Quintic through six samples.
    Quintic,
    /// Septic through eight samples.
    Septic,
}

impl PolynomialDegree {
    /// Lower-case name used by `Display` and `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Cubic => "cubic",
            Self::Quintic => "quintic",
            Self::Septic => "septic",
        }
    }
}

impl fmt::Display for PolynomialDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolynomialDegree {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "cubic" => Ok(Self::Cubic),
            "quintic" => Ok(Self::Quintic),
            "septic" => Ok(Self::Septic),
            other => Err(EngineError::invalid_parameter(
                "degree",
                format!("unknown polynomial degree '{other}'"),
            )),
        }
    }
}

impl From<PolynomialDegree> for rubato::PolynomialDegree {
    fn from(degree: PolynomialDegree) -> Self {
        match degree {
            PolynomialDegree::Nearest => Self::Nearest,
            PolynomialDegree::Linear => Self::Linear,
            PolynomialDegree::Cubic => Self::Cubic,
            PolynomialDegree::Quintic => Self::Quintic,
            PolynomialDegree::Septic => Self::Septic,
        }
    }
}
