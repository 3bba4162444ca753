//! Element kinds and the type-level traits that tie Rust element types to them.
//!
//! Every buffer holds one of four element kinds. The [`Element`] trait maps the
//! concrete Rust types (`f32`, `f64`, `Complex<f32>`, `Complex<f64>`) to their
//! [`DataType`] tag and lets generic code move typed arrays in and out of the
//! dynamically typed [`BufferData`](crate::repr::BufferData).

use std::fmt;
use std::fmt::{Debug, Display};
use std::str::FromStr;

use num_complex::Complex;
use num_traits::{Float, FloatConst, NumCast, Zero};
use rustfft::FftNum;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::repr::{BufferData, HArray};
use crate::{EngineError, EngineResult};

/// Element kind tag carried by every buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum DataType {
    /// 32-bit real
    Float32,
    /// 64-bit real
    Float64,
    /// Complex with 32-bit parts
    Complex32,
    /// Complex with 64-bit parts
    Complex64,
}

impl DataType {
    /// Whether the kind stores complex values.
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex32 | Self::Complex64)
    }

    /// Whether the kind uses 64-bit components.
    pub const fn is_double_precision(self) -> bool {
        matches!(self, Self::Float64 | Self::Complex64)
    }

    /// The real kind with the same component precision.
    pub const fn real(self) -> Self {
        match self {
            Self::Float32 | Self::Complex32 => Self::Float32,
            Self::Float64 | Self::Complex64 => Self::Float64,
        }
    }

    /// The complex kind with the same component precision.
    pub const fn complex(self) -> Self {
        match self {
            Self::Float32 | Self::Complex32 => Self::Complex32,
            Self::Float64 | Self::Complex64 => Self::Complex64,
        }
    }

    /// Lower-case tag used by `Display` and `FromStr`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex32 => "complex32",
            Self::Complex64 => "complex64",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "float32" | "f32" => Ok(Self::Float32),
            "float64" | "f64" => Ok(Self::Float64),
            "complex32" | "c32" => Ok(Self::Complex32),
            "complex64" | "c64" => Ok(Self::Complex64),
            other => Err(EngineError::unsupported_dtype(format!(
                "unknown dtype tag '{other}'"
            ))),
        }
    }
}

/// A Rust type that can be stored in a buffer.
pub trait Element: Copy + PartialEq + Debug + Display + Zero + Send + Sync + 'static {
    /// Kind tag of this element type.
    const DTYPE: DataType;

    /// Wrap a typed array into the dynamically typed representation.
    fn wrap(array: HArray<Self>) -> BufferData;

    /// Borrow the typed array if `data` holds this element type.
    fn downcast_ref(data: &BufferData) -> Option<&HArray<Self>>;

    /// Mutably borrow the typed array if `data` holds this element type.
    fn downcast_mut(data: &mut BufferData) -> Option<&mut HArray<Self>>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DataType = DataType::$variant;

            fn wrap(array: HArray<Self>) -> BufferData {
                BufferData::$variant(array)
            }

            fn downcast_ref(data: &BufferData) -> Option<&HArray<Self>> {
                match data {
                    BufferData::$variant(array) => Some(array),
                    _ => None,
                }
            }

            fn downcast_mut(data: &mut BufferData) -> Option<&mut HArray<Self>> {
                match data {
                    BufferData::$variant(array) => Some(array),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(f32, Float32);
impl_element!(f64, Float64);
impl_element!(Complex<f32>, Complex32);
impl_element!(Complex<f64>, Complex64);

/// Marker trait for real floating-point types (f32, f64)
///
/// Bundles everything the transform and resampling engines need from a sample
/// type, including access to the complex element kind of the same precision.
pub trait RealFloat: Float + FloatConst + NumCast + FftNum + Element + Default {
    /// Complex kind with this component precision.
    const COMPLEX_DTYPE: DataType;

    /// Lossy `as` conversion from `f64`.
    fn cast_f64(value: f64) -> Self;

    /// Lossless widening to `f64`.
    fn widen(self) -> f64;

    /// Wrap a complex array of this precision.
    fn wrap_complex(array: HArray<Complex<Self>>) -> BufferData;

    /// Borrow a complex array of this precision.
    fn complex_ref(data: &BufferData) -> Option<&HArray<Complex<Self>>>;
}

impl RealFloat for f32 {
    const COMPLEX_DTYPE: DataType = DataType::Complex32;

    fn cast_f64(value: f64) -> Self {
        value as f32
    }

    fn widen(self) -> f64 {
        <f64 as From<f32>>::from(self)
    }

    fn wrap_complex(array: HArray<Complex<Self>>) -> BufferData {
        BufferData::Complex32(array)
    }

    fn complex_ref(data: &BufferData) -> Option<&HArray<Complex<Self>>> {
        <Complex<f32> as Element>::downcast_ref(data)
    }
}

impl RealFloat for f64 {
    const COMPLEX_DTYPE: DataType = DataType::Complex64;

    fn cast_f64(value: f64) -> Self {
        value
    }

    fn widen(self) -> f64 {
        self
    }

    fn wrap_complex(array: HArray<Complex<Self>>) -> BufferData {
        BufferData::Complex64(array)
    }

    fn complex_ref(data: &BufferData) -> Option<&HArray<Complex<Self>>> {
        <Complex<f64> as Element>::downcast_ref(data)
    }
}

/// Convert an `f64` value into the working precision `F`.
///
/// Lets generic numeric code be written once and run at either `f32` or `f64`
/// precision without sprinkling `as` conversions around.
///
/// # Examples
/// ```
/// use sample_engine::to_precision;
///
/// let half: f32 = to_precision(0.5);
/// assert_eq!(half, 0.5f32);
/// ```
#[inline]
pub fn to_precision<F: RealFloat>(value: f64) -> F {
    F::cast_f64(value)
}

/// Ensure `actual` equals `expected`, producing a [`EngineError::DtypeMismatch`] otherwise.
pub fn check_dtype(expected: DataType, actual: DataType) -> EngineResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(EngineError::dtype_mismatch(expected, actual))
    }
}
