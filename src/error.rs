//! Error types and result utilities for buffer, transform and resampler operations.

use thiserror::Error;

/// Convenience type alias for results that may contain [`EngineError`]
pub type EngineResult<T> = Result<T, EngineError>;

/// Error kinds raised by every engine in the crate.
///
/// Failures are atomic: an operation that returns an error leaves the buffer or
/// engine it was called on exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// An element kind (or kind tag) that the operation does not support.
    ///
    /// Raised for unknown dtype tags, complex data handed to a real-only
    /// transform or resampler, and malformed complex value lists.
    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),

    /// Two operands carry different element kinds.
    #[error("Dtype mismatch: expected {expected}, got {actual}")]
    DtypeMismatch {
        /// Kind the operation required.
        expected: String,
        /// Kind that was supplied.
        actual: String,
    },

    /// An axis or index range that lies outside the buffer.
    #[error("Index out of bounds: {0}")]
    OutOfBounds(String),

    /// Input dimensions that do not agree with what the engine was built for.
    #[error("Size mismatch in {context}: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Where the mismatch was detected.
        context: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// A length that cannot be used (zero transform length, empty shape, ...).
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// A configuration or control value outside its permitted domain.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The handle was explicitly invalidated and can no longer be used.
    #[error("Buffer used after invalidate")]
    UseAfterInvalidate,
}

impl EngineError {
    /// Create an unsupported dtype error
    pub fn unsupported_dtype(details: impl Into<String>) -> Self {
        Self::UnsupportedDtype(details.into())
    }

    /// Create a dtype mismatch error
    pub fn dtype_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::DtypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(details: impl Into<String>) -> Self {
        Self::OutOfBounds(details.into())
    }

    /// Create a size mismatch error
    pub fn size_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid length error
    pub fn invalid_length(details: impl Into<String>) -> Self {
        Self::InvalidLength(details.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error was caused by the caller's data rather than the engine setup.
    ///
    /// Data errors can be fixed by supplying a differently shaped or typed buffer;
    /// the engine itself remains usable.
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::DtypeMismatch { .. } | Self::SizeMismatch { .. } | Self::OutOfBounds(_)
        )
    }
}

impl From<ndarray::ShapeError> for EngineError {
    fn from(err: ndarray::ShapeError) -> Self {
        match err.kind() {
            ndarray::ErrorKind::OutOfBounds => Self::OutOfBounds(format!("array layout: {err}")),
            _ => Self::InvalidLength(format!("array layout: {err}")),
        }
    }
}

impl From<rubato::ResampleError> for EngineError {
    fn from(err: rubato::ResampleError) -> Self {
        match err {
            rubato::ResampleError::WrongNumberOfInputChannels {
                expected, actual, ..
            } => {
                Self::size_mismatch("resampler input channels", expected, actual)
            }
            rubato::ResampleError::InsufficientInputBufferSize {
                expected, actual, ..
            } => Self::size_mismatch("resampler input frames", expected, actual),
            rubato::ResampleError::RatioOutOfBounds { .. } => {
                Self::invalid_parameter("resample_ratio", err.to_string())
            }
            _ => Self::invalid_parameter("resampler", err.to_string()),
        }
    }
}

impl From<rubato::ResamplerConstructionError> for EngineError {
    fn from(err: rubato::ResamplerConstructionError) -> Self {
        Self::invalid_parameter("resampler", err.to_string())
    }
}
