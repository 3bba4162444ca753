//! Short-time Fourier transform.
//!
//! The signal along the last axis is cut into frames of the transform length,
//! advancing by the hop length. Each frame is multiplied by the window and
//! transformed independently. Only frames that fit entirely inside the signal
//! are produced.
//!
//! The output has shape `leading_axes ++ [n_frames, bins]`, so for a 1-D signal
//! the frame axis becomes the new leading axis.

use std::ops::Mul;

use tracing::debug;

use super::fft::Fft;
use super::types::FftMode;
use crate::dtype::check_dtype;
use crate::windows::{StandardWindows, WindowFunction, WindowType};
use crate::{DataType, EngineError, EngineResult, HArray, RealFloat, SampleBuffer, to_precision};

/// Fit `coefficients` to a frame of `frame_len` points, keeping it centred.
///
/// Shorter windows are zero-padded on both sides, longer ones are trimmed.
fn fit_window(coefficients: &[f64], frame_len: usize) -> Vec<f64> {
    let window_len = coefficients.len();
    if window_len <= frame_len {
        let left = (frame_len - window_len) / 2;
        let mut padded = vec![0.0; frame_len];
        padded[left..left + window_len].copy_from_slice(coefficients);
        padded
    } else {
        let start = (window_len - frame_len) / 2;
        coefficients[start..start + frame_len].to_vec()
    }
}

/// Typed short-time transform.
pub struct Stft<T: RealFloat> {
    fft: Fft<T>,
    hop_length: usize,
    window: Vec<T>,
}

impl<T: RealFloat> Stft<T> {
    /// Build a short-time transform.
    ///
    /// # Arguments
    /// * `fft_length` - Frame and transform length
    /// * `hop_length` - Distance between the starts of successive frames
    /// * `window_length` - Declared length of `window`
    /// * `window` - Window coefficients, fitted to `fft_length` by centred padding or trimming
    /// * `mode` - [`FftMode::Forward`] for full spectra or [`FftMode::RealForward`] for `fft_length/2 + 1` bins
    /// * `complex_domain` - Whether input frames are complex
    ///
    /// # Errors
    /// - [`EngineError::InvalidLength`] if `fft_length` or `window_length` is zero
    /// - [`EngineError::InvalidParameter`] if `hop_length` is zero or `mode` is an inverse mode
    /// - [`EngineError::SizeMismatch`] if `window.len() != window_length`
    /// - [`EngineError::UnsupportedDtype`] for a real-forward transform of complex frames
    pub fn new(
        fft_length: usize,
        hop_length: usize,
        window_length: usize,
        window: &[f64],
        mode: FftMode,
        complex_domain: bool,
    ) -> EngineResult<Self> {
        if window_length == 0 {
            return Err(EngineError::invalid_length("window length must be > 0"));
        }
        if hop_length == 0 {
            return Err(EngineError::invalid_parameter("hop_length", "must be > 0"));
        }
        if mode.is_inverse() {
            return Err(EngineError::invalid_parameter(
                "mode",
                format!("short-time transforms run forward only, got {mode}"),
            ));
        }
        if window.len() != window_length {
            return Err(EngineError::size_mismatch(
                "window coefficients",
                window_length,
                window.len(),
            ));
        }
        let fft = Fft::new(fft_length, mode, complex_domain)?;
        let window = fit_window(window, fft_length)
            .into_iter()
            .map(to_precision)
            .collect();
        debug!(fft_length, hop_length, window_length, %mode, "planned stft");
        Ok(Self {
            fft,
            hop_length,
            window,
        })
    }

    /// Frame length.
    pub const fn fft_length(&self) -> usize {
        self.fft.length()
    }

    /// Hop between frames.
    pub const fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of whole frames in a signal of `n_samples`.
    pub const fn n_frames(&self, n_samples: usize) -> usize {
        if n_samples < self.fft.length() {
            0
        } else {
            1 + (n_samples - self.fft.length()) / self.hop_length
        }
    }

    /// Transform every frame of the last axis of `input`.
    ///
    /// # Errors
    /// - [`EngineError::DtypeMismatch`] for input of the wrong element kind
    /// - [`EngineError::SizeMismatch`] if the signal is shorter than one frame
    pub fn process(&mut self, input: &SampleBuffer) -> EngineResult<SampleBuffer> {
        check_dtype(self.fft.input_dtype(), input.dtype()?)?;
        let frames: SampleBuffer = match input.data()? {
            data if data.dtype() == T::DTYPE => self.frame(input.array::<T>()?)?.into(),
            data => {
                let array = T::complex_ref(data).ok_or_else(|| {
                    EngineError::dtype_mismatch(self.fft.input_dtype(), data.dtype())
                })?;
                T::wrap_complex(self.frame(array)?).into()
            }
        };
        self.fft.process(&frames)
    }

    /// Cut each lane into windowed frames laid out as `leading ++ [n_frames, fft_length]`.
    fn frame<E>(&self, array: &HArray<E>) -> EngineResult<HArray<E>>
    where
        E: Copy + Mul<T, Output = E>,
    {
        let shape = array.shape();
        let n_samples = shape[shape.len() - 1];
        let frame_len = self.fft.length();
        let n_frames = self.n_frames(n_samples);
        if n_frames == 0 {
            return Err(EngineError::size_mismatch(
                "short-time transform needs at least one full frame",
                frame_len,
                n_samples,
            ));
        }

        let signal = array.to_vec();
        let mut frames = Vec::with_capacity(signal.len() / n_samples * n_frames * frame_len);
        for lane in signal.chunks_exact(n_samples) {
            for frame in 0..n_frames {
                let start = frame * self.hop_length;
                frames.extend(
                    lane[start..start + frame_len]
                        .iter()
                        .zip(&self.window)
                        .map(|(&x, &w)| x * w),
                );
            }
        }

        let mut out_shape = shape[..shape.len() - 1].to_vec();
        out_shape.extend([n_frames, frame_len]);
        HArray::from_shape_vec(&out_shape, frames)
    }
}

enum Precision {
    Single(Stft<f32>),
    Double(Stft<f64>),
}

/// Short-time transform whose precision is chosen at runtime.
pub struct StftEngine {
    dtype: DataType,
    inner: Precision,
}

impl StftEngine {
    /// Build a short-time transform for signals of `dtype`.
    ///
    /// See [`Stft::new`] for the meaning of the arguments and the errors.
    pub fn new(
        fft_length: usize,
        hop_length: usize,
        window_length: usize,
        window: &[f64],
        dtype: DataType,
        mode: FftMode,
    ) -> EngineResult<Self> {
        let complex_domain = dtype.is_complex();
        let inner = if dtype.is_double_precision() {
            Precision::Double(Stft::new(
                fft_length,
                hop_length,
                window_length,
                window,
                mode,
                complex_domain,
            )?)
        } else {
            Precision::Single(Stft::new(
                fft_length,
                hop_length,
                window_length,
                window,
                mode,
                complex_domain,
            )?)
        };
        Ok(Self { dtype, inner })
    }

    /// Build a short-time transform using a named window from [`StandardWindows`].
    ///
    /// The window is periodic, as is usual for spectral analysis.
    pub fn with_window(
        fft_length: usize,
        hop_length: usize,
        window_length: usize,
        window: WindowType,
        dtype: DataType,
        mode: FftMode,
    ) -> EngineResult<Self> {
        let coefficients = StandardWindows.coefficients(window, window_length, false)?;
        Self::new(fft_length, hop_length, window_length, &coefficients, dtype, mode)
    }

    /// Signal dtype the engine was built for.
    pub const fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Transform every frame of the last axis of `input`.
    pub fn process(&mut self, input: &SampleBuffer) -> EngineResult<SampleBuffer> {
        match &mut self.inner {
            Precision::Single(stft) => stft.process(input),
            Precision::Double(stft) => stft.process(input),
        }
    }
}
