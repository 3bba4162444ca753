//! Stateful forward and inverse FFT engines.
//!
//! [`Fft<T>`] is planned once for a fixed length and mode, then applied to any
//! buffer whose last axis matches. Leading axes are treated as a batch: every
//! lane along the last axis is transformed independently, and with the
//! `parallel-processing` feature the lanes are spread over the rayon pool.
//! Results are always freshly owned buffers.
//!
//! [`FftEngine`] picks the precision at runtime from a [`DataType`].
//!
//! ```rust
//! use sample_engine::{DataType, FftEngine, FftMode, SampleBuffer};
//!
//! let signal = SampleBuffer::new(&[1.0, 0.0, -1.0, 0.0], &[4], DataType::Float64).unwrap();
//! let mut rfft = FftEngine::new(4, DataType::Float64, FftMode::RealForward).unwrap();
//! let spectrum = rfft.process(&signal).unwrap();
//! assert_eq!(spectrum.shape().unwrap(), &[3]);
//! assert_eq!(spectrum.dtype().unwrap(), DataType::Complex64);
//! ```

use num_complex::Complex;
use num_traits::Zero;
use tracing::{debug, trace};

use super::fft_backends::FftKernel;
use super::types::FftMode;
use crate::dtype::check_dtype;
use crate::{DataType, EngineError, EngineResult, HArray, RealFloat, SampleBuffer, to_precision};

/// Typed transform engine for one length, mode and precision.
pub struct Fft<T: RealFloat> {
    length: usize,
    mode: FftMode,
    complex_domain: bool,
    kernel: FftKernel<T>,
}

impl<T: RealFloat> Fft<T> {
    /// Plan a transform of `length` points.
    ///
    /// `complex_domain` selects complex time-domain data (complex engine dtype)
    /// instead of real data.
    ///
    /// # Errors
    /// - [`EngineError::InvalidLength`] if `length` is zero
    /// - [`EngineError::UnsupportedDtype`] for a real-optimized mode in the complex domain
    pub fn new(length: usize, mode: FftMode, complex_domain: bool) -> EngineResult<Self> {
        if length == 0 {
            return Err(EngineError::invalid_length("transform length must be > 0"));
        }
        if mode.is_real() && complex_domain {
            return Err(EngineError::unsupported_dtype(format!(
                "{mode} transforms need a real dtype, got {}",
                T::COMPLEX_DTYPE
            )));
        }
        let kernel = match mode {
            FftMode::Forward => FftKernel::complex(length, false),
            FftMode::Inverse => FftKernel::complex(length, true),
            FftMode::RealForward => FftKernel::real_forward(length),
            FftMode::RealInverse => FftKernel::real_inverse(length),
        };
        debug!(length, %mode, complex_domain, "planned fft");
        Ok(Self {
            length,
            mode,
            complex_domain,
            kernel,
        })
    }

    /// Time-domain transform length.
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Configured mode.
    pub const fn mode(&self) -> FftMode {
        self.mode
    }

    /// Number of bins produced by the real forward transform.
    pub const fn real_bins(&self) -> usize {
        self.length / 2 + 1
    }

    /// Dtype of the time-domain side.
    pub const fn dtype(&self) -> DataType {
        if self.complex_domain {
            T::COMPLEX_DTYPE
        } else {
            T::DTYPE
        }
    }

    /// Dtype `process` accepts.
    pub const fn input_dtype(&self) -> DataType {
        match self.mode {
            FftMode::Forward | FftMode::RealForward => self.dtype(),
            FftMode::Inverse | FftMode::RealInverse => T::COMPLEX_DTYPE,
        }
    }

    /// Dtype `process` returns.
    pub const fn output_dtype(&self) -> DataType {
        match self.mode {
            FftMode::Forward | FftMode::RealForward => T::COMPLEX_DTYPE,
            FftMode::Inverse | FftMode::RealInverse => self.dtype(),
        }
    }

    /// Last-axis length `process` accepts.
    pub const fn input_len(&self) -> usize {
        match self.mode {
            FftMode::RealInverse => self.real_bins(),
            _ => self.length,
        }
    }

    /// Last-axis length `process` returns.
    pub const fn output_len(&self) -> usize {
        match self.mode {
            FftMode::RealForward => self.real_bins(),
            _ => self.length,
        }
    }

    /// Apply the transform along the last axis of `input`.
    ///
    /// # Errors
    /// - [`EngineError::DtypeMismatch`] if `input` is not of [`input_dtype`](Self::input_dtype)
    /// - [`EngineError::SizeMismatch`] if the last axis is not [`input_len`](Self::input_len)
    pub fn process(&mut self, input: &SampleBuffer) -> EngineResult<SampleBuffer> {
        check_dtype(self.input_dtype(), input.dtype()?)?;
        let output = match (self.mode, self.complex_domain) {
            (FftMode::Forward, false) => {
                let (shape, data) = self.lanes(input.array::<T>()?)?;
                let data = data.into_iter().map(|re| Complex::new(re, T::zero())).collect();
                T::wrap_complex(self.complex_batch(&shape, data)?).into()
            }
            (FftMode::Forward | FftMode::Inverse, true) => {
                let (shape, data) = self.lanes(self.complex_array(input)?)?;
                T::wrap_complex(self.complex_batch(&shape, data)?).into()
            }
            (FftMode::Inverse, false) => {
                let (shape, data) = self.lanes(self.complex_array(input)?)?;
                self.complex_batch(&shape, data)?.map(|c| c.re).into()
            }
            (FftMode::RealForward, _) => {
                let (shape, mut data) = self.lanes(input.array::<T>()?)?;
                let spectrum = self.forward_real(&mut data)?;
                T::wrap_complex(HArray::from_shape_vec(&self.output_shape(&shape), spectrum)?).into()
            }
            (FftMode::RealInverse, _) => {
                let (shape, mut data) = self.lanes(self.complex_array(input)?)?;
                let signal = self.inverse_real(&mut data)?;
                HArray::from_shape_vec(&self.output_shape(&shape), signal)?.into()
            }
        };
        Ok(output)
    }

    /// Real forward transform of back-to-back lanes of `length` samples.
    ///
    /// `signal` is clobbered.
    fn forward_real(&mut self, signal: &mut [T]) -> EngineResult<Vec<Complex<T>>> {
        let lanes = signal.len() / self.length;
        let mut spectrum = vec![Complex::zero(); lanes * self.real_bins()];
        self.kernel.process_real_forward(signal, &mut spectrum)?;
        Ok(spectrum)
    }

    /// Normalised real inverse transform of back-to-back lanes of `length/2 + 1` bins.
    ///
    /// `spectrum` is clobbered.
    fn inverse_real(&mut self, spectrum: &mut [Complex<T>]) -> EngineResult<Vec<T>> {
        let lanes = spectrum.len() / self.real_bins();
        let mut signal = vec![T::zero(); lanes * self.length];
        self.kernel.process_real_inverse(spectrum, &mut signal)?;
        let scale = T::one() / to_precision::<T>(self.length as f64);
        signal.iter_mut().for_each(|s| *s = *s * scale);
        Ok(signal)
    }

    fn complex_array<'a>(&self, input: &'a SampleBuffer) -> EngineResult<&'a HArray<Complex<T>>> {
        let data = input.data()?;
        T::complex_ref(data).ok_or_else(|| EngineError::dtype_mismatch(T::COMPLEX_DTYPE, data.dtype()))
    }

    /// Shape and row-major elements of `array`, after checking its last axis.
    fn lanes<E: Copy>(&self, array: &HArray<E>) -> EngineResult<(Vec<usize>, Vec<E>)> {
        let shape = array.shape();
        let last = shape[shape.len() - 1];
        if last != self.input_len() {
            return Err(EngineError::size_mismatch(
                format!("{} transform last axis", self.mode),
                self.input_len(),
                last,
            ));
        }
        Ok((shape.to_vec(), array.to_vec()))
    }

    fn output_shape(&self, input_shape: &[usize]) -> Vec<usize> {
        let mut shape = input_shape.to_vec();
        let last = shape.len() - 1;
        shape[last] = self.output_len();
        shape
    }

    fn complex_batch(
        &mut self,
        shape: &[usize],
        mut data: Vec<Complex<T>>,
    ) -> EngineResult<HArray<Complex<T>>> {
        trace!(lanes = data.len() / self.length, length = self.length, "complex fft batch");
        self.kernel.process_complex(&mut data)?;
        if self.mode.is_inverse() {
            let scale = T::one() / to_precision::<T>(self.length as f64);
            data.iter_mut().for_each(|c| *c = c.scale(scale));
        }
        HArray::from_shape_vec(&self.output_shape(shape), data)
    }
}

enum Precision {
    Single(Fft<f32>),
    Double(Fft<f64>),
}

/// Transform engine whose precision is chosen at runtime.
pub struct FftEngine {
    dtype: DataType,
    inner: Precision,
}

impl FftEngine {
    /// Plan a transform of `length` points for buffers of `dtype`.
    ///
    /// `dtype` names the time-domain element kind: a real kind means real
    /// signals, a complex kind means complex signals.
    ///
    /// # Errors
    /// - [`EngineError::InvalidLength`] if `length` is zero
    /// - [`EngineError::UnsupportedDtype`] if `mode` is real-optimized and `dtype` is complex
    pub fn new(length: usize, dtype: DataType, mode: FftMode) -> EngineResult<Self> {
        let complex_domain = dtype.is_complex();
        let inner = if dtype.is_double_precision() {
            Precision::Double(Fft::new(length, mode, complex_domain)?)
        } else {
            Precision::Single(Fft::new(length, mode, complex_domain)?)
        };
        Ok(Self { dtype, inner })
    }

    /// Time-domain dtype the engine was built for.
    pub const fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Transform length.
    pub const fn length(&self) -> usize {
        match &self.inner {
            Precision::Single(fft) => fft.length(),
            Precision::Double(fft) => fft.length(),
        }
    }

    /// Configured mode.
    pub const fn mode(&self) -> FftMode {
        match &self.inner {
            Precision::Single(fft) => fft.mode(),
            Precision::Double(fft) => fft.mode(),
        }
    }

    /// Apply the transform along the last axis of `input`.
    pub fn process(&mut self, input: &SampleBuffer) -> EngineResult<SampleBuffer> {
        match &mut self.inner {
            Precision::Single(fft) => fft.process(input),
            Precision::Double(fft) => fft.process(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::comparison::max_abs_diff;

    fn test_signal(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (i as f64 * 0.37).sin() + 0.25 * (i as f64 * 1.3).cos())
            .collect()
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            FftEngine::new(0, DataType::Float32, FftMode::Forward),
            Err(EngineError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_real_mode_rejects_complex_dtype() {
        for mode in [FftMode::RealForward, FftMode::RealInverse] {
            assert!(matches!(
                FftEngine::new(8, DataType::Complex64, mode),
                Err(EngineError::UnsupportedDtype(_))
            ));
        }
    }

    #[test]
    fn test_real_forward_bin_count() {
        for len in [1usize, 2, 7, 8, 63, 64] {
            let signal = SampleBuffer::new(&test_signal(len), &[len], DataType::Float32).unwrap();
            let mut engine = FftEngine::new(len, DataType::Float32, FftMode::RealForward).unwrap();
            let spectrum = engine.process(&signal).unwrap();
            assert_eq!(spectrum.shape().unwrap(), &[len / 2 + 1]);
            assert_eq!(spectrum.dtype().unwrap(), DataType::Complex32);
        }
    }

    #[test]
    fn test_forward_of_real_input_matches_dft() {
        let values = test_signal(6);
        let signal = SampleBuffer::new(&values, &[6], DataType::Float64).unwrap();
        let mut engine = FftEngine::new(6, DataType::Float64, FftMode::Forward).unwrap();
        let spectrum = engine.process(&signal).unwrap();
        let bins = spectrum.array::<Complex<f64>>().unwrap().to_vec();

        for (k, bin) in bins.iter().enumerate() {
            let expected: Complex<f64> = values
                .iter()
                .enumerate()
                .map(|(n, &x)| {
                    let phase = -2.0 * std::f64::consts::PI * (k * n) as f64 / 6.0;
                    Complex::new(x * phase.cos(), x * phase.sin())
                })
                .sum();
            assert!((*bin - expected).norm() < 1e-10, "bin {k}: {bin} vs {expected}");
        }
    }

    #[test]
    fn test_complex_round_trip() {
        let values: Vec<f64> = test_signal(16);
        let signal = SampleBuffer::new(&values, &[8], DataType::Complex64).unwrap();
        let mut forward = FftEngine::new(8, DataType::Complex64, FftMode::Forward).unwrap();
        let mut inverse = FftEngine::new(8, DataType::Complex64, FftMode::Inverse).unwrap();
        let restored = inverse.process(&forward.process(&signal).unwrap()).unwrap();
        assert!(max_abs_diff(&restored, &signal).unwrap() < 1e-12);
    }

    #[test]
    fn test_inverse_to_real_dtype() {
        let values = test_signal(10);
        let signal = SampleBuffer::new(&values, &[10], DataType::Float64).unwrap();
        let mut forward = FftEngine::new(10, DataType::Float64, FftMode::Forward).unwrap();
        let mut inverse = FftEngine::new(10, DataType::Float64, FftMode::Inverse).unwrap();
        let restored = inverse.process(&forward.process(&signal).unwrap()).unwrap();
        assert_eq!(restored.dtype().unwrap(), DataType::Float64);
        assert!(max_abs_diff(&restored, &signal).unwrap() < 1e-12);
    }

    #[test]
    fn test_batch_lanes_are_independent() {
        let values = test_signal(24);
        let batch = SampleBuffer::new(&values, &[2, 3, 4], DataType::Float64).unwrap();
        let mut engine = FftEngine::new(4, DataType::Float64, FftMode::RealForward).unwrap();
        let spectrum = engine.process(&batch).unwrap();
        assert_eq!(spectrum.shape().unwrap(), &[2, 3, 3]);

        let lane = SampleBuffer::new(&values[12..16], &[4], DataType::Float64).unwrap();
        let single = engine.process(&lane).unwrap();
        let from_batch = spectrum.slice(0, 1..2).unwrap().slice(1, 0..1).unwrap();
        assert_eq!(
            from_batch.to_host_values().unwrap(),
            single.to_host_values().unwrap()
        );
    }

    #[test]
    fn test_output_is_freshly_owned() {
        let signal = SampleBuffer::new(&test_signal(8), &[8], DataType::Float32).unwrap();
        let _alias = signal.clone();
        let mut engine = FftEngine::new(8, DataType::Float32, FftMode::RealForward).unwrap();
        let spectrum = engine.process(&signal).unwrap();
        assert!(spectrum.is_unique().unwrap());
        assert!(spectrum.is_standard_layout().unwrap());
    }

    #[test]
    fn test_size_and_dtype_mismatch() {
        let mut engine = FftEngine::new(8, DataType::Float32, FftMode::RealForward).unwrap();
        let short = SampleBuffer::new(&test_signal(6), &[6], DataType::Float32).unwrap();
        assert!(matches!(
            engine.process(&short),
            Err(EngineError::SizeMismatch { expected: 8, actual: 6, .. })
        ));
        let wrong_kind = SampleBuffer::new(&test_signal(8), &[8], DataType::Float64).unwrap();
        assert!(matches!(
            engine.process(&wrong_kind),
            Err(EngineError::DtypeMismatch { .. })
        ));

        let mut irfft = FftEngine::new(8, DataType::Float32, FftMode::RealInverse).unwrap();
        let eight_bins = SampleBuffer::new(&test_signal(16), &[8], DataType::Complex32).unwrap();
        assert!(matches!(
            irfft.process(&eight_bins),
            Err(EngineError::SizeMismatch { expected: 5, actual: 8, .. })
        ));
    }

    #[test]
    fn test_invalidated_input() {
        let mut signal = SampleBuffer::new(&test_signal(4), &[4], DataType::Float32).unwrap();
        signal.invalidate();
        let mut engine = FftEngine::new(4, DataType::Float32, FftMode::Forward).unwrap();
        assert_eq!(
            engine.process(&signal).err(),
            Some(EngineError::UseAfterInvalidate)
        );
    }
}
