//! FFT kernels backing the transform engines.
//!
//! Complex transforms run on `rustfft`; the real-input transforms run on
//! `realfft`, which packs a length-`n` real transform into a length-`n/2`
//! complex one. A kernel owns its plan and a scratch buffer that is reused
//! across calls, and works on any number of back-to-back lanes.

use std::sync::Arc;

use num_complex::Complex;
use num_traits::Zero;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::FftPlanner;

use crate::{EngineError, EngineResult, RealFloat};

/// A planned transform of one fixed length.
pub(crate) enum FftKernel<T: RealFloat> {
    /// Complex-to-complex, forward or inverse.
    Complex {
        plan: Arc<dyn rustfft::Fft<T>>,
        scratch: Vec<Complex<T>>,
    },
    /// Real input, `n/2 + 1` complex bins out.
    RealForward {
        plan: Arc<dyn RealToComplex<T>>,
        scratch: Vec<Complex<T>>,
    },
    /// `n/2 + 1` complex bins in, real samples out.
    RealInverse {
        plan: Arc<dyn ComplexToReal<T>>,
        scratch: Vec<Complex<T>>,
    },
}

fn backend_error(err: realfft::FftError) -> EngineError {
    match err {
        realfft::FftError::InputBuffer(expected, actual) => {
            EngineError::size_mismatch("realfft input buffer", expected, actual)
        }
        realfft::FftError::OutputBuffer(expected, actual) => {
            EngineError::size_mismatch("realfft output buffer", expected, actual)
        }
        realfft::FftError::ScratchBuffer(expected, actual) => {
            EngineError::size_mismatch("realfft scratch buffer", expected, actual)
        }
        realfft::FftError::InputValues(..) => EngineError::invalid_parameter("spectrum", err.to_string()),
    }
}

fn wrong_kernel(expected: &str) -> EngineError {
    EngineError::invalid_parameter("mode", format!("kernel is not planned for {expected}"))
}

impl<T: RealFloat> FftKernel<T> {
    /// Plan a complex transform.
    pub(crate) fn complex(length: usize, inverse: bool) -> Self {
        let mut planner = FftPlanner::<T>::new();
        let plan = if inverse {
            planner.plan_fft_inverse(length)
        } else {
            planner.plan_fft_forward(length)
        };
        let scratch = vec![Complex::zero(); plan.get_inplace_scratch_len()];
        Self::Complex { plan, scratch }
    }

    /// Plan a real-input forward transform.
    pub(crate) fn real_forward(length: usize) -> Self {
        let mut planner = RealFftPlanner::<T>::new();
        let plan = planner.plan_fft_forward(length);
        let scratch = plan.make_scratch_vec();
        Self::RealForward { plan, scratch }
    }

    /// Plan a real-output inverse transform.
    pub(crate) fn real_inverse(length: usize) -> Self {
        let mut planner = RealFftPlanner::<T>::new();
        let plan = planner.plan_fft_inverse(length);
        let scratch = plan.make_scratch_vec();
        Self::RealInverse { plan, scratch }
    }

    /// Transform every length-`n` lane of `buffer` in place.
    pub(crate) fn process_complex(&mut self, buffer: &mut [Complex<T>]) -> EngineResult<()> {
        let Self::Complex { plan, scratch } = self else {
            return Err(wrong_kernel("complex transforms"));
        };
        if !buffer.is_empty() {
            lanes::complex(plan.as_ref(), buffer, scratch);
        }
        Ok(())
    }

    /// Transform every length-`n` lane of `input` into `n/2 + 1` bins of `output`.
    ///
    /// `input` is used as scratch space and left unspecified.
    pub(crate) fn process_real_forward(
        &mut self,
        input: &mut [T],
        output: &mut [Complex<T>],
    ) -> EngineResult<()> {
        let Self::RealForward { plan, scratch } = self else {
            return Err(wrong_kernel("real forward transforms"));
        };
        lanes::real_forward(plan.as_ref(), input, output, scratch).map_err(backend_error)
    }

    /// Transform every `n/2 + 1`-bin lane of `input` into `n` samples of `output`.
    ///
    /// The output is not normalised. The imaginary parts of the DC bin (and of
    /// the Nyquist bin for even `n`) are ignored.
    pub(crate) fn process_real_inverse(
        &mut self,
        input: &mut [Complex<T>],
        output: &mut [T],
    ) -> EngineResult<()> {
        let Self::RealInverse { plan, scratch } = self else {
            return Err(wrong_kernel("real inverse transforms"));
        };
        let length = plan.len();
        let bins = length / 2 + 1;
        for lane in input.chunks_exact_mut(bins) {
            lane[0].im = T::zero();
            if length % 2 == 0 {
                lane[bins - 1].im = T::zero();
            }
        }
        lanes::real_inverse(plan.as_ref(), input, output, scratch).map_err(backend_error)
    }
}

/// Lane loops, run serially with the kernel's own scratch buffer.
#[cfg(not(feature = "parallel-processing"))]
mod lanes {
    use num_complex::Complex;
    use realfft::{ComplexToReal, FftError, RealToComplex};

    use crate::RealFloat;

    pub(super) fn complex<T: RealFloat>(
        plan: &dyn rustfft::Fft<T>,
        buffer: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) {
        plan.process_with_scratch(buffer, scratch);
    }

    pub(super) fn real_forward<T: RealFloat>(
        plan: &dyn RealToComplex<T>,
        input: &mut [T],
        output: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        let length = plan.len();
        for (lane_in, lane_out) in input
            .chunks_exact_mut(length)
            .zip(output.chunks_exact_mut(length / 2 + 1))
        {
            plan.process_with_scratch(lane_in, lane_out, scratch)?;
        }
        Ok(())
    }

    pub(super) fn real_inverse<T: RealFloat>(
        plan: &dyn ComplexToReal<T>,
        input: &mut [Complex<T>],
        output: &mut [T],
        scratch: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        let length = plan.len();
        for (lane_in, lane_out) in input
            .chunks_exact_mut(length / 2 + 1)
            .zip(output.chunks_exact_mut(length))
        {
            plan.process_with_scratch(lane_in, lane_out, scratch)?;
        }
        Ok(())
    }
}

/// Lane loops spread over the rayon pool, one scratch buffer per worker.
#[cfg(feature = "parallel-processing")]
mod lanes {
    use num_complex::Complex;
    use num_traits::Zero;
    use rayon::prelude::*;
    use realfft::{ComplexToReal, FftError, RealToComplex};
    use rustfft::Length;

    use crate::RealFloat;

    pub(super) fn complex<T: RealFloat>(
        plan: &dyn rustfft::Fft<T>,
        buffer: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) {
        let scratch_len = scratch.len();
        buffer.par_chunks_mut(plan.len()).for_each_init(
            || vec![Complex::zero(); scratch_len],
            |scratch, lane| plan.process_with_scratch(lane, scratch),
        );
    }

    pub(super) fn real_forward<T: RealFloat>(
        plan: &dyn RealToComplex<T>,
        input: &mut [T],
        output: &mut [Complex<T>],
        _scratch: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        let length = plan.len();
        input
            .par_chunks_mut(length)
            .zip(output.par_chunks_mut(length / 2 + 1))
            .try_for_each_init(
                || plan.make_scratch_vec(),
                |scratch, (lane_in, lane_out)| plan.process_with_scratch(lane_in, lane_out, scratch),
            )
    }

    pub(super) fn real_inverse<T: RealFloat>(
        plan: &dyn ComplexToReal<T>,
        input: &mut [Complex<T>],
        output: &mut [T],
        _scratch: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        let length = plan.len();
        input
            .par_chunks_mut(length / 2 + 1)
            .zip(output.par_chunks_mut(length))
            .try_for_each_init(
                || plan.make_scratch_vec(),
                |scratch, (lane_in, lane_out)| plan.process_with_scratch(lane_in, lane_out, scratch),
            )
    }
}
