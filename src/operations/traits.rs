//! Trait definitions for one-shot transforms.

use crate::windows::WindowType;
use crate::{EngineResult, SampleBuffer};

/// Transforms applied directly to a buffer, planning a fresh engine per call.
///
/// Every method works along the last axis and returns a freshly owned buffer.
/// Use [`FftEngine`](crate::operations::FftEngine) or
/// [`StftEngine`](crate::operations::StftEngine) to reuse a plan across calls.
pub trait BufferTransforms {
    /// Full complex forward transform.
    fn fft(&self) -> EngineResult<SampleBuffer>;

    /// Normalised complex inverse transform; the result stays complex.
    fn ifft(&self) -> EngineResult<SampleBuffer>;

    /// Real-input forward transform producing `n/2 + 1` bins.
    fn rfft(&self) -> EngineResult<SampleBuffer>;

    /// Inverse of [`rfft`](Self::rfft); `length` picks between the even and odd
    /// signal lengths that share a bin count.
    fn irfft(&self, length: usize) -> EngineResult<SampleBuffer>;

    /// Short-time real transform with a periodic window of `fft_length` points.
    fn stft(
        &self,
        fft_length: usize,
        hop_length: usize,
        window: WindowType,
    ) -> EngineResult<SampleBuffer>;
}
