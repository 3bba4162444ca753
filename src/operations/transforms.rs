//! [`BufferTransforms`] for [`SampleBuffer`].

use super::fft::FftEngine;
use super::stft::StftEngine;
use super::traits::BufferTransforms;
use super::types::FftMode;
use crate::windows::WindowType;
use crate::{EngineError, EngineResult, SampleBuffer};

fn last_axis(buffer: &SampleBuffer) -> EngineResult<usize> {
    buffer
        .shape()?
        .last()
        .copied()
        .ok_or_else(|| EngineError::invalid_length("buffer has no axes"))
}

impl BufferTransforms for SampleBuffer {
    fn fft(&self) -> EngineResult<SampleBuffer> {
        FftEngine::new(last_axis(self)?, self.dtype()?, FftMode::Forward)?.process(self)
    }

    fn ifft(&self) -> EngineResult<SampleBuffer> {
        FftEngine::new(last_axis(self)?, self.dtype()?, FftMode::Inverse)?.process(self)
    }

    fn rfft(&self) -> EngineResult<SampleBuffer> {
        FftEngine::new(last_axis(self)?, self.dtype()?, FftMode::RealForward)?.process(self)
    }

    fn irfft(&self, length: usize) -> EngineResult<SampleBuffer> {
        let dtype = self.dtype()?.real();
        FftEngine::new(length, dtype, FftMode::RealInverse)?.process(self)
    }

    fn stft(
        &self,
        fft_length: usize,
        hop_length: usize,
        window: WindowType,
    ) -> EngineResult<SampleBuffer> {
        StftEngine::with_window(
            fft_length,
            hop_length,
            fft_length,
            window,
            self.dtype()?,
            FftMode::RealForward,
        )?
        .process(self)
    }
}
