//! Channel and level helpers for audio laid out as `(channels, frames)`.
//!
//! A 1-D buffer is a single channel of `len` frames. For higher ranks the
//! first axis counts channels and the last axis counts frames.

use ndarray::Axis;

use crate::{BufferData, EngineError, EngineResult, HArray, RealFloat, SampleBuffer};

/// Audio-oriented queries and conversions on [`SampleBuffer`].
pub trait AudioOps {
    /// Number of channels: `1` for 1-D buffers, the first axis otherwise.
    fn nchannels(&self) -> EngineResult<usize>;

    /// Number of frames: the length of the last axis.
    fn nframes(&self) -> EngineResult<usize>;

    /// Average all channels into a freshly owned 1-D buffer.
    ///
    /// # Errors
    /// - [`EngineError::UnsupportedDtype`] for complex buffers
    /// - [`EngineError::InvalidLength`] for a buffer with zero channels
    fn to_mono(&self) -> EngineResult<SampleBuffer>;

    /// Convert decibel values to amplitudes in place:
    /// `x -> reference * (10^(0.1 x))^power`.
    ///
    /// Storage shared with other handles is copied before it is written.
    ///
    /// # Errors
    /// [`EngineError::UnsupportedDtype`] for complex buffers.
    fn db_to_amplitude(&mut self, reference: f64, power: f64) -> EngineResult<()>;
}

fn mono<T: RealFloat>(array: &HArray<T>) -> EngineResult<HArray<T>> {
    if array.ndim() == 1 {
        return Ok(array.collect());
    }
    let mean = array.view().mean_axis(Axis(0)).ok_or_else(|| {
        EngineError::invalid_length("cannot average a buffer with zero channels")
    })?;
    HArray::from_ndarray(&mean)
}

fn db_to_amplitude_in_place<T: RealFloat>(array: &mut HArray<T>, reference: f64, power: f64) {
    for value in array.make_mut() {
        let amplitude = reference * 10f64.powf(0.1 * value.widen()).powf(power);
        *value = T::cast_f64(amplitude);
    }
}

fn complex_rejected(operation: &str, data: &BufferData) -> EngineError {
    EngineError::unsupported_dtype(format!("{operation} needs real samples, got {}", data.dtype()))
}

impl AudioOps for SampleBuffer {
    fn nchannels(&self) -> EngineResult<usize> {
        let shape = self.shape()?;
        Ok(if shape.len() == 1 { 1 } else { shape[0] })
    }

    fn nframes(&self) -> EngineResult<usize> {
        Ok(self.shape()?.last().copied().unwrap_or(0))
    }

    fn to_mono(&self) -> EngineResult<SampleBuffer> {
        match self.data()? {
            BufferData::Float32(array) => Ok(mono(array)?.into()),
            BufferData::Float64(array) => Ok(mono(array)?.into()),
            other => Err(complex_rejected("to_mono", other)),
        }
    }

    fn db_to_amplitude(&mut self, reference: f64, power: f64) -> EngineResult<()> {
        match self.data_mut()? {
            BufferData::Float32(array) => db_to_amplitude_in_place(array, reference, power),
            BufferData::Float64(array) => db_to_amplitude_in_place(array, reference, power),
            other => return Err(complex_rejected("db_to_amplitude", other)),
        }
        Ok(())
    }
}
