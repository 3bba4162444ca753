//! Streaming sample-rate conversion on top of `rubato`.
//!
//! Three strategies are available, each in a fixed-input and a fixed-output
//! flavour (see [`ResamplerType`]):
//!
//! - **FFT**: synchronous conversion between two integer sample rates, done
//!   by filtering in the frequency domain. The ratio is fixed.
//! - **Sinc**: asynchronous windowed-sinc interpolation
//!   ([`SincInterpolationParameters`]). The ratio may change mid-stream.
//! - **Fast**: asynchronous polynomial interpolation ([`PolynomialDegree`]).
//!   The ratio may change mid-stream.
//!
//! [`ResamplerCore<T>`] is the typed engine working on [`HArray<T>`];
//! [`Resampler`] picks the precision at runtime and works on
//! [`SampleBuffer`]s. Input is `(channels, frames)`, or `(frames)` for a mono
//! engine, and the output keeps the input's rank. All channels share one read
//! position, so channel phase alignment is preserved.
//!
//! A fixed-input engine needs exactly `chunk_size` frames per call and
//! returns however many frames the ratio yields. A fixed-output engine returns
//! exactly `chunk_size` frames and needs at least
//! [`input_frames_next`](Resampler::input_frames_next) input frames; surplus
//! frames are queued for the next call. A rejected call leaves the engine
//! untouched.
//!
//! ```rust
//! use sample_engine::{DataType, PolynomialDegree, Resampler, ResamplerType, SampleBuffer};
//!
//! let mut resampler = Resampler::new_fast(
//!     0.5,
//!     1.0,
//!     PolynomialDegree::Cubic,
//!     4,
//!     1,
//!     ResamplerType::FastFixedIn,
//!     DataType::Float64,
//! )
//! .unwrap();
//! let input = SampleBuffer::new(&[1.0, 0.0, -1.0, 0.0], &[4], DataType::Float64).unwrap();
//! let output = resampler.process_all(&input).unwrap();
//! assert_eq!(output.shape().unwrap(), &[2]);
//! ```

pub mod polynomial;
pub mod sinc;

use std::fmt;
use std::str::FromStr;

use num_traits::Zero;
use rubato::{
    FastFixedIn, FastFixedOut, FftFixedIn, FftFixedOut, Resampler as _, Sample, SincFixedIn,
    SincFixedOut,
};
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

pub use self::polynomial::PolynomialDegree;
pub use self::sinc::{SincInterpolationParameters, SincInterpolationType, SincWindow};
use crate::dtype::check_dtype;
use crate::{DataType, EngineError, EngineResult, HArray, RealFloat, SampleBuffer};

/// Chunk size used by [`resample_by_ratio`].
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Strategy and fixed side of a resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ResamplerType {
    /// FFT strategy, constant input frames per call.
    FftFixedIn,
    /// FFT strategy, constant output frames per call.
    FftFixedOut,
    /// Sinc strategy, constant input frames per call.
    SincFixedIn,
    /// Sinc strategy, constant output frames per call.
    SincFixedOut,
    /// Fast strategy, constant input frames per call.
    FastFixedIn,
    /// Fast strategy, constant output frames per call.
    FastFixedOut,
}

impl ResamplerType {
    /// Whether `chunk_size` counts output frames.
    pub const fn is_fixed_out(self) -> bool {
        matches!(
            self,
            Self::FftFixedOut | Self::SincFixedOut | Self::FastFixedOut
        )
    }

    /// Whether this is the FFT strategy.
    pub const fn is_fft(self) -> bool {
        matches!(self, Self::FftFixedIn | Self::FftFixedOut)
    }

    /// Whether this is the sinc strategy.
    pub const fn is_sinc(self) -> bool {
        matches!(self, Self::SincFixedIn | Self::SincFixedOut)
    }

    /// Whether this is the fast strategy.
    pub const fn is_fast(self) -> bool {
        matches!(self, Self::FastFixedIn | Self::FastFixedOut)
    }

    /// Snake-case name used by `Display` and `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FftFixedIn => "fft_fixed_in",
            Self::FftFixedOut => "fft_fixed_out",
            Self::SincFixedIn => "sinc_fixed_in",
            Self::SincFixedOut => "sinc_fixed_out",
            Self::FastFixedIn => "fast_fixed_in",
            Self::FastFixedOut => "fast_fixed_out",
        }
    }
}

impl fmt::Display for ResamplerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResamplerType {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "fftfixedin" => Ok(Self::FftFixedIn),
            "fftfixedout" => Ok(Self::FftFixedOut),
            "sincfixedin" => Ok(Self::SincFixedIn),
            "sincfixedout" => Ok(Self::SincFixedOut),
            "fastfixedin" => Ok(Self::FastFixedIn),
            "fastfixedout" => Ok(Self::FastFixedOut),
            _ => Err(EngineError::invalid_parameter(
                "res_type",
                format!("unknown resampler type '{s}'"),
            )),
        }
    }
}


enum ResamplerKind<T: Sample> {
    FftFixedIn(FftFixedIn<T>),
    FftFixedOut(FftFixedOut<T>),
    SincFixedIn(SincFixedIn<T>),
    SincFixedOut(SincFixedOut<T>),
    FastFixedIn(FastFixedIn<T>),
    FastFixedOut(FastFixedOut<T>),
}

/// Run `$body` with `$r` bound to whichever `rubato` engine `$kind` holds.
macro_rules! each_kind {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            ResamplerKind::FftFixedIn($r) => $body,
            ResamplerKind::FftFixedOut($r) => $body,
            ResamplerKind::SincFixedIn($r) => $body,
            ResamplerKind::SincFixedOut($r) => $body,
            ResamplerKind::FastFixedIn($r) => $body,
            ResamplerKind::FastFixedOut($r) => $body,
        }
    };
}

fn check_layout(chunk_size: usize, nbr_channels: usize) -> EngineResult<()> {
    if chunk_size == 0 {
        return Err(EngineError::invalid_parameter("chunk_size", "must be >= 1"));
    }
    if nbr_channels == 0 {
        return Err(EngineError::invalid_parameter("nbr_channels", "must be >= 1"));
    }
    Ok(())
}

fn check_ratio(resample_ratio: f64, max_resample_ratio_relative: f64) -> EngineResult<()> {
    if !(resample_ratio.is_finite() && resample_ratio > 0.0) {
        return Err(EngineError::invalid_parameter(
            "resample_ratio",
            format!("must be finite and > 0, got {resample_ratio}"),
        ));
    }
    if !(max_resample_ratio_relative.is_finite() && max_resample_ratio_relative >= 1.0) {
        return Err(EngineError::invalid_parameter(
            "max_resample_ratio_relative",
            format!("must be finite and >= 1, got {max_resample_ratio_relative}"),
        ));
    }
    Ok(())
}

fn check_strategy(res_type: ResamplerType, supported: bool, constructor: &str) -> EngineResult<()> {
    if supported {
        Ok(())
    } else {
        Err(EngineError::invalid_parameter(
            "res_type",
            format!("{res_type} cannot be built by {constructor}"),
        ))
    }
}

/// Typed streaming resampler.
pub struct ResamplerCore<T: RealFloat + Sample> {
    res_type: ResamplerType,
    nbr_channels: usize,
    chunk_size: usize,
    /// `(sample_rate_in, sample_rate_out)` of an FFT engine.
    rates: Option<(usize, usize)>,
    initial_ratio: f64,
    ratio: f64,
    max_relative: f64,
    kind: ResamplerKind<T>,
    /// Input frames a fixed-output engine received but has not consumed yet.
    pending: Vec<Vec<T>>,
}

impl<T: RealFloat + Sample> ResamplerCore<T> {
    fn assemble(
        res_type: ResamplerType,
        nbr_channels: usize,
        chunk_size: usize,
        rates: Option<(usize, usize)>,
        ratio: f64,
        max_relative: f64,
        kind: ResamplerKind<T>,
    ) -> Self {
        Self {
            res_type,
            nbr_channels,
            chunk_size,
            rates,
            initial_ratio: ratio,
            ratio,
            max_relative,
            kind,
            pending: vec![Vec::new(); nbr_channels],
        }
    }

    /// FFT resampler converting `sample_rate_in` to `sample_rate_out`.
    ///
    /// # Arguments
    /// * `chunk_size` - Input frames per call (fixed-in) or output frames per call (fixed-out)
    /// * `sub_chunks` - Number of pieces each chunk is split into, between 1 and
    ///   `chunk_size`. More pieces mean shorter transforms and a shorter delay,
    ///   but a shorter transform also lowers the anti-aliasing cutoff, so content
    ///   near the Nyquist frequency is attenuated more.
    /// * `nbr_channels` - Channel count
    /// * `res_type` - [`ResamplerType::FftFixedIn`] or [`ResamplerType::FftFixedOut`]
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] for zero rates, chunk size or channel
    /// count, a sub-chunk count outside `1..=chunk_size`, or a non-FFT `res_type`.
    pub fn new_fft(
        sample_rate_in: usize,
        sample_rate_out: usize,
        chunk_size: usize,
        sub_chunks: usize,
        nbr_channels: usize,
        res_type: ResamplerType,
    ) -> EngineResult<Self> {
        check_strategy(res_type, res_type.is_fft(), "new_fft")?;
        check_layout(chunk_size, nbr_channels)?;
        if sample_rate_in == 0 || sample_rate_out == 0 {
            return Err(EngineError::invalid_parameter(
                "sample_rate",
                format!("rates must be >= 1, got {sample_rate_in} -> {sample_rate_out}"),
            ));
        }
        if sub_chunks == 0 || sub_chunks > chunk_size {
            return Err(EngineError::invalid_parameter(
                "sub_chunks",
                format!("must lie in 1..={chunk_size}, got {sub_chunks}"),
            ));
        }
        let kind = if res_type.is_fixed_out() {
            ResamplerKind::FftFixedOut(FftFixedOut::new(
                sample_rate_in,
                sample_rate_out,
                chunk_size,
                sub_chunks,
                nbr_channels,
            )?)
        } else {
            ResamplerKind::FftFixedIn(FftFixedIn::new(
                sample_rate_in,
                sample_rate_out,
                chunk_size,
                sub_chunks,
                nbr_channels,
            )?)
        };
        debug!(
            %res_type,
            sample_rate_in,
            sample_rate_out,
            chunk_size,
            sub_chunks,
            nbr_channels,
            "created fft resampler"
        );
        Ok(Self::assemble(
            res_type,
            nbr_channels,
            chunk_size,
            Some((sample_rate_in, sample_rate_out)),
            sample_rate_out as f64 / sample_rate_in as f64,
            1.0,
            kind,
        ))
    }

    /// Windowed-sinc resampler.
    ///
    /// `max_resample_ratio_relative` (at least 1) bounds later ratio changes
    /// to `[resample_ratio / max, resample_ratio * max]`.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] for a non-positive ratio, invalid
    /// sinc parameters, zero chunk size or channel count, or a non-sinc `res_type`.
    pub fn new_sinc(
        resample_ratio: f64,
        max_resample_ratio_relative: f64,
        parameters: SincInterpolationParameters,
        chunk_size: usize,
        nbr_channels: usize,
        res_type: ResamplerType,
    ) -> EngineResult<Self> {
        check_strategy(res_type, res_type.is_sinc(), "new_sinc")?;
        check_layout(chunk_size, nbr_channels)?;
        check_ratio(resample_ratio, max_resample_ratio_relative)?;
        parameters.validate()?;
        let kind = if res_type.is_fixed_out() {
            ResamplerKind::SincFixedOut(SincFixedOut::new(
                resample_ratio,
                max_resample_ratio_relative,
                parameters.into(),
                chunk_size,
                nbr_channels,
            )?)
        } else {
            ResamplerKind::SincFixedIn(SincFixedIn::new(
                resample_ratio,
                max_resample_ratio_relative,
                parameters.into(),
                chunk_size,
                nbr_channels,
            )?)
        };
        debug!(
            %res_type,
            resample_ratio,
            max_resample_ratio_relative,
            sinc_len = parameters.sinc_len,
            window = %parameters.window,
            interpolation = %parameters.interpolation,
            chunk_size,
            nbr_channels,
            "created sinc resampler"
        );
        Ok(Self::assemble(
            res_type,
            nbr_channels,
            chunk_size,
            None,
            resample_ratio,
            max_resample_ratio_relative,
            kind,
        ))
    }

    /// Polynomial resampler of the given degree.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] for a non-positive ratio, zero chunk
    /// size or channel count, or a non-fast `res_type`.
    pub fn new_fast(
        resample_ratio: f64,
        max_resample_ratio_relative: f64,
        degree: PolynomialDegree,
        chunk_size: usize,
        nbr_channels: usize,
        res_type: ResamplerType,
    ) -> EngineResult<Self> {
        check_strategy(res_type, res_type.is_fast(), "new_fast")?;
        check_layout(chunk_size, nbr_channels)?;
        check_ratio(resample_ratio, max_resample_ratio_relative)?;
        let kind = if res_type.is_fixed_out() {
            ResamplerKind::FastFixedOut(FastFixedOut::new(
                resample_ratio,
                max_resample_ratio_relative,
                degree.into(),
                chunk_size,
                nbr_channels,
            )?)
        } else {
            ResamplerKind::FastFixedIn(FastFixedIn::new(
                resample_ratio,
                max_resample_ratio_relative,
                degree.into(),
                chunk_size,
                nbr_channels,
            )?)
        };
        debug!(
            %res_type,
            resample_ratio,
            max_resample_ratio_relative,
            %degree,
            chunk_size,
            nbr_channels,
            "created fast resampler"
        );
        Ok(Self::assemble(
            res_type,
            nbr_channels,
            chunk_size,
            None,
            resample_ratio,
            max_resample_ratio_relative,
            kind,
        ))
    }

    /// Strategy and fixed side.
    pub const fn res_type(&self) -> ResamplerType {
        self.res_type
    }

    /// Element kind processed.
    pub const fn dtype(&self) -> DataType {
        T::DTYPE
    }

    /// Channel count.
    pub const fn nbr_channels(&self) -> usize {
        self.nbr_channels
    }

    /// Frames per call on the fixed side, as requested at construction.
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Current output/input ratio; during a pending ramp, the ratio it ends at.
    pub const fn resample_ratio(&self) -> f64 {
        self.ratio
    }

    /// Input frames the next [`process`](Self::process) call needs.
    ///
    /// For a fixed-output engine, frames already queued count towards it.
    pub fn input_frames_next(&self) -> usize {
        let next = each_kind!(&self.kind, r => r.input_frames_next());
        if self.res_type.is_fixed_out() {
            next.saturating_sub(self.queued_frames())
        } else {
            next
        }
    }

    /// Most input frames a single call accepts.
    pub fn input_frames_max(&self) -> usize {
        each_kind!(&self.kind, r => r.input_frames_max())
    }

    /// Output frames the next call produces, given
    /// [`input_frames_next`](Self::input_frames_next) input frames.
    pub fn output_frames_next(&self) -> usize {
        each_kind!(&self.kind, r => r.output_frames_next())
    }

    /// Most output frames a single call produces.
    pub fn output_frames_max(&self) -> usize {
        each_kind!(&self.kind, r => r.output_frames_max())
    }

    /// Algorithmic latency in output frames, as reported by the engine.
    pub fn output_delay(&self) -> usize {
        each_kind!(&self.kind, r => r.output_delay())
    }

    /// Change the ratio, immediately or ramped linearly over the next call.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if `resample_ratio` is not positive and
    /// finite, lies outside the bounds fixed at construction, or the engine
    /// uses the FFT strategy.
    pub fn set_resample_ratio(&mut self, resample_ratio: f64, ramp: bool) -> EngineResult<()> {
        if self.res_type.is_fft() {
            return Err(EngineError::invalid_parameter(
                "resample_ratio",
                "the FFT resampler runs at the fixed ratio of its sample rates",
            ));
        }
        check_ratio(resample_ratio, 1.0)?;
        let low = self.initial_ratio / self.max_relative;
        let high = self.initial_ratio * self.max_relative;
        let slack = 1e-9 * high;
        if resample_ratio < low - slack || resample_ratio > high + slack {
            return Err(EngineError::invalid_parameter(
                "resample_ratio",
                format!("{resample_ratio} is outside [{low}, {high}]"),
            ));
        }
        let resample_ratio = resample_ratio.clamp(low, high);
        each_kind!(&mut self.kind, r => r.set_resample_ratio(resample_ratio, ramp))?;
        self.ratio = resample_ratio;
        debug!(res_type = %self.res_type, resample_ratio, ramp, "changed resample ratio");
        Ok(())
    }

    /// Set the ratio to `factor` times the ratio the engine was built with.
    ///
    /// # Errors
    /// As [`set_resample_ratio`](Self::set_resample_ratio).
    pub fn set_resample_ratio_relative(&mut self, factor: f64, ramp: bool) -> EngineResult<()> {
        self.set_resample_ratio(self.initial_ratio * factor, ramp)
    }

    /// Clear all history and queued input back to silence.
    ///
    /// The current ratio is kept. A pending ramp is completed at once.
    pub fn reset(&mut self) {
        each_kind!(&mut self.kind, r => r.reset());
        for queue in &mut self.pending {
            queue.clear();
        }
        // rubato's reset returns to the construction ratio.
        if (self.ratio - self.initial_ratio).abs() > f64::EPSILON * self.initial_ratio {
            let ratio = self.ratio;
            if let Err(err) = each_kind!(&mut self.kind, r => r.set_resample_ratio(ratio, false)) {
                warn!(%err, ratio, "could not restore the resample ratio after reset");
            }
        }
        debug!(res_type = %self.res_type, "reset resampler");
    }

    fn queued_frames(&self) -> usize {
        self.pending.first().map_or(0, Vec::len)
    }

    /// Frames a whole signal of `frames` input frames converts to.
    fn expected_frames(&self, frames: usize) -> usize {
        if let Some((sample_rate_in, sample_rate_out)) = self.rates {
            return (frames * sample_rate_out).div_ceil(sample_rate_in);
        }
        let exact = frames as f64 * self.ratio;
        let rounded = exact.round();
        if (exact - rounded).abs() <= 1e-9 * rounded.max(1.0) {
            rounded as usize
        } else {
            exact.ceil() as usize
        }
    }

    /// Split `(channels, frames)` or `(frames)` input into per-channel vectors.
    fn split_channels(&self, input: &HArray<T>) -> EngineResult<(Vec<Vec<T>>, bool)> {
        let shape = input.shape();
        let (channels, frames, mono) = match *shape {
            [frames] => (1, frames, true),
            [channels, frames] => (channels, frames, false),
            _ => {
                return Err(EngineError::size_mismatch(
                    "resampler input rank",
                    2,
                    shape.len(),
                ));
            }
        };
        if channels != self.nbr_channels {
            return Err(EngineError::size_mismatch(
                "resampler input channels",
                self.nbr_channels,
                channels,
            ));
        }
        if frames == 0 {
            return Ok((vec![Vec::new(); channels], mono));
        }
        let values = input.to_vec();
        Ok((values.chunks_exact(frames).map(<[T]>::to_vec).collect(), mono))
    }

    fn join_channels(&self, channels: Vec<Vec<T>>, mono: bool) -> EngineResult<HArray<T>> {
        let frames = channels.first().map_or(0, Vec::len);
        let data: Vec<T> = channels.into_iter().flatten().collect();
        if mono {
            HArray::from_shape_vec(&[frames], data)
        } else {
            HArray::from_shape_vec(&[self.nbr_channels, frames], data)
        }
    }

    fn check_frames(&self, frames: usize) -> EngineResult<()> {
        if !self.res_type.is_fixed_out() {
            // The FFT engine rounds its chunk up to whole transforms.
            let expected = self.input_frames_next();
            if frames != expected {
                return Err(EngineError::size_mismatch(
                    "fixed-input chunk frames",
                    expected,
                    frames,
                ));
            }
            return Ok(());
        }
        let next = self.input_frames_next();
        let max = self.input_frames_max();
        if frames < next {
            return Err(EngineError::size_mismatch(
                "fixed-output input frames (too few)",
                next,
                frames,
            ));
        }
        if frames > max {
            return Err(EngineError::size_mismatch(
                "fixed-output input frames (too many)",
                max,
                frames,
            ));
        }
        let capacity = 2 * max;
        let queued = self.queued_frames();
        if queued + frames > capacity {
            return Err(EngineError::size_mismatch(
                "queued input frames",
                capacity.saturating_sub(queued),
                frames,
            ));
        }
        Ok(())
    }

    fn process_channels(&mut self, channels: &[Vec<T>]) -> EngineResult<Vec<Vec<T>>> {
        let frames = channels.first().map_or(0, Vec::len);
        self.check_frames(frames)?;
        let output = if self.res_type.is_fixed_out() {
            let mut staged = self.pending.clone();
            for (queue, channel) in staged.iter_mut().zip(channels) {
                queue.extend_from_slice(channel);
            }
            let needed = each_kind!(&self.kind, r => r.input_frames_next());
            let output = each_kind!(&mut self.kind, r => r.process(&staged, None))?;
            for queue in &mut staged {
                queue.drain(..needed.min(queue.len()));
            }
            self.pending = staged;
            output
        } else {
            each_kind!(&mut self.kind, r => r.process(channels, None))?
        };
        trace!(
            frames_in = frames,
            frames_out = output.first().map_or(0, Vec::len),
            queued = self.queued_frames(),
            "resampled chunk"
        );
        Ok(output)
    }

    /// Resample one chunk.
    ///
    /// # Errors
    /// - [`EngineError::SizeMismatch`] for a wrong rank, channel count or frame count
    pub fn process(&mut self, input: &HArray<T>) -> EngineResult<HArray<T>> {
        let (channels, mono) = self.split_channels(input)?;
        let output = self.process_channels(&channels)?;
        self.join_channels(output, mono)
    }

    /// Resample a complete signal.
    ///
    /// The engine is reset, fed the signal chunk by chunk (the last chunk
    /// zero-padded, followed by silence until the latency is flushed), and the
    /// output is trimmed to `ceil(frames * ratio)` frames, skipping the
    /// [`output_delay`](Self::output_delay) leading frames.
    ///
    /// # Errors
    /// - [`EngineError::SizeMismatch`] for a wrong rank or channel count
    pub fn process_all(&mut self, input: &HArray<T>) -> EngineResult<HArray<T>> {
        let (channels, mono) = self.split_channels(input)?;
        self.reset();
        let frames = channels.first().map_or(0, Vec::len);
        let expected = self.expected_frames(frames);
        if expected == 0 {
            return self.join_channels(vec![Vec::new(); self.nbr_channels], mono);
        }
        let delay = self.output_delay();

        let mut collected = vec![Vec::with_capacity(delay + expected); self.nbr_channels];
        let mut offset = 0;
        while collected.first().map_or(0, Vec::len) < delay + expected {
            let wanted = self.input_frames_next();
            let block: Vec<Vec<T>> = channels
                .iter()
                .map(|channel| {
                    let mut block: Vec<T> =
                        channel.iter().skip(offset).take(wanted).copied().collect();
                    block.resize(wanted, <T as Zero>::zero());
                    block
                })
                .collect();
            offset += wanted;
            for (sink, produced) in collected.iter_mut().zip(self.process_channels(&block)?) {
                sink.extend(produced);
            }
        }
        for channel in &mut collected {
            channel.drain(..delay);
            channel.truncate(expected);
        }
        self.join_channels(collected, mono)
    }
}

enum Precision {
    Single(ResamplerCore<f32>),
    Double(ResamplerCore<f64>),
}

/// Resampler whose precision is chosen at runtime.
pub struct Resampler {
    dtype: DataType,
    inner: Precision,
}

macro_rules! each_precision {
    ($inner:expr, $core:ident => $body:expr) => {
        match $inner {
            Precision::Single($core) => $body,
            Precision::Double($core) => $body,
        }
    };
}

fn real_dtype(dtype: DataType) -> EngineResult<DataType> {
    if dtype.is_complex() {
        Err(EngineError::unsupported_dtype(format!(
            "resampling works on real samples, got {dtype}"
        )))
    } else {
        Ok(dtype)
    }
}

impl Resampler {
    /// FFT resampler for buffers of `dtype`. See [`ResamplerCore::new_fft`].
    ///
    /// # Errors
    /// [`EngineError::UnsupportedDtype`] for a complex `dtype`, otherwise as
    /// [`ResamplerCore::new_fft`].
    pub fn new_fft(
        sample_rate_in: usize,
        sample_rate_out: usize,
        chunk_size: usize,
        sub_chunks: usize,
        nbr_channels: usize,
        res_type: ResamplerType,
        dtype: DataType,
    ) -> EngineResult<Self> {
        let dtype = real_dtype(dtype)?;
        let inner = if dtype.is_double_precision() {
            Precision::Double(ResamplerCore::new_fft(
                sample_rate_in,
                sample_rate_out,
                chunk_size,
                sub_chunks,
                nbr_channels,
                res_type,
            )?)
        } else {
            Precision::Single(ResamplerCore::new_fft(
                sample_rate_in,
                sample_rate_out,
                chunk_size,
                sub_chunks,
                nbr_channels,
                res_type,
            )?)
        };
        Ok(Self { dtype, inner })
    }

    /// Sinc resampler. See [`ResamplerCore::new_sinc`].
    #[allow(clippy::too_many_arguments)]
    pub fn new_sinc(
        resample_ratio: f64,
        max_resample_ratio_relative: f64,
        parameters: SincInterpolationParameters,
        chunk_size: usize,
        nbr_channels: usize,
        res_type: ResamplerType,
        dtype: DataType,
    ) -> EngineResult<Self> {
        let dtype = real_dtype(dtype)?;
        let inner = if dtype.is_double_precision() {
            Precision::Double(ResamplerCore::new_sinc(
                resample_ratio,
                max_resample_ratio_relative,
                parameters,
                chunk_size,
                nbr_channels,
                res_type,
            )?)
        } else {
            Precision::Single(ResamplerCore::new_sinc(
                resample_ratio,
                max_resample_ratio_relative,
                parameters,
                chunk_size,
                nbr_channels,
                res_type,
            )?)
        };
        Ok(Self { dtype, inner })
    }

    /// Polynomial resampler. See [`ResamplerCore::new_fast`].
    pub fn new_fast(
        resample_ratio: f64,
        max_resample_ratio_relative: f64,
        degree: PolynomialDegree,
        chunk_size: usize,
        nbr_channels: usize,
        res_type: ResamplerType,
        dtype: DataType,
    ) -> EngineResult<Self> {
        let dtype = real_dtype(dtype)?;
        let inner = if dtype.is_double_precision() {
            Precision::Double(ResamplerCore::new_fast(
                resample_ratio,
                max_resample_ratio_relative,
                degree,
                chunk_size,
                nbr_channels,
                res_type,
            )?)
        } else {
            Precision::Single(ResamplerCore::new_fast(
                resample_ratio,
                max_resample_ratio_relative,
                degree,
                chunk_size,
                nbr_channels,
                res_type,
            )?)
        };
        Ok(Self { dtype, inner })
    }

    /// Element kind processed.
    pub const fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Strategy and fixed side.
    pub const fn res_type(&self) -> ResamplerType {
        match &self.inner {
            Precision::Single(core) => core.res_type(),
            Precision::Double(core) => core.res_type(),
        }
    }

    /// Channel count.
    pub const fn nbr_channels(&self) -> usize {
        match &self.inner {
            Precision::Single(core) => core.nbr_channels(),
            Precision::Double(core) => core.nbr_channels(),
        }
    }

    /// Frames per call on the fixed side.
    pub const fn chunk_size(&self) -> usize {
        match &self.inner {
            Precision::Single(core) => core.chunk_size(),
            Precision::Double(core) => core.chunk_size(),
        }
    }

    /// See [`ResamplerCore::resample_ratio`].
    pub fn resample_ratio(&self) -> f64 {
        each_precision!(&self.inner, core => core.resample_ratio())
    }

    /// See [`ResamplerCore::input_frames_next`].
    pub fn input_frames_next(&self) -> usize {
        each_precision!(&self.inner, core => core.input_frames_next())
    }

    /// See [`ResamplerCore::input_frames_max`].
    pub fn input_frames_max(&self) -> usize {
        each_precision!(&self.inner, core => core.input_frames_max())
    }

    /// See [`ResamplerCore::output_frames_next`].
    pub fn output_frames_next(&self) -> usize {
        each_precision!(&self.inner, core => core.output_frames_next())
    }

    /// See [`ResamplerCore::output_frames_max`].
    pub fn output_frames_max(&self) -> usize {
        each_precision!(&self.inner, core => core.output_frames_max())
    }

    /// See [`ResamplerCore::output_delay`].
    pub fn output_delay(&self) -> usize {
        each_precision!(&self.inner, core => core.output_delay())
    }

    /// See [`ResamplerCore::set_resample_ratio`].
    pub fn set_resample_ratio(&mut self, resample_ratio: f64, ramp: bool) -> EngineResult<()> {
        each_precision!(&mut self.inner, core => core.set_resample_ratio(resample_ratio, ramp))
    }

    /// See [`ResamplerCore::set_resample_ratio_relative`].
    pub fn set_resample_ratio_relative(&mut self, factor: f64, ramp: bool) -> EngineResult<()> {
        each_precision!(&mut self.inner, core => core.set_resample_ratio_relative(factor, ramp))
    }

    /// See [`ResamplerCore::reset`].
    pub fn reset(&mut self) {
        each_precision!(&mut self.inner, core => core.reset())
    }

    fn check_input(&self, input: &SampleBuffer) -> EngineResult<()> {
        check_dtype(self.dtype, real_dtype(input.dtype()?)?)
    }

    /// Resample one chunk.
    ///
    /// # Errors
    /// - [`EngineError::UnsupportedDtype`] for complex input
    /// - [`EngineError::DtypeMismatch`] for real input of the other precision
    /// - [`EngineError::SizeMismatch`] for a wrong rank, channel count or frame count
    pub fn process(&mut self, input: &SampleBuffer) -> EngineResult<SampleBuffer> {
        self.check_input(input)?;
        Ok(match &mut self.inner {
            Precision::Single(core) => core.process(input.array::<f32>()?)?.into(),
            Precision::Double(core) => core.process(input.array::<f64>()?)?.into(),
        })
    }

    /// Resample a complete signal. See [`ResamplerCore::process_all`].
    pub fn process_all(&mut self, input: &SampleBuffer) -> EngineResult<SampleBuffer> {
        self.check_input(input)?;
        Ok(match &mut self.inner {
            Precision::Single(core) => core.process_all(input.array::<f32>()?)?.into(),
            Precision::Double(core) => core.process_all(input.array::<f64>()?)?.into(),
        })
    }
}

/// Resample a complete buffer by `ratio` in one go.
///
/// Sinc types use [`SincInterpolationParameters::default`], fast types use
/// [`PolynomialDegree::default`]; both run with [`DEFAULT_CHUNK_SIZE`]. FFT
/// types are defined by sample rates rather than a ratio, so they are
/// rejected here; build them with [`Resampler::new_fft`].
///
/// # Errors
/// - [`EngineError::InvalidParameter`] for an FFT `res_type` or an invalid ratio
/// - [`EngineError::UnsupportedDtype`] for complex input
pub fn resample_by_ratio(
    buffer: &SampleBuffer,
    ratio: f64,
    res_type: ResamplerType,
) -> EngineResult<SampleBuffer> {
    let shape = buffer.shape()?;
    let nbr_channels = if shape.len() == 1 { 1 } else { shape[0] };
    let dtype = buffer.dtype()?;
    let mut resampler = if res_type.is_sinc() {
        Resampler::new_sinc(
            ratio,
            1.0,
            SincInterpolationParameters::default(),
            DEFAULT_CHUNK_SIZE,
            nbr_channels,
            res_type,
            dtype,
        )?
    } else if res_type.is_fast() {
        Resampler::new_fast(
            ratio,
            1.0,
            PolynomialDegree::default(),
            DEFAULT_CHUNK_SIZE,
            nbr_channels,
            res_type,
            dtype,
        )?
    } else {
        return Err(EngineError::invalid_parameter(
            "res_type",
            format!("{res_type} is configured by sample rates, use Resampler::new_fft"),
        ));
    };
    resampler.process_all(buffer)
}
