//! Spectral transforms over sample buffers.
//!
//! ## Module Organization
//!
//! - [`fft`] - Planned forward/inverse transforms ([`Fft`], [`FftEngine`])
//! - [`stft`] - Short-time transforms ([`Stft`], [`StftEngine`])
//! - [`traits`] - One-shot transform methods on [`SampleBuffer`](crate::SampleBuffer)
//! - [`types`] - Supporting types and enums
//!
//! ## Quick Start
//!
//! ```rust
//! use sample_engine::{DataType, SampleBuffer};
//! use sample_engine::operations::BufferTransforms;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signal = SampleBuffer::new(&[0.0, 1.0, 0.0, -1.0], &[4], DataType::Float32)?;
//! let spectrum = signal.rfft()?;
//! let restored = spectrum.irfft(4)?;
//! assert_eq!(restored.shape()?, &[4]);
//! # Ok(())
//! # }
//! ```

pub mod fft;
pub(crate) mod fft_backends;
pub mod stft;
pub mod traits;
pub mod transforms;
pub mod types;

pub use fft::{Fft, FftEngine};
pub use stft::{Stft, StftEngine};
pub use traits::BufferTransforms;
pub use types::FftMode;
