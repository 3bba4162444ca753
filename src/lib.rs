// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![allow(clippy::too_many_arguments)]
// Allow functions with many parameters (resampler constructors)
#![deny(missing_docs)] // Documentation is a must for release

//! # sample_engine
//!
//! Numeric core for audio DSP: a copy-on-write sample buffer, FFT and
//! short-time transforms, and streaming sample-rate converters.
//!
//! ## Overview
//!
//! - [`SampleBuffer`] holds 32/64-bit real or complex samples of any shape.
//!   Clones and slices share storage; mutation copies first when the storage
//!   is shared.
//! - [`FftEngine`] / [`Fft`] run forward, inverse and real-optimized
//!   transforms along the last axis; [`StftEngine`] / [`Stft`] frame and window
//!   the signal first.
//! - [`Resampler`] / [`ResamplerCore`] convert sample rates chunk by chunk with
//!   an FFT, windowed-sinc or polynomial strategy.
//! - [`WindowFunction`] supplies window coefficients; [`StandardWindows`] is the
//!   built-in implementation.
//!
//! Every engine exists in a typed flavour working on [`HArray<T>`] and a
//! dynamic flavour that picks the precision from a [`DataType`] at runtime.
//!
//! ## Features
//!
//! - `parallel-processing`: batch lanes of a transform run on the rayon pool
//! - `serialization`: `serde` support for every parameter type
//!
//! ## Error Handling
//!
//! Every fallible call returns [`EngineResult`]. Failures leave the buffer or
//! engine exactly as it was.
//!
//! ```rust
//! use sample_engine::{DataType, EngineError, SampleBuffer};
//!
//! match SampleBuffer::new(&[1.0, 2.0, 3.0], &[2], DataType::Float32) {
//!     Err(EngineError::SizeMismatch { expected, actual, .. }) => {
//!         assert_eq!((expected, actual), (2, 3));
//!     }
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs through `tracing`: engine construction, ratio changes and
//! resets at `debug`, one line per processed chunk at `trace`. Install any
//! subscriber to see them.
//!
//! ## Quick Start
//!
//! ```rust
//! use sample_engine::{
//!     BufferTransforms, DataType, PolynomialDegree, Resampler, ResamplerType, SampleBuffer,
//! };
//!
//! let values: Vec<f64> = (0..64).map(|n| (n as f64 * 0.2).sin()).collect();
//! let signal = SampleBuffer::new(&values, &[64], DataType::Float64).unwrap();
//!
//! let spectrum = signal.rfft().unwrap();
//! assert_eq!(spectrum.shape().unwrap(), &[33]);
//!
//! let mut resampler = Resampler::new_fast(
//!     2.0,
//!     1.0,
//!     PolynomialDegree::Cubic,
//!     64,
//!     1,
//!     ResamplerType::FastFixedIn,
//!     DataType::Float64,
//! )
//! .unwrap();
//! let upsampled = resampler.process_all(&signal).unwrap();
//! assert_eq!(upsampled.shape().unwrap(), &[128]);
//! ```

mod error;

pub mod audioop;
pub mod dtype;
pub mod operations;
mod repr;
pub mod resampling;
pub mod utils;
pub mod windows;

pub use crate::audioop::AudioOps;
pub use crate::dtype::{DataType, Element, RealFloat, to_precision};
pub use crate::error::{EngineError, EngineResult};
pub use crate::operations::{BufferTransforms, Fft, FftEngine, FftMode, Stft, StftEngine};
pub use crate::repr::{BufferData, HArray, SampleBuffer};
pub use crate::resampling::{
    PolynomialDegree, Resampler, ResamplerCore, ResamplerType, SincInterpolationParameters,
    SincInterpolationType, SincWindow, resample_by_ratio,
};
pub use crate::windows::{StandardWindows, WindowFunction, WindowType};
