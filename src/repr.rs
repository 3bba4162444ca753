//! Core sample buffer representation.
//!
//! This module provides the storage layer every engine in the crate operates on:
//!
//! - [`HArray<T>`] - a typed n-dimensional handle over reference-counted storage
//! - [`BufferData`] - the element-kind tagged union of the four typed handles
//! - [`SampleBuffer`] - the dynamically typed handle callers construct and pass around
//!
//! # Copy-on-write
//!
//! Every [`HArray`] wraps an `ndarray` [`ArcArray`]. Cloning a handle or slicing
//! it never copies samples, it only bumps the reference count, so both handles
//! report [`is_shared`](HArray::is_shared). In-place mutation goes through
//! [`HArray::make_mut`], which lets `ArcArray` copy the storage first whenever
//! another handle observes it.
//!
//! ```rust
//! use sample_engine::{DataType, SampleBuffer};
//!
//! let buffer = SampleBuffer::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2], DataType::Float32).unwrap();
//! assert!(buffer.is_unique().unwrap());
//!
//! let alias = buffer.clone();
//! assert!(buffer.is_shared().unwrap());
//! assert_eq!(buffer.mem_address().unwrap(), alias.mem_address().unwrap());
//!
//! let row = buffer.slice(0, 1..2).unwrap();
//! assert_eq!(row.shape().unwrap(), &[1, 2]);
//!
//! let owned = row.collect().unwrap();
//! assert!(owned.is_unique().unwrap());
//! assert!(owned.eq(&row).unwrap());
//! ```

use std::fmt;
use std::ops::Range;

use ndarray::{ArcArray, ArrayBase, ArrayD, ArrayViewD, Axis, Data, Dimension, IxDyn, Slice};
use num_complex::Complex;

use crate::dtype::{DataType, Element, check_dtype};
use crate::{EngineError, EngineResult};

/// A typed, n-dimensional handle over shared sample storage.
///
/// Handles created by [`slice`](Self::slice) keep the parent's strides and may
/// therefore not be in standard layout.
#[derive(Debug, Clone, PartialEq)]
pub struct HArray<T>(ArcArray<T, IxDyn>);

impl<T: Copy> HArray<T> {
    /// Build a standard-layout array from row-major `data`.
    ///
    /// # Errors
    /// - [`EngineError::InvalidLength`] if `shape` is empty
    /// - [`EngineError::SizeMismatch`] if the product of `shape` differs from `data.len()`
    pub fn from_shape_vec(shape: &[usize], data: Vec<T>) -> EngineResult<Self> {
        if shape.is_empty() {
            return Err(EngineError::invalid_length(
                "a buffer needs at least one axis",
            ));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(EngineError::size_mismatch(
                format!("buffer of shape {shape:?}"),
                expected,
                data.len(),
            ));
        }
        Ok(Self(ArcArray::from_shape_vec(IxDyn(shape), data)?))
    }

    /// Copy any `ndarray` array or view into a fresh, unique handle.
    ///
    /// # Errors
    /// [`EngineError::InvalidLength`] for a zero-dimensional array.
    pub fn from_ndarray<S, D>(array: &ArrayBase<S, D>) -> EngineResult<Self>
    where
        S: Data<Elem = T>,
        D: Dimension,
    {
        if array.ndim() == 0 {
            return Err(EngineError::invalid_length(
                "a buffer needs at least one axis",
            ));
        }
        let owned = array.as_standard_layout().into_owned().into_dyn();
        Ok(Self(owned.into_shared()))
    }

    /// The wrapped `ndarray` array.
    pub const fn inner(&self) -> &ArcArray<T, IxDyn> {
        &self.0
    }

    /// Dimension sizes, outermost first.
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.0.ndim()
    }

    /// Number of logical elements (product of the shape).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether any axis has length zero.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether another handle references the same storage.
    pub fn is_shared(&self) -> bool {
        !self.is_unique()
    }

    /// Whether this is the only handle referencing its storage.
    pub fn is_unique(&self) -> bool {
        self.0.is_unique()
    }

    /// Contiguous and row-major, with no gaps between elements.
    pub fn is_standard_layout(&self) -> bool {
        self.0.is_standard_layout()
    }

    /// Address of the first visible element.
    ///
    /// Clones report the same address; a slice reports the address of its own
    /// first element inside the shared storage.
    pub fn mem_address(&self) -> usize {
        self.0.as_ptr() as usize
    }

    /// Borrow the elements as an `ndarray` view with this handle's layout.
    pub fn view(&self) -> ArrayViewD<'_, T> {
        self.0.view()
    }

    /// Copy the elements into an owned `ndarray` array.
    pub fn to_ndarray(&self) -> ArrayD<T> {
        self.0.as_standard_layout().into_owned()
    }

    /// Elements in logical (row-major) order.
    pub fn to_vec(&self) -> Vec<T> {
        match self.0.as_slice() {
            Some(values) => values.to_vec(),
            None => self.0.iter().copied().collect(),
        }
    }

    /// A view of `range` along `axis`, sharing this handle's storage.
    ///
    /// # Errors
    /// [`EngineError::OutOfBounds`] if `axis` does not exist or `range` exceeds it.
    pub fn slice(&self, axis: usize, range: Range<usize>) -> EngineResult<Self> {
        let Some(&axis_len) = self.shape().get(axis) else {
            return Err(EngineError::out_of_bounds(format!(
                "axis {axis} on a buffer with {} axes",
                self.ndim()
            )));
        };
        if range.start > range.end || range.end > axis_len {
            return Err(EngineError::out_of_bounds(format!(
                "range {}..{} on axis {axis} of length {axis_len}",
                range.start, range.end
            )));
        }
        Ok(Self(self.0.clone().slice_axis_move(Axis(axis), Slice::from(range))))
    }

    /// Materialize into fresh, unique, standard-layout storage.
    pub fn collect(&self) -> Self {
        Self(self.to_ndarray().into_shared())
    }

    /// Mutable access to the elements in row-major order.
    ///
    /// Copies first if the storage is shared or this handle is a strided window.
    pub fn make_mut(&mut self) -> &mut [T] {
        if !self.is_standard_layout() {
            *self = self.collect();
        }
        self.0.as_slice_mut().unwrap_or_default()
    }

    /// Apply `f` element-wise into a new array of possibly different kind.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> HArray<U> {
        HArray(self.0.map(|&value| f(value)).into_shared())
    }
}

/// Typed array of one of the four supported element kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferData {
    /// 32-bit real samples
    Float32(HArray<f32>),
    /// 64-bit real samples
    Float64(HArray<f64>),
    /// Complex samples with 32-bit parts
    Complex32(HArray<Complex<f32>>),
    /// Complex samples with 64-bit parts
    Complex64(HArray<Complex<f64>>),
}

/// Run `$body` with `$arr` bound to whichever typed array `$data` holds.
macro_rules! dispatch {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            BufferData::Float32($arr) => $body,
            BufferData::Float64($arr) => $body,
            BufferData::Complex32($arr) => $body,
            BufferData::Complex64($arr) => $body,
        }
    };
}

impl BufferData {
    /// Element kind tag.
    pub const fn dtype(&self) -> DataType {
        match self {
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Complex32(_) => DataType::Complex32,
            Self::Complex64(_) => DataType::Complex64,
        }
    }
}

/// Dynamically typed, copy-on-write sample buffer.
///
/// Handles are cheap to clone. Once [`invalidate`](Self::invalidate) has been
/// called, every operation on the handle fails with
/// [`EngineError::UseAfterInvalidate`].
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: Option<BufferData>,
}

impl SampleBuffer {
    /// Build a buffer from host values.
    ///
    /// Real kinds take one value per element. Complex kinds take interleaved
    /// `(re, im)` pairs, so `values` must hold twice as many entries as the shape.
    ///
    /// # Errors
    /// - [`EngineError::UnsupportedDtype`] for an odd value count with a complex kind
    /// - [`EngineError::SizeMismatch`] if the value count disagrees with `shape`
    /// - [`EngineError::InvalidLength`] if `shape` is empty
    pub fn new(values: &[f64], shape: &[usize], dtype: DataType) -> EngineResult<Self> {
        if dtype.is_complex() && values.len() % 2 != 0 {
            return Err(EngineError::unsupported_dtype(format!(
                "{} values cannot be read as {dtype} (re, im) pairs",
                values.len()
            )));
        }
        let data = match dtype {
            DataType::Float32 => BufferData::Float32(HArray::from_shape_vec(
                shape,
                values.iter().map(|&v| v as f32).collect(),
            )?),
            DataType::Float64 => {
                BufferData::Float64(HArray::from_shape_vec(shape, values.to_vec())?)
            }
            DataType::Complex32 => BufferData::Complex32(HArray::from_shape_vec(
                shape,
                values
                    .chunks_exact(2)
                    .map(|pair| Complex::new(pair[0] as f32, pair[1] as f32))
                    .collect(),
            )?),
            DataType::Complex64 => BufferData::Complex64(HArray::from_shape_vec(
                shape,
                values
                    .chunks_exact(2)
                    .map(|pair| Complex::new(pair[0], pair[1]))
                    .collect(),
            )?),
        };
        Ok(Self { data: Some(data) })
    }

    /// Build a buffer from a dtype tag such as `"float32"` or `"complex64"`.
    pub fn from_tag(values: &[f64], shape: &[usize], tag: &str) -> EngineResult<Self> {
        Self::new(values, shape, tag.parse()?)
    }

    /// Wrap a typed array.
    pub fn from_array<T: Element>(array: HArray<T>) -> Self {
        Self {
            data: Some(T::wrap(array)),
        }
    }

    /// Copy an `ndarray` array into a new buffer.
    pub fn from_ndarray<T, S, D>(array: &ArrayBase<S, D>) -> EngineResult<Self>
    where
        T: Element,
        S: Data<Elem = T>,
        D: Dimension,
    {
        Ok(Self::from_array(HArray::from_ndarray(array)?))
    }

    /// Borrow the typed storage.
    pub fn data(&self) -> EngineResult<&BufferData> {
        self.data.as_ref().ok_or(EngineError::UseAfterInvalidate)
    }

    /// Mutably borrow the typed storage.
    pub fn data_mut(&mut self) -> EngineResult<&mut BufferData> {
        self.data.as_mut().ok_or(EngineError::UseAfterInvalidate)
    }

    /// Borrow the typed array, checking the element kind.
    pub fn array<T: Element>(&self) -> EngineResult<&HArray<T>> {
        let data = self.data()?;
        T::downcast_ref(data).ok_or_else(|| EngineError::dtype_mismatch(T::DTYPE, data.dtype()))
    }

    /// Mutably borrow the typed array, checking the element kind.
    pub fn array_mut<T: Element>(&mut self) -> EngineResult<&mut HArray<T>> {
        let data = self.data_mut()?;
        let actual = data.dtype();
        T::downcast_mut(data).ok_or_else(|| EngineError::dtype_mismatch(T::DTYPE, actual))
    }

    /// Element kind.
    pub fn dtype(&self) -> EngineResult<DataType> {
        Ok(self.data()?.dtype())
    }

    /// Dimension sizes.
    pub fn shape(&self) -> EngineResult<&[usize]> {
        Ok(dispatch!(self.data()?, arr => arr.shape()))
    }

    /// Number of axes.
    pub fn ndim(&self) -> EngineResult<usize> {
        Ok(self.shape()?.len())
    }

    /// Number of logical elements.
    pub fn len(&self) -> EngineResult<usize> {
        Ok(self.shape()?.iter().product())
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }

    /// A view of `range` along `axis` sharing this buffer's storage.
    pub fn slice(&self, axis: usize, range: Range<usize>) -> EngineResult<Self> {
        let data = dispatch!(self.data()?, arr => arr.slice(axis, range)?.into_data());
        Ok(Self { data: Some(data) })
    }

    /// Materialize into an owned, standard-layout buffer.
    pub fn collect(&self) -> EngineResult<Self> {
        let data = dispatch!(self.data()?, arr => arr.collect().into_data());
        Ok(Self { data: Some(data) })
    }

    /// Structural equality: same kind, same shape, identical elements.
    ///
    /// # Errors
    /// [`EngineError::DtypeMismatch`] if the element kinds differ.
    #[allow(clippy::should_implement_trait)]
    pub fn eq(&self, other: &Self) -> EngineResult<bool> {
        let (lhs, rhs) = (self.data()?, other.data()?);
        check_dtype(lhs.dtype(), rhs.dtype())?;
        Ok(lhs == rhs)
    }

    /// Negation of [`eq`](Self::eq), with the same error behaviour.
    #[allow(clippy::should_implement_trait)]
    pub fn ne(&self, other: &Self) -> EngineResult<bool> {
        Ok(!self.eq(other)?)
    }

    /// Hex address of the shared storage.
    pub fn mem_address(&self) -> EngineResult<String> {
        let address = dispatch!(self.data()?, arr => arr.mem_address());
        Ok(format!("{address:#x}"))
    }

    /// Whether the storage is referenced by more than one handle.
    pub fn is_shared(&self) -> EngineResult<bool> {
        Ok(dispatch!(self.data()?, arr => arr.is_shared()))
    }

    /// Whether this is the only handle on its storage.
    pub fn is_unique(&self) -> EngineResult<bool> {
        Ok(!self.is_shared()?)
    }

    /// Whether the elements are contiguous and row-major.
    pub fn is_standard_layout(&self) -> EngineResult<bool> {
        Ok(dispatch!(self.data()?, arr => arr.is_standard_layout()))
    }

    /// Release this handle's reference to its storage.
    pub fn invalidate(&mut self) {
        self.data = None;
    }

    /// Whether [`invalidate`](Self::invalidate) has been called.
    pub const fn is_invalidated(&self) -> bool {
        self.data.is_none()
    }

    /// Values in row-major order widened to `f64`; complex kinds yield `(re, im)` pairs.
    pub fn to_host_values(&self) -> EngineResult<Vec<f64>> {
        Ok(match self.data()? {
            BufferData::Float32(arr) => arr.to_vec().into_iter().map(f64::from).collect(),
            BufferData::Float64(arr) => arr.to_vec(),
            BufferData::Complex32(arr) => arr
                .to_vec()
                .into_iter()
                .flat_map(|c| [f64::from(c.re), f64::from(c.im)])
                .collect(),
            BufferData::Complex64(arr) => arr
                .to_vec()
                .into_iter()
                .flat_map(|c| [c.re, c.im])
                .collect(),
        })
    }
}

impl<T: Element> From<HArray<T>> for SampleBuffer {
    fn from(array: HArray<T>) -> Self {
        Self::from_array(array)
    }
}

impl<T: Element> HArray<T> {
    /// Element kind of this array.
    pub const fn dtype(&self) -> DataType {
        T::DTYPE
    }

    fn into_data(self) -> BufferData {
        T::wrap(self)
    }
}

impl From<BufferData> for SampleBuffer {
    fn from(data: BufferData) -> Self {
        Self { data: Some(data) }
    }
}

impl fmt::Display for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(data) = &self.data else {
            return write!(f, "SampleBuffer(invalidated)");
        };
        dispatch!(data, arr => {
            writeln!(f, "SampleBuffer(dtype={}, shape={:?})", data.dtype(), arr.shape())?;
            write!(f, "{}", arr.view())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ramp_buffer(shape: &[usize], dtype: DataType) -> SampleBuffer {
        let count: usize = shape.iter().product::<usize>() * if dtype.is_complex() { 2 } else { 1 };
        let values: Vec<f64> = (0..count).map(|v| v as f64).collect();
        SampleBuffer::new(&values, shape, dtype).unwrap()
    }

    #[test]
    fn test_construct_shapes() {
        let buffer = ramp_buffer(&[2, 3, 4], DataType::Float64);
        assert_eq!(buffer.shape().unwrap(), &[2, 3, 4]);
        assert_eq!(buffer.ndim().unwrap(), 3);
        assert_eq!(buffer.len().unwrap(), 24);
        assert_eq!(buffer.dtype().unwrap(), DataType::Float64);
        assert!(buffer.is_standard_layout().unwrap());
    }

    #[test]
    fn test_construct_complex_pairs() {
        let buffer =
            SampleBuffer::new(&[1.0, 2.0, 3.0, 4.0], &[2], DataType::Complex32).unwrap();
        let arr = buffer.array::<Complex<f32>>().unwrap();
        assert_eq!(arr.to_vec(), vec![Complex::new(1.0, 2.0), Complex::new(3.0, 4.0)]);

        let odd = SampleBuffer::new(&[1.0, 2.0, 3.0], &[1], DataType::Complex64);
        assert!(matches!(odd, Err(EngineError::UnsupportedDtype(_))));
    }

    #[test]
    fn test_construct_rejects_bad_shapes() {
        assert!(matches!(
            SampleBuffer::new(&[1.0, 2.0, 3.0], &[2, 2], DataType::Float32),
            Err(EngineError::SizeMismatch { .. })
        ));
        assert!(matches!(
            SampleBuffer::new(&[], &[], DataType::Float32),
            Err(EngineError::InvalidLength(_))
        ));
        assert!(matches!(
            SampleBuffer::from_tag(&[1.0], &[1], "int8"),
            Err(EngineError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_clone_shares_storage() {
        let buffer = ramp_buffer(&[8], DataType::Float32);
        assert!(buffer.is_unique().unwrap());

        let alias = buffer.clone();
        assert!(buffer.is_shared().unwrap());
        assert!(alias.is_shared().unwrap());
        assert_eq!(buffer.mem_address().unwrap(), alias.mem_address().unwrap());

        drop(alias);
        assert!(buffer.is_unique().unwrap());
    }

    #[test]
    fn test_slice_first_axis() {
        let buffer = ramp_buffer(&[4, 3], DataType::Float64);
        let rows = buffer.slice(0, 1..3).unwrap();
        assert_eq!(rows.shape().unwrap(), &[2, 3]);
        assert_eq!(rows.len().unwrap(), 6);
        assert!(rows.is_standard_layout().unwrap());
        assert!(buffer.is_shared().unwrap());

        let parent = buffer.array::<f64>().unwrap().mem_address();
        let offset = 3 * std::mem::size_of::<f64>();
        assert_eq!(rows.array::<f64>().unwrap().mem_address(), parent + offset);
        let head = buffer.slice(0, 0..2).unwrap();
        assert_eq!(head.mem_address().unwrap(), buffer.mem_address().unwrap());
        assert_eq!(
            rows.to_host_values().unwrap(),
            vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );
    }

    #[test]
    fn test_slice_inner_axis_is_strided() {
        let buffer = ramp_buffer(&[3, 4], DataType::Float64);
        let cols = buffer.slice(1, 1..3).unwrap();
        assert_eq!(cols.shape().unwrap(), &[3, 2]);
        assert!(!cols.is_standard_layout().unwrap());
        assert_eq!(
            cols.to_host_values().unwrap(),
            vec![1.0, 2.0, 5.0, 6.0, 9.0, 10.0]
        );

        let owned = cols.collect().unwrap();
        assert!(owned.is_unique().unwrap());
        assert!(owned.is_standard_layout().unwrap());
        assert!(owned.eq(&cols).unwrap());
        assert_ne!(owned.mem_address().unwrap(), buffer.mem_address().unwrap());
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let buffer = ramp_buffer(&[4], DataType::Float32);
        assert!(matches!(buffer.slice(0, 2..5), Err(EngineError::OutOfBounds(_))));
        assert!(matches!(buffer.slice(1, 0..1), Err(EngineError::OutOfBounds(_))));
    }

    #[test]
    fn test_equality_rules() {
        let a = ramp_buffer(&[2, 2], DataType::Float32);
        let b = ramp_buffer(&[2, 2], DataType::Float32);
        let reshaped = ramp_buffer(&[4], DataType::Float32);
        assert!(a.eq(&b).unwrap());
        assert!(!a.ne(&b).unwrap());
        assert!(a.ne(&reshaped).unwrap());

        let other_kind = ramp_buffer(&[2, 2], DataType::Float64);
        assert!(matches!(
            a.eq(&other_kind),
            Err(EngineError::DtypeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalidate() {
        let mut buffer = ramp_buffer(&[4], DataType::Float32);
        let alias = buffer.clone();
        buffer.invalidate();
        assert!(buffer.is_invalidated());
        assert_eq!(buffer.len(), Err(EngineError::UseAfterInvalidate));
        assert_eq!(buffer.slice(0, 0..1).err(), Some(EngineError::UseAfterInvalidate));
        assert!(alias.is_unique().unwrap());
        assert_eq!(buffer.to_string(), "SampleBuffer(invalidated)");
    }

    #[test]
    fn test_make_mut_copies_shared_storage() {
        let original = HArray::from_shape_vec(&[4], vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
        let mut writer = original.clone();
        writer.make_mut()[0] = 10.0;

        assert_eq!(original.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(writer.to_vec(), vec![10.0, 2.0, 3.0, 4.0]);
        assert!(original.is_unique());
        assert!(writer.is_unique());
    }

    #[test]
    fn test_make_mut_in_place_when_unique() {
        let mut arr = HArray::from_shape_vec(&[2], vec![1.0f32, 2.0]).unwrap();
        let address = arr.mem_address();
        arr.make_mut()[1] = 5.0;
        assert_eq!(arr.mem_address(), address);
        assert_eq!(arr.to_vec(), vec![1.0, 5.0]);
    }

    #[test]
    fn test_ndarray_interop() {
        let source = array![[1.0f32, 2.0], [3.0, 4.0]];
        let buffer = SampleBuffer::from_ndarray(&source).unwrap();
        let back = buffer.array::<f32>().unwrap().to_ndarray();
        assert_eq!(back, source.into_dyn());
        assert!(matches!(
            buffer.array::<f64>(),
            Err(EngineError::DtypeMismatch { .. })
        ));
    }

    #[test]
    fn test_make_mut_on_shared_slice_leaves_parent_intact() {
        let parent = HArray::from_shape_vec(&[2, 3], vec![0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut row = parent.slice(0, 1..2).unwrap();
        assert!(row.is_shared());

        row.make_mut()[0] = -1.0;
        assert_eq!(row.to_vec(), vec![-1.0, 4.0, 5.0]);
        assert_eq!(parent.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(parent.is_unique());
    }

    #[test]
    fn test_make_mut_collects_strided_window() {
        let parent = HArray::from_shape_vec(&[2, 3], vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut cols = parent.slice(1, 0..2).unwrap();
        assert!(!cols.is_standard_layout());

        let values = cols.make_mut();
        assert_eq!(values, &[0.0, 1.0, 3.0, 4.0]);
        values[3] = 9.0;
        assert!(cols.is_standard_layout());
        assert!(cols.is_unique());
        assert_eq!(parent.to_vec()[4], 4.0);
    }

    #[test]
    fn test_zero_dimensional_ndarray_rejected() {
        let scalar = ndarray::arr0(1.0f64);
        assert!(matches!(
            HArray::from_ndarray(&scalar),
            Err(EngineError::InvalidLength(_))
        ));
    }
}
