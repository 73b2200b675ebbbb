//! Sample representation abstraction for f32/f64 audio routing.
//!
//! The routing core runs in one canonical sample type chosen by the unit
//! (`ProcessingUnit<f64>` or `ProcessingUnit<f32>`). Hosts may deliver blocks
//! in either representation; the [`Sample`] trait supplies the conversions and
//! lets the router detect at zero cost whether a host buffer can be bound
//! directly or must go through scratch storage.

use std::any::TypeId;
use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

/// Identity of a sample representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

/// Trait for audio sample types (f32, f64).
///
/// All methods inline for monomorphization. Only the operations the router,
/// the delay line and simple processors need are included.
pub trait Sample:
    Copy
    + Default
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + PartialOrd
{
    /// Zero value (0.0).
    const ZERO: Self;

    /// Unit value (1.0).
    const ONE: Self;

    /// Representation tag.
    const FORMAT: SampleFormat;

    /// Convert from f32.
    fn from_f32(value: f32) -> Self;

    /// Convert to f32.
    fn to_f32(self) -> f32;

    /// Convert from f64.
    fn from_f64(value: f64) -> Self;

    /// Convert to f64.
    fn to_f64(self) -> f64;

    /// Absolute value.
    fn abs(self) -> Self;

    /// Convert into another sample representation.
    #[inline(always)]
    fn convert<T: Sample>(self) -> T {
        match T::FORMAT {
            SampleFormat::F32 => T::from_f32(self.to_f32()),
            SampleFormat::F64 => T::from_f64(self.to_f64()),
        }
    }

    /// Returns true if `Self` and `T` are the same representation.
    #[inline(always)]
    fn is_same_format<T: Sample>() -> bool {
        TypeId::of::<Self>() == TypeId::of::<T>()
    }

    /// Reinterpret a pointer to `Self` as a pointer to `T`.
    ///
    /// Returns `None` unless the two types are identical, so the cast can
    /// never change the meaning of the pointed-to memory.
    #[inline(always)]
    fn cast_ptr<T: Sample>(ptr: *mut Self) -> Option<*mut T> {
        if Self::is_same_format::<T>() {
            Some(ptr.cast::<T>())
        } else {
            None
        }
    }
}

/// Convert `src` into `dst` element by element.
///
/// Copies `min(src.len(), dst.len())` samples.
#[inline]
pub fn convert_slice<A: Sample, B: Sample>(src: &[A], dst: &mut [B]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = s.convert();
    }
}

/// Add `src` into `dst` element by element, converting representation.
#[inline]
pub fn accumulate_slice<A: Sample, B: Sample>(src: &[A], dst: &mut [B]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = *d + s.convert();
    }
}

impl Sample for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const FORMAT: SampleFormat = SampleFormat::F32;

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn abs(self) -> Self {
        f32::abs(self)
    }
}

impl Sample for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const FORMAT: SampleFormat = SampleFormat::F64;

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value as f64
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn abs(self) -> Self {
        f64::abs(self)
    }
}
