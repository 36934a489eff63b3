//! Growable output buffers.
//!
//! An [`Arena`] holds the scratch buffer the kernel writes into. It grows to
//! `ceil(required * safety_factor)` whenever a call needs more room and never
//! shrinks, so a stream settles at a steady-state capacity after its largest
//! call.

use tracing::debug;

use crate::error::{Error, Result};
use crate::sample::SampleFormat;

/// Default headroom applied to every capacity computation.
pub const DEFAULT_SAFETY_FACTOR: f64 = 1.1;

/// A capacity change reported by [`Arena::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    pub from: usize,
    pub to: usize,
}

/// Returns `ceil(len * multiplier)`, failing when the product is not a
/// representable buffer size.
pub fn required_capacity(len: usize, multiplier: f64) -> Result<usize> {
    if len == 0 {
        return Ok(0);
    }
    let want = (len as f64 * multiplier).ceil();
    if !want.is_finite() || want < 0.0 || want >= isize::MAX as f64 {
        return Err(Error::AllocationFailure);
    }
    Ok(want as usize)
}

fn clamp_safety(safety_factor: f64) -> f64 {
    if safety_factor.is_finite() && safety_factor >= 1.0 {
        safety_factor
    } else {
        1.0
    }
}

/// A monotonically growing buffer of one sample type.
#[derive(Debug)]
pub struct Arena<T> {
    buf: Vec<T>,
    safety_factor: f64,
}

impl<T: Copy + Default> Arena<T> {
    /// Creates an empty arena. Safety factors below 1.0 are raised to 1.0.
    pub fn new(safety_factor: f64) -> Self {
        Self {
            buf: Vec::new(),
            safety_factor: clamp_safety(safety_factor),
        }
    }

    /// Current capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// Changes the headroom for future growth. Current capacity is kept.
    pub fn set_safety_factor(&mut self, safety_factor: f64) {
        self.safety_factor = clamp_safety(safety_factor);
    }

    /// Makes room for at least `required` samples.
    ///
    /// Returns the growth when the buffer had to be reallocated. On
    /// allocation failure the existing buffer is left untouched.
    pub fn ensure(&mut self, required: usize) -> Result<Option<Growth>> {
        let from = self.buf.len();
        if required <= from {
            return Ok(None);
        }
        let to = required_capacity(required, self.safety_factor)?.max(required);
        self.buf.try_reserve_exact(to - from)?;
        self.buf.resize(to, T::default());
        debug!("arena: grew from {} to {} samples", from, to);
        Ok(Some(Growth { from, to }))
    }

    /// Returns the first `len` samples for the kernel to write into.
    pub(crate) fn slice_mut(&mut self, len: usize) -> &mut [T] {
        let len = len.min(self.buf.len());
        &mut self.buf[..len]
    }

    /// Returns the first `len` samples, the valid output of the last call.
    pub(crate) fn valid(&self, len: usize) -> &[T] {
        &self.buf[..len.min(self.buf.len())]
    }
}

/// One arena per sample format.
#[derive(Debug)]
pub struct Arenas {
    int: Arena<i16>,
    float: Arena<f32>,
}

impl Arenas {
    pub fn new(safety_factor: f64) -> Self {
        Self {
            int: Arena::new(safety_factor),
            float: Arena::new(safety_factor),
        }
    }

    pub fn safety_factor(&self) -> f64 {
        self.int.safety_factor()
    }

    pub fn set_safety_factor(&mut self, safety_factor: f64) {
        self.int.set_safety_factor(safety_factor);
        self.float.set_safety_factor(safety_factor);
    }

    /// Capacity of the arena for `format`.
    pub fn capacity(&self, format: SampleFormat) -> usize {
        match format {
            SampleFormat::Int16 => self.int.capacity(),
            SampleFormat::Float32 => self.float.capacity(),
        }
    }

    pub fn ensure(&mut self, format: SampleFormat, required: usize) -> Result<Option<Growth>> {
        match format {
            SampleFormat::Int16 => self.int.ensure(required),
            SampleFormat::Float32 => self.float.ensure(required),
        }
    }

    pub(crate) fn int_mut(&mut self) -> &mut Arena<i16> {
        &mut self.int
    }

    pub(crate) fn float_mut(&mut self) -> &mut Arena<f32> {
        &mut self.float
    }
}
