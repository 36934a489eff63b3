//! Channel layout arithmetic.
//!
//! Converts between frame and sample counts, checks channel indices and
//! interleaved lengths, and reshapes between planar and interleaved buffers.

use crate::error::{Error, Result};

/// How samples of a multi-channel stream are arranged in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// One buffer per channel.
    Planar,
    /// One buffer, channel samples alternating per frame.
    Interleaved,
}

/// Returns the number of frames in an interleaved buffer of `samples`.
///
/// A length that is not a multiple of `channels` is rejected rather than
/// truncated.
pub fn frames(samples: usize, channels: u32) -> Result<usize> {
    let ch = channels as usize;
    if ch == 0 {
        return Err(Error::invalid("channel count must be positive"));
    }
    if samples % ch != 0 {
        return Err(Error::invalid(format!(
            "interleaved length {} is not a multiple of {} channels",
            samples, channels
        )));
    }
    Ok(samples / ch)
}

/// Returns the number of interleaved samples in `frames` frames.
pub fn samples(frames: usize, channels: u32) -> Result<usize> {
    frames
        .checked_mul(channels as usize)
        .ok_or(Error::AllocationFailure)
}

/// Number of samples a slice of `len` elements holds at `stride`.
#[inline]
pub fn strided_count(len: usize, stride: usize) -> usize {
    if stride <= 1 {
        len
    } else {
        len.div_ceil(stride)
    }
}

/// Number of elements needed to hold `count` samples at `stride`.
pub fn strided_len(count: usize, stride: usize) -> Result<usize> {
    if count == 0 {
        return Ok(0);
    }
    (count - 1)
        .checked_mul(stride.max(1))
        .and_then(|n| n.checked_add(1))
        .ok_or(Error::AllocationFailure)
}

/// Checks `channel` against a stream of `channels` channels.
pub fn check_channel(channel: u32, channels: u32) -> Result<()> {
    if channel >= channels {
        return Err(Error::invalid(format!(
            "channel {} out of range for {} channels",
            channel, channels
        )));
    }
    Ok(())
}

/// Fails with [`Error::Overlap`] if the two slices share memory.
pub fn check_disjoint<T>(input: &[T], output: &[T]) -> Result<()> {
    if input.is_empty() || output.is_empty() {
        return Ok(());
    }
    let a = input.as_ptr_range();
    let b = output.as_ptr_range();
    if a.start < b.end && b.start < a.end {
        return Err(Error::Overlap);
    }
    Ok(())
}

/// Interleaves equal-length planes into one buffer.
pub fn interleave<T: Copy>(planes: &[&[T]]) -> Result<Vec<T>> {
    let Some(first) = planes.first() else {
        return Err(Error::invalid("no planes to interleave"));
    };
    let frames = first.len();
    if planes.iter().any(|p| p.len() != frames) {
        return Err(Error::invalid("planes differ in length"));
    }
    let total = frames
        .checked_mul(planes.len())
        .ok_or(Error::AllocationFailure)?;
    let mut out = Vec::new();
    out.try_reserve_exact(total)?;
    for i in 0..frames {
        out.extend(planes.iter().map(|p| p[i]));
    }
    Ok(out)
}

/// Splits an interleaved buffer into one plane per channel.
pub fn deinterleave<T: Copy>(input: &[T], channels: u32) -> Result<Vec<Vec<T>>> {
    let n = frames(input.len(), channels)?;
    let ch = channels as usize;
    let mut planes = Vec::new();
    planes.try_reserve_exact(ch)?;
    for c in 0..ch {
        let mut plane = Vec::new();
        plane.try_reserve_exact(n)?;
        plane.extend(input.iter().skip(c).step_by(ch).copied());
        planes.push(plane);
    }
    Ok(planes)
}
