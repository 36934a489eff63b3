//! Sample formats.

use serde::{Deserialize, Serialize};

use crate::arena::{Arena, Arenas};
use crate::kernel::{Kernel, Processed, Status};

mod sealed {
    pub trait Sealed {}
    impl Sealed for i16 {}
    impl Sealed for f32 {}
}

/// Supported PCM sample formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// 16-bit signed integer.
    Int16,
    /// 32-bit float.
    Float32,
}

/// A PCM sample type the session can resample: `i16` or `f32`.
///
/// This trait is sealed. Besides value conversion it routes generic session
/// code to the matching kernel entry point and output arena.
pub trait Sample: sealed::Sealed + Copy + Default + Send + 'static {
    /// The format tag of this sample type.
    const FORMAT: SampleFormat;

    /// Converts to the kernel's working representation.
    fn to_f32(self) -> f32;

    /// Converts from the kernel's working representation. Integer samples
    /// round half up and saturate.
    fn from_f32(value: f32) -> Self;

    #[doc(hidden)]
    fn kernel_planar<K: Kernel>(
        kernel: &mut K,
        channel: u32,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<Processed, Status>;

    #[doc(hidden)]
    fn kernel_interleaved<K: Kernel>(
        kernel: &mut K,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<Processed, Status>;

    #[doc(hidden)]
    fn arena(arenas: &mut Arenas) -> &mut Arena<Self>;
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::Int16;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        if value < -32767.5 {
            i16::MIN
        } else if value > 32766.5 {
            i16::MAX
        } else {
            (0.5 + value).floor() as i16
        }
    }

    fn kernel_planar<K: Kernel>(
        kernel: &mut K,
        channel: u32,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<Processed, Status> {
        kernel.process_int(channel, input, output)
    }

    fn kernel_interleaved<K: Kernel>(
        kernel: &mut K,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<Processed, Status> {
        kernel.process_interleaved_int(input, output)
    }

    fn arena(arenas: &mut Arenas) -> &mut Arena<Self> {
        arenas.int_mut()
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::Float32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }

    fn kernel_planar<K: Kernel>(
        kernel: &mut K,
        channel: u32,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<Processed, Status> {
        kernel.process_float(channel, input, output)
    }

    fn kernel_interleaved<K: Kernel>(
        kernel: &mut K,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<Processed, Status> {
        kernel.process_interleaved_float(input, output)
    }

    fn arena(arenas: &mut Arenas) -> &mut Arena<Self> {
        arenas.float_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_from_f32_rounds() {
        assert_eq!(i16::from_f32(0.0), 0);
        assert_eq!(i16::from_f32(0.49), 0);
        assert_eq!(i16::from_f32(0.5), 1);
        assert_eq!(i16::from_f32(-0.5), 0);
        assert_eq!(i16::from_f32(-0.51), -1);
        assert_eq!(i16::from_f32(1234.4), 1234);
    }

    #[test]
    fn test_i16_from_f32_saturates() {
        assert_eq!(i16::from_f32(40000.0), i16::MAX);
        assert_eq!(i16::from_f32(32766.6), i16::MAX);
        assert_eq!(i16::from_f32(-40000.0), i16::MIN);
        assert_eq!(i16::from_f32(-32767.6), i16::MIN);
    }

    #[test]
    fn test_to_f32_is_unscaled() {
        assert_eq!(1000i16.to_f32(), 1000.0);
        assert_eq!(i16::MIN.to_f32(), -32768.0);
        assert_eq!(0.25f32.to_f32(), 0.25);
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(<i16 as Sample>::FORMAT, SampleFormat::Int16);
        assert_eq!(<f32 as Sample>::FORMAT, SampleFormat::Float32);
    }
}
