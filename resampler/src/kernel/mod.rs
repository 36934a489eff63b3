//! Resampling kernel contract.
//!
//! A kernel owns the filter state for every channel of one stream and does
//! the actual interpolation. Sessions drive a kernel exclusively through the
//! [`Kernel`] trait; [`RubatoKernel`], built on rubato's sinc resampler, is
//! the implementation shipped with this crate.
//!
//! Kernel calls report failures as raw [`Status`] codes. The session maps them
//! through [`Error::from_status`](crate::Error::from_status).

mod rubato_impl;

pub use rubato_impl::RubatoKernel;

/// Raw kernel status code.
pub type Status = i32;

/// The call succeeded.
pub const STATUS_SUCCESS: Status = 0;
/// Filter or history memory could not be allocated.
pub const STATUS_ALLOC_FAILED: Status = 1;
/// The kernel is not in a usable state.
pub const STATUS_BAD_STATE: Status = 2;
/// An argument was rejected.
pub const STATUS_INVALID_ARG: Status = 3;
/// Input and output buffers overlap.
pub const STATUS_PTR_OVERLAP: Status = 4;
/// First code past the known catalog.
pub const STATUS_MAX: Status = 5;

/// Lowest accepted quality.
pub const QUALITY_MIN: i32 = 0;
/// Highest accepted quality.
pub const QUALITY_MAX: i32 = 10;
/// Default quality, a good trade-off for most streams.
pub const QUALITY_DEFAULT: i32 = 4;
/// Quality suited to desktop playback.
pub const QUALITY_DESKTOP: i32 = 5;
/// Quality suited to voice calls.
pub const QUALITY_VOIP: i32 = 3;

/// Sample counts reported by one process call.
///
/// Planar calls count samples of the named channel; interleaved calls count
/// frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Processed {
    /// Input samples (or frames) consumed.
    pub consumed: usize,
    /// Output samples (or frames) written.
    pub produced: usize,
}

/// The resampling kernel call contract.
///
/// Process calls stop as soon as either the input is exhausted or the output
/// slice is full, so `consumed` may be less than the input length. A call with
/// non-empty input and non-empty output always consumes or produces at least
/// one sample.
///
/// Planar input and output lengths are measured in stride-spaced samples: a
/// slice of `n` elements with stride `s` holds `ceil(n / s)` samples.
///
/// Dropping the kernel releases it.
pub trait Kernel: Sized {
    /// Creates a kernel converting `in_rate` to `out_rate`.
    fn init(channels: u32, in_rate: u32, out_rate: u32, quality: i32) -> Result<Self, Status>;

    /// Creates a kernel with an explicit `ratio_num / ratio_den` (input over
    /// output) ratio. `in_rate`/`out_rate` are informational.
    fn init_frac(
        channels: u32,
        ratio_num: u32,
        ratio_den: u32,
        in_rate: u32,
        out_rate: u32,
        quality: i32,
    ) -> Result<Self, Status>;

    /// Number of channels, fixed at init.
    fn channels(&self) -> u32;

    /// Resamples one channel of 16-bit samples.
    fn process_int(
        &mut self,
        channel: u32,
        input: &[i16],
        output: &mut [i16],
    ) -> Result<Processed, Status>;

    /// Resamples one channel of float samples.
    fn process_float(
        &mut self,
        channel: u32,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<Processed, Status>;

    /// Resamples interleaved 16-bit frames. Counts are in frames.
    fn process_interleaved_int(
        &mut self,
        input: &[i16],
        output: &mut [i16],
    ) -> Result<Processed, Status>;

    /// Resamples interleaved float frames. Counts are in frames.
    fn process_interleaved_float(
        &mut self,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<Processed, Status>;

    /// Sets the rate pair; the ratio becomes `in_rate / out_rate`.
    fn set_rate(&mut self, in_rate: u32, out_rate: u32) -> Result<(), Status> {
        self.set_rate_frac(in_rate, out_rate, in_rate, out_rate)
    }

    /// Returns `(in_rate, out_rate)`.
    fn rate(&self) -> (u32, u32);

    /// Sets an explicit ratio along with the informational rate pair.
    fn set_rate_frac(
        &mut self,
        ratio_num: u32,
        ratio_den: u32,
        in_rate: u32,
        out_rate: u32,
    ) -> Result<(), Status>;

    /// Returns the ratio `(num, den)` in lowest terms.
    fn ratio(&self) -> (u32, u32);

    /// Sets the quality, 0 to 10.
    fn set_quality(&mut self, quality: i32) -> Result<(), Status>;

    /// Returns the quality.
    fn quality(&self) -> i32;

    /// Sets the planar input stride.
    fn set_input_stride(&mut self, stride: u32);

    /// Returns the planar input stride.
    fn input_stride(&self) -> u32;

    /// Sets the planar output stride.
    fn set_output_stride(&mut self, stride: u32);

    /// Returns the planar output stride.
    fn output_stride(&self) -> u32;

    /// Algorithmic delay in input samples.
    fn input_latency(&self) -> u32;

    /// Algorithmic delay in output samples.
    fn output_latency(&self) -> u32;

    /// Skips the filter's leading zeros so output starts with signal.
    fn skip_zeros(&mut self) -> Result<(), Status>;

    /// Clears filter history.
    fn reset_mem(&mut self) -> Result<(), Status>;
}
