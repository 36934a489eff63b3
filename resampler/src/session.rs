//! Resample sessions.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::arena::{Arenas, DEFAULT_SAFETY_FACTOR, Growth, required_capacity};
use crate::error::{Error, Result, strerror};
use crate::kernel::{
    Kernel, Processed, QUALITY_MAX, QUALITY_MIN, RubatoKernel, STATUS_MAX, Status,
};
use crate::layout::{self, Layout, strided_count, strided_len};
use crate::observer::{Observer, ProcessEvent};
use crate::sample::{Sample, SampleFormat};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// The kernel is live and every operation is available.
    Ready,
    /// The kernel has been released; every operation fails with
    /// [`Error::BadState`].
    Destroyed,
}

/// Output of one process call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resampled<'a, T> {
    /// Input consumed: samples for planar calls, frames for interleaved
    /// calls. May be less than the input length; feed the remainder in the
    /// next call.
    pub consumed: usize,
    /// The produced output. Borrowed from the session's arena, valid until
    /// the next call.
    pub samples: &'a [T],
}

impl<T> Resampled<'_, T> {
    fn empty() -> Self {
        Self {
            consumed: 0,
            samples: &[],
        }
    }
}

/// A streaming sample rate conversion session.
///
/// A session owns one kernel for a fixed number of channels, plus one output
/// arena per sample format. A process call may consume only part of its
/// input; callers loop until everything is consumed:
///
/// ```
/// use giztoy_resampler::Session;
///
/// let mut session = Session::new(1, 48000, 44100, 4)?;
/// let input = vec![0i16; 960];
/// let mut output = Vec::new();
/// let mut pos = 0;
/// while pos < input.len() {
///     let out = session.process_planar_int(0, &input[pos..])?;
///     pos += out.consumed;
///     output.extend_from_slice(out.samples);
/// }
/// session.destroy()?;
/// # Ok::<(), giztoy_resampler::Error>(())
/// ```
///
/// A session is not synchronized. Use one session per stream.
pub struct Session<K: Kernel = RubatoKernel> {
    kernel: Option<K>,
    channels: u32,
    multiplier: f64,
    safety_factor: f64,
    arenas: Arenas,
    observer: Option<Box<dyn Observer>>,
}

/// Maps a failing kernel status to an error.
pub(crate) fn kernel_error(status: Status, op: &str) -> Error {
    warn!(
        "resampler: kernel {} failed: {} (code {})",
        op,
        strerror(status),
        status
    );
    Error::from_status(status).unwrap_or(Error::UnknownKernel(status))
}

/// Rejects counts beyond what the kernel was handed.
fn check_counts(done: Processed, in_len: usize, out_len: usize, op: &str) -> Result<Processed> {
    if done.consumed > in_len || done.produced > out_len {
        warn!(
            "resampler: kernel {} reported consumed={}/{} produced={}/{}",
            op, done.consumed, in_len, done.produced, out_len
        );
        return Err(Error::UnknownKernel(STATUS_MAX));
    }
    Ok(done)
}

fn validate_init(channels: u32, quality: i32, rates: &[u32]) -> Result<()> {
    if channels == 0 {
        return Err(Error::invalid("channel count must be positive"));
    }
    if !(QUALITY_MIN..=QUALITY_MAX).contains(&quality) {
        return Err(Error::invalid(format!(
            "quality {} outside [{}, {}]",
            quality, QUALITY_MIN, QUALITY_MAX
        )));
    }
    if rates.contains(&0) {
        return Err(Error::invalid("rates and ratio terms must be positive"));
    }
    Ok(())
}

impl Session<RubatoKernel> {
    /// Creates a session converting `in_rate` to `out_rate` with the
    /// built-in rubato kernel.
    pub fn new(channels: u32, in_rate: u32, out_rate: u32, quality: i32) -> Result<Self> {
        Self::create(channels, in_rate, out_rate, quality)
    }

    /// Creates a session with an explicit `ratio_num / ratio_den` ratio
    /// (input over output) with the built-in rubato kernel.
    pub fn new_frac(
        channels: u32,
        ratio_num: u32,
        ratio_den: u32,
        in_rate: u32,
        out_rate: u32,
        quality: i32,
    ) -> Result<Self> {
        Self::create_frac(channels, ratio_num, ratio_den, in_rate, out_rate, quality)
    }
}

impl<K: Kernel> Session<K> {
    /// Creates a session over kernel `K`.
    pub fn create(channels: u32, in_rate: u32, out_rate: u32, quality: i32) -> Result<Self> {
        validate_init(channels, quality, &[in_rate, out_rate])?;
        let kernel =
            K::init(channels, in_rate, out_rate, quality).map_err(|s| kernel_error(s, "init"))?;
        debug!(
            "resampler: created session channels={} rate={}->{} quality={}",
            channels, in_rate, out_rate, quality
        );
        Self::with_kernel(kernel)
    }

    /// Creates a fractional-ratio session over kernel `K`.
    pub fn create_frac(
        channels: u32,
        ratio_num: u32,
        ratio_den: u32,
        in_rate: u32,
        out_rate: u32,
        quality: i32,
    ) -> Result<Self> {
        validate_init(channels, quality, &[ratio_num, ratio_den, in_rate, out_rate])?;
        let kernel = K::init_frac(channels, ratio_num, ratio_den, in_rate, out_rate, quality)
            .map_err(|s| kernel_error(s, "init_frac"))?;
        debug!(
            "resampler: created session channels={} ratio={}/{} rate={}->{} quality={}",
            channels, ratio_num, ratio_den, in_rate, out_rate, quality
        );
        Self::with_kernel(kernel)
    }

    /// Wraps an already initialized kernel. A kernel reporting no channels
    /// is rejected and released.
    pub fn with_kernel(kernel: K) -> Result<Self> {
        let channels = kernel.channels();
        if channels == 0 {
            return Err(Error::invalid("kernel reports no channels"));
        }
        let mut session = Self {
            kernel: Some(kernel),
            channels,
            multiplier: 1.0,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            arenas: Arenas::new(DEFAULT_SAFETY_FACTOR),
            observer: None,
        };
        session.refresh_multiplier();
        Ok(session)
    }

    /// Sets the headroom factor used for output sizing. Values below 1.0
    /// are raised to 1.0. Existing arena capacity is kept.
    pub fn with_safety_factor(mut self, safety_factor: f64) -> Self {
        self.arenas.set_safety_factor(safety_factor);
        self.safety_factor = self.arenas.safety_factor();
        self.refresh_multiplier();
        self
    }

    /// Installs an observer, replacing any previous one.
    pub fn set_observer<O: Observer + 'static>(&mut self, observer: O) {
        self.observer = Some(Box::new(observer));
    }

    /// Removes and returns the observer.
    pub fn take_observer(&mut self) -> Option<Box<dyn Observer>> {
        self.observer.take()
    }

    pub fn state(&self) -> State {
        if self.kernel.is_some() {
            State::Ready
        } else {
            State::Destroyed
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.kernel.is_none()
    }

    /// Releases the kernel. A second call fails with [`Error::BadState`].
    pub fn destroy(&mut self) -> Result<()> {
        let kernel = self.kernel.take().ok_or(Error::BadState)?;
        drop(kernel);
        debug!("resampler: destroyed session channels={}", self.channels);
        Ok(())
    }

    /// Channel count, fixed at creation.
    pub fn channels(&self) -> Result<u32> {
        self.kernel()?;
        Ok(self.channels)
    }

    /// Current output-to-input sizing multiplier, headroom included.
    pub fn multiplier(&self) -> Result<f64> {
        self.kernel()?;
        Ok(self.multiplier)
    }

    /// Current output arena capacity for `format`, in samples.
    pub fn capacity(&self, format: SampleFormat) -> Result<usize> {
        self.kernel()?;
        Ok(self.arenas.capacity(format))
    }

    /// Grows the `format` arena so that a call with up to `max_input_len`
    /// input samples, planar or interleaved, does not allocate.
    pub fn reserve(&mut self, format: SampleFormat, max_input_len: usize) -> Result<()> {
        let kernel = self.kernel.as_ref().ok_or(Error::BadState)?;
        let in_stride = kernel.input_stride() as usize;
        let out_stride = kernel.output_stride() as usize;

        let planar = required_capacity(strided_count(max_input_len, in_stride), self.multiplier)?;
        let planar = strided_len(planar, out_stride)?;
        let frames = max_input_len / self.channels as usize;
        let interleaved = layout::samples(
            required_capacity(frames, self.multiplier)?,
            self.channels,
        )?;

        let growth = self.arenas.ensure(format, planar.max(interleaved))?;
        self.notify_grow(format, growth);
        Ok(())
    }

    /// Resamples 16-bit samples of one channel.
    pub fn process_planar_int(&mut self, channel: u32, input: &[i16]) -> Result<Resampled<'_, i16>> {
        self.process_planar(channel, input)
    }

    /// Resamples float samples of one channel.
    pub fn process_planar_float(
        &mut self,
        channel: u32,
        input: &[f32],
    ) -> Result<Resampled<'_, f32>> {
        self.process_planar(channel, input)
    }

    /// Resamples interleaved 16-bit frames. `consumed` counts frames.
    pub fn process_interleaved_int(&mut self, input: &[i16]) -> Result<Resampled<'_, i16>> {
        self.process_interleaved(input)
    }

    /// Resamples interleaved float frames. `consumed` counts frames.
    pub fn process_interleaved_float(&mut self, input: &[f32]) -> Result<Resampled<'_, f32>> {
        self.process_interleaved(input)
    }

    /// Resamples samples of one channel.
    ///
    /// Input and output are read and written at the configured strides; the
    /// returned `consumed` counts samples, not slice elements, and the
    /// output slice spans the produced samples at the output stride.
    pub fn process_planar<T: Sample>(
        &mut self,
        channel: u32,
        input: &[T],
    ) -> Result<Resampled<'_, T>> {
        let kernel = self.kernel.as_mut().ok_or(Error::BadState)?;
        layout::check_channel(channel, self.channels)?;
        if input.is_empty() {
            return Ok(Resampled::empty());
        }

        let in_stride = kernel.input_stride() as usize;
        let out_stride = kernel.output_stride() as usize;
        let count = strided_count(input.len(), in_stride);
        let want = required_capacity(count, self.multiplier)?.max(1);
        let out_len = strided_len(want, out_stride)?;

        let arena = T::arena(&mut self.arenas);
        if let Some(growth) = arena.ensure(out_len)? {
            if let Some(observer) = &self.observer {
                observer.on_grow(T::FORMAT, growth.from, growth.to);
            }
        }
        let done = T::kernel_planar(kernel, channel, input, arena.slice_mut(out_len))
            .map_err(|s| kernel_error(s, "process_planar"))?;
        let done = check_counts(done, count, want, "process_planar")?;

        trace!(
            "resampler: planar channel={} consumed={} produced={}",
            channel, done.consumed, done.produced
        );
        self.notify_process(T::FORMAT, Layout::Planar, Some(channel), done);

        let valid = strided_len(done.produced, out_stride)?;
        Ok(Resampled {
            consumed: done.consumed,
            samples: T::arena(&mut self.arenas).valid(valid),
        })
    }

    /// Resamples interleaved frames.
    ///
    /// The input length must be a multiple of the channel count.
    pub fn process_interleaved<T: Sample>(&mut self, input: &[T]) -> Result<Resampled<'_, T>> {
        let kernel = self.kernel.as_mut().ok_or(Error::BadState)?;
        let frames = layout::frames(input.len(), self.channels)?;
        if frames == 0 {
            return Ok(Resampled::empty());
        }

        let want = required_capacity(frames, self.multiplier)?.max(1);
        let out_len = layout::samples(want, self.channels)?;

        let arena = T::arena(&mut self.arenas);
        if let Some(growth) = arena.ensure(out_len)? {
            if let Some(observer) = &self.observer {
                observer.on_grow(T::FORMAT, growth.from, growth.to);
            }
        }
        let done = T::kernel_interleaved(kernel, input, arena.slice_mut(out_len))
            .map_err(|s| kernel_error(s, "process_interleaved"))?;
        let done = check_counts(done, frames, want, "process_interleaved")?;

        trace!(
            "resampler: interleaved consumed={} produced={} frames",
            done.consumed, done.produced
        );
        self.notify_process(T::FORMAT, Layout::Interleaved, None, done);

        let valid = layout::samples(done.produced, self.channels)?;
        Ok(Resampled {
            consumed: done.consumed,
            samples: T::arena(&mut self.arenas).valid(valid),
        })
    }

    /// Resamples one channel into a caller-owned buffer at the configured
    /// output stride, e.g. one channel of an interleaved buffer.
    ///
    /// Returns the samples consumed and produced. `output` must have room
    /// for at least one sample.
    pub fn process_planar_into<T: Sample>(
        &mut self,
        channel: u32,
        input: &[T],
        output: &mut [T],
    ) -> Result<Processed> {
        let kernel = self.kernel.as_mut().ok_or(Error::BadState)?;
        layout::check_channel(channel, self.channels)?;
        layout::check_disjoint(input, output)?;
        if input.is_empty() {
            return Ok(Processed::default());
        }
        if output.is_empty() {
            return Err(Error::invalid("output buffer holds no samples"));
        }

        let in_len = strided_count(input.len(), kernel.input_stride() as usize);
        let out_len = strided_count(output.len(), kernel.output_stride() as usize);
        let done = T::kernel_planar(kernel, channel, input, output)
            .map_err(|s| kernel_error(s, "process_planar"))?;
        let done = check_counts(done, in_len, out_len, "process_planar")?;
        trace!(
            "resampler: planar into channel={} consumed={} produced={}",
            channel, done.consumed, done.produced
        );
        self.notify_process(T::FORMAT, Layout::Planar, Some(channel), done);
        Ok(done)
    }

    pub(crate) fn kernel(&self) -> Result<&K> {
        self.kernel.as_ref().ok_or(Error::BadState)
    }

    pub(crate) fn kernel_mut(&mut self) -> Result<&mut K> {
        self.kernel.as_mut().ok_or(Error::BadState)
    }

    /// Recomputes the sizing multiplier from the kernel's current ratio.
    pub(crate) fn refresh_multiplier(&mut self) {
        let Some(kernel) = &self.kernel else {
            return;
        };
        let (num, den) = kernel.ratio();
        self.multiplier = if num == 0 || den == 0 {
            self.safety_factor
        } else {
            f64::from(den) / f64::from(num) * self.safety_factor
        };
    }

    fn notify_grow(&self, format: SampleFormat, growth: Option<Growth>) {
        if let (Some(observer), Some(growth)) = (&self.observer, growth) {
            observer.on_grow(format, growth.from, growth.to);
        }
    }

    fn notify_process(
        &self,
        format: SampleFormat,
        layout: Layout,
        channel: Option<u32>,
        done: Processed,
    ) {
        if let Some(observer) = &self.observer {
            observer.on_process(&ProcessEvent {
                format,
                layout,
                channel,
                consumed: done.consumed,
                produced: done.produced,
            });
        }
    }
}

impl<K: Kernel> Drop for Session<K> {
    fn drop(&mut self) {
        if self.kernel.take().is_some() {
            debug!("resampler: released session on drop");
        }
    }
}

impl<K: Kernel> fmt::Debug for Session<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("channels", &self.channels)
            .field("multiplier", &self.multiplier)
            .field("int_capacity", &self.arenas.capacity(SampleFormat::Int16))
            .field("float_capacity", &self.arenas.capacity(SampleFormat::Float32))
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
