//! Rubato-based resampling kernel.
//!
//! Every channel runs its own `SincFixedIn` resampler. Rubato filters fixed
//! input blocks, so each channel queues input until a block is full and
//! queues filtered output until the caller has room for it. A process call
//! can therefore stop at any sample.

use std::collections::VecDeque;
use std::fmt;

use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use super::{
    Kernel, Processed, QUALITY_DEFAULT, QUALITY_MAX, QUALITY_MIN, STATUS_ALLOC_FAILED,
    STATUS_BAD_STATE, STATUS_INVALID_ARG, Status,
};
use crate::layout::strided_count;
use crate::sample::Sample;

/// Input samples per channel handed to rubato at once.
const CHUNK_SIZE: usize = 64;

/// How far the ratio may move from the one the filters were built for
/// before they are rebuilt.
const MAX_RELATIVE_RATIO: f64 = 2.0;

/// Largest accepted output-over-input factor.
const MAX_UPSAMPLE: u64 = 1024;

/// `(sinc_len, f_cutoff, oversampling_factor)` per quality level.
const QUALITY_MAP: [(usize, f32, usize); 11] = [
    (8, 0.50, 32),
    (16, 0.70, 32),
    (32, 0.80, 64),
    (48, 0.85, 64),
    (64, 0.88, 128),
    (80, 0.90, 128),
    (96, 0.91, 128),
    (128, 0.92, 256),
    (160, 0.93, 256),
    (192, 0.94, 256),
    (256, 0.95, 256),
];

fn parameters(quality: i32) -> SincInterpolationParameters {
    let (sinc_len, f_cutoff, oversampling_factor) = QUALITY_MAP[quality as usize];
    let (interpolation, window) = if quality < QUALITY_DEFAULT {
        (SincInterpolationType::Linear, WindowFunction::Blackman)
    } else {
        (SincInterpolationType::Cubic, WindowFunction::BlackmanHarris2)
    };
    SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        oversampling_factor,
        interpolation,
        window,
    }
}

fn valid_quality(quality: i32) -> bool {
    (QUALITY_MIN..=QUALITY_MAX).contains(&quality)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduces `num / den` (input over output) to lowest terms.
fn reduce(num: u32, den: u32) -> Result<(u32, u32), Status> {
    if num == 0 || den == 0 {
        return Err(STATUS_INVALID_ARG);
    }
    let fact = gcd(num, den);
    let (num, den) = (num / fact, den / fact);
    if u64::from(den) > u64::from(num) * MAX_UPSAMPLE {
        return Err(STATUS_INVALID_ARG);
    }
    Ok((num, den))
}

/// Output over input, the way rubato expresses a ratio.
fn resample_ratio(num: u32, den: u32) -> f64 {
    f64::from(den) / f64::from(num)
}

fn build(quality: i32, ratio: f64) -> Result<SincFixedIn<f32>, Status> {
    SincFixedIn::<f32>::new(ratio, MAX_RELATIVE_RATIO, parameters(quality), CHUNK_SIZE, 1)
        .map_err(|_| STATUS_INVALID_ARG)
}

/// One channel: its filter and the queues around it.
struct Lane {
    filter: SincFixedIn<f32>,
    /// Input waiting for a full block.
    pending: Vec<f32>,
    /// Filtered samples not handed out yet.
    ready: VecDeque<f32>,
    /// Scratch output for one block.
    block: Vec<f32>,
    /// Leading output samples still to drop.
    skip: usize,
}

impl Lane {
    fn new(filter: SincFixedIn<f32>) -> Result<Self, Status> {
        let mut pending = Vec::new();
        pending
            .try_reserve_exact(CHUNK_SIZE)
            .map_err(|_| STATUS_ALLOC_FAILED)?;
        Ok(Self {
            filter,
            pending,
            ready: VecDeque::new(),
            block: Vec::new(),
            skip: 0,
        })
    }

    /// Queues one input sample and filters a block once one is complete.
    fn push(&mut self, sample: f32) -> Result<(), Status> {
        self.pending.push(sample);
        if self.pending.len() < CHUNK_SIZE {
            return Ok(());
        }

        let needed = self.filter.output_frames_next();
        if self.block.len() < needed {
            self.block
                .try_reserve_exact(needed - self.block.len())
                .map_err(|_| STATUS_ALLOC_FAILED)?;
            self.block.resize(needed, 0.0);
        }
        let (_, written) = self
            .filter
            .process_into_buffer(&[&self.pending], &mut [&mut self.block], None)
            .map_err(|_| STATUS_BAD_STATE)?;
        self.pending.clear();

        let skipped = self.skip.min(written);
        self.skip -= skipped;
        self.ready
            .try_reserve(written - skipped)
            .map_err(|_| STATUS_ALLOC_FAILED)?;
        self.ready.extend(&self.block[skipped..written]);
        Ok(())
    }

    fn clear(&mut self) {
        self.filter.reset();
        self.pending.clear();
        self.ready.clear();
        self.skip = 0;
    }
}

/// Kernel over rubato's windowed-sinc resampler.
///
/// The ratio is kept as an exact fraction `num / den` (input over output);
/// rubato only ever sees it as a float. Quality picks the sinc length,
/// cutoff and oversampling factor. Changing the quality, or moving the ratio
/// past what the current filters accept, rebuilds the filters. Queued input
/// and output survive a rebuild; the filter history does not.
pub struct RubatoKernel {
    channels: u32,
    in_rate: u32,
    out_rate: u32,
    num_rate: u32,
    den_rate: u32,
    quality: i32,
    in_stride: u32,
    out_stride: u32,
    /// Ratio the current filters were built for.
    base_ratio: f64,
    lanes: Vec<Lane>,
}

impl RubatoKernel {
    /// Sinc filter length of the current quality, in input samples.
    pub fn sinc_len(&self) -> usize {
        QUALITY_MAP[self.quality as usize].0
    }

    /// Replaces every channel's filter; commits only once all are built.
    fn rebuild(&mut self, quality: i32, ratio: f64) -> Result<(), Status> {
        let mut filters = Vec::new();
        filters
            .try_reserve_exact(self.lanes.len())
            .map_err(|_| STATUS_ALLOC_FAILED)?;
        for _ in 0..self.lanes.len() {
            filters.push(build(quality, ratio)?);
        }
        for (lane, filter) in self.lanes.iter_mut().zip(filters) {
            lane.filter = filter;
        }
        self.base_ratio = ratio;
        Ok(())
    }

    /// Moves the filters to `ratio`, rebuilding when it is out of reach.
    fn retune(&mut self, ratio: f64) -> Result<(), Status> {
        let relative = ratio / self.base_ratio;
        if relative > 1.0 / MAX_RELATIVE_RATIO && relative < MAX_RELATIVE_RATIO {
            for lane in &mut self.lanes {
                lane.filter
                    .set_resample_ratio(ratio, false)
                    .map_err(|_| STATUS_INVALID_ARG)?;
            }
            return Ok(());
        }
        self.rebuild(self.quality, ratio)
    }

    /// Frames every channel has ready.
    fn ready_frames(&self) -> usize {
        self.lanes
            .iter()
            .map(|lane| lane.ready.len())
            .min()
            .unwrap_or(0)
    }

    fn process_planar<T: Sample>(
        &mut self,
        channel: u32,
        input: &[T],
        output: &mut [T],
    ) -> Result<Processed, Status> {
        let in_stride = self.in_stride as usize;
        let out_stride = self.out_stride as usize;
        let lane = self
            .lanes
            .get_mut(channel as usize)
            .ok_or(STATUS_INVALID_ARG)?;
        let in_len = strided_count(input.len(), in_stride);
        let out_len = strided_count(output.len(), out_stride);

        let mut consumed = 0;
        while consumed < in_len && lane.ready.len() < out_len {
            lane.push(input[consumed * in_stride].to_f32())?;
            consumed += 1;
        }

        let produced = lane.ready.len().min(out_len);
        let slots = output.iter_mut().step_by(out_stride);
        for (slot, sample) in slots.zip(lane.ready.drain(..produced)) {
            *slot = T::from_f32(sample);
        }
        Ok(Processed { consumed, produced })
    }

    /// Feeds whole frames to every channel and hands out only the frames
    /// all channels have produced; the rest stay queued.
    fn process_interleaved<T: Sample>(
        &mut self,
        input: &[T],
        output: &mut [T],
    ) -> Result<Processed, Status> {
        let channels = self.channels as usize;
        let out_frames = output.len() / channels;

        let mut consumed = 0;
        let mut frames = input.chunks_exact(channels);
        while self.ready_frames() < out_frames {
            let Some(frame) = frames.next() else {
                break;
            };
            for (lane, &sample) in self.lanes.iter_mut().zip(frame) {
                lane.push(sample.to_f32())?;
            }
            consumed += 1;
        }

        let produced = self.ready_frames().min(out_frames);
        for (ch, lane) in self.lanes.iter_mut().enumerate() {
            let slots = output.iter_mut().skip(ch).step_by(channels);
            for (slot, sample) in slots.zip(lane.ready.drain(..produced)) {
                *slot = T::from_f32(sample);
            }
        }
        Ok(Processed { consumed, produced })
    }
}

impl Kernel for RubatoKernel {
    fn init(channels: u32, in_rate: u32, out_rate: u32, quality: i32) -> Result<Self, Status> {
        Self::init_frac(channels, in_rate, out_rate, in_rate, out_rate, quality)
    }

    fn init_frac(
        channels: u32,
        ratio_num: u32,
        ratio_den: u32,
        in_rate: u32,
        out_rate: u32,
        quality: i32,
    ) -> Result<Self, Status> {
        if channels == 0 || in_rate == 0 || out_rate == 0 || !valid_quality(quality) {
            return Err(STATUS_INVALID_ARG);
        }
        let (num, den) = reduce(ratio_num, ratio_den)?;
        let ratio = resample_ratio(num, den);

        let mut lanes = Vec::new();
        lanes
            .try_reserve_exact(channels as usize)
            .map_err(|_| STATUS_ALLOC_FAILED)?;
        for _ in 0..channels {
            lanes.push(Lane::new(build(quality, ratio)?)?);
        }

        Ok(Self {
            channels,
            in_rate,
            out_rate,
            num_rate: num,
            den_rate: den,
            quality,
            in_stride: 1,
            out_stride: 1,
            base_ratio: ratio,
            lanes,
        })
    }

    fn channels(&self) -> u32 {
        self.channels
    }

    fn process_int(
        &mut self,
        channel: u32,
        input: &[i16],
        output: &mut [i16],
    ) -> Result<Processed, Status> {
        self.process_planar(channel, input, output)
    }

    fn process_float(
        &mut self,
        channel: u32,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<Processed, Status> {
        self.process_planar(channel, input, output)
    }

    fn process_interleaved_int(
        &mut self,
        input: &[i16],
        output: &mut [i16],
    ) -> Result<Processed, Status> {
        self.process_interleaved(input, output)
    }

    fn process_interleaved_float(
        &mut self,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<Processed, Status> {
        self.process_interleaved(input, output)
    }

    fn rate(&self) -> (u32, u32) {
        (self.in_rate, self.out_rate)
    }

    fn set_rate_frac(
        &mut self,
        ratio_num: u32,
        ratio_den: u32,
        in_rate: u32,
        out_rate: u32,
    ) -> Result<(), Status> {
        if in_rate == 0 || out_rate == 0 {
            return Err(STATUS_INVALID_ARG);
        }
        let (num, den) = reduce(ratio_num, ratio_den)?;
        if (num, den) != (self.num_rate, self.den_rate) {
            self.retune(resample_ratio(num, den))?;
            self.num_rate = num;
            self.den_rate = den;
        }
        self.in_rate = in_rate;
        self.out_rate = out_rate;
        Ok(())
    }

    fn ratio(&self) -> (u32, u32) {
        (self.num_rate, self.den_rate)
    }

    fn set_quality(&mut self, quality: i32) -> Result<(), Status> {
        if !valid_quality(quality) {
            return Err(STATUS_INVALID_ARG);
        }
        if quality != self.quality {
            self.rebuild(quality, resample_ratio(self.num_rate, self.den_rate))?;
            self.quality = quality;
        }
        Ok(())
    }

    fn quality(&self) -> i32 {
        self.quality
    }

    fn set_input_stride(&mut self, stride: u32) {
        self.in_stride = stride.max(1);
    }

    fn input_stride(&self) -> u32 {
        self.in_stride
    }

    fn set_output_stride(&mut self, stride: u32) {
        self.out_stride = stride.max(1);
    }

    fn output_stride(&self) -> u32 {
        self.out_stride
    }

    fn input_latency(&self) -> u32 {
        (self.sinc_len() / 2) as u32
    }

    fn output_latency(&self) -> u32 {
        self.lanes
            .first()
            .map_or(0, |lane| lane.filter.output_delay()) as u32
    }

    fn skip_zeros(&mut self) -> Result<(), Status> {
        for lane in &mut self.lanes {
            lane.skip = lane.filter.output_delay();
        }
        Ok(())
    }

    fn reset_mem(&mut self) -> Result<(), Status> {
        for lane in &mut self.lanes {
            lane.clear();
        }
        Ok(())
    }
}

impl fmt::Debug for RubatoKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RubatoKernel")
            .field("channels", &self.channels)
            .field("rate", &(self.in_rate, self.out_rate))
            .field("ratio", &(self.num_rate, self.den_rate))
            .field("quality", &self.quality)
            .field("strides", &(self.in_stride, self.out_stride))
            .finish()
    }
}
