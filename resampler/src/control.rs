//! Rate, quality, stride and latency controls.
//!
//! Every control fails with [`Error::BadState`] once the session has been
//! destroyed, without touching any state.

use tracing::debug;

use crate::error::{Error, Result};
use crate::kernel::{Kernel, QUALITY_MAX, QUALITY_MIN};
use crate::session::{Session, kernel_error};

impl<K: Kernel> Session<K> {
    /// Sets the rate pair. The ratio becomes `in_rate / out_rate` and the
    /// output sizing follows.
    pub fn set_rate(&mut self, in_rate: u32, out_rate: u32) -> Result<()> {
        let kernel = self.kernel_mut()?;
        if in_rate == 0 || out_rate == 0 {
            return Err(Error::invalid("rates must be positive"));
        }
        kernel
            .set_rate(in_rate, out_rate)
            .map_err(|s| kernel_error(s, "set_rate"))?;
        self.refresh_multiplier();
        debug!("resampler: rate set to {}->{}", in_rate, out_rate);
        Ok(())
    }

    /// Returns `(in_rate, out_rate)`.
    pub fn rate(&self) -> Result<(u32, u32)> {
        Ok(self.kernel()?.rate())
    }

    /// Sets an explicit `ratio_num / ratio_den` ratio (input over output)
    /// together with the informational rate pair.
    pub fn set_rate_frac(
        &mut self,
        ratio_num: u32,
        ratio_den: u32,
        in_rate: u32,
        out_rate: u32,
    ) -> Result<()> {
        let kernel = self.kernel_mut()?;
        if ratio_den == 0 || ratio_num == 0 {
            return Err(Error::invalid("ratio terms must be positive"));
        }
        if in_rate == 0 || out_rate == 0 {
            return Err(Error::invalid("rates must be positive"));
        }
        kernel
            .set_rate_frac(ratio_num, ratio_den, in_rate, out_rate)
            .map_err(|s| kernel_error(s, "set_rate_frac"))?;
        self.refresh_multiplier();
        debug!(
            "resampler: ratio set to {}/{} rate={}->{}",
            ratio_num, ratio_den, in_rate, out_rate
        );
        Ok(())
    }

    /// Returns the ratio `(num, den)` in lowest terms.
    pub fn ratio(&self) -> Result<(u32, u32)> {
        Ok(self.kernel()?.ratio())
    }

    /// Sets the quality. Values outside `[0, 10]` are rejected and the
    /// current quality is kept.
    pub fn set_quality(&mut self, quality: i32) -> Result<()> {
        let kernel = self.kernel_mut()?;
        if !(QUALITY_MIN..=QUALITY_MAX).contains(&quality) {
            return Err(Error::invalid(format!(
                "quality {} outside [{}, {}]",
                quality, QUALITY_MIN, QUALITY_MAX
            )));
        }
        kernel
            .set_quality(quality)
            .map_err(|s| kernel_error(s, "set_quality"))?;
        debug!("resampler: quality set to {}", quality);
        Ok(())
    }

    pub fn quality(&self) -> Result<i32> {
        Ok(self.kernel()?.quality())
    }

    /// Sets the planar input stride, in samples.
    pub fn set_input_stride(&mut self, stride: u32) -> Result<()> {
        let kernel = self.kernel_mut()?;
        if stride == 0 {
            return Err(Error::invalid("input stride must be positive"));
        }
        kernel.set_input_stride(stride);
        debug!("resampler: input stride set to {}", stride);
        Ok(())
    }

    pub fn input_stride(&self) -> Result<u32> {
        Ok(self.kernel()?.input_stride())
    }

    /// Sets the planar output stride, in samples.
    pub fn set_output_stride(&mut self, stride: u32) -> Result<()> {
        let kernel = self.kernel_mut()?;
        if stride == 0 {
            return Err(Error::invalid("output stride must be positive"));
        }
        kernel.set_output_stride(stride);
        debug!("resampler: output stride set to {}", stride);
        Ok(())
    }

    pub fn output_stride(&self) -> Result<u32> {
        Ok(self.kernel()?.output_stride())
    }

    /// Algorithmic delay in input samples.
    pub fn input_latency(&self) -> Result<u32> {
        Ok(self.kernel()?.input_latency())
    }

    /// Algorithmic delay in output samples.
    pub fn output_latency(&self) -> Result<u32> {
        Ok(self.kernel()?.output_latency())
    }

    /// Primes the filter so output starts with signal instead of the
    /// filter's leading zeros.
    ///
    /// Meant for processing a whole file so output length matches input
    /// length. Live streams should leave the delay in.
    pub fn skip_leading_zeros(&mut self) -> Result<()> {
        self.kernel_mut()?
            .skip_zeros()
            .map_err(|s| kernel_error(s, "skip_zeros"))?;
        debug!("resampler: skipping leading zeros");
        Ok(())
    }

    /// Clears filter history so an unrelated stream can reuse the session.
    /// Channels, rate and quality are kept.
    pub fn reset_stream(&mut self) -> Result<()> {
        self.kernel_mut()?
            .reset_mem()
            .map_err(|s| kernel_error(s, "reset_mem"))?;
        debug!("resampler: stream reset");
        Ok(())
    }
}
