//! Streaming sample rate conversion sessions for PCM audio.
//!
//! A [`Session`] converts multi-channel 16-bit or float PCM between two
//! sample rates, planar or interleaved, while the rate, ratio and quality
//! may change mid-stream. The filtering itself is done by a [`Kernel`];
//! [`RubatoKernel`] is the built-in implementation over rubato.
//!
//! # Processing
//!
//! A single process call is not guaranteed to consume all of its input.
//! Feed the unconsumed remainder back until nothing is left:
//!
//! ```
//! use giztoy_resampler::Session;
//!
//! let mut session = Session::new(2, 48000, 16000, giztoy_resampler::QUALITY_VOIP)?;
//! let frames = vec![0.0f32; 960 * 2];
//! let mut pos = 0;
//! let mut produced = 0;
//! while pos < frames.len() {
//!     let out = session.process_interleaved_float(&frames[pos..])?;
//!     pos += out.consumed * 2;
//!     produced += out.samples.len() / 2;
//! }
//! assert!(produced > 300);
//! # Ok::<(), giztoy_resampler::Error>(())
//! ```
//!
//! # Output buffers
//!
//! Output is written into per-format arenas owned by the session, sized at
//! `ceil(input_len * out_rate / in_rate * safety_factor)` before every call.
//! Arenas never shrink. Use [`Session::reserve`] to reach the steady-state
//! capacity ahead of a latency-sensitive path.
//!
//! # Lifecycle
//!
//! [`Session::destroy`] releases the kernel; afterwards every operation
//! fails with [`Error::BadState`]. Dropping a session releases it too.

mod arena;
mod config;
mod control;
mod error;
pub mod kernel;
mod layout;
mod observer;
mod sample;
mod session;

pub use arena::{Arena, Arenas, DEFAULT_SAFETY_FACTOR, Growth, required_capacity};
pub use config::Config;
pub use error::{Error, ErrorKind, Result, strerror};
pub use kernel::{
    Kernel, Processed, QUALITY_DEFAULT, QUALITY_DESKTOP, QUALITY_MAX, QUALITY_MIN, QUALITY_VOIP,
    RubatoKernel, Status,
};
pub use layout::{
    Layout, check_channel, check_disjoint, deinterleave, frames, interleave, samples,
    strided_count, strided_len,
};
pub use observer::{Observer, ProcessEvent};
pub use sample::{Sample, SampleFormat};
pub use session::{Resampled, Session, State};
