//! Optional per-session instrumentation.

use crate::layout::Layout;
use crate::sample::SampleFormat;

/// One completed process call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessEvent {
    pub format: SampleFormat,
    pub layout: Layout,
    /// Channel index for planar calls.
    pub channel: Option<u32>,
    pub consumed: usize,
    pub produced: usize,
}

/// Receives session events. All methods default to no-ops.
///
/// Install one with [`Session::set_observer`](crate::Session::set_observer).
pub trait Observer: Send {
    /// Called after every successful process call.
    fn on_process(&self, _event: &ProcessEvent) {}

    /// Called when an output arena grows.
    fn on_grow(&self, _format: SampleFormat, _from: usize, _to: usize) {}
}
