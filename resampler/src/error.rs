//! Error catalog.
//!
//! Kernel status codes are plain integers; this module maps them onto the
//! closed [`Error`] taxonomy and provides the kernel's English messages
//! through [`strerror`].

use std::collections::TryReserveError;

use thiserror::Error;

use crate::kernel::{
    STATUS_ALLOC_FAILED, STATUS_BAD_STATE, STATUS_INVALID_ARG, STATUS_PTR_OVERLAP, STATUS_SUCCESS,
    Status,
};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Resampler error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Bad channel index, quality out of range, malformed interleaved
    /// length, zero rate or ratio term.
    #[error("resampler: invalid argument: {0}")]
    InvalidArgument(String),

    /// Buffer or kernel memory growth failed. The session stays usable.
    #[error("resampler: memory allocation failed")]
    AllocationFailure,

    /// Operation on a destroyed session.
    #[error("resampler: bad resampler state")]
    BadState,

    /// Input and output buffers alias each other.
    #[error("resampler: input and output buffers overlap")]
    Overlap,

    /// Kernel status code outside the known catalog.
    #[error("resampler: unknown kernel error (code {0})")]
    UnknownKernel(Status),
}

/// Discriminant of [`Error`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    AllocationFailure,
    BadState,
    Overlap,
    UnknownKernel,
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Maps a kernel status code onto the taxonomy.
    ///
    /// Returns `None` for success. Codes the catalog does not know become
    /// [`Error::UnknownKernel`] carrying the raw code.
    pub fn from_status(status: Status) -> Option<Self> {
        match status {
            STATUS_SUCCESS => None,
            STATUS_ALLOC_FAILED => Some(Error::AllocationFailure),
            STATUS_BAD_STATE => Some(Error::BadState),
            STATUS_INVALID_ARG => Some(Error::invalid("rejected by kernel")),
            STATUS_PTR_OVERLAP => Some(Error::Overlap),
            code => Some(Error::UnknownKernel(code)),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::AllocationFailure => ErrorKind::AllocationFailure,
            Error::BadState => ErrorKind::BadState,
            Error::Overlap => ErrorKind::Overlap,
            Error::UnknownKernel(_) => ErrorKind::UnknownKernel,
        }
    }

    /// Returns the kernel status code equivalent to this error.
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidArgument(_) => STATUS_INVALID_ARG,
            Error::AllocationFailure => STATUS_ALLOC_FAILED,
            Error::BadState => STATUS_BAD_STATE,
            Error::Overlap => STATUS_PTR_OVERLAP,
            Error::UnknownKernel(code) => *code,
        }
    }

    /// Returns true if the session that produced this error can keep going.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::BadState)
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::AllocationFailure
    }
}

/// Returns the English meaning of a kernel status code.
pub fn strerror(status: Status) -> &'static str {
    match status {
        STATUS_SUCCESS => "Success.",
        STATUS_ALLOC_FAILED => "Memory allocation failed.",
        STATUS_BAD_STATE => "Bad resampler state.",
        STATUS_INVALID_ARG => "Invalid argument.",
        STATUS_PTR_OVERLAP => "Input and output buffers overlap.",
        _ => "Unknown error. Bad error code or strange version mismatch.",
    }
}
