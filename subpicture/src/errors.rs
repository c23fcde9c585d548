//! Error handling.
//!
//! Malformed subtitle streams are not errors: the decoders log what they
//! skipped and return the best image they can. The only failures we report
//! are inputs which can't be decoded at all.

use std::result;
use thiserror::Error;

/// Our standard result type.
pub type Result<T, E = Error> = result::Result<T, E>;

/// Errors which can be returned by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// We were handed an empty buffer.
    #[error("{what} is empty")]
    #[non_exhaustive]
    EmptyInput {
        /// Which buffer was empty.
        what: &'static str,
    },

    /// The buffer is too short to contain a sub-picture header.
    #[error("sub-picture header needs 4 bytes, but only {len} were supplied")]
    #[non_exhaustive]
    TruncatedHeader {
        /// The length of the buffer we were given.
        len: usize,
    },

    /// An XSub image can't be empty, or too big to allocate.
    #[error("invalid XSub image size {width}x{height}")]
    #[non_exhaustive]
    InvalidDimensions {
        /// The requested width.
        width: usize,
        /// The requested height.
        height: usize,
    },

    /// We could not parse an XSub time code.
    #[error("could not parse time code {time_code:?}")]
    #[non_exhaustive]
    InvalidTimeCode {
        /// The time code text we were given.
        time_code: String,
    },
}

impl Error {
    /// An empty input buffer.
    pub(crate) fn empty_input(what: &'static str) -> Self {
        Error::EmptyInput { what }
    }

    /// A time code which doesn't contain four numeric fields.
    pub(crate) fn invalid_time_code<S: Into<String>>(time_code: S) -> Self {
        Error::InvalidTimeCode {
            time_code: time_code.into(),
        }
    }
}
