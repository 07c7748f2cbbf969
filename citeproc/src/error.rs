// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for citeproc operations.
//!
//! Engine failures arrive as a result code plus a message parked in the
//! engine's thread-local last-error slot. [`Error::from_code`] reads both
//! immediately after the failing call and turns them into an [`Error`].

use std::fmt;

use crate::{api::CiteprocApi, buffer::Utf8Buffer};

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// The engine's error taxonomy, plus the failures that only exist on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid UTF-8 crossed the boundary.
    Utf8,
    /// A string that must be null-terminated contained a null byte.
    NullByte,
    /// A null handle, or a cite reference outliving its cluster generation.
    NullPointer,
    /// Reference JSON did not match the CSL-JSON schema.
    Serialization,
    /// The style failed to parse or validate. The message carries byte offsets.
    InvalidStyle,
    /// A cluster order was rejected.
    Reordering,
    /// A cluster was formatted while not part of the document order.
    ClusterNotInFlow,
    /// A buffer callback reported failure.
    BufferOps,
    /// The driver panicked in an earlier call and must be recreated.
    Poisoned,
    /// This call panicked inside the engine.
    CaughtPanic,
    /// A cite index or enumeration value was out of range.
    Indexing,
    /// A logger is already installed.
    SetLogger,
    /// The engine library could not be loaded.
    Loading,
    /// A code this crate does not know about.
    Unknown(u32),
}

impl ErrorKind {
    /// Maps a `CR_ERR_*` code. `CR_ERR_NONE` has no kind.
    pub fn from_code(code: citeproc_sys::ErrorCode) -> Option<Self> {
        Some(match code {
            citeproc_sys::CR_ERR_NONE => return None,
            citeproc_sys::CR_ERR_UTF8 => Self::Utf8,
            citeproc_sys::CR_ERR_NULL_BYTE => Self::NullByte,
            citeproc_sys::CR_ERR_NULL_POINTER => Self::NullPointer,
            citeproc_sys::CR_ERR_SERIALIZATION => Self::Serialization,
            citeproc_sys::CR_ERR_INVALID_STYLE => Self::InvalidStyle,
            citeproc_sys::CR_ERR_REORDERING => Self::Reordering,
            citeproc_sys::CR_ERR_CLUSTER_NOT_IN_FLOW => Self::ClusterNotInFlow,
            citeproc_sys::CR_ERR_BUFFER_OPS => Self::BufferOps,
            citeproc_sys::CR_ERR_POISONED => Self::Poisoned,
            citeproc_sys::CR_ERR_CAUGHT_PANIC => Self::CaughtPanic,
            citeproc_sys::CR_ERR_INDEXING => Self::Indexing,
            citeproc_sys::CR_ERR_SET_LOGGER => Self::SetLogger,
            other => Self::Unknown(other),
        })
    }

    /// Whether the driver that produced this error must be recreated.
    pub fn is_fatal_for_driver(&self) -> bool {
        matches!(self, Self::CaughtPanic | Self::Poisoned)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Utf8 => "utf8",
            Self::NullByte => "nullByte",
            Self::NullPointer => "nullPointer",
            Self::Serialization => "serialization",
            Self::InvalidStyle => "invalidStyle",
            Self::Reordering => "reordering",
            Self::ClusterNotInFlow => "clusterNotInFlow",
            Self::BufferOps => "bufferOps",
            Self::Poisoned => "poisoned",
            Self::CaughtPanic => "caughtPanic",
            Self::Indexing => "indexing",
            Self::SetLogger => "setLogger",
            Self::Loading => "loading",
            Self::Unknown(code) => return write!(f, "unknown({code})"),
        };
        f.write_str(name)
    }
}

/// Errors returned by the bindings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A failure reported by the engine.
    #[error("{kind}: {message}")]
    Citeproc { kind: ErrorKind, message: String },

    /// A cite reference was used after its cluster was reset.
    #[error("stale cite reference: the cluster was reset after this cite was created")]
    StaleCite,

    /// A reference could not be serialised to JSON on the host side.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to load or interact with the engine dynamic library.
    #[error("Loading library: {0}")]
    LibLoading(#[from] libloading::Error),
}

impl Error {
    /// The taxonomy entry this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Citeproc { kind, .. } => *kind,
            Error::StaleCite => ErrorKind::NullPointer,
            Error::Json(_) => ErrorKind::Serialization,
            Error::LibLoading(_) => ErrorKind::Loading,
        }
    }

    /// Converts an engine result code into a [`Result`], reading the last-error slot on failure.
    ///
    /// Must be called on the thread that made the failing call, before any other
    /// engine call. When the engine reports a failure but left the slot empty,
    /// the returned code is used with the message `"unknown error"`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let code = unsafe { api.driver_insert_reference(raw, json.as_ptr().cast(), json.len()) };
    /// Error::from_code(&api, code)?;
    /// ```
    pub fn from_code(api: &CiteprocApi, code: citeproc_sys::ErrorCode) -> Result<()> {
        match ErrorKind::from_code(code) {
            None => Ok(()),
            Some(returned) => Err(last_error(api).unwrap_or_else(|| Error::Citeproc {
                kind: returned,
                message: "unknown error".to_string(),
            })),
        }
    }
}

/// Reads the engine's last-error slot, if it holds anything.
pub(crate) fn last_error(api: &CiteprocApi) -> Option<Error> {
    let kind = ErrorKind::from_code(unsafe { api.last_error_code() })?;
    let mut buffer = Utf8Buffer::new();
    let code = unsafe { api.last_error_utf8(Utf8Buffer::OPS, buffer.user_data()) };
    let message = if code == citeproc_sys::CR_ERR_NONE {
        buffer.take_string()
    } else {
        tracing::warn!(code, "could not read the engine's error message");
        String::new()
    };
    Some(Error::Citeproc {
        kind,
        message: if message.is_empty() {
            "unknown error".to_string()
        } else {
            message
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_kinds() {
        assert_eq!(ErrorKind::from_code(citeproc_sys::CR_ERR_NONE), None);
        assert_eq!(
            ErrorKind::from_code(citeproc_sys::CR_ERR_CLUSTER_NOT_IN_FLOW),
            Some(ErrorKind::ClusterNotInFlow)
        );
        assert_eq!(ErrorKind::from_code(99), Some(ErrorKind::Unknown(99)));
        assert_eq!(ErrorKind::Unknown(99).to_string(), "unknown(99)");
        assert_eq!(ErrorKind::InvalidStyle.to_string(), "invalidStyle");
        assert!(ErrorKind::Poisoned.is_fatal_for_driver());
        assert!(!ErrorKind::ClusterNotInFlow.is_fatal_for_driver());
    }

    #[test]
    fn host_side_errors_have_kinds() {
        assert_eq!(Error::StaleCite.kind(), ErrorKind::NullPointer);
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json).kind(), ErrorKind::Serialization);
    }
}
