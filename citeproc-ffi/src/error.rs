// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! The last-error channel and the panic boundary.
//!
//! Every exported function reports failure in two halves: a result code (or a
//! null / negative sentinel) returned to the caller, and a [`FfiError`] stored
//! in a thread-local slot that the caller reads back with
//! `citeproc_rs_last_error_code` and `citeproc_rs_last_error_utf8`.
//!
//! The slot holds one error. It is cleared at the start of every fallible call
//! and overwritten by the next failure.

use std::{
    any::Any,
    cell::RefCell,
    os::raw::c_void,
    panic::{self, AssertUnwindSafe},
};

use citeproc_sys::{BufferOps, ErrorCode};

use crate::buffer::BufferWriter;

pub(crate) type Result<T> = std::result::Result<T, FfiError>;

/// Everything that can go wrong inside the engine, one variant per error code.
#[derive(Debug, thiserror::Error)]
pub enum FfiError {
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("string contains a null byte: {0}")]
    NullByte(#[from] std::ffi::NulError),

    #[error("null pointer: {0}")]
    NullPointer(&'static str),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("style error: {0}")]
    InvalidStyle(String),

    #[error("reordering error: {0}")]
    Reordering(String),

    #[error("cluster {0} is not in the document order")]
    ClusterNotInFlow(u32),

    #[error("buffer operation failed: {0}")]
    BufferOps(&'static str),

    #[error("poisoned: {0}")]
    Poisoned(&'static str),

    #[error("caught panic: {0}")]
    CaughtPanic(String),

    #[error("index out of range: {0}")]
    Indexing(String),

    #[error("could not set logger: {0}")]
    SetLogger(String),
}

impl FfiError {
    /// The code returned across the boundary for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            FfiError::Utf8(_) => citeproc_sys::CR_ERR_UTF8,
            FfiError::NullByte(_) => citeproc_sys::CR_ERR_NULL_BYTE,
            FfiError::NullPointer(_) => citeproc_sys::CR_ERR_NULL_POINTER,
            FfiError::Serialization(_) => citeproc_sys::CR_ERR_SERIALIZATION,
            FfiError::InvalidStyle(_) => citeproc_sys::CR_ERR_INVALID_STYLE,
            FfiError::Reordering(_) => citeproc_sys::CR_ERR_REORDERING,
            FfiError::ClusterNotInFlow(_) => citeproc_sys::CR_ERR_CLUSTER_NOT_IN_FLOW,
            FfiError::BufferOps(_) => citeproc_sys::CR_ERR_BUFFER_OPS,
            FfiError::Poisoned(_) => citeproc_sys::CR_ERR_POISONED,
            FfiError::CaughtPanic(_) => citeproc_sys::CR_ERR_CAUGHT_PANIC,
            FfiError::Indexing(_) => citeproc_sys::CR_ERR_INDEXING,
            FfiError::SetLogger(_) => citeproc_sys::CR_ERR_SET_LOGGER,
        }
    }
}

struct LastError {
    code: ErrorCode,
    message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

/// Stores `error` in the calling thread's slot and returns its code.
pub(crate) fn set_last_error(error: FfiError) -> ErrorCode {
    let code = error.code();
    let message = error.to_string();
    tracing::debug!(code, "{message}");
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(LastError { code, message }));
    code
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Runs `f` with the slot cleared, converting a panic into [`FfiError::CaughtPanic`].
pub(crate) fn catch_panic<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
    clear_last_error();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!("caught panic at the FFI boundary: {message}");
            Err(FfiError::CaughtPanic(message))
        }
    }
}

/// Boundary for functions that return an [`ErrorCode`].
pub(crate) fn code_boundary(f: impl FnOnce() -> Result<()>) -> ErrorCode {
    match catch_panic(f) {
        Ok(()) => citeproc_sys::CR_ERR_NONE,
        Err(error) => set_last_error(error),
    }
}

/// Boundary for functions that return a value, with `on_error` as the failure sentinel.
pub(crate) fn value_boundary<R>(on_error: R, f: impl FnOnce() -> Result<R>) -> R {
    match catch_panic(f) {
        Ok(value) => value,
        Err(error) => {
            set_last_error(error);
            on_error
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Clears the calling thread's last error.
#[unsafe(no_mangle)]
pub extern "C" fn citeproc_rs_last_error_clear() {
    clear_last_error();
}

/// Returns the code of the calling thread's last error, or `CR_ERR_NONE`.
#[unsafe(no_mangle)]
pub extern "C" fn citeproc_rs_last_error_code() -> ErrorCode {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(citeproc_sys::CR_ERR_NONE, |error| error.code)
    })
}

/// Writes the calling thread's last error message into a host buffer.
///
/// The slot is left untouched, so the message can be read again. When there
/// is no error the buffer is cleared and nothing is written.
///
/// # Safety
///
/// `user_data` must be valid for the callbacks in `buffer_ops`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_last_error_utf8(
    buffer_ops: BufferOps,
    user_data: *mut c_void,
) -> ErrorCode {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let writer = BufferWriter::new(buffer_ops, user_data)?;
        LAST_ERROR.with(|slot| match slot.borrow().as_ref() {
            Some(error) => writer.replace(error.message.as_bytes()),
            None => writer.clear(),
        })
    }));
    match result {
        Ok(Ok(())) => citeproc_sys::CR_ERR_NONE,
        Ok(Err(error)) => error.code(),
        Err(_) => citeproc_sys::CR_ERR_CAUGHT_PANIC,
    }
}
