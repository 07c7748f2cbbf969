// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Host-side byte sink the engine streams UTF-8 output into.
//!
//! The engine never allocates host memory and the host never frees engine
//! memory: output is copied, through two callbacks, into a `Vec<u8>` owned by
//! the host object that made the call.

use std::{
    os::raw::c_void,
    panic::{self, AssertUnwindSafe},
};

/// A growable buffer reused across calls.
///
/// Only one engine call may write into a given buffer at a time. Owners take
/// `&mut self` around every call that hands the buffer out.
#[derive(Debug, Default)]
pub(crate) struct Utf8Buffer {
    data: Vec<u8>,
}

impl Utf8Buffer {
    /// Callbacks for every buffer of this type.
    pub(crate) const OPS: citeproc_sys::BufferOps = citeproc_sys::BufferOps {
        write: Some(write_callback),
        clear: Some(clear_callback),
    };

    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The pointer to pass as `user_data` alongside [`Self::OPS`]. Valid until `self` moves.
    pub(crate) fn user_data(&mut self) -> *mut c_void {
        self as *mut Self as *mut c_void
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Empties the buffer, keeping its capacity.
    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    /// Decodes the contents, replacing invalid sequences, and clears the buffer.
    pub(crate) fn take_string(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.data).into_owned();
        self.clear();
        text
    }
}

unsafe extern "C" fn write_callback(user_data: *mut c_void, src: *const u8, src_len: usize) -> bool {
    if user_data.is_null() || (src.is_null() && src_len != 0) {
        return false;
    }
    let buffer = unsafe { &mut *(user_data as *mut Utf8Buffer) };
    let bytes: &[u8] = if src_len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(src, src_len) }
    };
    panic::catch_unwind(AssertUnwindSafe(|| buffer.write(bytes))).is_ok()
}

unsafe extern "C" fn clear_callback(user_data: *mut c_void) -> bool {
    if user_data.is_null() {
        return false;
    }
    let buffer = unsafe { &mut *(user_data as *mut Utf8Buffer) };
    buffer.clear();
    true
}
