// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Pointer + length arguments received from the host.

use std::os::raw::c_char;

use crate::error::{FfiError, Result};

/// Borrows `len` bytes at `ptr`. A null pointer is only accepted together with a zero length.
///
/// # Safety
///
/// A non-null `ptr` must be valid for reads of `len` bytes for `'a`.
pub(crate) unsafe fn bytes<'a>(ptr: *const c_char, len: usize, what: &'static str) -> Result<&'a [u8]> {
    if ptr.is_null() {
        return if len == 0 {
            Ok(&[])
        } else {
            Err(FfiError::NullPointer(what))
        };
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr as *const u8, len) })
}

/// Like [`bytes`], additionally requiring valid UTF-8.
///
/// # Safety
///
/// Same contract as [`bytes`].
pub(crate) unsafe fn utf8<'a>(ptr: *const c_char, len: usize, what: &'static str) -> Result<&'a str> {
    let bytes = unsafe { bytes(ptr, len, what)? };
    Ok(std::str::from_utf8(bytes)?)
}
