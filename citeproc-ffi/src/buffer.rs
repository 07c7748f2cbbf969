// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

use std::os::raw::c_void;

use citeproc_sys::BufferOps;

use crate::error::{FfiError, Result};

/// A host buffer borrowed for the duration of one call.
pub(crate) struct BufferWriter {
    ops: BufferOps,
    user_data: *mut c_void,
}

impl BufferWriter {
    pub(crate) fn new(ops: BufferOps, user_data: *mut c_void) -> Result<Self> {
        if user_data.is_null() {
            return Err(FfiError::NullPointer("buffer user data"));
        }
        Ok(Self { ops, user_data })
    }

    pub(crate) fn clear(&self) -> Result<()> {
        let clear = self
            .ops
            .clear
            .ok_or(FfiError::BufferOps("no clear callback registered"))?;
        // Safety: the caller handed us `user_data` together with these ops for this call.
        if unsafe { clear(self.user_data) } {
            Ok(())
        } else {
            Err(FfiError::BufferOps("clear callback reported failure"))
        }
    }

    pub(crate) fn write(&self, bytes: &[u8]) -> Result<()> {
        let write = self
            .ops
            .write
            .ok_or(FfiError::BufferOps("no write callback registered"))?;
        if unsafe { write(self.user_data, bytes.as_ptr(), bytes.len()) } {
            Ok(())
        } else {
            Err(FfiError::BufferOps("write callback reported failure"))
        }
    }

    /// Clears the buffer, then writes `bytes` into it.
    pub(crate) fn replace(&self, bytes: &[u8]) -> Result<()> {
        self.clear()?;
        self.write(bytes)
    }
}
