// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Hooks for exercising failure paths from binding tests. Only built with the `testing` feature.

use std::os::raw::c_char;

use citeproc_sys::{ErrorCode, LogLevel};

use crate::{
    args,
    driver::DriverHandle,
    error::{FfiError, code_boundary},
};

/// Panics inside the boundary. Always returns `CR_ERR_CAUGHT_PANIC`.
#[unsafe(no_mangle)]
pub extern "C" fn citeproc_rs_test_panic() -> ErrorCode {
    code_boundary(|| panic!("citeproc_rs_test_panic was called"))
}

/// Panics while holding the driver's lock, leaving the driver poisoned.
///
/// # Safety
///
/// `driver` must be null or a live driver pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_test_panic_poison_driver(driver: *mut citeproc_sys::Driver) -> ErrorCode {
    code_boundary(|| {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        driver.with(|_| -> Result<(), FfiError> {
            panic!("citeproc_rs_test_panic_poison_driver was called")
        })
    })
}

/// Emits one `tracing` event at `level` with `message`.
///
/// # Safety
///
/// `message` must be valid for `message_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_test_log_msg(
    level: LogLevel,
    message: *const c_char,
    message_len: usize,
) -> ErrorCode {
    code_boundary(|| {
        let message = unsafe { args::utf8(message, message_len, "message")? };
        match level {
            citeproc_sys::CR_LOG_LEVEL_ERROR => tracing::error!("{message}"),
            citeproc_sys::CR_LOG_LEVEL_WARN => tracing::warn!("{message}"),
            citeproc_sys::CR_LOG_LEVEL_INFO => tracing::info!("{message}"),
            citeproc_sys::CR_LOG_LEVEL_DEBUG => tracing::debug!("{message}"),
            citeproc_sys::CR_LOG_LEVEL_TRACE => tracing::trace!("{message}"),
            other => return Err(FfiError::Indexing(format!("{other} is not a log level"))),
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panics_are_caught() {
        assert_eq!(citeproc_rs_test_panic(), citeproc_sys::CR_ERR_CAUGHT_PANIC);
        assert_eq!(
            crate::error::citeproc_rs_last_error_code(),
            citeproc_sys::CR_ERR_CAUGHT_PANIC
        );
    }

    #[test]
    fn unknown_log_levels_are_rejected() {
        let message = "hello";
        let code = unsafe { citeproc_rs_test_log_msg(9, message.as_ptr() as *const c_char, message.len()) };
        assert_eq!(code, citeproc_sys::CR_ERR_INDEXING);
    }
}
