// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Exported driver functions.
//!
//! A driver is a [`Processor`] behind a mutex. A panic while the lock is held
//! poisons the mutex, and every later call on that driver fails with
//! `CR_ERR_POISONED` without touching the processor again.

use std::{
    os::raw::{c_char, c_void},
    sync::Mutex,
};

use citeproc_sys::{BufferOps, ClusterId, ClusterPosition, ErrorCode, InitOptions};

use crate::{
    args,
    buffer::BufferWriter,
    cluster::ClusterBuilder,
    error::{FfiError, Result, code_boundary, value_boundary},
    locale::{BUILT_IN_LANG, Locale, LocaleFetcher},
    processor::Processor,
    reference::Reference,
    render::OutputFormat,
    style::Style,
};

pub(crate) struct DriverHandle {
    processor: Mutex<Processor>,
    buffer_ops: BufferOps,
}

impl DriverHandle {
    /// Resolves a driver pointer, failing with `Poisoned` before any argument is
    /// looked at if an earlier call on this driver panicked.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live pointer returned by `citeproc_rs_driver_new`.
    pub(crate) unsafe fn from_raw<'a>(ptr: *mut citeproc_sys::Driver) -> Result<&'a Self> {
        let driver = unsafe { (ptr as *const Self).as_ref() }.ok_or(FfiError::NullPointer("driver"))?;
        if driver.processor.is_poisoned() {
            return Err(poisoned());
        }
        Ok(driver)
    }

    /// Runs `f` with the processor locked.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Processor) -> Result<R>) -> Result<R> {
        let mut processor = self.processor.lock().map_err(|_| poisoned())?;
        f(&mut processor)
    }

    fn writer(&self, user_buf: *mut c_void) -> Result<BufferWriter> {
        BufferWriter::new(self.buffer_ops, user_buf)
    }
}

fn poisoned() -> FfiError {
    FfiError::Poisoned("the driver panicked in an earlier call and must be recreated")
}

fn build(init: &InitOptions) -> Result<DriverHandle> {
    let format = OutputFormat::from_raw(init.format)?;
    let text = unsafe { args::utf8(init.style, init.style_len, "style")? };
    let style = Style::parse(text)?;

    let tag = style.default_locale.as_deref().unwrap_or(BUILT_IN_LANG);
    let mut locale = match init.locale_fetch_callback {
        Some(callback) => LocaleFetcher {
            context: init.locale_fetch_context,
            callback,
        }
        .resolve(tag)?,
        None => Locale::built_in(),
    };
    for inline in &style.locales {
        let applies = inline.lang.as_deref().is_none_or(|lang| {
            lang == tag || tag.split('-').next() == Some(lang)
        });
        if applies {
            locale.merge(inline);
        }
    }
    tracing::debug!(locale = tag, ?format, "driver created");

    Ok(DriverHandle {
        processor: Mutex::new(Processor::new(style, locale, format)),
        buffer_ops: init.buffer_ops,
    })
}

/// Parses a style and resolves its locales. Returns null on failure.
///
/// The locale fetch callback, if any, is invoked synchronously before this returns.
///
/// # Safety
///
/// `init.style` must be valid for `init.style_len` bytes, and the fetch context
/// must be valid for the fetch callback.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_new(init: InitOptions) -> *mut citeproc_sys::Driver {
    value_boundary(std::ptr::null_mut(), || {
        let driver = Box::new(build(&init)?);
        Ok(Box::into_raw(driver) as *mut citeproc_sys::Driver)
    })
}

/// # Safety
///
/// `driver` must be null or a pointer from `citeproc_rs_driver_new` not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_free(driver: *mut citeproc_sys::Driver) {
    if !driver.is_null() {
        drop(unsafe { Box::from_raw(driver as *mut DriverHandle) });
    }
}

/// # Safety
///
/// `driver` must be live and `ref_json` valid for `ref_json_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_insert_reference(
    driver: *mut citeproc_sys::Driver,
    ref_json: *const c_char,
    ref_json_len: usize,
) -> ErrorCode {
    code_boundary(|| {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        let json = unsafe { args::bytes(ref_json, ref_json_len, "reference json")? };
        let reference = Reference::from_json(json)?;
        driver.with(|processor| {
            processor.insert_reference(reference);
            Ok(())
        })
    })
}

/// # Safety
///
/// `driver` must be live, `ref_json` valid for `ref_json_len` bytes, and
/// `user_buf` valid for the driver's buffer ops.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_preview_reference(
    driver: *mut citeproc_sys::Driver,
    ref_json: *const c_char,
    ref_json_len: usize,
    format: citeproc_sys::OutputFormat,
    user_buf: *mut c_void,
) -> ErrorCode {
    code_boundary(|| {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        let writer = driver.writer(user_buf)?;
        let format = OutputFormat::from_raw(format)?;
        let json = unsafe { args::bytes(ref_json, ref_json_len, "reference json")? };
        let reference = Reference::from_json(json)?;
        let output = driver.with(|processor| Ok(processor.preview_reference(&reference, format)))?;
        writer.replace(output.as_bytes())
    })
}

/// Maps a string to a stable cluster id. Negative on failure.
///
/// # Safety
///
/// `driver` must be live and `str` valid for `str_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_intern_cluster_id(
    driver: *mut citeproc_sys::Driver,
    str: *const c_char,
    str_len: usize,
) -> i64 {
    value_boundary(-1, || {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        let name = unsafe { args::utf8(str, str_len, "cluster id")? };
        driver.with(|processor| processor.intern_cluster_id(name).map(i64::from))
    })
}

/// # Safety
///
/// `driver` and `cluster` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_insert_cluster(
    driver: *mut citeproc_sys::Driver,
    cluster: *const citeproc_sys::Cluster,
) -> ErrorCode {
    code_boundary(|| {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        let cluster = unsafe { ClusterBuilder::from_raw(cluster)? };
        driver.with(|processor| {
            processor.insert_cluster(cluster);
            Ok(())
        })
    })
}

/// # Safety
///
/// `driver` must be live and `positions` valid for `positions_len` elements.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_set_cluster_order(
    driver: *mut citeproc_sys::Driver,
    positions: *const ClusterPosition,
    positions_len: usize,
) -> ErrorCode {
    code_boundary(|| {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        let positions: &[ClusterPosition] = if positions.is_null() {
            if positions_len != 0 {
                return Err(FfiError::NullPointer("cluster positions"));
            }
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(positions, positions_len) }
        };
        driver.with(|processor| processor.set_cluster_order(positions))
    })
}

/// # Safety
///
/// `driver` must be live and `user_buf` valid for the driver's buffer ops.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_format_cluster(
    driver: *mut citeproc_sys::Driver,
    cluster_id: ClusterId,
    user_buf: *mut c_void,
) -> ErrorCode {
    code_boundary(|| {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        let writer = driver.writer(user_buf)?;
        let output = driver.with(|processor| processor.format_cluster(cluster_id))?;
        writer.replace(output.as_bytes())
    })
}

/// # Safety
///
/// `driver` must be live and `user_buf` valid for the driver's buffer ops.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_driver_format_bibliography(
    driver: *mut citeproc_sys::Driver,
    user_buf: *mut c_void,
) -> ErrorCode {
    code_boundary(|| {
        let driver = unsafe { DriverHandle::from_raw(driver)? };
        let writer = driver.writer(user_buf)?;
        let output = driver.with(|processor| Ok(processor.format_bibliography()))?;
        writer.replace(output.as_bytes())
    })
}
