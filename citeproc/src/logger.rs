// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Receiving the engine's log output.
//!
//! The engine keeps one process-wide logger. [`Logger::install`] hands it a
//! [`Log`] backend; every event the engine emits at or above the chosen level
//! is delivered to that backend on the emitting thread.

use std::{
    fmt,
    os::raw::{c_char, c_void},
    panic::{self, AssertUnwindSafe},
};

use crate::{Error, Result, api::CiteprocApi, user_data::UserData};

/// Severity of a single log event.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error = citeproc_sys::CR_LOG_LEVEL_ERROR,
    Warn = citeproc_sys::CR_LOG_LEVEL_WARN,
    Info = citeproc_sys::CR_LOG_LEVEL_INFO,
    Debug = citeproc_sys::CR_LOG_LEVEL_DEBUG,
    Trace = citeproc_sys::CR_LOG_LEVEL_TRACE,
}

impl LogLevel {
    pub fn from_raw(raw: citeproc_sys::LogLevel) -> Option<Self> {
        Some(match raw {
            citeproc_sys::CR_LOG_LEVEL_ERROR => Self::Error,
            citeproc_sys::CR_LOG_LEVEL_WARN => Self::Warn,
            citeproc_sys::CR_LOG_LEVEL_INFO => Self::Info,
            citeproc_sys::CR_LOG_LEVEL_DEBUG => Self::Debug,
            citeproc_sys::CR_LOG_LEVEL_TRACE => Self::Trace,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> citeproc_sys::LogLevel {
        self as citeproc_sys::LogLevel
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        })
    }
}

/// The most verbose level a logger accepts.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LevelFilter {
    Off = citeproc_sys::CR_LEVEL_FILTER_OFF,
    Error = citeproc_sys::CR_LEVEL_FILTER_ERROR,
    Warn = citeproc_sys::CR_LEVEL_FILTER_WARN,
    #[default]
    Info = citeproc_sys::CR_LEVEL_FILTER_INFO,
    Debug = citeproc_sys::CR_LEVEL_FILTER_DEBUG,
    Trace = citeproc_sys::CR_LEVEL_FILTER_TRACE,
}

impl LevelFilter {
    pub fn as_raw(self) -> citeproc_sys::LevelFilter {
        self as citeproc_sys::LevelFilter
    }

    /// Whether an event at `level` passes this filter.
    pub fn allows(self, level: LogLevel) -> bool {
        level.as_raw() <= self.as_raw()
    }
}

/// A sink for engine log events.
///
/// Called from whichever thread the engine is running on, possibly several at
/// once. Implementations must not panic; a panic is caught and the event dropped.
pub trait Log: Send + Sync + 'static {
    fn log(&self, level: LogLevel, module_path: &str, message: &str);

    fn flush(&self) {}
}

/// Installs engine loggers.
pub struct Logger;

impl Logger {
    /// Installs `backend` as the engine's process-wide logger.
    ///
    /// `filter` takes `RUST_LOG`-style directives (`"citeproc_ffi::style=trace"`)
    /// and may be empty. Nothing more verbose than `min` is ever delivered.
    ///
    /// The backend is leaked on success: the engine keeps calling it for the
    /// rest of the process.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::SetLogger`] if a logger is already installed.
    pub fn install(api: &CiteprocApi, min: LevelFilter, filter: &str, backend: impl Log) -> Result<()> {
        let capsule: UserData<Box<dyn Log>> = UserData::new(Box::new(backend));
        let vtable = citeproc_sys::LoggerVTable {
            write: Some(write_trampoline),
            flush: Some(flush_trampoline),
        };
        let code = unsafe {
            api.set_logger(
                capsule.borrow(),
                vtable,
                min.as_raw(),
                filter.as_ptr() as *const c_char,
                filter.len(),
            )
        };
        Error::from_code(api, code)?;
        std::mem::forget(capsule);
        Ok(())
    }
}

unsafe extern "C" fn write_trampoline(
    instance: *mut c_void,
    level: citeproc_sys::LogLevel,
    module_path: *const u8,
    module_path_len: usize,
    message: *const u8,
    message_len: usize,
) {
    if instance.is_null() {
        return;
    }
    let Some(level) = LogLevel::from_raw(level) else {
        return;
    };
    let backend = unsafe { UserData::<Box<dyn Log>>::reconstruct(instance) };
    let module_path = unsafe { lossy(module_path, module_path_len) };
    let message = unsafe { lossy(message, message_len) };
    let _ = panic::catch_unwind(AssertUnwindSafe(|| backend.log(level, &module_path, &message)));
}

unsafe extern "C" fn flush_trampoline(instance: *mut c_void) {
    if instance.is_null() {
        return;
    }
    let backend = unsafe { UserData::<Box<dyn Log>>::reconstruct(instance) };
    let _ = panic::catch_unwind(AssertUnwindSafe(|| backend.flush()));
}

unsafe fn lossy<'a>(ptr: *const u8, len: usize) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() || len == 0 {
        return std::borrow::Cow::Borrowed("");
    }
    String::from_utf8_lossy(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Re-emits engine events as `tracing` events with target `citeproc_rs`.
///
/// The engine's module path travels in the `module_path` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl Log for TracingLog {
    fn log(&self, level: LogLevel, module_path: &str, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: "citeproc_rs", module_path, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "citeproc_rs", module_path, "{message}"),
            LogLevel::Info => tracing::info!(target: "citeproc_rs", module_path, "{message}"),
            LogLevel::Debug => tracing::debug!(target: "citeproc_rs", module_path, "{message}"),
            LogLevel::Trace => tracing::trace!(target: "citeproc_rs", module_path, "{message}"),
        }
    }
}
