// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Forwarding of the engine's `tracing` events to a host logger.
//!
//! The host logger is installed as the process-wide default subscriber, so it
//! can be installed once. Events are delivered synchronously on the thread
//! that emitted them.

use std::{
    cell::Cell,
    fmt::{self, Write as _},
    os::raw::{c_char, c_void},
};

use citeproc_sys::{ErrorCode, LevelFilter, LogLevel, LoggerVTable};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter as TracingLevelFilter,
    layer::{Context, Layer, SubscriberExt},
};

use crate::{
    args,
    error::{FfiError, code_boundary},
};

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

struct HostLogger {
    instance: *mut c_void,
    vtable: LoggerVTable,
    max_level: TracingLevelFilter,
}

// Safety: the host promises that `instance` and the vtable may be used from
// any thread for the rest of the process.
unsafe impl Send for HostLogger {}
unsafe impl Sync for HostLogger {}

fn level_code(level: Level) -> LogLevel {
    match level {
        Level::ERROR => citeproc_sys::CR_LOG_LEVEL_ERROR,
        Level::WARN => citeproc_sys::CR_LOG_LEVEL_WARN,
        Level::INFO => citeproc_sys::CR_LOG_LEVEL_INFO,
        Level::DEBUG => citeproc_sys::CR_LOG_LEVEL_DEBUG,
        _ => citeproc_sys::CR_LOG_LEVEL_TRACE,
    }
}

pub(crate) fn level_filter(raw: LevelFilter) -> Result<TracingLevelFilter, FfiError> {
    Ok(match raw {
        citeproc_sys::CR_LEVEL_FILTER_OFF => TracingLevelFilter::OFF,
        citeproc_sys::CR_LEVEL_FILTER_ERROR => TracingLevelFilter::ERROR,
        citeproc_sys::CR_LEVEL_FILTER_WARN => TracingLevelFilter::WARN,
        citeproc_sys::CR_LEVEL_FILTER_INFO => TracingLevelFilter::INFO,
        citeproc_sys::CR_LEVEL_FILTER_DEBUG => TracingLevelFilter::DEBUG,
        citeproc_sys::CR_LEVEL_FILTER_TRACE => TracingLevelFilter::TRACE,
        other => return Err(FfiError::Indexing(format!("{other} is not a level filter"))),
    })
}

/// Collects the `message` field first, then every other field as `name=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for HostLogger {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.max_level {
            return;
        }
        let Some(write) = self.vtable.write else {
            return;
        };
        // A host sink that logs through the engine again would recurse forever.
        if FORWARDING.with(|forwarding| forwarding.replace(true)) {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        visitor.message.push_str(&visitor.fields);
        let module_path = metadata.module_path().unwrap_or(metadata.target());
        unsafe {
            write(
                self.instance,
                level_code(*metadata.level()),
                module_path.as_ptr(),
                module_path.len(),
                visitor.message.as_ptr(),
                visitor.message.len(),
            );
            if *metadata.level() == Level::ERROR
                && let Some(flush) = self.vtable.flush
            {
                flush(self.instance);
            }
        }
        FORWARDING.with(|forwarding| forwarding.set(false));
    }
}

/// The registry, directive filter and host layer that `citeproc_rs_set_logger` installs.
fn host_subscriber(
    instance: *mut c_void,
    vtable: LoggerVTable,
    max_level: TracingLevelFilter,
    filters: &str,
) -> impl Subscriber + Send + Sync + use<> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(max_level.into())
        .parse_lossy(filters);
    tracing_subscriber::registry().with(env_filter).with(HostLogger {
        instance,
        vtable,
        max_level,
    })
}

/// Installs the process-wide logger.
///
/// `filters` uses `RUST_LOG` directive syntax and may be empty. Events more
/// verbose than `min_severity` are never delivered. Errors are delivered
/// followed by a flush.
///
/// # Errors
///
/// Fails with `CR_ERR_SET_LOGGER` if a logger (or any global `tracing`
/// subscriber) is already installed; the existing one stays in place.
///
/// # Safety
///
/// `instance` and `vtable` must stay valid for the rest of the process, and
/// `filters` must be valid for `filters_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_set_logger(
    instance: *mut c_void,
    vtable: LoggerVTable,
    min_severity: LevelFilter,
    filters: *const c_char,
    filters_len: usize,
) -> ErrorCode {
    code_boundary(|| {
        let max_level = level_filter(min_severity)?;
        let filters = unsafe { args::utf8(filters, filters_len, "filters")? };
        tracing::subscriber::set_global_default(host_subscriber(instance, vtable, max_level, filters))
            .map_err(|err| FfiError::SetLogger(err.to_string()))?;
        tracing::debug!(%max_level, "host logger installed");
        Ok(())
    })
}
