// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! # citeproc-sys: Raw FFI bindings to the citeproc-rs C ABI
//!
//! This crate describes the C-compatible surface of the citeproc-rs citation
//! engine: the `#[repr(C)]` structures exchanged across the boundary, the
//! integer constants used for enumerations, the opaque handle types, and a
//! function table that can be loaded from a shared library with `libloading`.
//!
//! ## Overview
//!
//! `citeproc-sys` exposes:
//! - Opaque handles (`Driver`, `Cluster`, `LocaleSlot`)
//! - Plain-data structures (`InitOptions`, `BufferOps`, `ClusterPosition`, `LoggerVTable`)
//! - Constants for error codes, output formats, locator types and log levels
//! - [`Functions`], the table of every exported `citeproc_rs_*` symbol, and
//!   [`CiteprocRs`], which owns a table together with the library it came from
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe `citeproc`
//! wrapper crate instead, which provides:
//! - RAII ownership of driver and cluster handles
//! - Translation of the engine's last-error slot into `Result`s
//! - Host-side buffers and callback trampolines
//!
//! ## Safety
//!
//! Every function in the table is `unsafe` and requires the caller to uphold the
//! engine's invariants:
//! - Handles are released exactly once, by the matching `*_free` function
//! - String arguments are passed as pointer + byte length and must stay valid
//!   for the duration of the call
//! - Buffer user data must point at whatever the registered [`BufferOps`]
//!   callbacks expect, and must not be shared by two in-flight calls
//! - The last-error slot is thread-local: read it on the calling thread,
//!   immediately after the failing call

#![allow(non_upper_case_globals)]
#![allow(clippy::missing_safety_doc)]

use std::{
    ffi::OsStr,
    os::raw::{c_char, c_void},
};

/// Opaque engine instance: one loaded style, locale set and output format.
#[repr(C)]
#[derive(Debug)]
pub struct Driver {
    _unused: [u8; 0],
}

/// Opaque, reusable citation cluster builder living in engine memory.
#[repr(C)]
#[derive(Debug)]
pub struct Cluster {
    _unused: [u8; 0],
}

/// Opaque write-once slot handed to a locale fetch callback.
#[repr(C)]
#[derive(Debug)]
pub struct LocaleSlot {
    _unused: [u8; 0],
}

/// Integer identifier of a cluster within one driver.
pub type ClusterId = u32;

/// Result code returned by fallible engine functions.
pub type ErrorCode = u32;
pub const CR_ERR_NONE: ErrorCode = 0;
pub const CR_ERR_UTF8: ErrorCode = 1;
pub const CR_ERR_NULL_BYTE: ErrorCode = 2;
pub const CR_ERR_NULL_POINTER: ErrorCode = 3;
pub const CR_ERR_SERIALIZATION: ErrorCode = 4;
pub const CR_ERR_INVALID_STYLE: ErrorCode = 5;
pub const CR_ERR_REORDERING: ErrorCode = 6;
pub const CR_ERR_CLUSTER_NOT_IN_FLOW: ErrorCode = 7;
pub const CR_ERR_BUFFER_OPS: ErrorCode = 8;
pub const CR_ERR_POISONED: ErrorCode = 9;
pub const CR_ERR_CAUGHT_PANIC: ErrorCode = 10;
pub const CR_ERR_INDEXING: ErrorCode = 11;
pub const CR_ERR_SET_LOGGER: ErrorCode = 12;

/// Output format for rendered citations and bibliographies.
pub type OutputFormat = u32;
pub const CR_OUTPUT_FORMAT_HTML: OutputFormat = 0;
pub const CR_OUTPUT_FORMAT_RTF: OutputFormat = 1;
pub const CR_OUTPUT_FORMAT_PLAIN: OutputFormat = 2;

/// CSL locator type attached to a cite's locator.
pub type LocatorType = u32;
pub const CR_LOCATOR_BOOK: LocatorType = 0;
pub const CR_LOCATOR_CHAPTER: LocatorType = 1;
pub const CR_LOCATOR_COLUMN: LocatorType = 2;
pub const CR_LOCATOR_FIGURE: LocatorType = 3;
pub const CR_LOCATOR_FOLIO: LocatorType = 4;
pub const CR_LOCATOR_ISSUE: LocatorType = 5;
pub const CR_LOCATOR_LINE: LocatorType = 6;
pub const CR_LOCATOR_NOTE: LocatorType = 7;
pub const CR_LOCATOR_OPUS: LocatorType = 8;
pub const CR_LOCATOR_PAGE: LocatorType = 9;
pub const CR_LOCATOR_PARAGRAPH: LocatorType = 10;
pub const CR_LOCATOR_PART: LocatorType = 11;
pub const CR_LOCATOR_SECTION: LocatorType = 12;
pub const CR_LOCATOR_SUB_VERBO: LocatorType = 13;
pub const CR_LOCATOR_VERSE: LocatorType = 14;
pub const CR_LOCATOR_VOLUME: LocatorType = 15;
pub const CR_LOCATOR_ACT: LocatorType = 16;
pub const CR_LOCATOR_APPENDIX: LocatorType = 17;
pub const CR_LOCATOR_ARTICLE_LOCATOR: LocatorType = 18;
pub const CR_LOCATOR_CANON: LocatorType = 19;
pub const CR_LOCATOR_ELOCATION: LocatorType = 20;
pub const CR_LOCATOR_EQUATION: LocatorType = 21;
pub const CR_LOCATOR_RULE: LocatorType = 22;
pub const CR_LOCATOR_SCENE: LocatorType = 23;
pub const CR_LOCATOR_SUPPLEMENT: LocatorType = 24;
pub const CR_LOCATOR_TABLE: LocatorType = 25;
pub const CR_LOCATOR_TIMESTAMP: LocatorType = 26;
pub const CR_LOCATOR_TITLE_LOCATOR: LocatorType = 27;

/// Severity of a single log event.
pub type LogLevel = u32;
pub const CR_LOG_LEVEL_ERROR: LogLevel = 1;
pub const CR_LOG_LEVEL_WARN: LogLevel = 2;
pub const CR_LOG_LEVEL_INFO: LogLevel = 3;
pub const CR_LOG_LEVEL_DEBUG: LogLevel = 4;
pub const CR_LOG_LEVEL_TRACE: LogLevel = 5;

/// Most verbose severity a logger accepts. `OFF` accepts nothing.
pub type LevelFilter = u32;
pub const CR_LEVEL_FILTER_OFF: LevelFilter = 0;
pub const CR_LEVEL_FILTER_ERROR: LevelFilter = 1;
pub const CR_LEVEL_FILTER_WARN: LevelFilter = 2;
pub const CR_LEVEL_FILTER_INFO: LevelFilter = 3;
pub const CR_LEVEL_FILTER_DEBUG: LevelFilter = 4;
pub const CR_LEVEL_FILTER_TRACE: LevelFilter = 5;

/// Appends `src_len` bytes to the buffer behind `user_data`. Returns `false` on failure.
pub type WriteCallback =
    unsafe extern "C" fn(user_data: *mut c_void, src: *const u8, src_len: usize) -> bool;

/// Empties the buffer behind `user_data`, keeping its capacity. Returns `false` on failure.
pub type ClearCallback = unsafe extern "C" fn(user_data: *mut c_void) -> bool;

/// Host-implemented byte sink the engine streams UTF-8 output into.
///
/// Both callbacks are only invoked synchronously, on the calling thread, for
/// the duration of the call that received the `user_data` pointer.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct BufferOps {
    pub write: Option<WriteCallback>,
    pub clear: Option<ClearCallback>,
}

/// Called by the engine to resolve a locale by language tag.
///
/// `lang` is a null-terminated tag such as `"de-AT"`. The callback either
/// writes locale XML into `slot` with `citeproc_rs_locale_slot_write`, or
/// writes nothing to signal that the locale is not available.
pub type LocaleFetchCallback =
    unsafe extern "C" fn(context: *mut c_void, slot: *mut LocaleSlot, lang: *const c_char);

/// Arguments to `citeproc_rs_driver_new`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct InitOptions {
    /// UTF-8 CSL style XML (not null-terminated).
    pub style: *const c_char,
    pub style_len: usize,
    /// Borrowed host pointer passed back to `locale_fetch_callback` unchanged.
    pub locale_fetch_context: *mut c_void,
    pub locale_fetch_callback: Option<LocaleFetchCallback>,
    pub format: OutputFormat,
    /// Used for every call on this driver that writes into a host buffer.
    pub buffer_ops: BufferOps,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            style: std::ptr::null(),
            style_len: 0,
            locale_fetch_context: std::ptr::null_mut(),
            locale_fetch_callback: None,
            format: CR_OUTPUT_FORMAT_HTML,
            buffer_ops: BufferOps::default(),
        }
    }
}

/// One entry of the document order submitted with `citeproc_rs_driver_set_cluster_order`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ClusterPosition {
    /// Marks the spot of a cluster being previewed; `id` is ignored when set.
    pub is_preview_marker: bool,
    pub id: ClusterId,
    pub is_note: bool,
    /// Footnote number; only meaningful when `is_note` is set.
    pub note_number: u32,
}

/// Receives one log event. `module_path` and `message` are UTF-8, not null-terminated.
pub type LogWriteCallback = unsafe extern "C" fn(
    instance: *mut c_void,
    level: LogLevel,
    module_path: *const u8,
    module_path_len: usize,
    message: *const u8,
    message_len: usize,
);

/// Asks the host logger to flush any buffered output.
pub type LogFlushCallback = unsafe extern "C" fn(instance: *mut c_void);

/// Host logger installed with `citeproc_rs_set_logger`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct LoggerVTable {
    pub write: Option<LogWriteCallback>,
    pub flush: Option<LogFlushCallback>,
}

/// Declares [`Functions`], its loader, and one forwarding method per entry on [`CiteprocRs`].
macro_rules! citeproc_functions {
    ($(
        $(#[$doc:meta])*
        fn $name:ident = $symbol:literal ($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;
    )*) => {
        /// Table of every function exported by the engine.
        ///
        /// Obtain one from a shared library with [`Functions::load`], or build it
        /// from statically linked symbols when the engine lives in-process.
        #[derive(Debug, Copy, Clone)]
        pub struct Functions {
            $(
                $(#[$doc])*
                pub $name: unsafe extern "C" fn($($ty),*) $(-> $ret)?,
            )*
        }

        impl Functions {
            /// Resolves every symbol from `library`.
            ///
            /// # Errors
            ///
            /// Fails if any symbol is missing; a partially loaded table is never returned.
            ///
            /// # Safety
            ///
            /// The library must export the symbols with exactly the signatures declared here.
            pub unsafe fn load(library: &libloading::Library) -> Result<Self, libloading::Error> {
                unsafe {
                    Ok(Self {
                        $(
                            $name: *library.get::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                                concat!($symbol, "\0").as_bytes(),
                            )?,
                        )*
                    })
                }
            }
        }

        impl CiteprocRs {
            $(
                $(#[$doc])*
                #[inline]
                pub unsafe fn $name(&self, $($arg: $ty),*) $(-> $ret)? {
                    unsafe { (self.functions.$name)($($arg),*) }
                }
            )*
        }
    };
}

citeproc_functions! {
    /// Clears the calling thread's last-error slot.
    fn last_error_clear = "citeproc_rs_last_error_clear"();
    /// Returns the code stored in the calling thread's last-error slot.
    fn last_error_code = "citeproc_rs_last_error_code"() -> ErrorCode;
    /// Writes the last error's message into a host buffer.
    fn last_error_utf8 = "citeproc_rs_last_error_utf8"(
        buffer_ops: BufferOps,
        user_data: *mut c_void,
    ) -> ErrorCode;

    /// Parses a style and resolves its locales. Returns null on failure.
    fn driver_new = "citeproc_rs_driver_new"(init: InitOptions) -> *mut Driver;
    /// Releases a driver. Null is ignored.
    fn driver_free = "citeproc_rs_driver_free"(driver: *mut Driver);
    /// Stores one CSL-JSON reference, replacing any reference with the same id.
    fn driver_insert_reference = "citeproc_rs_driver_insert_reference"(
        driver: *mut Driver,
        ref_json: *const c_char,
        ref_json_len: usize,
    ) -> ErrorCode;
    /// Renders a CSL-JSON reference as a lone bibliography entry without storing it.
    fn driver_preview_reference = "citeproc_rs_driver_preview_reference"(
        driver: *mut Driver,
        ref_json: *const c_char,
        ref_json_len: usize,
        format: OutputFormat,
        user_buf: *mut c_void,
    ) -> ErrorCode;
    /// Maps a string to a stable cluster id. Negative on failure.
    fn driver_intern_cluster_id = "citeproc_rs_driver_intern_cluster_id"(
        driver: *mut Driver,
        str: *const c_char,
        str_len: usize,
    ) -> i64;
    /// Copies a cluster builder's contents into the driver under its current id.
    fn driver_insert_cluster = "citeproc_rs_driver_insert_cluster"(
        driver: *mut Driver,
        cluster: *const Cluster,
    ) -> ErrorCode;
    /// Replaces the whole document order.
    fn driver_set_cluster_order = "citeproc_rs_driver_set_cluster_order"(
        driver: *mut Driver,
        positions: *const ClusterPosition,
        positions_len: usize,
    ) -> ErrorCode;
    /// Renders one cluster that is part of the current document order.
    fn driver_format_cluster = "citeproc_rs_driver_format_cluster"(
        driver: *mut Driver,
        cluster_id: ClusterId,
        user_buf: *mut c_void,
    ) -> ErrorCode;
    /// Renders the bibliography for the current document order.
    fn driver_format_bibliography = "citeproc_rs_driver_format_bibliography"(
        driver: *mut Driver,
        user_buf: *mut c_void,
    ) -> ErrorCode;

    /// Allocates an empty cluster builder. Returns null on failure.
    fn cluster_new = "citeproc_rs_cluster_new"(id: ClusterId) -> *mut Cluster;
    /// Releases a cluster builder. Null is ignored.
    fn cluster_free = "citeproc_rs_cluster_free"(cluster: *mut Cluster);
    /// Removes every cite and assigns a new id, keeping the allocation.
    fn cluster_reset = "citeproc_rs_cluster_reset"(
        cluster: *mut Cluster,
        new_id: ClusterId,
    ) -> ErrorCode;
    /// Appends a cite and returns its index, or -1 on failure.
    fn cluster_cite_new = "citeproc_rs_cluster_cite_new"(
        cluster: *mut Cluster,
        ref_id: *const c_char,
        ref_id_len: usize,
    ) -> isize;
    fn cluster_cite_set_prefix = "citeproc_rs_cluster_cite_set_prefix"(
        cluster: *mut Cluster,
        cite_index: usize,
        prefix: *const c_char,
        prefix_len: usize,
    ) -> ErrorCode;
    fn cluster_cite_set_suffix = "citeproc_rs_cluster_cite_set_suffix"(
        cluster: *mut Cluster,
        cite_index: usize,
        suffix: *const c_char,
        suffix_len: usize,
    ) -> ErrorCode;
    fn cluster_cite_set_ref = "citeproc_rs_cluster_cite_set_ref"(
        cluster: *mut Cluster,
        cite_index: usize,
        ref_id: *const c_char,
        ref_id_len: usize,
    ) -> ErrorCode;
    fn cluster_cite_set_locator = "citeproc_rs_cluster_cite_set_locator"(
        cluster: *mut Cluster,
        cite_index: usize,
        locator: *const c_char,
        locator_len: usize,
        loc_type: LocatorType,
    ) -> ErrorCode;

    /// Stores locale XML in the slot handed to a locale fetch callback.
    fn locale_slot_write = "citeproc_rs_locale_slot_write"(
        slot: *mut LocaleSlot,
        locale_xml: *const c_char,
        locale_xml_len: usize,
    ) -> ErrorCode;

    /// Installs the process-wide logger. Fails with `CR_ERR_SET_LOGGER` if one is installed.
    fn set_logger = "citeproc_rs_set_logger"(
        instance: *mut c_void,
        vtable: LoggerVTable,
        min_severity: LevelFilter,
        filters: *const c_char,
        filters_len: usize,
    ) -> ErrorCode;
}

/// A resolved engine API: a [`Functions`] table plus the library that backs it.
///
/// The library, when present, is kept loaded for as long as this value lives,
/// so the function pointers in the table stay valid.
#[derive(Debug)]
pub struct CiteprocRs {
    _library: Option<libloading::Library>,
    functions: Functions,
}

impl CiteprocRs {
    /// Loads the engine from the shared library at `path`.
    ///
    /// # Safety
    ///
    /// Loading runs the library's initialisers, and the library must export
    /// the `citeproc_rs_*` symbols with the signatures declared in this crate.
    pub unsafe fn new<P: AsRef<OsStr>>(path: P) -> Result<Self, libloading::Error> {
        let library = unsafe { libloading::Library::new(path)? };
        let functions = unsafe { Functions::load(&library)? };
        Ok(Self {
            _library: Some(library),
            functions,
        })
    }

    /// Wraps a table whose functions are linked into the current binary.
    pub fn from_functions(functions: Functions) -> Self {
        Self {
            _library: None,
            functions,
        }
    }

    /// The underlying function table.
    pub fn functions(&self) -> &Functions {
        &self.functions
    }
}
