// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! # citeproc-ffi: the engine side of the citeproc-rs C ABI
//!
//! This crate builds the shared library whose `citeproc_rs_*` symbols are
//! declared in `citeproc-sys`. It owns everything that has to happen on the
//! engine side of the boundary:
//!
//! - a thread-local last-error slot, cleared at the start of every fallible call
//! - `catch_unwind` around every exported function, so a panic is reported as
//!   `CR_ERR_CAUGHT_PANIC` instead of unwinding into the host
//! - drivers guarded by a mutex, which turns a panic mid-call into a
//!   permanently `CR_ERR_POISONED` driver
//! - the write-once locale slot handed to the host's fetch callback
//! - the process-wide logger install
//!
//! Behind the boundary sits a small CSL processor: text, group, label and
//! names elements, macros, locale terms, and HTML / RTF / plain output.
//!
//! The library can be loaded at runtime from the `cdylib`, or linked into a
//! Rust binary and reached through [`functions`].

mod args;
mod buffer;
mod cluster;
mod driver;
mod error;
mod locale;
mod logger;
mod processor;
mod reference;
mod render;
mod style;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cluster::{
    citeproc_rs_cluster_cite_new, citeproc_rs_cluster_cite_set_locator, citeproc_rs_cluster_cite_set_prefix,
    citeproc_rs_cluster_cite_set_ref, citeproc_rs_cluster_cite_set_suffix, citeproc_rs_cluster_free,
    citeproc_rs_cluster_new, citeproc_rs_cluster_reset,
};
pub use driver::{
    citeproc_rs_driver_format_bibliography, citeproc_rs_driver_format_cluster, citeproc_rs_driver_free,
    citeproc_rs_driver_insert_cluster, citeproc_rs_driver_insert_reference, citeproc_rs_driver_intern_cluster_id,
    citeproc_rs_driver_new, citeproc_rs_driver_preview_reference, citeproc_rs_driver_set_cluster_order,
};
pub use error::{FfiError, citeproc_rs_last_error_clear, citeproc_rs_last_error_code, citeproc_rs_last_error_utf8};
pub use locale::citeproc_rs_locale_slot_write;
pub use logger::citeproc_rs_set_logger;

/// The function table for the engine linked into the current binary.
///
/// Pass it to `citeproc_sys::CiteprocRs::from_functions` to use the engine
/// without loading a shared library.
pub fn functions() -> citeproc_sys::Functions {
    citeproc_sys::Functions {
        last_error_clear: citeproc_rs_last_error_clear,
        last_error_code: citeproc_rs_last_error_code,
        last_error_utf8: citeproc_rs_last_error_utf8,
        driver_new: citeproc_rs_driver_new,
        driver_free: citeproc_rs_driver_free,
        driver_insert_reference: citeproc_rs_driver_insert_reference,
        driver_preview_reference: citeproc_rs_driver_preview_reference,
        driver_intern_cluster_id: citeproc_rs_driver_intern_cluster_id,
        driver_insert_cluster: citeproc_rs_driver_insert_cluster,
        driver_set_cluster_order: citeproc_rs_driver_set_cluster_order,
        driver_format_cluster: citeproc_rs_driver_format_cluster,
        driver_format_bibliography: citeproc_rs_driver_format_bibliography,
        cluster_new: citeproc_rs_cluster_new,
        cluster_free: citeproc_rs_cluster_free,
        cluster_reset: citeproc_rs_cluster_reset,
        cluster_cite_new: citeproc_rs_cluster_cite_new,
        cluster_cite_set_prefix: citeproc_rs_cluster_cite_set_prefix,
        cluster_cite_set_suffix: citeproc_rs_cluster_cite_set_suffix,
        cluster_cite_set_ref: citeproc_rs_cluster_cite_set_ref,
        cluster_cite_set_locator: citeproc_rs_cluster_cite_set_locator,
        locale_slot_write: citeproc_rs_locale_slot_write,
        set_logger: citeproc_rs_set_logger,
    }
}
