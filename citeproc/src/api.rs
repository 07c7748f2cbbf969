// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Access to the engine's function table.

use std::{ffi::OsStr, sync::Arc};

use crate::Result;

/// The loaded engine: a function table and, when loaded from disk, the library backing it.
pub type CiteprocApi = citeproc_sys::CiteprocRs;

/// Shared handle to the engine, held by every driver and cluster created from it.
pub type CiteprocApiHandle = Arc<CiteprocApi>;

/// Loads the engine from a shared library.
///
/// # Arguments
///
/// * `path` - Path or file name of the `citeproc_ffi` shared library, e.g. from
///   [`crate::config::library_path`]
///
/// # Errors
///
/// Returns [`crate::Error::LibLoading`] if the library cannot be opened or does
/// not export every `citeproc_rs_*` symbol.
///
/// # Examples
///
/// ```no_run
/// use citeproc::{config::library_path, load_api};
///
/// # fn main() -> Result<(), citeproc::Error> {
/// let api = load_api(library_path())?;
/// # Ok(())
/// # }
/// ```
pub fn load_api(path: impl AsRef<OsStr>) -> Result<CiteprocApiHandle> {
    let api = unsafe { citeproc_sys::CiteprocRs::new(path)? };
    tracing::debug!("citeproc-rs engine loaded");
    Ok(Arc::new(api))
}

/// Wraps a function table whose engine is linked into the current binary.
pub fn api_from_functions(functions: citeproc_sys::Functions) -> CiteprocApiHandle {
    Arc::new(citeproc_sys::CiteprocRs::from_functions(functions))
}
