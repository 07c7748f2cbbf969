// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! The [`Driver`]: one loaded style with its references and document.

use std::os::raw::c_char;

use citeproc_sys::ClusterId;
use serde::Serialize;

use crate::{
    Error, Result,
    api::CiteprocApiHandle,
    buffer::Utf8Buffer,
    cluster::{Cluster, ClusterPosition, null_result},
    locale::{FetchContext, LocaleFetcher, fetch_locale_callback},
    user_data::UserData,
};

/// Output format for citations, bibliographies and previews.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Html = citeproc_sys::CR_OUTPUT_FORMAT_HTML,
    Rtf = citeproc_sys::CR_OUTPUT_FORMAT_RTF,
    Plain = citeproc_sys::CR_OUTPUT_FORMAT_PLAIN,
}

impl OutputFormat {
    pub fn as_raw(self) -> citeproc_sys::OutputFormat {
        self as citeproc_sys::OutputFormat
    }
}

/// A citation processor instance.
///
/// A driver is created from a CSL style and keeps a store of references, a set
/// of clusters and the order those clusters appear in the document. All output
/// is rendered in the format chosen at creation time unless a call says
/// otherwise.
///
/// Methods take `&mut self`: a driver, like its output buffer, serves one call
/// at a time. It may be moved to another thread between calls.
///
/// If the engine panics during a call, that call fails with
/// [`crate::ErrorKind::CaughtPanic`] and every later call fails with
/// [`crate::ErrorKind::Poisoned`]. Create a new driver to recover.
///
/// # Examples
///
/// ```no_run
/// use citeproc::{BuiltInLocales, Cite, ClusterPosition, Driver, OutputFormat, config::library_path, load_api};
///
/// # fn main() -> Result<(), citeproc::Error> {
/// let api = load_api(library_path())?;
/// let style = std::fs::read_to_string("chicago.csl").unwrap();
/// let mut driver = Driver::new(api, &style, BuiltInLocales, OutputFormat::Plain)?;
///
/// driver.insert_reference(&serde_json::json!({"id": "smith", "title": "Sparrows"}))?;
/// let cluster = driver.cluster_named("intro")?;
/// cluster.append(&Cite::new("smith"))?;
/// let id = driver.insert_cluster(&cluster)?;
/// driver.set_cluster_order(&[ClusterPosition::in_text(id)])?;
/// println!("{}", driver.format_cluster(id)?);
/// # Ok(())
/// # }
/// ```
pub struct Driver {
    api: CiteprocApiHandle,
    raw: *mut citeproc_sys::Driver,
    buffer: Utf8Buffer,
    output_format: OutputFormat,
    // Must outlive `raw`; `Drop` frees the engine driver before fields are dropped.
    _fetch_context: UserData<FetchContext>,
}

// Safety: the engine driver is internally synchronised and never bound to the
// creating thread. The fetch context only holds `Send` data.
unsafe impl Send for Driver {}

impl Driver {
    /// Parses `style` and resolves its locales.
    ///
    /// `fetcher` is consulted synchronously, before this returns, once per
    /// language tag the style needs.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::InvalidStyle`] with a byte-offset diagnostic if the
    /// style does not parse or validate.
    pub fn new(
        api: CiteprocApiHandle,
        style: &str,
        fetcher: impl LocaleFetcher,
        output_format: OutputFormat,
    ) -> Result<Self> {
        let fetch_context = FetchContext::new(api.clone(), fetcher);
        let init = citeproc_sys::InitOptions {
            style: style.as_ptr() as *const c_char,
            style_len: style.len(),
            locale_fetch_context: fetch_context.borrow(),
            locale_fetch_callback: Some(fetch_locale_callback),
            format: output_format.as_raw(),
            buffer_ops: Utf8Buffer::OPS,
        };
        unsafe { api.last_error_clear() };
        let raw = unsafe { api.driver_new(init) };
        if raw.is_null() {
            return Err(null_result(&api, "driver_new"));
        }
        tracing::debug!(?output_format, "driver created");
        Ok(Self {
            api,
            raw,
            buffer: Utf8Buffer::new(),
            output_format,
            _fetch_context: fetch_context,
        })
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Serialises `reference` to CSL-JSON and stores it, replacing any reference with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::Serialization`] if the record has no `id`; the store is unchanged.
    pub fn insert_reference<R: Serialize + ?Sized>(&mut self, reference: &R) -> Result<()> {
        let json = serde_json::to_vec(reference)?;
        self.insert_reference_json(&json)
    }

    /// Stores an already serialised CSL-JSON reference.
    pub fn insert_reference_json(&mut self, json: &[u8]) -> Result<()> {
        let code = unsafe {
            self.api
                .driver_insert_reference(self.raw, json.as_ptr() as *const c_char, json.len())
        };
        Error::from_code(&self.api, code)
    }

    /// Renders `reference` as a lone bibliography entry without storing it.
    ///
    /// Uses the driver's output format unless `format` overrides it.
    pub fn preview_reference<R: Serialize + ?Sized>(
        &mut self,
        reference: &R,
        format: Option<OutputFormat>,
    ) -> Result<String> {
        let json = serde_json::to_vec(reference)?;
        let format = format.unwrap_or(self.output_format);
        let code = unsafe {
            self.api.driver_preview_reference(
                self.raw,
                json.as_ptr() as *const c_char,
                json.len(),
                format.as_raw(),
                self.buffer.user_data(),
            )
        };
        self.take_output(code)
    }

    /// Maps `name` to a cluster id that stays the same for the life of this driver.
    pub fn intern_cluster_id(&mut self, name: &str) -> Result<ClusterId> {
        let id = unsafe {
            self.api
                .driver_intern_cluster_id(self.raw, name.as_ptr() as *const c_char, name.len())
        };
        ClusterId::try_from(id).map_err(|_| null_result(&self.api, "driver_intern_cluster_id"))
    }

    /// Allocates an empty cluster with a host-chosen id.
    pub fn cluster(&self, id: ClusterId) -> Result<Cluster> {
        Cluster::new(self.api.clone(), id)
    }

    /// Allocates an empty cluster whose id is interned from `name`.
    pub fn cluster_named(&mut self, name: &str) -> Result<Cluster> {
        let id = self.intern_cluster_id(name)?;
        self.cluster(id)
    }

    /// Copies `cluster` into the document under its current id, replacing any previous contents.
    ///
    /// The document order is not changed; see [`Driver::set_cluster_order`].
    pub fn insert_cluster(&mut self, cluster: &Cluster) -> Result<ClusterId> {
        let code = unsafe { self.api.driver_insert_cluster(self.raw, cluster.as_raw()) };
        Error::from_code(&self.api, code)?;
        Ok(cluster.id())
    }

    /// Replaces the whole document order.
    ///
    /// Clusters left out can no longer be formatted until they are ordered again.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::Reordering`] for preview markers, duplicate or
    /// unknown ids, and decreasing note numbers. The previous order stays in place.
    pub fn set_cluster_order(&mut self, positions: &[ClusterPosition]) -> Result<()> {
        let raw = ClusterPosition::as_raw_slice(positions);
        let code = unsafe {
            self.api
                .driver_set_cluster_order(self.raw, raw.as_ptr(), raw.len())
        };
        Error::from_code(&self.api, code)
    }

    /// Renders one cluster.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::ClusterNotInFlow`] if `id` is not in the current document order.
    pub fn format_cluster(&mut self, id: ClusterId) -> Result<String> {
        let code = unsafe {
            self.api
                .driver_format_cluster(self.raw, id, self.buffer.user_data())
        };
        self.take_output(code)
    }

    /// Renders the bibliography of every reference cited in the current document order.
    pub fn format_bibliography(&mut self) -> Result<String> {
        let code = unsafe {
            self.api
                .driver_format_bibliography(self.raw, self.buffer.user_data())
        };
        self.take_output(code)
    }

    fn take_output(&mut self, code: citeproc_sys::ErrorCode) -> Result<String> {
        let result = Error::from_code(&self.api, code);
        let output = self.buffer.take_string();
        result.map(|()| output)
    }

    /// The raw engine handle, for engine functions these bindings do not wrap.
    ///
    /// The pointer stays owned by this driver.
    pub fn as_raw(&self) -> *mut citeproc_sys::Driver {
        self.raw
    }

    /// Releases the engine driver now instead of on drop.
    pub fn destroy(mut self) {
        let raw = std::mem::replace(&mut self.raw, std::ptr::null_mut());
        unsafe { self.api.driver_free(raw) };
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe { self.api.driver_free(self.raw) };
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("raw", &self.raw)
            .field("output_format", &self.output_format)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_formats_match_the_abi() {
        assert_eq!(OutputFormat::default(), OutputFormat::Html);
        assert_eq!(OutputFormat::Rtf.as_raw(), citeproc_sys::CR_OUTPUT_FORMAT_RTF);
        assert_eq!(OutputFormat::Plain.as_raw(), citeproc_sys::CR_OUTPUT_FORMAT_PLAIN);
    }
}
