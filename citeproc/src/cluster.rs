// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Citation clusters and the cites inside them.
//!
//! A [`Cluster`] owns an engine-side builder. Cites appended to it are
//! addressed through [`CiteRef`]s, which borrow the cluster (so they cannot
//! outlive it) and remember the cluster's generation. [`Cluster::reset`]
//! starts a new generation, after which every older `CiteRef` fails with
//! [`Error::StaleCite`].

use std::{cell::Cell, os::raw::c_char};

use citeproc_sys::ClusterId;

use crate::{
    Error, Result,
    api::CiteprocApiHandle,
    error::last_error,
};

/// CSL locator types. The discriminants are the engine's `CR_LOCATOR_*` values.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorType {
    Book = citeproc_sys::CR_LOCATOR_BOOK,
    Chapter = citeproc_sys::CR_LOCATOR_CHAPTER,
    Column = citeproc_sys::CR_LOCATOR_COLUMN,
    Figure = citeproc_sys::CR_LOCATOR_FIGURE,
    Folio = citeproc_sys::CR_LOCATOR_FOLIO,
    Issue = citeproc_sys::CR_LOCATOR_ISSUE,
    Line = citeproc_sys::CR_LOCATOR_LINE,
    Note = citeproc_sys::CR_LOCATOR_NOTE,
    Opus = citeproc_sys::CR_LOCATOR_OPUS,
    Page = citeproc_sys::CR_LOCATOR_PAGE,
    Paragraph = citeproc_sys::CR_LOCATOR_PARAGRAPH,
    Part = citeproc_sys::CR_LOCATOR_PART,
    Section = citeproc_sys::CR_LOCATOR_SECTION,
    SubVerbo = citeproc_sys::CR_LOCATOR_SUB_VERBO,
    Verse = citeproc_sys::CR_LOCATOR_VERSE,
    Volume = citeproc_sys::CR_LOCATOR_VOLUME,
    Act = citeproc_sys::CR_LOCATOR_ACT,
    Appendix = citeproc_sys::CR_LOCATOR_APPENDIX,
    ArticleLocator = citeproc_sys::CR_LOCATOR_ARTICLE_LOCATOR,
    Canon = citeproc_sys::CR_LOCATOR_CANON,
    Elocation = citeproc_sys::CR_LOCATOR_ELOCATION,
    Equation = citeproc_sys::CR_LOCATOR_EQUATION,
    Rule = citeproc_sys::CR_LOCATOR_RULE,
    Scene = citeproc_sys::CR_LOCATOR_SCENE,
    Supplement = citeproc_sys::CR_LOCATOR_SUPPLEMENT,
    Table = citeproc_sys::CR_LOCATOR_TABLE,
    Timestamp = citeproc_sys::CR_LOCATOR_TIMESTAMP,
    TitleLocator = citeproc_sys::CR_LOCATOR_TITLE_LOCATOR,
}

impl LocatorType {
    pub fn as_raw(self) -> citeproc_sys::LocatorType {
        self as citeproc_sys::LocatorType
    }
}

/// Everything needed to append one cite in a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cite {
    pub ref_id: String,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub locator: Option<(String, LocatorType)>,
}

impl Cite {
    pub fn new(ref_id: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_locator(mut self, locator: impl Into<String>, locator_type: LocatorType) -> Self {
        self.locator = Some((locator.into(), locator_type));
        self
    }
}

/// One entry of the document order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterPosition(citeproc_sys::ClusterPosition);

impl ClusterPosition {
    /// A cluster in the running text.
    pub fn in_text(id: ClusterId) -> Self {
        Self(citeproc_sys::ClusterPosition {
            id,
            ..Default::default()
        })
    }

    /// A cluster in footnote `note_number`.
    pub fn note(id: ClusterId, note_number: u32) -> Self {
        Self(citeproc_sys::ClusterPosition {
            id,
            is_note: true,
            note_number,
            ..Default::default()
        })
    }

    /// Marks where a previewed cluster would go. The engine rejects it in a real document order.
    pub fn preview_marker() -> Self {
        Self(citeproc_sys::ClusterPosition {
            is_preview_marker: true,
            ..Default::default()
        })
    }

    /// A preview marker standing in a footnote.
    pub fn preview_marker_in_note(note_number: u32) -> Self {
        Self(citeproc_sys::ClusterPosition {
            is_preview_marker: true,
            is_note: true,
            note_number,
            ..Default::default()
        })
    }

    pub fn id(&self) -> ClusterId {
        self.0.id
    }

    pub fn note_number(&self) -> Option<u32> {
        self.0.is_note.then_some(self.0.note_number)
    }

    pub fn is_preview_marker(&self) -> bool {
        self.0.is_preview_marker
    }

    pub(crate) fn as_raw_slice(positions: &[Self]) -> &[citeproc_sys::ClusterPosition] {
        // Safety: `ClusterPosition` is `repr(transparent)` over the raw struct.
        unsafe { std::slice::from_raw_parts(positions.as_ptr().cast(), positions.len()) }
    }
}

/// An engine-side cluster builder.
///
/// Submitting it with [`crate::Driver::insert_cluster`] copies its cites into
/// the driver; the builder can then be [`reset`](Cluster::reset) and reused.
pub struct Cluster {
    api: CiteprocApiHandle,
    raw: *mut citeproc_sys::Cluster,
    id: Cell<ClusterId>,
    generation: Cell<u64>,
}

// Safety: the engine-side builder is only reached through this owner, and the
// `Cell`s keep `Cluster` from being shared between threads.
unsafe impl Send for Cluster {}

impl Cluster {
    /// Allocates an empty cluster with the given id.
    ///
    /// # Errors
    ///
    /// Returns the engine's error if it fails to allocate the builder.
    pub fn new(api: CiteprocApiHandle, id: ClusterId) -> Result<Self> {
        unsafe { api.last_error_clear() };
        let raw = unsafe { api.cluster_new(id) };
        if raw.is_null() {
            return Err(null_result(&api, "cluster_new"));
        }
        Ok(Self {
            api,
            raw,
            id: Cell::new(id),
            generation: Cell::new(0),
        })
    }

    pub fn id(&self) -> ClusterId {
        self.id.get()
    }

    /// Appends a cite and applies its optional fields.
    ///
    /// # Errors
    ///
    /// Returns the engine's error for invalid input, e.g. a locator type the
    /// engine does not know.
    pub fn append(&self, cite: &Cite) -> Result<CiteRef<'_>> {
        let cite_ref = self.append_ref(&cite.ref_id)?;
        if let Some(prefix) = &cite.prefix {
            cite_ref.set_prefix(prefix)?;
        }
        if let Some(suffix) = &cite.suffix {
            cite_ref.set_suffix(suffix)?;
        }
        if let Some((locator, locator_type)) = &cite.locator {
            cite_ref.set_locator(locator, *locator_type)?;
        }
        Ok(cite_ref)
    }

    /// Appends a cite with only a reference id.
    pub fn append_ref(&self, ref_id: &str) -> Result<CiteRef<'_>> {
        let index = unsafe {
            self.api
                .cluster_cite_new(self.raw, ref_id.as_ptr() as *const c_char, ref_id.len())
        };
        let index = usize::try_from(index).map_err(|_| null_result(&self.api, "cluster_cite_new"))?;
        Ok(CiteRef {
            cluster: self,
            index,
            generation: self.generation.get(),
        })
    }

    /// Removes every cite and assigns `new_id`, keeping the engine allocation.
    ///
    /// Every [`CiteRef`] obtained before the reset becomes stale.
    pub fn reset(&self, new_id: ClusterId) -> Result<()> {
        Error::from_code(&self.api, unsafe { self.api.cluster_reset(self.raw, new_id) })?;
        self.id.set(new_id);
        self.generation.set(self.generation.get() + 1);
        Ok(())
    }

    pub(crate) fn as_raw(&self) -> *const citeproc_sys::Cluster {
        self.raw
    }

    /// Releases the engine builder now instead of on drop.
    pub fn destroy(mut self) {
        let raw = std::mem::replace(&mut self.raw, std::ptr::null_mut());
        unsafe { self.api.cluster_free(raw) };
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe { self.api.cluster_free(self.raw) };
        }
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("id", &self.id.get())
            .field("generation", &self.generation.get())
            .finish_non_exhaustive()
    }
}

/// Handle to one cite in a [`Cluster`], valid until the cluster is reset.
#[derive(Debug, Clone, Copy)]
pub struct CiteRef<'a> {
    cluster: &'a Cluster,
    index: usize,
    generation: u64,
}

impl CiteRef<'_> {
    /// Position of the cite within its cluster.
    pub fn index(&self) -> usize {
        self.index
    }

    fn check(&self) -> Result<&Cluster> {
        if self.generation != self.cluster.generation.get() {
            return Err(Error::StaleCite);
        }
        Ok(self.cluster)
    }

    pub fn set_prefix(&self, prefix: &str) -> Result<()> {
        let cluster = self.check()?;
        let code = unsafe {
            cluster.api.cluster_cite_set_prefix(
                cluster.raw,
                self.index,
                prefix.as_ptr() as *const c_char,
                prefix.len(),
            )
        };
        Error::from_code(&cluster.api, code)
    }

    pub fn set_suffix(&self, suffix: &str) -> Result<()> {
        let cluster = self.check()?;
        let code = unsafe {
            cluster.api.cluster_cite_set_suffix(
                cluster.raw,
                self.index,
                suffix.as_ptr() as *const c_char,
                suffix.len(),
            )
        };
        Error::from_code(&cluster.api, code)
    }

    pub fn set_ref_id(&self, ref_id: &str) -> Result<()> {
        let cluster = self.check()?;
        let code = unsafe {
            cluster.api.cluster_cite_set_ref(
                cluster.raw,
                self.index,
                ref_id.as_ptr() as *const c_char,
                ref_id.len(),
            )
        };
        Error::from_code(&cluster.api, code)
    }

    pub fn set_locator(&self, locator: &str, locator_type: LocatorType) -> Result<()> {
        let cluster = self.check()?;
        let code = unsafe {
            cluster.api.cluster_cite_set_locator(
                cluster.raw,
                self.index,
                locator.as_ptr() as *const c_char,
                locator.len(),
                locator_type.as_raw(),
            )
        };
        Error::from_code(&cluster.api, code)
    }
}

/// The error for a call that signalled failure through its return value.
pub(crate) fn null_result(api: &citeproc_sys::CiteprocRs, function: &str) -> Error {
    last_error(api).unwrap_or_else(|| Error::Citeproc {
        kind: crate::ErrorKind::NullPointer,
        message: format!("{function} failed without reporting an error"),
    })
}
