// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Cluster builders: host-owned, engine-allocated lists of cites.

use std::os::raw::c_char;

use citeproc_sys::{ClusterId, ErrorCode, LocatorType};

use crate::{
    args,
    error::{FfiError, Result, code_boundary, value_boundary},
};

/// CSL term names indexed by the `CR_LOCATOR_*` constants.
const LOCATOR_TERMS: [&str; 28] = [
    "book",
    "chapter",
    "column",
    "figure",
    "folio",
    "issue",
    "line",
    "note",
    "opus",
    "page",
    "paragraph",
    "part",
    "section",
    "sub-verbo",
    "verse",
    "volume",
    "act",
    "appendix",
    "article-locator",
    "canon",
    "elocation",
    "equation",
    "rule",
    "scene",
    "supplement",
    "table",
    "timestamp",
    "title-locator",
];

pub(crate) fn locator_term(loc_type: LocatorType) -> Result<&'static str> {
    LOCATOR_TERMS
        .get(loc_type as usize)
        .copied()
        .ok_or_else(|| FfiError::Indexing(format!("{loc_type} is not a locator type")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Cite {
    pub ref_id: String,
    pub prefix: String,
    pub suffix: String,
    pub locator: Option<(String, &'static str)>,
}

#[derive(Debug, Default)]
pub(crate) struct ClusterBuilder {
    pub id: ClusterId,
    pub cites: Vec<Cite>,
}

impl ClusterBuilder {
    /// # Safety
    ///
    /// `ptr` must be null or a live pointer returned by `citeproc_rs_cluster_new`.
    pub(crate) unsafe fn from_raw<'a>(ptr: *const citeproc_sys::Cluster) -> Result<&'a Self> {
        unsafe { (ptr as *const Self).as_ref() }.ok_or(FfiError::NullPointer("cluster"))
    }

    unsafe fn from_raw_mut<'a>(ptr: *mut citeproc_sys::Cluster) -> Result<&'a mut Self> {
        unsafe { (ptr as *mut Self).as_mut() }.ok_or(FfiError::NullPointer("cluster"))
    }

    fn cite_mut(&mut self, index: usize) -> Result<&mut Cite> {
        let len = self.cites.len();
        self.cites.get_mut(index).ok_or_else(|| {
            FfiError::Indexing(format!("cite index {index} out of range for a cluster of {len}"))
        })
    }
}

/// Allocates an empty cluster builder.
#[unsafe(no_mangle)]
pub extern "C" fn citeproc_rs_cluster_new(id: ClusterId) -> *mut citeproc_sys::Cluster {
    value_boundary(std::ptr::null_mut(), || {
        let cluster = Box::new(ClusterBuilder {
            id,
            cites: Vec::new(),
        });
        Ok(Box::into_raw(cluster) as *mut citeproc_sys::Cluster)
    })
}

/// # Safety
///
/// `cluster` must be null or a pointer from `citeproc_rs_cluster_new` not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_cluster_free(cluster: *mut citeproc_sys::Cluster) {
    if !cluster.is_null() {
        drop(unsafe { Box::from_raw(cluster as *mut ClusterBuilder) });
    }
}

/// # Safety
///
/// `cluster` must be a live cluster pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_cluster_reset(
    cluster: *mut citeproc_sys::Cluster,
    new_id: ClusterId,
) -> ErrorCode {
    code_boundary(|| {
        let cluster = unsafe { ClusterBuilder::from_raw_mut(cluster)? };
        cluster.cites.clear();
        cluster.id = new_id;
        Ok(())
    })
}

/// Appends a cite and returns its index, or -1 on failure.
///
/// # Safety
///
/// `cluster` must be a live cluster pointer and `ref_id` valid for `ref_id_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_cluster_cite_new(
    cluster: *mut citeproc_sys::Cluster,
    ref_id: *const c_char,
    ref_id_len: usize,
) -> isize {
    value_boundary(-1, || {
        let cluster = unsafe { ClusterBuilder::from_raw_mut(cluster)? };
        let ref_id = unsafe { args::utf8(ref_id, ref_id_len, "ref id")? };
        cluster.cites.push(Cite {
            ref_id: ref_id.to_string(),
            ..Cite::default()
        });
        isize::try_from(cluster.cites.len() - 1)
            .map_err(|_| FfiError::Indexing("too many cites in one cluster".to_string()))
    })
}

unsafe fn set_field(
    cluster: *mut citeproc_sys::Cluster,
    cite_index: usize,
    value: *const c_char,
    value_len: usize,
    what: &'static str,
    apply: impl FnOnce(&mut Cite, &str) -> Result<()>,
) -> ErrorCode {
    code_boundary(|| {
        let cluster = unsafe { ClusterBuilder::from_raw_mut(cluster)? };
        let value = unsafe { args::utf8(value, value_len, what)? };
        apply(cluster.cite_mut(cite_index)?, value)
    })
}

/// # Safety
///
/// `cluster` must be a live cluster pointer and `prefix` valid for `prefix_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_cluster_cite_set_prefix(
    cluster: *mut citeproc_sys::Cluster,
    cite_index: usize,
    prefix: *const c_char,
    prefix_len: usize,
) -> ErrorCode {
    unsafe {
        set_field(cluster, cite_index, prefix, prefix_len, "prefix", |cite, value| {
            cite.prefix = value.to_string();
            Ok(())
        })
    }
}

/// # Safety
///
/// `cluster` must be a live cluster pointer and `suffix` valid for `suffix_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_cluster_cite_set_suffix(
    cluster: *mut citeproc_sys::Cluster,
    cite_index: usize,
    suffix: *const c_char,
    suffix_len: usize,
) -> ErrorCode {
    unsafe {
        set_field(cluster, cite_index, suffix, suffix_len, "suffix", |cite, value| {
            cite.suffix = value.to_string();
            Ok(())
        })
    }
}

/// # Safety
///
/// `cluster` must be a live cluster pointer and `ref_id` valid for `ref_id_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_cluster_cite_set_ref(
    cluster: *mut citeproc_sys::Cluster,
    cite_index: usize,
    ref_id: *const c_char,
    ref_id_len: usize,
) -> ErrorCode {
    unsafe {
        set_field(cluster, cite_index, ref_id, ref_id_len, "ref id", |cite, value| {
            cite.ref_id = value.to_string();
            Ok(())
        })
    }
}

/// # Safety
///
/// `cluster` must be a live cluster pointer and `locator` valid for `locator_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn citeproc_rs_cluster_cite_set_locator(
    cluster: *mut citeproc_sys::Cluster,
    cite_index: usize,
    locator: *const c_char,
    locator_len: usize,
    loc_type: LocatorType,
) -> ErrorCode {
    unsafe {
        set_field(cluster, cite_index, locator, locator_len, "locator", |cite, value| {
            cite.locator = Some((value.to_string(), locator_term(loc_type)?));
            Ok(())
        })
    }
}
