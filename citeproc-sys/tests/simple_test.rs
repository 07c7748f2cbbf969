// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Smoke tests for the hand-maintained ABI declarations.

use std::mem::{align_of, size_of};

/// Verifies that the plain-data structures have the C layout the engine expects.
#[test]
fn cluster_position_has_c_layout() {
    let position = citeproc_sys::ClusterPosition {
        id: 7,
        is_note: true,
        note_number: 3,
        ..Default::default()
    };

    assert!(!position.is_preview_marker);
    assert_eq!(size_of::<citeproc_sys::ClusterPosition>(), 16);
    assert_eq!(align_of::<citeproc_sys::ClusterPosition>(), 4);
    println!("cluster position: {:?}", position);
}

/// Nullable callbacks must stay pointer sized so `None` crosses as NULL.
#[test]
fn vtables_are_pairs_of_nullable_pointers() {
    assert_eq!(
        size_of::<citeproc_sys::BufferOps>(),
        2 * size_of::<*const ()>()
    );
    assert_eq!(
        size_of::<citeproc_sys::LoggerVTable>(),
        2 * size_of::<*const ()>()
    );

    let ops = citeproc_sys::BufferOps::default();
    assert!(ops.write.is_none());
    assert!(ops.clear.is_none());
}

#[test]
fn init_options_default_to_html_without_callbacks() {
    let init = citeproc_sys::InitOptions::default();
    assert!(init.style.is_null());
    assert_eq!(init.style_len, 0);
    assert!(init.locale_fetch_callback.is_none());
    assert_eq!(init.format, citeproc_sys::CR_OUTPUT_FORMAT_HTML);
}

#[test]
fn error_codes_are_distinct() {
    let codes = [
        citeproc_sys::CR_ERR_NONE,
        citeproc_sys::CR_ERR_UTF8,
        citeproc_sys::CR_ERR_NULL_BYTE,
        citeproc_sys::CR_ERR_NULL_POINTER,
        citeproc_sys::CR_ERR_SERIALIZATION,
        citeproc_sys::CR_ERR_INVALID_STYLE,
        citeproc_sys::CR_ERR_REORDERING,
        citeproc_sys::CR_ERR_CLUSTER_NOT_IN_FLOW,
        citeproc_sys::CR_ERR_BUFFER_OPS,
        citeproc_sys::CR_ERR_POISONED,
        citeproc_sys::CR_ERR_CAUGHT_PANIC,
        citeproc_sys::CR_ERR_INDEXING,
        citeproc_sys::CR_ERR_SET_LOGGER,
    ];
    for (index, code) in codes.iter().enumerate() {
        assert_eq!(*code as usize, index);
    }
}

#[test]
fn loading_a_missing_library_fails_cleanly() {
    let result = unsafe { citeproc_sys::CiteprocRs::new("/nonexistent/libciteproc_ffi.so") };
    assert!(result.is_err());
}
