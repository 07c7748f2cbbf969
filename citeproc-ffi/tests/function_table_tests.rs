// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Drives the engine through its function table, the way a host that loaded
//! the shared library would.

use std::os::raw::{c_char, c_void};

use citeproc_sys::{BufferOps, CiteprocRs, InitOptions};

unsafe extern "C" fn write(user_data: *mut c_void, src: *const u8, len: usize) -> bool {
    let out = unsafe { &mut *(user_data as *mut Vec<u8>) };
    out.extend_from_slice(unsafe { std::slice::from_raw_parts(src, len) });
    true
}

unsafe extern "C" fn clear(user_data: *mut c_void) -> bool {
    unsafe { &mut *(user_data as *mut Vec<u8>) }.clear();
    true
}

const OPS: BufferOps = BufferOps {
    write: Some(write),
    clear: Some(clear),
};

#[test]
fn errors_are_readable_through_the_table() {
    let api = CiteprocRs::from_functions(citeproc_ffi::functions());
    let style = "<citation/>";
    let init = InitOptions {
        style: style.as_ptr() as *const c_char,
        style_len: style.len(),
        buffer_ops: OPS,
        ..InitOptions::default()
    };
    unsafe {
        assert!(api.driver_new(init).is_null());
        assert_eq!(api.last_error_code(), citeproc_sys::CR_ERR_INVALID_STYLE);

        let mut message = Vec::new();
        let code = api.last_error_utf8(OPS, &mut message as *mut Vec<u8> as *mut c_void);
        assert_eq!(code, citeproc_sys::CR_ERR_NONE);
        let message = String::from_utf8(message).unwrap();
        assert!(message.contains("bytes 0..11 [Error] Root element must be <style>"), "{message}");

        // Reading does not consume the error; clearing does.
        assert_eq!(api.last_error_code(), citeproc_sys::CR_ERR_INVALID_STYLE);
        api.last_error_clear();
        assert_eq!(api.last_error_code(), citeproc_sys::CR_ERR_NONE);
    }
}

#[test]
fn one_shot_formatting_through_the_table() {
    let api = CiteprocRs::from_functions(citeproc_ffi::functions());
    let style = r#"<style xmlns="http://purl.org/net/xbiblio/csl" version="1.0">
  <citation><layout><text variable="title" font-weight="bold"/></layout></citation>
</style>"#;
    let init = InitOptions {
        style: style.as_ptr() as *const c_char,
        style_len: style.len(),
        buffer_ops: OPS,
        ..InitOptions::default()
    };
    let reference = br#"{"id": "r", "title": "Fish & Chips"}"#;
    let mut out = Vec::new();
    unsafe {
        let driver = api.driver_new(init);
        assert!(!driver.is_null());
        let code = api.driver_preview_reference(
            driver,
            reference.as_ptr() as *const c_char,
            reference.len(),
            citeproc_sys::CR_OUTPUT_FORMAT_HTML,
            &mut out as *mut Vec<u8> as *mut c_void,
        );
        assert_eq!(code, citeproc_sys::CR_ERR_NONE);
        api.driver_free(driver);
    }
    assert_eq!(String::from_utf8(out).unwrap(), "<b>Fish &amp; Chips</b>");
}
