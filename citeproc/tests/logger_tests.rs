// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! The engine logger is process-wide, so everything about it is checked in a
//! single test in its own binary. No `tracing` subscriber may be installed
//! here before the engine's.

mod common;

use std::os::raw::c_char;
use std::sync::{Arc, Mutex};

use citeproc::{ErrorKind, LevelFilter, Log, LogLevel, Logger};
use citeproc_ffi::testing::citeproc_rs_test_log_msg;

const TEST_MODULE: &str = "citeproc_ffi::testing";

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<(LogLevel, String)>>>,
    flushes: Arc<Mutex<usize>>,
}

impl Log for Recorder {
    fn log(&self, level: LogLevel, module_path: &str, message: &str) {
        if module_path == TEST_MODULE {
            self.events.lock().unwrap().push((level, message.to_string()));
        }
    }

    fn flush(&self) {
        *self.flushes.lock().unwrap() += 1;
    }
}

fn emit(level: LogLevel, message: &str) {
    let code = unsafe {
        citeproc_rs_test_log_msg(level.as_raw(), message.as_ptr() as *const c_char, message.len())
    };
    assert_eq!(code, citeproc_sys::CR_ERR_NONE);
}

#[test]
fn engine_events_reach_the_installed_backend() {
    let api = common::api();
    let recorder = Recorder::default();
    // Raises the test hooks' threshold to warnings; other modules keep `Info`.
    let filter = format!("{TEST_MODULE}=warn");
    Logger::install(&api, LevelFilter::Info, &filter, recorder.clone()).unwrap();

    emit(LogLevel::Warn, "hello from the engine");
    emit(LogLevel::Info, "silenced by the directive");
    emit(LogLevel::Debug, "below the minimum");
    emit(LogLevel::Trace, "far below the minimum");
    emit(LogLevel::Error, "something broke");

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            (LogLevel::Warn, "hello from the engine".to_string()),
            (LogLevel::Error, "something broke".to_string()),
        ]
    );
    assert!(*recorder.flushes.lock().unwrap() >= 1);

    let second = Recorder::default();
    let events = Arc::clone(&second.events);
    let err = Logger::install(&api, LevelFilter::Trace, "", second).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SetLogger);
    // The rejected backend is released, not leaked.
    assert_eq!(Arc::strong_count(&events), 1);

    emit(LogLevel::Warn, "after the second install");
    assert_eq!(recorder.events.lock().unwrap().len(), 3);
    assert!(events.lock().unwrap().is_empty());
}
