// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Panics inside the engine: caught at the boundary, then poisoning the driver.

mod common;

use citeproc::{BuiltInLocales, ClusterPosition, Driver, Error, ErrorKind, OutputFormat};
use citeproc_ffi::testing::{citeproc_rs_test_panic, citeproc_rs_test_panic_poison_driver};
use common::{NOTE_STYLE, owls, setup};

#[test]
fn panics_are_reported_as_caught() {
    let api = setup();
    let err = Error::from_code(&api, citeproc_rs_test_panic()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CaughtPanic);
    assert!(err.to_string().contains("citeproc_rs_test_panic"), "{err}");
}

#[test]
fn a_panic_poisons_only_its_driver() {
    let api = setup();
    let mut poisoned = Driver::new(api.clone(), NOTE_STYLE, BuiltInLocales, OutputFormat::Plain).unwrap();
    let mut healthy = Driver::new(api.clone(), NOTE_STYLE, BuiltInLocales, OutputFormat::Plain).unwrap();

    let code = unsafe { citeproc_rs_test_panic_poison_driver(poisoned.as_raw()) };
    let err = Error::from_code(&api, code).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CaughtPanic);
    assert!(err.kind().is_fatal_for_driver());

    for _ in 0..3 {
        let err = poisoned.insert_reference(&owls()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Poisoned);
    }
    let err = poisoned.format_bibliography().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Poisoned);
    assert!(err.to_string().contains("recreated"), "{err}");
    poisoned.destroy();

    healthy.insert_reference(&owls()).unwrap();
    assert_eq!(healthy.preview_reference(&owls(), None).unwrap(), "Owls");

    let mut fresh = Driver::new(api, NOTE_STYLE, BuiltInLocales, OutputFormat::Plain).unwrap();
    fresh.insert_reference(&owls()).unwrap();
    assert_eq!(fresh.format_bibliography().unwrap(), "");
}

#[test]
fn poisoned_driver_rejects_calls_before_reading_their_input() {
    let api = setup();
    let mut driver = Driver::new(api.clone(), NOTE_STYLE, BuiltInLocales, OutputFormat::Plain).unwrap();
    let code = unsafe { citeproc_rs_test_panic_poison_driver(driver.as_raw()) };
    assert_eq!(Error::from_code(&api, code).unwrap_err().kind(), ErrorKind::CaughtPanic);

    let no_id = serde_json::json!({"title": "no id"});
    let err = driver.insert_reference(&no_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Poisoned);
    let err = driver.insert_reference_json(b"{not json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Poisoned);
    let err = driver.preview_reference(&no_id, Some(OutputFormat::Html)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Poisoned);
    let err = driver.intern_cluster_id("a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Poisoned);
    let err = driver.set_cluster_order(&[ClusterPosition::in_text(12345)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Poisoned);
}
