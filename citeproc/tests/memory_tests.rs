// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Ownership of callback state and engine handles.

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use citeproc::{BuiltInLocales, Driver, OutputFormat, UserData};
use common::{GERMAN_STYLE, NOTE_STYLE, owls, setup};

#[test]
fn fetch_context_lives_exactly_as_long_as_the_driver() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let driver = Driver::new(
        setup(),
        GERMAN_STYLE,
        move |_: &str| -> Option<String> {
            counted.fetch_add(1, Ordering::SeqCst);
            None
        },
        OutputFormat::Plain,
    )
    .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(Arc::strong_count(&calls), 2);

    drop(driver);
    assert_eq!(Arc::strong_count(&calls), 1);
}

#[test]
fn failed_creation_releases_the_fetch_context() {
    let marker = Arc::new(());
    let held = Arc::clone(&marker);
    let result = Driver::new(
        setup(),
        "<style/>",
        move |_: &str| -> Option<String> {
            let _ = &held;
            None
        },
        OutputFormat::Plain,
    );
    assert!(result.is_err());
    assert_eq!(Arc::strong_count(&marker), 1);
}

#[test]
fn capsule_reconstruction_never_takes_ownership() {
    let shared = Arc::new(String::from("state"));
    let capsule = UserData::new(Arc::clone(&shared));
    let raw = capsule.borrow();
    for _ in 0..10_000 {
        let state = unsafe { UserData::<Arc<String>>::reconstruct(raw) };
        assert_eq!(state.as_str(), "state");
    }
    assert_eq!(Arc::strong_count(&shared), 2);
    drop(capsule);
    assert_eq!(Arc::strong_count(&shared), 1);
}

#[test]
fn many_drivers_and_clusters_are_released() {
    let api = setup();
    let before = Arc::strong_count(&api);
    for i in 0..100 {
        let mut driver = Driver::new(api.clone(), NOTE_STYLE, BuiltInLocales, OutputFormat::Plain).unwrap();
        driver.insert_reference(&owls()).unwrap();
        let cluster = driver.cluster(i).unwrap();
        cluster.append_ref("owls").unwrap();
        driver.insert_cluster(&cluster).unwrap();
        if i % 2 == 0 {
            cluster.destroy();
            driver.destroy();
        }
    }
    assert_eq!(Arc::strong_count(&api), before);
}
