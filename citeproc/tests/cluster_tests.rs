// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for [`citeproc::Cluster`] and its cite references.

mod common;

use citeproc::{
    BuiltInLocales, Cite, ClusterPosition, Driver, Error, ErrorKind, LocatorType, OutputFormat,
};
use common::{NOTE_STYLE, owls, setup, sparrows};

fn driver() -> Driver {
    let mut driver = Driver::new(setup(), NOTE_STYLE, BuiltInLocales, OutputFormat::Plain).unwrap();
    driver.insert_reference(&sparrows()).unwrap();
    driver.insert_reference(&owls()).unwrap();
    driver
}

#[test]
fn cite_fields_are_applied() {
    let mut driver = driver();
    let cluster = driver.cluster(1).unwrap();
    let cite = cluster.append_ref("sparrows").unwrap();
    cite.set_prefix("prefix: ").unwrap();
    cite.set_suffix(" :suffix").unwrap();
    cite.set_locator("56", LocatorType::Page).unwrap();
    assert_eq!(cite.index(), 0);

    driver.insert_cluster(&cluster).unwrap();
    driver.set_cluster_order(&[ClusterPosition::in_text(1)]).unwrap();
    assert_eq!(driver.format_cluster(1).unwrap(), "prefix: Sparrows, p. 56 :suffix");
}

#[test]
fn cite_descriptor_matches_setters() {
    let mut driver = driver();
    let cluster = driver.cluster(2).unwrap();
    let cite = cluster
        .append(
            &Cite::new("sparrows")
                .with_prefix("see ")
                .with_locator("3", LocatorType::Chapter),
        )
        .unwrap();
    let second = cluster.append_ref("sparrows").unwrap();
    second.set_ref_id("owls").unwrap();
    assert_eq!((cite.index(), second.index()), (0, 1));

    driver.insert_cluster(&cluster).unwrap();
    driver.set_cluster_order(&[ClusterPosition::in_text(2)]).unwrap();
    assert_eq!(driver.format_cluster(2).unwrap(), "see Sparrows, chap. 3; Owls");
}

#[test]
fn reset_invalidates_earlier_cites() {
    let mut driver = driver();
    let cluster = driver.cluster(1).unwrap();
    let stale = cluster.append_ref("sparrows").unwrap();
    cluster.reset(5).unwrap();
    assert_eq!(cluster.id(), 5);

    let err = stale.set_prefix("x").unwrap_err();
    assert!(matches!(err, Error::StaleCite));
    assert_eq!(err.kind(), ErrorKind::NullPointer);
    assert!(matches!(stale.set_locator("1", LocatorType::Page), Err(Error::StaleCite)));

    let fresh = cluster.append_ref("owls").unwrap();
    assert_eq!(fresh.index(), 0);
    fresh.set_suffix("!").unwrap();

    assert_eq!(driver.insert_cluster(&cluster).unwrap(), 5);
    driver.set_cluster_order(&[ClusterPosition::in_text(5)]).unwrap();
    assert_eq!(driver.format_cluster(5).unwrap(), "Owls!");
}

#[test]
fn reinserting_a_cluster_replaces_its_cites() {
    let mut driver = driver();
    let cluster = driver.cluster_named("intro").unwrap();
    let id = cluster.id();
    cluster.append_ref("sparrows").unwrap();
    driver.insert_cluster(&cluster).unwrap();
    driver.set_cluster_order(&[ClusterPosition::in_text(id)]).unwrap();
    assert_eq!(driver.format_cluster(id).unwrap(), "Sparrows");

    cluster.reset(id).unwrap();
    cluster.append_ref("owls").unwrap();
    driver.insert_cluster(&cluster).unwrap();
    assert_eq!(driver.format_cluster(id).unwrap(), "Owls");
}

#[test]
fn empty_cluster_formats_as_empty() {
    let mut driver = driver();
    let cluster = driver.cluster(9).unwrap();
    driver.insert_cluster(&cluster).unwrap();
    cluster.destroy();
    driver.set_cluster_order(&[ClusterPosition::in_text(9)]).unwrap();
    assert_eq!(driver.format_cluster(9).unwrap(), "");
}

#[test]
fn clusters_outlive_their_driver() {
    let api = setup();
    let cluster = {
        let driver = Driver::new(api.clone(), NOTE_STYLE, BuiltInLocales, OutputFormat::Plain).unwrap();
        driver.cluster(3).unwrap()
    };
    cluster.append_ref("owls").unwrap();
    assert_eq!(cluster.id(), 3);
}
